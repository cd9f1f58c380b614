use std::fs;

fn main() {
    // The compiled-in defaults must always parse
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={}", config_path);

    let content = fs::read_to_string(config_path).expect("Failed to read default_config.toml");

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {}", e),
    };

    // A code block narrower than two columns cannot hold a continuation glyph
    let width = table
        .get("code")
        .and_then(|code| code.get("max_line_width"))
        .and_then(|width| width.as_integer());
    match width {
        Some(width) if width >= 2 => {}
        Some(width) => panic!("default_config.toml: code.max_line_width {} is too small", width),
        None => panic!("default_config.toml: missing code.max_line_width"),
    }
}
