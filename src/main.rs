use std::fs;
use std::path::PathBuf;

use clap::Parser;

use prepress::Config;

#[derive(Parser)]
#[command(name = "prepress")]
#[command(about = "Export an issue's articles from a WordPress dump for layout")]
struct Cli {
    /// Issue tag to export, e.g. v141i3
    issue: String,

    /// WordPress XML dump to read from
    xml_dump: PathBuf,

    /// Issue document to write
    #[arg(short, long, default_value = "issue.xml")]
    output: PathBuf,

    /// Config file; built-in defaults are used if it doesn't exist
    #[arg(short, long, default_value = "prepress.toml")]
    config: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let xml = match fs::read_to_string(&cli.xml_dump) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.xml_dump.display(), e);
            std::process::exit(1);
        }
    };

    let issue = match prepress::export_issue(&xml, &cli.issue, &config) {
        Ok(issue) => issue,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = fs::write(&cli.output, issue) {
        eprintln!("Error writing {}: {}", cli.output.display(), e);
        std::process::exit(1);
    }

    println!("Issue written to {}", cli.output.display());
}
