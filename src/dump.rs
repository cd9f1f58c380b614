use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::Result;

/// The parts of an `<item>` the issue export uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpItem {
    pub title: Option<String>,
    /// Raw HTML of `<content:encoded>`.
    pub content: Option<String>,
    /// Text of every `<category domain="post_tag">`.
    pub tags: Vec<String>,
}

impl DumpItem {
    pub fn is_for_issue(&self, issue: &str) -> bool {
        self.tags.iter().any(|tag| tag == issue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Content,
    Tag,
}

impl Field {
    fn tag_name(self) -> &'static [u8] {
        match self {
            Field::Title => b"title",
            Field::Content => b"content:encoded",
            Field::Tag => b"category",
        }
    }

    fn store(self, item: &mut DumpItem, value: String) {
        match self {
            Field::Title => item.title = Some(value),
            Field::Content => item.content = Some(value),
            Field::Tag => item.tags.push(value.trim().to_string()),
        }
    }
}

/// Read every `<item>` of a dump, in document order.
pub fn read_items(xml: &str) -> Result<Vec<DumpItem>> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<DumpItem> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if start.name().as_ref() == b"item" {
                    current = Some(DumpItem::default());
                } else if current.is_some() && field.is_none() {
                    field = field_of(&start)?;
                    text.clear();
                }
            }
            // `<content:encoded/>` and friends hold an empty value
            Event::Empty(start) if field.is_none() => {
                if let Some(item) = current.as_mut() {
                    if let Some(f) = field_of(&start)? {
                        f.store(item, String::new());
                    }
                }
            }
            Event::Text(t) if field.is_some() => {
                let unescaped = t
                    .unescape()
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned().into());
                text.push_str(&unescaped);
            }
            Event::CData(t) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Event::End(end) => {
                let name = end.name();
                if let (Some(f), Some(item)) = (field, current.as_mut()) {
                    if name.as_ref() == f.tag_name() {
                        f.store(item, std::mem::take(&mut text));
                        field = None;
                    }
                } else if name.as_ref() == b"item" {
                    items.extend(current.take());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    log::debug!("Read {} items from dump", items.len());
    Ok(items)
}

fn field_of(start: &BytesStart) -> Result<Option<Field>> {
    let field = match start.name().as_ref() {
        b"title" => Some(Field::Title),
        b"content:encoded" => Some(Field::Content),
        b"category" => {
            let domain = match start
                .try_get_attribute("domain")
                .map_err(quick_xml::Error::from)?
            {
                Some(attr) => attr.unescape_value()?,
                None => Cow::Borrowed(""),
            };
            (domain == "post_tag").then_some(Field::Tag)
        }
        _ => None,
    };
    Ok(field)
}
