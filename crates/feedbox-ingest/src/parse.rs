use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::IngestError;

/// One entry extracted from an RSS document. `guid` falls back to the link
/// at store time when the feed omits it.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub guid: Option<String>,
    pub published_at: Option<String>,
}

/// Extract `<item>` entries from raw RSS XML. Items missing a title or a
/// link are dropped rather than failing the whole document.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<FeedEntry>, IngestError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current_item: Option<FeedEntryBuilder> = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                current_element = name.clone();

                if name == "item" {
                    current_item = Some(FeedEntryBuilder::default());
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if name == "item" {
                    if let Some(builder) = current_item.take() {
                        if let Some(entry) = builder.build() {
                            entries.push(entry);
                        }
                    }
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut item) = current_item {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        match current_element.as_str() {
                            "title" => item.title = Some(text),
                            "link" => item.link = Some(text),
                            "guid" => item.guid = Some(text),
                            "pubDate" => item.published_at = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[derive(Default)]
struct FeedEntryBuilder {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    published_at: Option<String>,
}

impl FeedEntryBuilder {
    fn build(self) -> Option<FeedEntry> {
        Some(FeedEntry {
            title: self.title?,
            link: self.link?,
            guid: self.guid,
            published_at: self.published_at,
        })
    }
}
