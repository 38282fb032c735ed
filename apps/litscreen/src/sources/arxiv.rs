//! arXiv Atom feed pages (`{"pages": [{"xml": "<feed>..."}]}`).
//!
//! Each page is parsed independently; a page that fails to parse is
//! skipped with a warning and the remaining pages still load.

use super::text;
use litscreen_core::text::safe_year;
use litscreen_core::{CanonicalRecord, Source};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Value;

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    let Some(pages) = payload.get("pages").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        let xml = text(page, "xml");
        if xml.trim().is_empty() {
            continue;
        }
        match parse_feed(xml) {
            Ok(entries) => records.extend(entries.into_iter().map(Entry::into_record)),
            Err(e) => tracing::warn!("Skipping arXiv page {}: {}", index, e),
        }
    }
    records
}

// =============================================================================
// ATOM PARSING
// =============================================================================

#[derive(Default)]
struct Entry {
    id: String,
    title: String,
    authors: Vec<String>,
    published: String,
    doi: String,
}

impl Entry {
    fn into_record(self) -> CanonicalRecord {
        CanonicalRecord::new(Source::Arxiv, self.id.trim())
            .with_title(&self.title)
            .with_authors(self.authors)
            .with_year(safe_year(&self.published))
            .with_doi(&self.doi)
            .with_url(&self.id)
            .with_venue("arXiv")
    }
}

/// Element whose text is being collected.
#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Published,
    Doi,
    AuthorName,
}

fn parse_feed(xml: &str) -> Result<Vec<Entry>, quick_xml::Error> {
    // text is kept untrimmed so whitespace around entity references
    // survives; record builders collapse it afterwards
    let mut reader = Reader::from_str(xml);

    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;
    let mut in_author = false;
    let mut field: Option<Field> = None;
    let mut author_name = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"entry" => current = Some(Entry::default()),
                    b"author" if current.is_some() => {
                        in_author = true;
                        author_name.clear();
                    }
                    b"name" if in_author => field = Some(Field::AuthorName),
                    b"id" if current.is_some() && !in_author => field = Some(Field::Id),
                    b"title" if current.is_some() => field = Some(Field::Title),
                    b"published" if current.is_some() => field = Some(Field::Published),
                    b"doi" if current.is_some() => field = Some(Field::Doi),
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                let chunk = String::from_utf8_lossy(e.as_ref());
                append(&mut current, &mut author_name, field, &chunk);
            }
            Event::CData(ref e) => {
                let chunk = String::from_utf8_lossy(e.as_ref());
                append(&mut current, &mut author_name, field, &chunk);
            }
            Event::GeneralRef(ref e) => {
                let mut utf8 = [0u8; 4];
                let resolved = match e.resolve_char_ref() {
                    Ok(Some(ch)) => Some(&*ch.encode_utf8(&mut utf8)),
                    _ => {
                        let name: &[u8] = e;
                        predefined_entity(name)
                    }
                };
                if let Some(resolved) = resolved {
                    append(&mut current, &mut author_name, field, resolved);
                }
            }
            Event::End(ref e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                        in_author = false;
                    }
                    b"author" if in_author => {
                        in_author = false;
                        if let Some(entry) = current.as_mut() {
                            entry.authors.push(std::mem::take(&mut author_name));
                        }
                    }
                    _ => {}
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn append(
    current: &mut Option<Entry>,
    author_name: &mut String,
    field: Option<Field>,
    chunk: &str,
) {
    let (Some(entry), Some(field)) = (current.as_mut(), field) else {
        return;
    };
    let target = match field {
        Field::Id => &mut entry.id,
        Field::Title => &mut entry.title,
        Field::Published => &mut entry.published,
        Field::Doi => &mut entry.doi,
        Field::AuthorName => author_name,
    };
    target.push_str(chunk);
}

fn predefined_entity(name: &[u8]) -> Option<&'static str> {
    match name {
        b"amp" => Some("&"),
        b"lt" => Some("<"),
        b"gt" => Some(">"),
        b"quot" => Some("\""),
        b"apos" => Some("'"),
        _ => None,
    }
}
