//! Preamble codec: a `---`-delimited key/value block, a blank line, then the
//! free-text body.
//!
//! Line grammar: `key: scalar` | `key:` (opens an indented nested block) |
//! inline lists `[a, b]`. Nesting is two spaces per level. Decoding tolerates
//! a missing preamble for legacy payloads; `encode(decode(x))` is
//! semantically equivalent to `x` for every modeled field.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use super::{Note, NoteKind, NoteMetadata, NotePreamble};
use crate::models::DateRange;

const DELIMITER: &str = "---";
const DATE_FMT: &str = "%Y-%m-%d";

pub fn encode(note: &Note) -> String {
    let p = &note.preamble;
    let mut lines = vec![DELIMITER.to_string()];
    lines.push(format!("type: {}", p.kind.as_ref()));
    lines.push(format!("createdAt: {}", p.created_at.to_rfc3339()));
    lines.push(format!("updatedAt: {}", p.updated_at.to_rfc3339()));
    lines.push(format!("tags: [{}]", render_inline_list(&p.tags)));
    if let Some(parent) = &p.parent_id {
        lines.push(format!("parentId: {}", quote_scalar(parent)));
    }
    if !p.child_ids.is_empty() {
        lines.push(format!("childIds: [{}]", render_inline_list(&p.child_ids)));
    }
    if let Some(meta) = &p.metadata {
        if !meta.is_empty() {
            lines.push("metadata:".to_string());
            encode_metadata(meta, &mut lines);
        }
    }
    lines.push(DELIMITER.to_string());
    format!("{}\n\n{}", lines.join("\n"), note.body)
}

fn encode_metadata(meta: &NoteMetadata, lines: &mut Vec<String>) {
    if let Some(company) = &meta.company {
        lines.push(format!("  company: {}", quote_scalar(company)));
    }
    if let Some(location) = &meta.location {
        lines.push(format!("  location: {}", quote_scalar(location)));
    }
    if let Some(proficiency) = &meta.proficiency {
        lines.push(format!("  proficiency: {}", quote_scalar(proficiency)));
    }
    if let Some(notes) = &meta.notes {
        lines.push(format!("  notes: {}", quote_scalar(notes)));
    }
    if let Some(range) = &meta.date_range {
        lines.push("  dateRange:".to_string());
        lines.push(format!("    start: {}", range.start.format(DATE_FMT)));
        if let Some(end) = range.end {
            lines.push(format!("    end: {}", end.format(DATE_FMT)));
        }
    }
    if !meta.custom.is_empty() {
        lines.push("  custom:".to_string());
        for (key, value) in &meta.custom {
            // pre-serialized so the value survives without being understood
            let doc = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
            lines.push(format!("    {key}: {doc}"));
        }
    }
}

/// Decode never fails: payloads without a preamble become all-body notes
/// with a default preamble.
pub fn decode(payload: &str) -> Note {
    match split_preamble(payload) {
        Some((block, body)) => Note {
            preamble: parse_block(&block),
            body,
        },
        None => Note {
            preamble: NotePreamble::default(),
            body: payload.to_string(),
        },
    }
}

/// Split into (preamble block, body). None when no leading delimiter pair.
fn split_preamble(payload: &str) -> Option<(String, String)> {
    let trimmed = payload.trim_start();
    let rest = trimmed.strip_prefix(DELIMITER)?;
    let close = rest.find("\n---")?;
    let block = rest[..close].trim_matches('\n').to_string();
    let after = &rest[close + 4..];
    let body = after
        .strip_prefix('\n')
        .unwrap_or(after)
        .trim_start_matches('\n')
        .to_string();
    Some((block, body))
}

struct Cursor<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(block: &'a str) -> Self {
        let lines = block
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| (l.len() - l.trim_start().len(), l.trim()))
            .collect();
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

fn parse_block(block: &str) -> NotePreamble {
    let mut cursor = Cursor::new(block);
    let mut preamble = NotePreamble::default();

    while let Some((indent, line)) = cursor.peek() {
        if indent > 0 {
            // stray indented line outside any block
            cursor.advance();
            continue;
        }
        let Some((key, value)) = split_key(line) else {
            cursor.advance();
            continue;
        };
        match key {
            "type" => {
                cursor.advance();
                preamble.kind = unquote(value).parse().unwrap_or_default();
            }
            "createdAt" => {
                cursor.advance();
                if let Some(ts) = parse_timestamp(value) {
                    preamble.created_at = ts;
                }
            }
            "updatedAt" => {
                cursor.advance();
                if let Some(ts) = parse_timestamp(value) {
                    preamble.updated_at = ts;
                }
            }
            "tags" => {
                cursor.advance();
                preamble.tags = parse_inline_list(value);
            }
            "parentId" => {
                cursor.advance();
                let id = unquote(value);
                if !id.is_empty() {
                    preamble.parent_id = Some(id);
                }
            }
            "childIds" => {
                cursor.advance();
                preamble.child_ids = parse_inline_list(value);
            }
            "metadata" if value.is_empty() => {
                cursor.advance();
                let meta = parse_metadata(&mut cursor, indent);
                if !meta.is_empty() {
                    preamble.metadata = Some(meta);
                }
            }
            _ => cursor.advance(),
        }
    }
    preamble
}

fn parse_metadata(cursor: &mut Cursor<'_>, parent_indent: usize) -> NoteMetadata {
    let mut meta = NoteMetadata::default();
    while let Some((indent, line)) = cursor.peek() {
        if indent <= parent_indent {
            break;
        }
        let Some((key, value)) = split_key(line) else {
            cursor.advance();
            continue;
        };
        match key {
            "dateRange" if value.is_empty() => {
                cursor.advance();
                meta.date_range = parse_date_range(cursor, indent);
            }
            "custom" if value.is_empty() => {
                cursor.advance();
                meta.custom = parse_custom(cursor, indent);
            }
            "company" => {
                cursor.advance();
                meta.company = non_empty(unquote(value));
            }
            "location" => {
                cursor.advance();
                meta.location = non_empty(unquote(value));
            }
            "proficiency" => {
                cursor.advance();
                meta.proficiency = non_empty(unquote(value));
            }
            "notes" => {
                cursor.advance();
                meta.notes = non_empty(unquote(value));
            }
            // unknown extension fields survive under `custom`
            _ => {
                cursor.advance();
                meta.custom
                    .insert(key.to_string(), parse_custom_value(value));
            }
        }
    }
    meta
}

fn parse_date_range(cursor: &mut Cursor<'_>, parent_indent: usize) -> Option<DateRange> {
    let mut start = None;
    let mut end = None;
    while let Some((indent, line)) = cursor.peek() {
        if indent <= parent_indent {
            break;
        }
        cursor.advance();
        let Some((key, value)) = split_key(line) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&unquote(value), DATE_FMT).ok();
        match key {
            "start" => start = date,
            "end" => end = date,
            _ => {}
        }
    }
    start.map(|start| DateRange { start, end })
}

fn parse_custom(cursor: &mut Cursor<'_>, parent_indent: usize) -> BTreeMap<String, serde_json::Value> {
    let mut custom = BTreeMap::new();
    while let Some((indent, line)) = cursor.peek() {
        if indent <= parent_indent {
            break;
        }
        cursor.advance();
        if let Some((key, value)) = split_key(line) {
            custom.insert(key.to_string(), parse_custom_value(value));
        }
    }
    custom
}

fn parse_custom_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(unquote(raw)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&unquote(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn split_key(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn render_inline_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| quote_scalar(i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse an inline list like `[foo, bar, "baz qux"]`.
fn parse_inline_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw);
    inner
        .split(',')
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

fn quote_scalar(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s.contains(':')
        || s.contains('#')
        || s.contains('"')
        || s.starts_with(char::is_whitespace)
        || s.ends_with(char::is_whitespace)
        || s.starts_with('[');
    if needs_quotes {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].replace("\\\"", "\"")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_note() -> Note {
        let mut note = Note::new(
            NoteKind::Experience,
            "Led the storage team.\n\nShipped the v2 engine.",
        )
        .with_tags(vec!["skill".to_string(), "python".to_string()]);
        note.preamble.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        note.preamble.updated_at = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        note.preamble.parent_id = Some("note-1700000000000-parent".to_string());
        note.preamble.child_ids = vec!["note-1-a".to_string(), "note-1-b".to_string()];
        let mut meta = NoteMetadata {
            company: Some("Acme".to_string()),
            location: Some("Berlin, DE".to_string()),
            proficiency: Some("expert".to_string()),
            notes: Some("relocated mid-role".to_string()),
            date_range: Some(DateRange {
                start: d(2020, 1, 1),
                end: Some(d(2023, 1, 1)),
            }),
            custom: BTreeMap::new(),
        };
        meta.custom.insert(
            "budget".to_string(),
            serde_json::json!({"amount": 2.5, "unit": "meur"}),
        );
        note.with_metadata(meta)
    }

    #[test]
    fn test_roundtrip_all_fields() {
        let note = sample_note();
        let decoded = decode(&encode(&note));
        assert_eq!(decoded, note);
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let once = encode(&decode(&encode(&sample_note())));
        let twice = encode(&decode(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_preamble_becomes_body() {
        let decoded = decode("Just some prose.\nNo preamble at all.");
        assert_eq!(decoded.preamble.kind, NoteKind::General);
        assert!(decoded.preamble.tags.is_empty());
        assert!(decoded.body.starts_with("Just some prose."));
    }

    #[test]
    fn test_unclosed_delimiter_is_body() {
        let decoded = decode("--- this is a ruler, not a preamble");
        assert!(decoded.body.contains("ruler"));
    }

    #[test]
    fn test_quoted_scalars_with_separators() {
        let mut note = Note::new(NoteKind::General, "body");
        note.preamble.metadata = Some(NoteMetadata {
            company: Some("Acme: Research".to_string()),
            ..Default::default()
        });
        let decoded = decode(&encode(&note));
        assert_eq!(
            decoded.preamble.metadata.unwrap().company.as_deref(),
            Some("Acme: Research")
        );
    }

    #[test]
    fn test_inline_list_parsing() {
        assert_eq!(parse_inline_list("[a, b, c]"), vec!["a", "b", "c"]);
        assert_eq!(parse_inline_list("[\"quoted item\", bare]"), vec!["quoted item", "bare"]);
        assert!(parse_inline_list("[]").is_empty());
    }

    #[test]
    fn test_unknown_metadata_key_survives_in_custom() {
        let payload = "---\ntype: skill\ntags: []\nmetadata:\n  certifier: ISC2\n---\n\nbody";
        let decoded = decode(payload);
        let meta = decoded.preamble.metadata.unwrap();
        assert_eq!(
            meta.custom.get("certifier"),
            Some(&serde_json::Value::String("ISC2".to_string()))
        );

        // and it still round-trips from here on
        let note = Note {
            preamble: NotePreamble {
                metadata: Some(meta),
                ..NotePreamble::default()
            },
            body: "body".to_string(),
        };
        let again = decode(&encode(&note));
        assert_eq!(again.preamble.metadata, note.preamble.metadata);
    }

    #[test]
    fn test_open_ended_date_range() {
        let payload =
            "---\ntype: experience\nmetadata:\n  dateRange:\n    start: 2019-01-01\n---\n\nbody";
        let range = decode(payload)
            .preamble
            .metadata
            .unwrap()
            .date_range
            .unwrap();
        assert_eq!(range.start, d(2019, 1, 1));
        assert!(range.end.is_none());
    }

    #[test]
    fn test_body_preserved_verbatim() {
        let note = Note::new(NoteKind::General, "line one\n\n  indented line\nlast");
        let decoded = decode(&encode(&note));
        assert_eq!(decoded.body, note.body);
    }
}
