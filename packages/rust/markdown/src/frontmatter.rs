//! Front-matter detection and payload parsing.
//!
//! Only a block at the very start of a document counts: a `---` or `+++`
//! line, then any payload lines, then the same delimiter on its own line.

use serde_json::{Map, Value};

use mdmerge_shared::{FrontMatter, FrontMatterDelimiter};

/// Result of looking for front matter at the start of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatterSplit<'a> {
    pub front_matter: Option<FrontMatter>,
    /// Everything after the block, or the whole text when there is none.
    pub body: &'a str,
    /// An opening delimiter was found but never closed.
    pub unterminated: bool,
}

/// Error raised while parsing a front-matter payload.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("line {line}: {message}")]
    Yaml { line: usize, message: String },

    #[error("invalid TOML: {0}")]
    Toml(String),
}

/// Split a leading front-matter block from `text` (line endings already `\n`).
pub fn split_front_matter(text: &str) -> FrontMatterSplit<'_> {
    let none = |unterminated| FrontMatterSplit {
        front_matter: None,
        body: text,
        unterminated,
    };

    let first_end = text.find('\n');
    let marker = text[..first_end.unwrap_or(text.len())].trim_end();
    let delimiter = match marker {
        "---" => FrontMatterDelimiter::Dashes,
        "+++" => FrontMatterDelimiter::Pluses,
        _ => return none(false),
    };
    let Some(first_end) = first_end else {
        return none(true);
    };

    let payload_start = first_end + 1;
    let mut offset = payload_start;
    loop {
        let line_end = text[offset..].find('\n').map(|i| offset + i);
        let line = &text[offset..line_end.unwrap_or(text.len())];

        if line.trim_end() == marker {
            let raw_end = line_end.map_or(text.len(), |i| i + 1);
            let payload = text[payload_start..offset]
                .strip_suffix('\n')
                .unwrap_or(&text[payload_start..offset]);
            return FrontMatterSplit {
                front_matter: Some(FrontMatter {
                    delimiter,
                    raw: text[..raw_end].to_string(),
                    payload: payload.to_string(),
                }),
                body: &text[raw_end..],
                unterminated: false,
            };
        }

        match line_end {
            Some(end) => offset = end + 1,
            None => return none(true),
        }
    }
}

/// Parse a front-matter payload into key/value pairs.
///
/// `+++` payloads are TOML. `---` payloads support the flat subset of YAML
/// found in markdown headers: `key: value`, inline `[a, b]` lists and
/// block `- item` lists.
pub fn parse_front_matter(front_matter: &FrontMatter) -> Result<Map<String, Value>, FrontMatterError> {
    match front_matter.delimiter {
        FrontMatterDelimiter::Pluses => {
            let table: toml::Table = front_matter
                .payload
                .parse()
                .map_err(|e: toml::de::Error| FrontMatterError::Toml(e.message().to_string()))?;
            Ok(table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect())
        }
        FrontMatterDelimiter::Dashes => parse_yaml_like(&front_matter.payload),
    }
}

// ---------------------------------------------------------------------------
// YAML subset
// ---------------------------------------------------------------------------

fn parse_yaml_like(payload: &str) -> Result<Map<String, Value>, FrontMatterError> {
    let mut map = Map::new();
    let mut list_key: Option<String> = None;

    for (index, line) in payload.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let item = trimmed
            .strip_prefix("- ")
            .or_else(|| (trimmed == "-").then_some(""));
        if let Some(item) = item {
            let key = list_key.as_ref().ok_or_else(|| FrontMatterError::Yaml {
                line: line_no,
                message: "list item without a key".into(),
            })?;
            let entry = map.entry(key.clone()).or_insert(Value::Null);
            match entry {
                Value::Array(items) => items.push(scalar(item.trim())),
                other => *other = Value::Array(vec![scalar(item.trim())]),
            }
            continue;
        }

        if line.starts_with([' ', '\t']) {
            return Err(FrontMatterError::Yaml {
                line: line_no,
                message: "nested mappings are not supported".into(),
            });
        }

        let (key, value) = trimmed.split_once(':').ok_or_else(|| FrontMatterError::Yaml {
            line: line_no,
            message: "expected `key: value`".into(),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(FrontMatterError::Yaml {
                line: line_no,
                message: "empty key".into(),
            });
        }

        let value = value.trim();
        if value.is_empty() {
            map.insert(key.to_string(), Value::Null);
            list_key = Some(key.to_string());
        } else {
            map.insert(key.to_string(), inline_value(value, line_no)?);
            list_key = None;
        }
    }

    Ok(map)
}

fn inline_value(value: &str, line: usize) -> Result<Value, FrontMatterError> {
    if let Some(inner) = value.strip_prefix('[') {
        let inner = inner.strip_suffix(']').ok_or_else(|| FrontMatterError::Yaml {
            line,
            message: "unclosed inline list".into(),
        })?;
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(scalar)
            .collect();
        return Ok(Value::Array(items));
    }
    if value.starts_with('{') || value.starts_with('|') || value.starts_with('>') {
        return Err(FrontMatterError::Yaml {
            line,
            message: "flow mappings and block scalars are not supported".into(),
        });
    }
    Ok(scalar(value))
}

fn scalar(raw: &str) -> Value {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "~" => Value::Null,
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_yaml_block_at_start() {
        let text = "---\ntitle: Test\ndate: 2025-01-01\n---\n\n# Heading\n";
        let split = split_front_matter(text);
        let fm = split.front_matter.expect("front matter");
        assert_eq!(fm.delimiter, FrontMatterDelimiter::Dashes);
        assert_eq!(fm.raw, "---\ntitle: Test\ndate: 2025-01-01\n---\n");
        assert_eq!(fm.payload, "title: Test\ndate: 2025-01-01");
        assert_eq!(split.body, "\n# Heading\n");
        assert!(!split.unterminated);
    }

    #[test]
    fn splits_toml_block_without_trailing_newline() {
        let split = split_front_matter("+++\ntitle = \"x\"\n+++");
        let fm = split.front_matter.expect("front matter");
        assert_eq!(fm.delimiter, FrontMatterDelimiter::Pluses);
        assert_eq!(fm.raw, "+++\ntitle = \"x\"\n+++");
        assert_eq!(split.body, "");
    }

    #[test]
    fn mismatched_delimiters_do_not_close() {
        let split = split_front_matter("---\ntitle: x\n+++\nbody\n");
        assert!(split.front_matter.is_none());
        assert!(split.unterminated);
    }

    #[test]
    fn front_matter_elsewhere_is_body() {
        let text = "# Title\n---\nkey: value\n---\n";
        let split = split_front_matter(text);
        assert!(split.front_matter.is_none());
        assert!(!split.unterminated);
        assert_eq!(split.body, text);
    }

    #[test]
    fn unterminated_block_is_flagged() {
        let split = split_front_matter("---\ntitle: x\n\nNo closing line\n");
        assert!(split.front_matter.is_none());
        assert!(split.unterminated);
        assert_eq!(split.body, "---\ntitle: x\n\nNo closing line\n");
    }

    #[test]
    fn parses_yaml_subset() {
        let split = split_front_matter(
            "---\ntitle: \"Getting Started\"\ndraft: false\nweight: 3\ntags: [intro, setup]\nauthors:\n  - Ana\n  - Bo\n---\n",
        );
        let map = parse_front_matter(&split.front_matter.unwrap()).expect("parse");
        assert_eq!(map["title"], "Getting Started");
        assert_eq!(map["draft"], false);
        assert_eq!(map["weight"], 3);
        assert_eq!(map["tags"], serde_json::json!(["intro", "setup"]));
        assert_eq!(map["authors"], serde_json::json!(["Ana", "Bo"]));
    }

    #[test]
    fn yaml_parse_failure_reports_line() {
        let split = split_front_matter("---\ntitle: ok\njust some prose\n---\n");
        let err = parse_front_matter(&split.front_matter.unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "line 2: expected `key: value`");
    }

    #[test]
    fn parses_toml_payload() {
        let split = split_front_matter("+++\ntitle = \"Guide\"\n[extra]\nlevel = 2\n+++\nbody");
        let map = parse_front_matter(&split.front_matter.unwrap()).expect("parse");
        assert_eq!(map["title"], "Guide");
        assert_eq!(map["extra"]["level"], 2);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let split = split_front_matter("+++\ntitle = \n+++\n");
        assert!(matches!(
            parse_front_matter(&split.front_matter.unwrap()),
            Err(FrontMatterError::Toml(_))
        ));
    }
}
