//! Free-text query tokenizer.
//!
//! `key:value` pairs (keys are lowercase words or dashes) are pulled out of
//! the query; everything else is returned as residual text. Values containing
//! spaces may be double-quoted: `category:"Pet food"`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::storage::sort_index::MIN_SORT_KEY;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[a-z-]+:("[^"]+"|[^ ]+)"#).expect("query token pattern"));

const FROM: &str = "from";
const TO: &str = "to";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid range: from \"{from}\" is after to \"{to}\"")]
    InvertedRange { from: String, to: String },
    #[error("Unknown list \"{0}\", expected \"category\" or \"title\"")]
    UnknownList(String),
    #[error("Missing \"{0}:\" token")]
    MissingToken(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub tokens: BTreeMap<String, String>,
    pub text: String,
}

/// Inclusive sort key range; no upper bound when `to` is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRange {
    pub from: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Range(SortRange),
    Equals { field: String, value: String },
}

/// Typed filters of a query: at most one range, one equality per other token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<Filter>);

impl Filters {
    pub fn range(&self) -> Option<&SortRange> {
        self.0.iter().find_map(|filter| match filter {
            Filter::Range(range) => Some(range),
            Filter::Equals { .. } => None,
        })
    }

    /// Value the `field` must equal, if the query constrains it
    pub fn equals(&self, field: &str) -> Option<&str> {
        self.0.iter().find_map(|filter| match filter {
            Filter::Equals { field: f, value } if f == field => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Split a query into tokens and residual text. Later tokens with the same
/// key overwrite earlier ones.
pub fn parse(query: &str) -> ParsedQuery {
    let mut tokens = BTreeMap::new();
    let mut text = String::with_capacity(query.len());
    let mut last = 0;

    for m in TOKEN_RE.find_iter(query) {
        if let Some((key, value)) = m.as_str().split_once(':') {
            tokens.insert(key.to_string(), unquote(value).to_string());
        }
        text.push_str(&query[last..m.start()]);
        last = m.end();
    }
    text.push_str(&query[last..]);

    ParsedQuery {
        tokens,
        text: text.trim().to_string(),
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

impl ParsedQuery {
    fn get(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    /// Sort key range from the `from:` and `to:` tokens, if either is present
    fn range(&self) -> Result<Option<SortRange>, QueryError> {
        let (from, to) = match (self.get(FROM), self.get(TO)) {
            (None, None) => return Ok(None),
            (from, to) => (from.unwrap_or(MIN_SORT_KEY), to),
        };
        if let Some(to) = to {
            if from > to {
                return Err(QueryError::InvertedRange {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        Ok(Some(SortRange {
            from: from.to_string(),
            to: to.map(str::to_string),
        }))
    }

    /// Fails when the `from:`/`to:` range is inverted
    pub fn filters(&self) -> Result<Filters, QueryError> {
        let mut filters = Vec::new();
        if let Some(range) = self.range()? {
            filters.push(Filter::Range(range));
        }
        for (field, value) in &self.tokens {
            if field != FROM && field != TO {
                filters.push(Filter::Equals {
                    field: field.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(Filters(filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_and_text() {
        let parsed = parse("Cat food from:2015-01-01 to:2015-01-31");
        assert_eq!(parsed.get("from"), Some("2015-01-01"));
        assert_eq!(parsed.get("to"), Some("2015-01-31"));
        assert_eq!(parsed.text, "Cat food");
    }

    #[test]
    fn test_plain_text() {
        let parsed = parse("  just some words ");
        assert!(parsed.tokens.is_empty());
        assert_eq!(parsed.text, "just some words");
        assert_eq!(parse(""), ParsedQuery::default());
    }

    #[test]
    fn test_quoted_values() {
        let parsed = parse(r#"category:"Pet food" Whiskas"#);
        assert_eq!(parsed.get("category"), Some("Pet food"));
        assert_eq!(parsed.text, "Whiskas");
    }

    #[test]
    fn test_later_tokens_overwrite() {
        let parsed = parse("id:1 Foo id:2");
        assert_eq!(parsed.get("id"), Some("2"));
        assert_eq!(parsed.tokens.len(), 1);
        assert_eq!(parsed.text, "Foo");
    }

    #[test]
    fn test_value_splits_on_first_colon() {
        let parsed = parse("from:2015-01-01T00:00:00.000Z");
        assert_eq!(parsed.get("from"), Some("2015-01-01T00:00:00.000Z"));
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_uppercase_keys_are_text() {
        let parsed = parse("Note:this");
        assert_eq!(parsed.get("ote"), Some("this"));
        assert_eq!(parsed.text, "N");
    }

    #[test]
    fn test_parse_is_idempotent_on_text() {
        let queries = [
            "Cat food from:2015-01-01 to:2015-01-31",
            r#"in:category "unterminated"#,
            r#"k:"a b" rest x:y:z"#,
            "A:from:1 -:- ::",
            "a:b c:d e",
            r#"title:"quoted value"trailing more"#,
            "ümlaut:x to:ÿ",
        ];
        for q in queries {
            let once = parse(q);
            assert!(parse(&once.text).tokens.is_empty(), "query {q:?}");
        }
    }

    #[test]
    fn test_range() {
        assert_eq!(parse("hello").range().unwrap(), None);

        let range = parse("from:2015-01-01").range().unwrap().unwrap();
        assert_eq!(range.from, "2015-01-01");
        assert_eq!(range.to, None);

        let range = parse("to:2015-01-31").range().unwrap().unwrap();
        assert_eq!(range.from, MIN_SORT_KEY);
        assert_eq!(range.to.as_deref(), Some("2015-01-31"));

        assert!(matches!(
            parse("from:2015-02-01 to:2015-01-01").range(),
            Err(QueryError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_filters() {
        let filters = parse("in:category from:2015-01-01 id:42").filters().unwrap();
        assert_eq!(
            filters.0,
            vec![
                Filter::Range(SortRange {
                    from: "2015-01-01".to_string(),
                    to: None
                }),
                Filter::Equals {
                    field: "id".to_string(),
                    value: "42".to_string()
                },
                Filter::Equals {
                    field: "in".to_string(),
                    value: "category".to_string()
                },
            ]
        );

        assert_eq!(filters.equals("id"), Some("42"));
        assert_eq!(filters.equals("in"), Some("category"));
        assert_eq!(filters.equals("category"), None);
        assert_eq!(filters.range().map(|r| r.from.as_str()), Some("2015-01-01"));

        let filters = parse("just text").filters().unwrap();
        assert_eq!(filters, Filters::default());
        assert_eq!(filters.range(), None);

        assert!(matches!(
            parse("id:42 from:2015-02-01 to:2015-01-01").filters(),
            Err(QueryError::InvertedRange { .. })
        ));
    }
}
