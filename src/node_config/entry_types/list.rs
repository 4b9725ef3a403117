//! List entries.
//!
//! A list is rendered either on one line, joined with a separator and
//! optionally wrapped in brackets (`[15,60,300]`), or as one line per element
//! when the key is repeated in the file (`private-key = ...` twice).

use super::scalar::EntryKind;
use super::{ConfigEntry, EntryError, Value};
use std::fmt;
use std::marker::PhantomData;

/// Formatting options of a list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFormat {
    pub begin: &'static str,
    pub separator: &'static str,
    pub end: &'static str,
    pub single_line: bool,
}

impl Default for ListFormat {
    fn default() -> Self {
        Self {
            begin: "",
            separator: " ",
            end: "",
            single_line: true,
        }
    }
}

/// Result of serializing a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Single-line mode: the whole list joined on one line
    Line(String),
    /// Multi-line mode: one serialized element per line
    Lines(Vec<String>),
}

/// Ordered list of values of one scalar kind
#[derive(Clone, PartialEq)]
pub struct List<K: EntryKind> {
    items: Vec<K::Value>,
    format: ListFormat,
    _kind: PhantomData<K>,
}

impl<K: EntryKind> List<K> {
    /// Single-line list separated by spaces
    pub fn new() -> Self {
        Self::with_format(ListFormat::default())
    }

    pub fn with_format(format: ListFormat) -> Self {
        Self {
            items: Vec::new(),
            format,
            _kind: PhantomData,
        }
    }

    /// One element per line
    pub fn multi_line() -> Self {
        Self::with_format(ListFormat {
            single_line: false,
            ..ListFormat::default()
        })
    }

    /// Single-line list such as `[15,60,300]`
    pub fn bracketed(begin: &'static str, separator: &'static str, end: &'static str) -> Self {
        Self::with_format(ListFormat {
            begin,
            separator,
            end,
            single_line: true,
        })
    }

    pub fn format(&self) -> &ListFormat {
        &self.format
    }

    /// Replace the contents with the values parsed from `raw`.
    ///
    /// In multi-line mode `raw` holds one element per line.
    pub fn parse_from_text(&mut self, raw: &str) -> Result<(), EntryError> {
        self.items = self.parse_items(raw)?;
        Ok(())
    }

    pub fn serialize_to_text(&self) -> Rendered {
        let serialized = self.items.iter().map(K::serialize);
        if self.format.single_line {
            let joined = serialized.collect::<Vec<_>>().join(self.format.separator);
            Rendered::Line(format!("{}{}{}", self.format.begin, joined, self.format.end))
        } else {
            Rendered::Lines(serialized.collect())
        }
    }

    pub fn get_value(&self) -> &[K::Value] {
        &self.items
    }

    /// Replace the contents; nothing changes if any value has the wrong kind.
    pub fn set_value<I, V>(&mut self, values: I) -> Result<(), EntryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.items = Self::accept_all(values)?;
        Ok(())
    }

    /// Append values; nothing changes if any value has the wrong kind.
    pub fn extend<I, V>(&mut self, values: I) -> Result<(), EntryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let accepted = Self::accept_all(values)?;
        self.items.extend(accepted);
        Ok(())
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), EntryError> {
        self.items.push(K::accept(value.into())?);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn accept_all<I, V>(values: I) -> Result<Vec<K::Value>, EntryError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values.into_iter().map(|v| K::accept(v.into())).collect()
    }

    fn parse_items(&self, raw: &str) -> Result<Vec<K::Value>, EntryError> {
        if !self.format.single_line {
            return raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(K::parse)
                .collect();
        }

        let mut inner = raw.trim();
        if !self.format.begin.is_empty() {
            inner = inner.strip_prefix(self.format.begin).ok_or_else(|| {
                EntryError::parse("list", raw, format!("expected leading '{}'", self.format.begin))
            })?;
        }
        if !self.format.end.is_empty() {
            inner = inner.strip_suffix(self.format.end).ok_or_else(|| {
                EntryError::parse("list", raw, format!("expected trailing '{}'", self.format.end))
            })?;
        }

        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(Vec::new());
        }

        split_outside_quotes(inner, self.format.separator)
            .into_iter()
            .map(K::parse)
            .collect()
    }
}

/// Split `text` on `separator` except between double quotes.
///
/// A blank separator splits on any run of whitespace. Items are trimmed.
fn split_outside_quotes<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let on_whitespace = separator.trim().is_empty();
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut rest = text.char_indices().peekable();

    while let Some((index, c)) = rest.next() {
        if c == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if on_whitespace && c.is_whitespace() {
            if index > start {
                items.push(&text[start..index]);
            }
            start = index + c.len_utf8();
        } else if !on_whitespace && text[index..].starts_with(separator) {
            items.push(text[start..index].trim());
            start = index + separator.len();
            // Skip the remaining characters of a multi-character separator
            while rest.peek().is_some_and(|(next, _)| *next < start) {
                rest.next();
            }
        }
    }

    let last = text[start..].trim();
    if !on_whitespace || !last.is_empty() {
        items.push(last);
    }
    items
}

impl<K: EntryKind> Default for List<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntryKind> fmt::Debug for List<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("kind", &K::NAME)
            .field("items", &self.items)
            .field("format", &self.format)
            .finish()
    }
}

impl<K: EntryKind> ConfigEntry for List<K> {
    fn to_lines(&self) -> Vec<String> {
        if self.items.is_empty() {
            return Vec::new();
        }
        match self.serialize_to_text() {
            Rendered::Line(line) => vec![line],
            Rendered::Lines(lines) => lines,
        }
    }

    fn merge_from_text(&mut self, raw: &str) -> Result<(), EntryError> {
        let parsed = self.parse_items(raw)?;
        self.items.extend(parsed);
        Ok(())
    }

    fn is_set(&self) -> bool {
        !self.items.is_empty()
    }

    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Integer, Quoted, Untouched};
    use super::*;

    const PLUGINS: [&str; 5] = [
        "network_node_api",
        "account_by_key",
        "witness",
        "network_broadcast_api",
        "condenser_api",
    ];

    #[test]
    fn test_parsing_single_line_of_untouched() {
        let mut items = List::<Untouched>::new();
        items.parse_from_text(&PLUGINS.join(" ")).unwrap();
        assert_eq!(items.get_value(), PLUGINS);
    }

    #[test]
    fn test_serializing_single_line_of_untouched() {
        let mut items = List::<Untouched>::new();
        items.set_value(PLUGINS).unwrap();
        assert_eq!(items.serialize_to_text(), Rendered::Line(PLUGINS.join(" ")));
    }

    #[test]
    fn test_parsing_single_line_of_integers() {
        let mut items = List::<Integer>::bracketed("[", ",", "]");
        items.parse_from_text("[15,60,300,3600,86400]").unwrap();
        assert_eq!(items.get_value(), [15, 60, 300, 3600, 86400]);
    }

    #[test]
    fn test_serializing_single_line_of_integers() {
        let mut items = List::<Integer>::bracketed("[", ",", "]");
        items.set_value([15, 60, 300, 3600, 86400]).unwrap();
        assert_eq!(
            items.serialize_to_text(),
            Rendered::Line("[15,60,300,3600,86400]".to_string())
        );
    }

    #[test]
    fn test_serializing_multiple_lines_of_strings() {
        let input = ["initminer", "blocktrades", "gtg", "good-karma"];
        let mut items = List::<Quoted>::multi_line();
        items.set_value(input).unwrap();

        let expected = input.iter().map(|item| format!("\"{}\"", item)).collect();
        assert_eq!(items.serialize_to_text(), Rendered::Lines(expected));
    }

    #[test]
    fn test_multi_line_round_trip() {
        let mut source = List::<Quoted>::multi_line();
        source.set_value(["initminer", "blocktrades"]).unwrap();
        let Rendered::Lines(lines) = source.serialize_to_text() else {
            panic!("multi-line list rendered as a single line");
        };
        assert_eq!(lines, ["\"initminer\"", "\"blocktrades\""]);

        let mut parsed = List::<Quoted>::multi_line();
        parsed.parse_from_text(&lines.join("\n")).unwrap();
        assert_eq!(parsed.get_value(), source.get_value());
    }

    #[test]
    fn test_quoted_items_keep_their_spaces() {
        let mut source = List::<Quoted>::new();
        source.set_value(["a b", "c"]).unwrap();
        let Rendered::Line(line) = source.serialize_to_text() else {
            panic!("single-line list rendered as several lines");
        };
        assert_eq!(line, "\"a b\" \"c\"");

        let mut parsed = List::<Quoted>::new();
        parsed.parse_from_text(&line).unwrap();
        assert_eq!(parsed.get_value(), ["a b", "c"]);
    }

    #[test]
    fn test_quoted_items_keep_their_separators() {
        let mut source = List::<Quoted>::bracketed("[", ",", "]");
        source.set_value(["x,y", "z"]).unwrap();
        let Rendered::Line(line) = source.serialize_to_text() else {
            panic!("single-line list rendered as several lines");
        };

        let mut parsed = List::<Quoted>::bracketed("[", ",", "]");
        parsed.parse_from_text(&line).unwrap();
        assert_eq!(parsed.get_value(), ["x,y", "z"]);
    }

    #[test]
    fn test_list_rejects_line_breaks() {
        let mut items = List::<Quoted>::multi_line();
        assert!(matches!(
            items.push("first\nsecond"),
            Err(EntryError::LineBreak { .. })
        ));
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_brackets_fail() {
        let mut items = List::<Integer>::bracketed("[", ",", "]");
        assert!(items.parse_from_text("15,60]").is_err());
        assert!(items.parse_from_text("[15,60").is_err());
        assert!(items.parse_from_text("[15,x]").is_err());
    }

    #[test]
    fn test_empty_brackets_parse_to_empty_list() {
        let mut items = List::<Integer>::bracketed("[", ",", "]");
        items.parse_from_text("[]").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut items = List::<Integer>::new();
        items.extend([1, 2]).unwrap();
        assert!(items.extend([Value::Integer(3), Value::Bool(true)]).is_err());
        assert_eq!(items.get_value(), [1, 2]);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut items = List::<Untouched>::new();
        items.merge_from_text("p2p witness").unwrap();
        items.merge_from_text("condenser_api").unwrap();
        assert_eq!(items.get_value(), ["p2p", "witness", "condenser_api"]);
    }
}
