// ── Full access paths ──
//
// The textual address format shared with the legacy client:
// dot-separated attribute names, `[N]` for zero-based sequence
// indices and `["key"]` for mapping keys, e.g.
// `panel.channels[2].gains["left"]`.
//
// Rendering is the exact inverse of parsing. Keys containing a double
// quote cannot be represented (there is no escaping) and are rejected
// when a path is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

// ── Segment ─────────────────────────────────────────────────────────

/// One step of an [`AccessPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named member lookup on an object.
    Attribute(String),
    /// Bounds-checked lookup into a sequence.
    Index(usize),
    /// Lookup into a string-keyed mapping.
    Key(String),
}

impl Segment {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn as_attribute(&self) -> Option<&str> {
        match self {
            Self::Attribute(name) => Some(name),
            _ => None,
        }
    }

    /// Check that the segment can be rendered and parsed back unchanged.
    fn validate(&self) -> Result<(), BridgeError> {
        match self {
            Self::Attribute(name) if !is_identifier(name) => Err(BridgeError::malformed(
                name,
                "attribute names must be identifiers",
            )),
            Self::Key(key) if key.contains('"') => {
                Err(BridgeError::UnsupportedKey { key: key.clone() })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "[\"{key}\"]"),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

// ── AccessPath ──────────────────────────────────────────────────────

/// A non-empty, validated sequence of segments.
///
/// Paths are cheap, per-request values: built from a request or a change
/// event, used for one resolve/apply cycle and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessPath {
    segments: Vec<Segment>,
}

impl AccessPath {
    /// Build a path from already-split segments.
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, BridgeError> {
        if segments.is_empty() {
            return Err(BridgeError::malformed("", "empty path"));
        }
        for segment in &segments {
            segment.validate()?;
        }
        Ok(Self { segments })
    }

    /// A single-segment path.
    pub fn single(segment: Segment) -> Result<Self, BridgeError> {
        Self::from_segments(vec![segment])
    }

    /// Parse the textual form. See the module docs for the grammar.
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        Parser::new(text).run()
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: Segment) -> Result<Self, BridgeError> {
        segment.validate()?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; paths are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> &Segment {
        // Non-empty by construction.
        &self.segments[self.segments.len() - 1]
    }

    /// Everything but the last segment (empty for single-segment paths).
    pub fn parent_segments(&self) -> &[Segment] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The enclosing path, or `None` when this path names a root member.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.parent_segments().to_vec(),
        })
    }

    /// Whether the last segment is the attribute `name`.
    pub fn ends_with_attribute(&self, name: &str) -> bool {
        self.last().as_attribute() == Some(name)
    }

    /// Render the first `len` segments (used for diagnostics).
    pub(crate) fn render_prefix(&self, len: usize) -> String {
        render_segments(&self.segments[..len.min(self.segments.len())])
    }
}

fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 && matches!(segment, Segment::Attribute(_)) {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_segments(&self.segments))
    }
}

impl FromStr for AccessPath {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccessPath {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccessPath> for String {
    fn from(path: AccessPath) -> Self {
        path.to_string()
    }
}

// ── Parser ──────────────────────────────────────────────────────────

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    segments: Vec<Segment>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            segments: Vec::new(),
        }
    }

    fn run(mut self) -> Result<AccessPath, BridgeError> {
        if self.text.is_empty() {
            return Err(self.error("empty path"));
        }

        while let Some(c) = self.peek() {
            match c {
                '.' if self.segments.is_empty() => return Err(self.error("leading '.'")),
                '.' => {
                    self.pos += 1;
                    let name = self.identifier()?;
                    self.segments.push(Segment::Attribute(name));
                }
                '[' => {
                    let segment = self.bracket()?;
                    self.segments.push(segment);
                }
                ']' => return Err(self.error(format!("unmatched ']' at offset {}", self.pos))),
                _ if self.segments.is_empty() => {
                    let name = self.identifier()?;
                    self.segments.push(Segment::Attribute(name));
                }
                other => {
                    return Err(self.error(format!(
                        "unexpected '{other}' at offset {}, expected '.' or '['",
                        self.pos
                    )));
                }
            }
        }

        Ok(AccessPath {
            segments: self.segments,
        })
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn identifier(&mut self) -> Result<String, BridgeError> {
        let rest = &self.text[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..len];
        if !is_identifier(name) {
            return Err(self.error(format!("expected attribute name at offset {}", self.pos)));
        }
        self.pos += len;
        Ok(name.to_owned())
    }

    /// `[N]` or `["key"]`, with `pos` on the opening bracket.
    fn bracket(&mut self) -> Result<Segment, BridgeError> {
        let open = self.pos;
        let rest = &self.text[open + 1..];

        if let Some(quoted) = rest.strip_prefix('"') {
            let Some(end) = quoted.find('"') else {
                return Err(self.error(format!("unterminated key at offset {open}")));
            };
            let key = &quoted[..end];
            if !quoted[end + 1..].starts_with(']') {
                // A later `"]` closes a key that has a quote inside it.
                if let Some(close) = quoted[end + 1..].find("\"]") {
                    return Err(BridgeError::UnsupportedKey {
                        key: quoted[..end + 1 + close].to_owned(),
                    });
                }
                return Err(self.error(format!("unmatched '[' at offset {open}")));
            }
            // '[' + '"' + key + '"' + ']'
            self.pos = open + key.len() + 4;
            return Ok(Segment::Key(key.to_owned()));
        }

        let Some(end) = rest.find(']') else {
            return Err(self.error(format!("unmatched '[' at offset {open}")));
        };
        let content = &rest[..end];
        if content.is_empty() || !content.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error(format!("non-numeric index '{content}' at offset {open}")));
        }
        let index = content
            .parse::<usize>()
            .map_err(|e| self.error(format!("index '{content}' at offset {open}: {e}")))?;
        self.pos = open + end + 2;
        Ok(Segment::Index(index))
    }

    fn error(&self, reason: impl Into<String>) -> BridgeError {
        BridgeError::malformed(self.text, reason)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Segment {
        Segment::attribute(name)
    }

    #[test]
    fn parses_dotted_attributes() {
        let path = AccessPath::parse("panel.slider.value").unwrap();
        assert_eq!(
            path.segments(),
            &[attr("panel"), attr("slider"), attr("value")]
        );
    }

    #[test]
    fn parses_indices_and_keys() {
        let path = AccessPath::parse("channels[2].gains[\"left.front\"]").unwrap();
        assert_eq!(
            path.segments(),
            &[
                attr("channels"),
                Segment::Index(2),
                attr("gains"),
                Segment::key("left.front"),
            ]
        );
    }

    #[test]
    fn round_trips_through_text() {
        let cases = vec![
            vec![attr("mode")],
            vec![attr("a"), Segment::Index(0), Segment::Index(10)],
            vec![attr("m"), Segment::key(""), attr("x")],
            vec![Segment::Index(3), attr("name")],
            vec![Segment::key("with ] bracket"), Segment::key("a[0].b")],
            vec![attr("_private"), attr("x1")],
        ];
        for segments in cases {
            let path = AccessPath::from_segments(segments).unwrap();
            let text = path.to_string();
            assert_eq!(AccessPath::parse(&text).unwrap(), path, "text: {text}");
        }
    }

    #[test]
    fn renders_expected_text() {
        let path = AccessPath::from_segments(vec![
            attr("items"),
            Segment::Index(1),
            Segment::key("k"),
            attr("value"),
        ])
        .unwrap();
        assert_eq!(path.to_string(), "items[1][\"k\"].value");
    }

    #[test]
    fn rejects_malformed_text() {
        for text in [
            "", ".a", "a.", "a..b", "a[", "a[]", "a[x]", "a[-1]", "a]", "a[0]b", "a[\"k\"",
            "a[\"k\"x]", "1abc", "a.1b", "a b",
        ] {
            let err = AccessPath::parse(text).unwrap_err();
            assert!(
                matches!(err, BridgeError::MalformedPath { .. }),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_keys_with_quotes() {
        let err = AccessPath::single(Segment::key("say \"hi\"")).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedKey { .. }));

        let base = AccessPath::parse("m").unwrap();
        assert!(base.join(Segment::key("\"")).is_err());

        assert_eq!(
            AccessPath::parse(r#"d["a"b"].x"#).unwrap_err(),
            BridgeError::UnsupportedKey {
                key: r#"a"b"#.into()
            }
        );
        assert!(matches!(
            AccessPath::parse(r#"d["a"b]"#),
            Err(BridgeError::MalformedPath { .. })
        ));
    }

    #[test]
    fn parent_and_last() {
        let path = AccessPath::parse("panel.slider.value").unwrap();
        assert!(path.ends_with_attribute("value"));
        assert_eq!(path.parent().unwrap().to_string(), "panel.slider");
        assert!(AccessPath::parse("mode").unwrap().parent().is_none());
    }

    #[test]
    fn serde_uses_text_form() {
        let path = AccessPath::parse("a[0][\"b\"]").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""a[0][\"b\"]""#);
        let back: AccessPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
