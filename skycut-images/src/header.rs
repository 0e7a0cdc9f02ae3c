use crate::errors::{FitsError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str;

pub const CARD_SIZE: usize = 80;
pub const HEADER_BLOCK_SIZE: usize = 2880;

const VALUE_START: usize = 10;
const MAX_STRING_LEN: usize = CARD_SIZE - VALUE_START - 2;

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl KeywordValue {
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Self::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn parse(value_str: &str) -> Self {
        let trimmed = value_str.trim();

        if trimmed == "T" {
            return Self::Logical(true);
        }
        if trimmed == "F" {
            return Self::Logical(false);
        }

        if trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 {
            let content = &trimmed[1..trimmed.len() - 1];
            return Self::String(content.replace("''", "'").trim_end().to_string());
        }

        if let Ok(int_val) = trimmed.parse::<i64>() {
            return Self::Integer(int_val);
        }

        // Fortran-style D exponents show up in older headers.
        if let Ok(float_val) = trimmed.replace(['D', 'd'], "E").parse::<f64>() {
            return Self::Real(float_val);
        }

        Self::String(trimmed.to_string())
    }

    fn to_card_value(&self) -> String {
        match self {
            Self::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
            Self::Integer(i) => format!("{:>20}", i),
            Self::Real(f) => format!("{:>20}", format_real(*f)),
            Self::String(s) => {
                let truncated: String = s.chars().take(MAX_STRING_LEN).collect();
                let mut escaped = truncated.replace('\'', "''");
                while escaped.len() > MAX_STRING_LEN {
                    escaped.pop();
                }
                format!("'{:<8}'", escaped)
            }
        }
    }
}

/// Shortest representation that parses back to the same `f64`, always with a
/// decimal point or exponent so readers do not take it for an integer.
fn format_real(value: f64) -> String {
    format!("{:?}", value).replace('e', "E")
}

impl fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", format_real(*r)),
            Self::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for KeywordValue {
    fn from(value: bool) -> Self {
        Self::Logical(value)
    }
}

impl From<i64> for KeywordValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for KeywordValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for KeywordValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for KeywordValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Option<KeywordValue>,
    pub comment: Option<String>,
}

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            comment: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<KeywordValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn logical(name: impl Into<String>, value: bool) -> Self {
        Self::new(name).with_value(value)
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name).with_value(value)
    }

    pub fn real(name: impl Into<String>, value: f64) -> Self {
        Self::new(name).with_value(value)
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).with_value(value.into())
    }

    pub fn history(text: impl Into<String>) -> Self {
        Self::new("HISTORY").with_comment(text)
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::new("COMMENT").with_comment(text)
    }

    /// Keywords that describe the HDU layout and are regenerated on write.
    pub fn is_structural(&self) -> bool {
        let name = self.name.as_str();
        matches!(
            name,
            "SIMPLE"
                | "BITPIX"
                | "NAXIS"
                | "EXTEND"
                | "XTENSION"
                | "PCOUNT"
                | "GCOUNT"
                | "BSCALE"
                | "BZERO"
                | "BLANK"
                | "CHECKSUM"
                | "DATASUM"
                | "END"
        ) || (name.len() > 5
            && name.starts_with("NAXIS")
            && name[5..].chars().all(|c| c.is_ascii_digit()))
    }

    fn is_commentary(&self) -> bool {
        matches!(self.name.as_str(), "HISTORY" | "COMMENT" | "")
    }

    pub fn to_card(&self) -> Result<[u8; CARD_SIZE]> {
        if self.name.len() > 8 || !self.name.is_ascii() {
            return Err(FitsError::InvalidFormat(format!(
                "keyword name '{}' does not fit a FITS card",
                self.name
            )));
        }

        let mut text = format!("{:<8}", self.name);
        if self.name == "END" {
            // nothing after END
        } else if self.is_commentary() || self.value.is_none() {
            if let Some(comment) = &self.comment {
                text.push_str(comment);
            }
        } else if let Some(value) = &self.value {
            text.push_str("= ");
            text.push_str(&value.to_card_value());
            if let Some(comment) = &self.comment {
                text.push_str(" / ");
                text.push_str(comment);
            }
        }

        let mut card = [b' '; CARD_SIZE];
        let bytes: Vec<u8> = text
            .bytes()
            .map(|b| if b.is_ascii() && !b.is_ascii_control() { b } else { b'?' })
            .take(CARD_SIZE)
            .collect();
        card[..bytes.len()].copy_from_slice(&bytes);
        Ok(card)
    }
}

#[derive(Debug, Clone)]
pub struct HeaderCard {
    pub keyword: String,
    pub value: Option<String>,
    pub comment: Option<String>,
}

impl HeaderCard {
    pub fn parse(data: &[u8; CARD_SIZE]) -> Result<Self> {
        let card_str = str::from_utf8(data)
            .map_err(|_| FitsError::InvalidFormat("Invalid UTF-8 in header card".to_string()))?;

        let mut card = HeaderCard {
            keyword: card_str[0..8].trim().to_string(),
            value: None,
            comment: None,
        };

        if &card_str[8..VALUE_START] == "= " {
            card.parse_value_and_comment(&card_str[VALUE_START..]);
        } else {
            let comment_part = card_str[8..].trim();
            if !comment_part.is_empty() {
                card.comment = Some(comment_part.to_string());
            }
        }

        Ok(card)
    }

    fn parse_value_and_comment(&mut self, rest: &str) {
        let trimmed = rest.trim_start();
        let (value_part, comment_part) = if trimmed.starts_with('\'') {
            let end = closing_quote(trimmed);
            let (value, after) = trimmed.split_at(end);
            (value, after.trim_start().strip_prefix('/'))
        } else {
            match trimmed.find('/') {
                Some(pos) => (&trimmed[..pos], Some(&trimmed[pos + 1..])),
                None => (trimmed, None),
            }
        };

        let value_part = value_part.trim();
        if !value_part.is_empty() {
            self.value = Some(value_part.to_string());
        }
        if let Some(comment) = comment_part.map(str::trim).filter(|c| !c.is_empty()) {
            self.comment = Some(comment.to_string());
        }
    }

    pub fn to_keyword(&self) -> Keyword {
        Keyword {
            name: self.keyword.clone(),
            value: self.value.as_deref().map(KeywordValue::parse),
            comment: self.comment.clone(),
        }
    }
}

/// Byte index just past the quote closing a FITS string, honouring `''` escapes.
/// An unterminated string runs to the end of the card.
fn closing_quote(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    keywords: Vec<Keyword>,
    keyword_index: HashMap<String, usize>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, keyword: Keyword) {
        let index = self.keywords.len();
        if !keyword.is_commentary() {
            self.keyword_index.entry(keyword.name.clone()).or_insert(index);
        }
        self.keywords.push(keyword);
    }

    /// Replaces the value of an existing keyword in place, or appends it.
    pub fn set_keyword(&mut self, keyword: Keyword) {
        match self.keyword_index.get(&keyword.name) {
            Some(&index) => self.keywords[index] = keyword,
            None => self.add_keyword(keyword),
        }
    }

    pub fn get_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keyword_index
            .get(name)
            .and_then(|&index| self.keywords.get(index))
    }

    pub fn get_keyword_value(&self, name: &str) -> Option<&KeywordValue> {
        self.get_keyword(name)?.value.as_ref()
    }

    pub fn require_integer(&self, name: &str) -> Result<i64> {
        let value = self
            .get_keyword_value(name)
            .ok_or_else(|| FitsError::keyword_not_found(name))?;
        value.as_integer().ok_or_else(|| FitsError::InvalidKeywordValue {
            keyword: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords.iter()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn is_primary(&self) -> bool {
        self.get_keyword_value("SIMPLE")
            .and_then(|v| v.as_logical())
            .unwrap_or(false)
    }

    pub fn is_extension(&self) -> bool {
        self.get_keyword("XTENSION").is_some()
    }

    /// Keeps only the keywords for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Keyword) -> bool) {
        let kept: Vec<Keyword> = self.keywords.drain(..).filter(|k| keep(k)).collect();
        self.keyword_index.clear();
        for keyword in kept {
            self.add_keyword(keyword);
        }
    }

    /// Drops every keyword after the first one named `name` (case-insensitive).
    /// Returns false and leaves the header alone when there is no such keyword.
    pub fn truncate_after(&mut self, name: &str) -> bool {
        match self
            .keywords
            .iter()
            .position(|k| k.name.eq_ignore_ascii_case(name))
        {
            Some(pos) => {
                self.keywords.truncate(pos + 1);
                self.keyword_index.retain(|_, index| *index <= pos);
                true
            }
            None => false,
        }
    }

    /// Parses whole header blocks. Cards after `END` are ignored.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() % HEADER_BLOCK_SIZE != 0 {
            return Err(FitsError::InvalidFormat(
                "Header size must be multiple of 2880 bytes".to_string(),
            ));
        }

        let mut header = Header::new();
        for chunk in data.chunks_exact(CARD_SIZE) {
            let mut card_data = [0u8; CARD_SIZE];
            card_data.copy_from_slice(chunk);
            let card = HeaderCard::parse(&card_data)?;

            if card.keyword == "END" {
                return Ok(header);
            }
            if card.keyword.is_empty() && card.value.is_none() && card.comment.is_none() {
                continue;
            }
            header.add_keyword(card.to_keyword());
        }

        Err(FitsError::InvalidFormat("Missing END keyword".to_string()))
    }

    /// Serialises the header with a trailing `END` card, padded to whole blocks.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity((self.keywords.len() + 1) * CARD_SIZE);
        for keyword in &self.keywords {
            bytes.extend_from_slice(&keyword.to_card()?);
        }
        bytes.extend_from_slice(&Keyword::new("END").to_card()?);

        let padding = (HEADER_BLOCK_SIZE - bytes.len() % HEADER_BLOCK_SIZE) % HEADER_BLOCK_SIZE;
        bytes.resize(bytes.len() + padding, b' ');
        Ok(bytes)
    }
}

impl FromIterator<Keyword> for Header {
    fn from_iter<I: IntoIterator<Item = Keyword>>(iter: I) -> Self {
        let mut header = Header::new();
        for keyword in iter {
            header.add_keyword(keyword);
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> [u8; CARD_SIZE] {
        let mut card = [b' '; CARD_SIZE];
        card[..text.len()].copy_from_slice(text.as_bytes());
        card
    }

    #[test]
    fn test_header_card_parse_keyword() {
        let parsed =
            HeaderCard::parse(&card("SIMPLE  =                    T / Standard FITS format"))
                .unwrap();
        assert_eq!(parsed.keyword, "SIMPLE");
        assert_eq!(parsed.value.as_deref(), Some("T"));
        assert_eq!(parsed.comment.as_deref(), Some("Standard FITS format"));
    }

    #[test]
    fn test_header_card_parse_string_with_slash() {
        let parsed =
            HeaderCard::parse(&card("ORIG_FLE= 'data/img_1.fits'  / source file")).unwrap();
        assert_eq!(parsed.value.as_deref(), Some("'data/img_1.fits'"));
        assert_eq!(parsed.comment.as_deref(), Some("source file"));
        assert_eq!(
            parsed.to_keyword().value,
            Some(KeywordValue::String("data/img_1.fits".to_string()))
        );
    }

    #[test]
    fn test_header_card_parse_escaped_quote() {
        let parsed = HeaderCard::parse(&card("OBSERVER= 'O''Brien'")).unwrap();
        assert_eq!(
            parsed.to_keyword().value,
            Some(KeywordValue::String("O'Brien".to_string()))
        );
    }

    #[test]
    fn test_header_card_parse_comment_only() {
        let parsed = HeaderCard::parse(&card("HISTORY This is a history comment")).unwrap();
        assert_eq!(parsed.keyword, "HISTORY");
        assert!(parsed.value.is_none());
        assert_eq!(parsed.comment.as_deref(), Some("This is a history comment"));
    }

    #[test]
    fn test_header_card_rejects_invalid_utf8() {
        let mut data = [b' '; CARD_SIZE];
        data[0] = 0xFF;
        assert!(matches!(
            HeaderCard::parse(&data),
            Err(FitsError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(KeywordValue::parse("T"), KeywordValue::Logical(true));
        assert_eq!(KeywordValue::parse("  42"), KeywordValue::Integer(42));
        assert_eq!(KeywordValue::parse("-1.5E-3"), KeywordValue::Real(-1.5e-3));
        assert_eq!(KeywordValue::parse("2.5D2"), KeywordValue::Real(250.0));
        assert_eq!(
            KeywordValue::parse("'RA---TAN'"),
            KeywordValue::String("RA---TAN".to_string())
        );
    }

    #[test]
    fn test_card_reals_keep_full_precision() {
        for value in [512.0, -2.7777777777777778e-4, 1e-10, 1.0 / 3.0, 6.02e23] {
            let kw = Keyword::real("CD1_1", value);
            let parsed = HeaderCard::parse(&kw.to_card().unwrap()).unwrap().to_keyword();
            assert_eq!(parsed.value, Some(KeywordValue::Real(value)));
        }
    }

    #[test]
    fn test_card_layout_matches_fixed_format() {
        let card = Keyword::integer("BITPIX", -64)
            .with_comment("Bits per pixel")
            .to_card()
            .unwrap();
        let text = str::from_utf8(&card).unwrap();
        assert_eq!(&text[..10], "BITPIX  = ");
        assert_eq!(&text[10..30], "                 -64");
        assert_eq!(&text[30..33], " / ");
        assert!(text[33..].starts_with("Bits per pixel"));
    }

    #[test]
    fn test_card_rejects_long_names() {
        assert!(Keyword::real("TOOLONGNAME", 1.0).to_card().is_err());
    }

    #[test]
    fn test_long_strings_are_truncated_to_the_card() {
        let kw = Keyword::string("ORIG_FLE", "x".repeat(100));
        let card = kw.to_card().unwrap();
        let parsed = HeaderCard::parse(&card).unwrap().to_keyword();
        assert_eq!(parsed.value.unwrap().as_string().unwrap().len(), MAX_STRING_LEN);
    }

    #[test]
    fn test_header_roundtrip_through_blocks() {
        let header: Header = [
            Keyword::logical("SIMPLE", true),
            Keyword::integer("BITPIX", -64),
            Keyword::integer("NAXIS", 0),
            Keyword::string("OBJECT", "M31 / core"),
            Keyword::history("made by a test"),
        ]
        .into_iter()
        .collect();

        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_BLOCK_SIZE);

        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed.keywords(), header.keywords());
        assert!(parsed.is_primary());
    }

    #[test]
    fn test_header_parse_requires_end() {
        let data = vec![b' '; HEADER_BLOCK_SIZE];
        assert!(matches!(
            Header::parse(&data),
            Err(FitsError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_truncate_after_is_case_insensitive() {
        let mut header: Header = ["A", "DUMMY1", "B", "C"]
            .into_iter()
            .map(|name| Keyword::integer(name, 1))
            .collect();
        assert!(header.truncate_after("Dummy1"));
        let names: Vec<&str> = header.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["A", "DUMMY1"]);
        assert!(header.get_keyword("B").is_none());
        assert!(!header.truncate_after("MISSING"));
    }

    #[test]
    fn test_set_keyword_replaces_in_place() {
        let mut header: Header = [Keyword::integer("A", 1), Keyword::integer("B", 2)]
            .into_iter()
            .collect();
        header.set_keyword(Keyword::integer("A", 10));
        header.set_keyword(Keyword::integer("C", 3));
        assert_eq!(header.keywords()[0], Keyword::integer("A", 10));
        assert_eq!(header.len(), 3);
    }

    #[test]
    fn test_structural_keywords() {
        assert!(Keyword::integer("NAXIS2", 5).is_structural());
        assert!(Keyword::real("BZERO", 32768.0).is_structural());
        assert!(!Keyword::integer("NAXISX", 5).is_structural());
        assert!(!Keyword::string("OBJECT", "M1").is_structural());
    }
}
