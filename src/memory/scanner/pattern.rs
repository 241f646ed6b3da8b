//! Masked byte patterns parsed from text templates

use crate::core::types::{MemoryError, MemoryResult};
use std::fmt;

/// A byte sequence where each position is either a literal or a don't-care
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    bytes: Vec<u8>,
    mask: Vec<bool>,
}

/// Result of parsing a template: the pattern and the index of the first `??` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub pattern: BytePattern,
    pub capture: Option<usize>,
}

impl BytePattern {
    /// Parses a space separated template such as `"48 8B ?? xx 05"`.
    ///
    /// `xx` is a don't-care byte, `??` is a don't-care byte marking a capture
    /// point, and one or two hex digits are a literal byte.
    pub fn parse(template: &str) -> MemoryResult<Self> {
        Self::parse_template(template).map(|parsed| parsed.pattern)
    }

    /// Like [`parse`](Self::parse), also reporting where the first `??` token sits
    pub fn parse_template(template: &str) -> MemoryResult<ParsedTemplate> {
        if template.is_empty() {
            return Err(MemoryError::malformed_pattern("", "pattern is empty"));
        }

        let tokens: Vec<&str> = template.split(' ').collect();
        let mut bytes = Vec::with_capacity(tokens.len());
        let mut mask = Vec::with_capacity(tokens.len());
        let mut capture = None;

        for (index, token) in tokens.iter().enumerate() {
            if token.len() > 2 {
                return Err(MemoryError::malformed_pattern(
                    *token,
                    "tokens are at most two characters",
                ));
            }

            if token.contains('x') {
                bytes.push(0);
                mask.push(false);
            } else if token.contains('?') {
                bytes.push(0);
                mask.push(false);
                capture.get_or_insert(index);
            } else {
                bytes.push(parse_hex_byte(token)?);
                mask.push(true);
            }
        }

        Ok(ParsedTemplate {
            pattern: BytePattern { bytes, mask },
            capture,
        })
    }

    /// Pattern matching `bytes` literally
    pub fn exact(bytes: &[u8]) -> MemoryResult<Self> {
        if bytes.is_empty() {
            return Err(MemoryError::malformed_pattern("", "pattern is empty"));
        }
        Ok(BytePattern {
            bytes: bytes.to_vec(),
            mask: vec![true; bytes.len()],
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; parsing rejects empty patterns
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Compares the start of `data` at significant positions only
    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() >= self.bytes.len()
            && self
                .bytes
                .iter()
                .zip(&self.mask)
                .zip(data)
                .all(|((expected, significant), actual)| !significant || expected == actual)
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .bytes
            .iter()
            .zip(&self.mask)
            .map(|(byte, significant)| {
                if *significant {
                    hex::encode_upper([*byte])
                } else {
                    "??".to_string()
                }
            })
            .collect();
        f.write_str(&tokens.join(" "))
    }
}

fn parse_hex_byte(token: &str) -> MemoryResult<u8> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MemoryError::malformed_pattern(token, "not a hex byte"));
    }
    u8::from_str_radix(token, 16).map_err(|e| MemoryError::malformed_pattern(token, e.to_string()))
}
