//! Field-tag parser for a single article block.
//!
//! Archive exports lay an article out as a flat run of text where each field
//! starts with a 2–3 letter tag alone on its line:
//!
//! ```text
//! HD Storm hits coast
//!
//! WC
//! 512 words
//!
//! LA
//! English
//! ```
//!
//! The block is split on the tag-boundary pattern `\s[A-Z]{2,3}\n`, keeping
//! the matched tag lines in the sequence, and the sequence is walked once
//! with a current key and a current value. `HD` and `SE` get an inline-prefix
//! match first because they often open a block without a preceding newline.
//!
//! # Tolerance
//!
//! Parsing never fails. After every segment the current key/value pair is
//! written when the key is retained, so:
//! - text before the first tag is dropped
//! - a tag on the block's last line is not a tag line and joins the previous value
//! - two tag lines with no blank line between them hand the second tag's line
//!   to the first tag as its value
//! - a repeated tag keeps its last value

use crate::models::{ArticleRecord, FieldSet};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

static TAG_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s[A-Z]{2,3}\n").unwrap());
static TAG_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s[A-Z]{2,3}\n\z").unwrap());
static HEADLINE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\AHD\s").unwrap());
static SECTION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\ASE\s").unwrap());

/// How one piece of a split block is read.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    /// `HD`/`SE` followed by its value in the same segment.
    Inline { code: &'static str, value: &'a str },
    /// A bare tag line; the value arrives in the next segment.
    Tag(&'a str),
    /// Free text between tags.
    Text(&'a str),
}

impl<'a> Segment<'a> {
    fn classify(segment: &'a str) -> Self {
        for (prefix, code) in [(&*HEADLINE_PREFIX, "HD"), (&*SECTION_PREFIX, "SE")] {
            if let Some(m) = prefix.find(segment) {
                return Segment::Inline {
                    code,
                    value: segment[m.end()..].trim(),
                };
            }
        }
        if TAG_LINE.is_match(segment) {
            Segment::Tag(segment.trim())
        } else {
            Segment::Text(segment.trim())
        }
    }
}

/// Split `text` on every tag-boundary match, keeping the matches.
///
/// Text and tag pieces alternate, starting and ending with text; text pieces
/// may be empty.
fn split_keeping_tags(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in TAG_BOUNDARY.find_iter(text) {
        parts.push(&text[last..m.start()]);
        parts.push(m.as_str());
        last = m.end();
    }
    parts.push(&text[last..]);
    parts
}

/// Turns raw article blocks into [`ArticleRecord`]s for one [`FieldSet`].
///
/// Holds no state between calls; parsing the same block twice yields the
/// same record.
#[derive(Debug, Clone)]
pub struct TagParser {
    fields: FieldSet,
}

impl TagParser {
    pub fn new(fields: FieldSet) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Parse one article block.
    ///
    /// Returns `None` when the block is blank after trimming. A non-blank
    /// block always yields a record, possibly with no values.
    #[instrument(level = "trace", skip_all)]
    pub fn parse(&self, block: &str) -> Option<ArticleRecord> {
        let block = block.trim();
        if block.is_empty() {
            return None;
        }

        let mut values: Vec<Option<String>> = vec![None; self.fields.len()];
        let mut key: Option<&str> = None;
        let mut value: &str = "";

        for segment in split_keeping_tags(block) {
            match Segment::classify(segment) {
                Segment::Inline { code, value: v } => {
                    key = Some(code);
                    value = v;
                }
                Segment::Tag(tag) => key = Some(tag),
                Segment::Text(text) => value = text,
            }

            if let Some(i) = key.and_then(|k| self.fields.position(k)) {
                values[i] = Some(value.to_string());
            }
        }

        let record = ArticleRecord::from_values(values);
        if record.is_empty() {
            debug!(
                preview = %truncate_for_log(block, 80),
                "Article block produced no retained fields"
            );
        }
        Some(record)
    }
}
