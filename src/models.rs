//! Data models for field codes, the output schema and parsed article records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FieldCode`]: A validated 2–3 letter tag such as `HD` or `PUB`
//! - [`FieldSet`]: The ordered list of codes kept in the output (the fixed column schema)
//! - [`ArticleRecord`]: One parsed article, one optional value per column
//! - [`Batch`]: Every record of a run, in loader emission order
//!
//! The schema is decided once, when the configuration is resolved. Records
//! never carry their own keys, so every row has exactly the same columns.

use crate::error::{Error, Result};
use itertools::Itertools;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Field codes known to appear in archive exports, with a short description.
pub const KNOWN_FIELDS: &[(&str, &str)] = &[
    ("SE", "Section"),
    ("HD", "Headline"),
    ("BY", "Byline"),
    ("CR", "Credit"),
    ("WC", "Word count"),
    ("PD", "Publication date"),
    ("ET", "Publication time"),
    ("SN", "Source name"),
    ("SC", "Source code"),
    ("ED", "Edition"),
    ("PG", "Page"),
    ("LA", "Language"),
    ("CY", "Copyright"),
    ("LP", "Lead paragraph"),
    ("TD", "Trailing text"),
    ("CT", "Contact"),
    ("RF", "Reference"),
    ("CO", "Company codes"),
    ("IN", "Industry codes"),
    ("NS", "Subject codes"),
    ("RE", "Region codes"),
    ("IPC", "Information provider codes"),
    ("IPD", "Information provider descriptors"),
    ("PUB", "Publisher name"),
    ("AN", "Accession number"),
];

/// Columns written when neither the config file nor the CLI names any.
pub const DEFAULT_FIELDS: &[&str] = &[
    "SE", "HD", "BY", "WC", "PD", "SN", "SC", "LA", "CY", "LP", "TD", "CO", "NS", "RE", "IPD",
    "PUB", "AN",
];

/// A 2–3 uppercase ASCII letter tag identifying a metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldCode(String);

impl FieldCode {
    /// Validate `code` after trimming surrounding whitespace.
    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim();
        let well_formed =
            (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase());
        if well_formed {
            Ok(Self(code.to_string()))
        } else {
            Err(Error::Config(format!(
                "invalid field code {code:?}: expected 2 or 3 uppercase letters"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable description when the code is in [`KNOWN_FIELDS`].
    pub fn description(&self) -> Option<&'static str> {
        KNOWN_FIELDS
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, desc)| *desc)
    }

    pub fn is_known(&self) -> bool {
        self.description().is_some()
    }
}

impl TryFrom<String> for FieldCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FieldCode> for String {
    fn from(code: FieldCode) -> Self {
        code.0
    }
}

impl fmt::Display for FieldCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The ordered set of field codes retained in output.
///
/// Column order is the configured order, never discovery order. Duplicates
/// collapse to their first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    codes: Vec<FieldCode>,
    positions: HashMap<String, usize>,
}

impl FieldSet {
    pub fn new(codes: Vec<FieldCode>) -> Result<Self> {
        if codes.is_empty() {
            return Err(Error::Config("field list is empty".to_string()));
        }

        let total = codes.len();
        let codes: Vec<FieldCode> = codes.into_iter().unique().collect();
        if codes.len() != total {
            warn!(
                dropped = total - codes.len(),
                "Duplicate field codes in configuration; keeping first occurrence"
            );
        }

        for code in codes.iter().filter(|c| !c.is_known()) {
            warn!(%code, "Configured field code is not in the known catalogue");
        }

        Ok(Self::indexed(codes))
    }

    fn indexed(codes: Vec<FieldCode>) -> Self {
        let positions = codes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str().to_string(), i))
            .collect();
        Self { codes, positions }
    }

    /// Build a set from raw strings, validating each one.
    pub fn from_strs<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        let parsed = codes
            .iter()
            .map(|c| FieldCode::parse(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(parsed)
    }

    pub fn codes(&self) -> &[FieldCode] {
        &self.codes
    }

    /// Column index of `code`, or `None` when the code is not retained.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.positions.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(FieldCode::as_str)
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::indexed(
            DEFAULT_FIELDS
                .iter()
                .map(|c| FieldCode(c.to_string()))
                .collect(),
        )
    }
}

/// One parsed article: a value slot per column of the [`FieldSet`] it was
/// parsed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    values: Vec<Option<String>>,
}

impl ArticleRecord {
    pub(crate) fn from_values(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Value of `code`, looked up through the schema the record was built with.
    pub fn get(&self, fields: &FieldSet, code: &str) -> Option<&str> {
        fields
            .position(code)
            .and_then(|i| self.values.get(i))
            .and_then(|v| v.as_deref())
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// `true` when no column has a value.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Row cells in column order, absent fields rendered as empty strings.
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.as_deref().unwrap_or(""))
    }
}

/// Every record of one run, with the schema they share.
#[derive(Debug, Clone)]
pub struct Batch {
    fields: FieldSet,
    records: Vec<ArticleRecord>,
}

impl Batch {
    pub fn new(fields: FieldSet) -> Self {
        Self {
            fields,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ArticleRecord) {
        debug_assert_eq!(record.values.len(), self.fields.len());
        self.records.push(record);
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records holding a value, per column.
    pub fn fill_counts(&self) -> Vec<(&FieldCode, usize)> {
        self.fields
            .codes()
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let filled = self
                    .records
                    .iter()
                    .filter(|r| r.values().get(i).is_some_and(Option::is_some))
                    .count();
                (code, filled)
            })
            .collect()
    }
}

/// Serializes as an array of objects keyed by field code, in column order.
impl Serialize for Batch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(&RowView {
                fields: &self.fields,
                record,
            })?;
        }
        seq.end()
    }
}

struct RowView<'a> {
    fields: &'a FieldSet,
    record: &'a ArticleRecord,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (code, value) in self.fields.codes().iter().zip(&self.record.values) {
            map.serialize_entry(code.as_str(), value)?;
        }
        map.end()
    }
}
