use crate::error::{ConvertError, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// One extracted row. Values are kept in field-map declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(&'static str, String)>,
}

impl Record {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: String) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field resolved to an empty string.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_empty())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// All records extracted from one document, with the line counters gathered on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSet {
    field_names: Vec<&'static str>,
    records: Vec<Record>,
    lines_scanned: usize,
    skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line_number: usize,
    pub reason: String,
}

impl RecordSet {
    pub(crate) fn new(field_names: Vec<&'static str>) -> Self {
        Self {
            field_names,
            records: Vec::new(),
            lines_scanned: 0,
            skipped: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn record_skip(&mut self, line_number: usize, reason: String) {
        self.skipped.push(SkippedLine {
            line_number,
            reason,
        });
    }

    pub(crate) fn set_lines_scanned(&mut self, lines: usize) {
        self.lines_scanned = lines;
    }

    pub fn field_names(&self) -> &[&'static str] {
        &self.field_names
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lines_scanned(&self) -> usize {
        self.lines_scanned
    }

    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    /// Records where no field could be populated.
    pub fn blank_records(&self) -> usize {
        self.records.iter().filter(|r| r.is_blank()).count()
    }

    /// Hand the set on only if it holds at least one record.
    pub fn require_records(self, source: &str) -> Result<Self> {
        if self.records.is_empty() {
            return Err(ConvertError::NoValidData {
                source_name: source.to_string(),
                lines_scanned: self.lines_scanned,
            });
        }
        Ok(self)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
