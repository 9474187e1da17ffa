use crate::extractor::field_map::FieldMap;
use crate::extractor::record::{Record, RecordSet};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, trace};

/// Lines that carry expense data start with this token. Header, summary and
/// footer lines do not.
pub const DETAIL_MARKER: &str = "DETAIL";

const FIELD_DELIMITER: char = '|';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// A DETAIL line turned into a record.
    Extracted(Record),
    /// Not a DETAIL line.
    Ignored,
    /// A DETAIL line that could not be processed. The batch carries on.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidUtf8 { valid_up_to: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidUtf8 { valid_up_to } => {
                write!(f, "invalid UTF-8 after byte {}", valid_up_to)
            }
        }
    }
}

/// Turns Concur report text into a [`RecordSet`].
///
/// Extraction is pure: the same input always yields the same set, and nothing
/// about a line's shape can make it fail. Columns missing from a short line
/// come back as empty strings.
#[derive(Debug, Clone, Copy)]
pub struct RecordExtractor {
    field_map: FieldMap,
    lossy_utf8: bool,
}

impl RecordExtractor {
    pub fn new(field_map: FieldMap) -> Self {
        Self {
            field_map,
            lossy_utf8: true,
        }
    }

    /// With `false`, a DETAIL line that is not valid UTF-8 is skipped instead
    /// of being decoded with replacement characters.
    pub fn with_lossy_utf8(mut self, lossy: bool) -> Self {
        self.lossy_utf8 = lossy;
        self
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub fn extract(&self, text: &str) -> RecordSet {
        let mut set = RecordSet::new(self.field_map.field_names());
        let mut lines = 0;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

        for (index, line) in text.split('\n').enumerate() {
            lines += 1;
            self.collect(&mut set, index + 1, self.classify_line(line));
        }

        set.set_lines_scanned(lines);
        debug!(
            records = set.len(),
            lines_scanned = lines,
            "extracted DETAIL records"
        );
        set
    }

    /// Like [`extract`](Self::extract), but decodes each line on its own so a
    /// single badly encoded line cannot spoil the whole document.
    pub fn extract_bytes(&self, bytes: &[u8]) -> RecordSet {
        let mut set = RecordSet::new(self.field_map.field_names());
        let mut lines = 0;
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        for (index, line) in bytes.split(|b| *b == b'\n').enumerate() {
            lines += 1;
            self.collect(&mut set, index + 1, self.classify_bytes(line));
        }

        set.set_lines_scanned(lines);
        debug!(
            records = set.len(),
            skipped = set.skipped().len(),
            lines_scanned = lines,
            "extracted DETAIL records"
        );
        set
    }

    pub fn classify_line(&self, line: &str) -> LineOutcome {
        if !line.starts_with(DETAIL_MARKER) {
            return LineOutcome::Ignored;
        }
        LineOutcome::Extracted(self.extract_record(line))
    }

    pub fn classify_bytes(&self, line: &[u8]) -> LineOutcome {
        if !line.starts_with(DETAIL_MARKER.as_bytes()) {
            return LineOutcome::Ignored;
        }

        let decoded = if self.lossy_utf8 {
            String::from_utf8_lossy(line)
        } else {
            match std::str::from_utf8(line) {
                Ok(text) => Cow::Borrowed(text),
                Err(e) => {
                    return LineOutcome::Skipped(SkipReason::InvalidUtf8 {
                        valid_up_to: e.valid_up_to(),
                    })
                }
            }
        };

        LineOutcome::Extracted(self.extract_record(&decoded))
    }

    fn extract_record(&self, line: &str) -> Record {
        let parts: Vec<&str> = line.trim().split(FIELD_DELIMITER).collect();
        let mut record = Record::with_capacity(self.field_map.len());

        for field in self.field_map.iter() {
            record.push(field.name, field.source.resolve(&parts));
        }

        if parts.len() < self.field_map.required_columns() {
            trace!(
                columns = parts.len(),
                required = self.field_map.required_columns(),
                "short DETAIL line, missing fields left empty"
            );
        }

        record
    }

    fn collect(&self, set: &mut RecordSet, line_number: usize, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Extracted(record) => set.push(record),
            LineOutcome::Ignored => {}
            LineOutcome::Skipped(reason) => {
                debug!(line = line_number, %reason, "skipping DETAIL line");
                set.record_skip(line_number, reason.to_string());
            }
        }
    }
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(FieldMap::concur())
    }
}

/// Extract every DETAIL record from `text` using `field_map`.
pub fn extract(text: &str, field_map: &FieldMap) -> RecordSet {
    RecordExtractor::new(*field_map).extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a DETAIL line with `columns` fields, filling the given positions.
    fn detail_line(columns: usize, values: &[(usize, &str)]) -> String {
        let mut parts: Vec<String> = (0..columns).map(|i| format!("c{}", i)).collect();
        parts[0] = DETAIL_MARKER.to_string();
        for (index, value) in values {
            parts[*index] = value.to_string();
        }
        parts.join("|")
    }

    fn full_line() -> String {
        detail_line(
            260,
            &[
                (2, "2024-01-05"),
                (5, "Smith"),
                (6, "Jane"),
                (9, "Finance"),
                (65, "3"),
                (68, "Client dinner"),
                (79, "P-00042"),
                (248, "0125.50"),
            ],
        )
    }

    #[test]
    fn test_no_detail_lines_yields_empty_set() {
        let text = "HEADER|a|b\nSUMMARY|1|2\nFOOTER\n";
        let set = extract(text, &FieldMap::concur());
        assert!(set.is_empty());
        assert_eq!(set.lines_scanned(), 4);
    }

    #[test]
    fn test_empty_input() {
        let set = extract("", &FieldMap::concur());
        assert!(set.is_empty());
        assert!(set.skipped().is_empty());
    }

    #[test]
    fn test_full_line_populates_every_field() {
        let set = extract(&full_line(), &FieldMap::concur());
        assert_eq!(set.len(), 1);

        let record = &set.records()[0];
        assert_eq!(record.get("Date"), Some("2024-01-05"));
        assert_eq!(record.get("PartnerId"), Some("P-00042"));
        assert_eq!(record.get("Quantity"), Some("3"));
        assert_eq!(record.get("UserName"), Some("Smith Jane"));
        assert_eq!(record.get("Department"), Some("Finance"));
        assert_eq!(record.get("Purpose"), Some("Client dinner"));
        assert_eq!(record.get("Value"), Some("0125.50"));
    }

    #[test]
    fn test_short_line_is_degraded_not_dropped() {
        let line = detail_line(10, &[(2, "2024-01-05"), (5, "Smith"), (6, "Jane"), (9, "Finance")]);
        let set = extract(&line, &FieldMap::concur());
        assert_eq!(set.len(), 1);

        let record = &set.records()[0];
        assert_eq!(record.get("Date"), Some("2024-01-05"));
        assert_eq!(record.get("UserName"), Some("Smith Jane"));
        assert_eq!(record.get("Department"), Some("Finance"));
        assert_eq!(record.get("PartnerId"), Some(""));
        assert_eq!(record.get("Quantity"), Some(""));
        assert_eq!(record.get("Purpose"), Some(""));
        assert_eq!(record.get("Value"), Some(""));
    }

    #[test]
    fn test_bare_marker_line_still_produces_record() {
        let set = extract("DETAIL", &FieldMap::concur());
        assert_eq!(set.len(), 1);
        assert!(set.records()[0].is_blank());
        assert_eq!(set.blank_records(), 1);
    }

    #[test]
    fn test_user_name_on_short_lines() {
        // last name present, first name column missing
        let line = "DETAIL|x|2024-01-05|a|b|Smith";
        let set = extract(line, &FieldMap::concur());
        assert_eq!(set.records()[0].get("UserName"), Some("Smith"));

        let line = "DETAIL|x|2024-01-05";
        let set = extract(line, &FieldMap::concur());
        assert_eq!(set.records()[0].get("UserName"), Some(""));
    }

    #[test]
    fn test_order_is_preserved() {
        let text = [
            detail_line(10, &[(2, "first")]),
            "SUMMARY|ignored".to_string(),
            detail_line(10, &[(2, "second")]),
            detail_line(10, &[(2, "third")]),
        ]
        .join("\n");

        let set = extract(&text, &FieldMap::concur());
        let dates: Vec<_> = set.iter().map(|r| r.get("Date").unwrap()).collect();
        assert_eq!(dates, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_marker_must_start_the_line() {
        let text = format!(" {}\nXDETAIL|a|b\nDETAILS|a|2024", full_line());
        let set = extract(&text, &FieldMap::concur());
        // only the last line starts with the marker; the prefix test is literal
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].get("Date"), Some("2024"));
    }

    #[test]
    fn test_carriage_returns_are_trimmed() {
        let text = "DETAIL|x|2024-01-05|a|b|Smith|Jane\r\nSUMMARY\r\n";
        let set = extract(text, &FieldMap::concur());
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].get("UserName"), Some("Smith Jane"));
    }

    #[test]
    fn test_values_are_not_converted() {
        let line = detail_line(260, &[(65, "007"), (248, "1.50E+03")]);
        let set = extract(&line, &FieldMap::concur());
        assert_eq!(set.records()[0].get("Quantity"), Some("007"));
        assert_eq!(set.records()[0].get("Value"), Some("1.50E+03"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = format!("{}\n{}\nSUMMARY", full_line(), detail_line(12, &[(2, "x")]));
        let first = extract(&text, &FieldMap::concur());
        let second = extract(&text, &FieldMap::concur());
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_example() {
        let line = detail_line(
            80,
            &[(1, "x"), (2, "2024-01-05"), (5, "Smith"), (6, "Jane"), (9, "Finance")],
        );
        let text = format!("SUMMARY|2024|totals\n{}", line);
        let set = extract(&text, &FieldMap::concur());

        assert_eq!(set.len(), 1);
        let record = &set.records()[0];
        assert_eq!(record.get("Date"), Some("2024-01-05"));
        assert_eq!(record.get("UserName"), Some("Smith Jane"));
        assert_eq!(record.get("Department"), Some("Finance"));
        assert_eq!(record.get("PartnerId"), Some("c79"));
        assert_eq!(record.get("Value"), Some(""));
    }

    #[test]
    fn test_classify_line() {
        let extractor = RecordExtractor::default();
        assert_eq!(extractor.classify_line("SUMMARY|1"), LineOutcome::Ignored);
        assert_eq!(extractor.classify_line(""), LineOutcome::Ignored);
        assert!(matches!(
            extractor.classify_line("DETAIL|a"),
            LineOutcome::Extracted(_)
        ));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut bytes = b"DETAIL|x|2024-01-05\n".to_vec();
        bytes.extend_from_slice(b"DETAIL|x|bad\xff\n");
        bytes.extend_from_slice(b"DETAIL|x|2024-01-07\n");

        let set = RecordExtractor::default()
            .with_lossy_utf8(false)
            .extract_bytes(&bytes);
        assert_eq!(set.len(), 2);
        assert_eq!(set.skipped().len(), 1);
        assert_eq!(set.skipped()[0].line_number, 2);
        assert!(set.skipped()[0].reason.contains("invalid UTF-8"));
        assert_eq!(set.records()[1].get("Date"), Some("2024-01-07"));
    }

    #[test]
    fn test_invalid_utf8_outside_detail_lines_is_ignored() {
        let bytes = b"HEADER\xfe\xff\nDETAIL|x|2024-01-05".to_vec();
        let set = RecordExtractor::default().extract_bytes(&bytes);
        assert_eq!(set.len(), 1);
        assert!(set.skipped().is_empty());
    }

    #[test]
    fn test_lossy_decoding_keeps_the_line() {
        let bytes = b"DETAIL|x|bad\xff".to_vec();
        let set = RecordExtractor::default().extract_bytes(&bytes);
        assert_eq!(set.len(), 1);
        assert!(set.skipped().is_empty());
        assert_eq!(set.records()[0].get("Date"), Some("bad\u{FFFD}"));
    }

    #[test]
    fn test_cp1252_names_are_kept_by_default() {
        let bytes = b"DETAIL|x|2024-01-05|a|b|M\xFCller|Jane\nDETAIL|x|2024-01-06|a|b|Smith|Ann";
        let set = RecordExtractor::default().extract_bytes(bytes);
        assert_eq!(set.len(), 2);
        assert!(set.skipped().is_empty());
        assert_eq!(set.records()[0].get("UserName"), Some("M\u{FFFD}ller Jane"));
        assert_eq!(set.records()[1].get("UserName"), Some("Smith Ann"));
    }

    #[test]
    fn test_leading_byte_order_mark_is_stripped() {
        let bytes = b"\xEF\xBB\xBFDETAIL|x|2024-01-05\nDETAIL|x|2024-01-06";
        let set = RecordExtractor::default().extract_bytes(bytes);
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].get("Date"), Some("2024-01-05"));

        let text = "\u{FEFF}DETAIL|x|2024-01-05\nDETAIL|x|2024-01-06";
        let set = extract(text, &FieldMap::concur());
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].get("Date"), Some("2024-01-05"));
    }

    #[test]
    fn test_byte_order_mark_only_stripped_at_start() {
        let bytes = b"DETAIL|x|2024-01-05\n\xEF\xBB\xBFDETAIL|x|2024-01-06";
        let set = RecordExtractor::default().extract_bytes(bytes);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_bytes_and_text_agree_on_valid_input() {
        let text = format!("HEADER\n{}\nSUMMARY\n{}", full_line(), detail_line(7, &[(6, "Jane")]));
        let extractor = RecordExtractor::default();
        assert_eq!(extractor.extract(&text), extractor.extract_bytes(text.as_bytes()));
    }
}
