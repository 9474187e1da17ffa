pub mod field_map;
pub mod record;
pub mod record_extractor;

pub use field_map::{FieldMap, FieldSource, FieldSpec, CONCUR_FIELD_MAP};
pub use record::{Record, RecordSet, SkippedLine};
pub use record_extractor::{extract, LineOutcome, RecordExtractor, SkipReason, DETAIL_MARKER};
