pub mod batch;
pub mod document;
pub mod report;

pub use batch::{BatchConverter, BatchOutcome, ConversionProgress};
pub use document::{DocumentConverter, DocumentResult};
pub use report::{ConversionReport, FailedDocument, REPORT_FILE_NAME};
