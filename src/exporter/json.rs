use crate::error::Result;
use crate::exporter::{ExportFormat, Exporter};
use crate::extractor::RecordSet;
use std::io::Write;

pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write_to(&self, records: &RecordSet, writer: &mut dyn Write) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, records.records())?;
        } else {
            serde_json::to_writer(&mut *writer, records.records())?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
