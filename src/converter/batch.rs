use crate::converter::document::{DocumentConverter, DocumentResult};
use crate::error::{ConvertError, Result};
use crate::scanner::ReportFile;
use crate::ui::GracefulShutdown;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub type ProgressCallback<'a> = &'a (dyn Fn(&ConversionProgress) + Sync);

#[derive(Debug, Clone)]
pub struct ConversionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub rows_written: usize,
    pub bytes_processed: u64,
    pub total_bytes: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub errors: Vec<String>,
}

impl ConversionProgress {
    pub fn new(total_files: usize, total_bytes: u64) -> Self {
        Self {
            files_processed: 0,
            total_files,
            rows_written: 0,
            bytes_processed: 0,
            total_bytes,
            current_file: None,
            start_time: Instant::now(),
            errors: Vec::new(),
        }
    }

    pub fn update_file(&mut self, filename: String, bytes: u64, rows: usize) {
        self.files_processed += 1;
        self.bytes_processed += bytes;
        self.rows_written += rows;
        self.current_file = Some(filename);
    }

    pub fn add_error<S: Into<String>>(&mut self, filename: String, error: S) {
        self.files_processed += 1;
        self.current_file = Some(filename);
        self.errors.push(error.into());
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.elapsed();
        let rate = self.files_processed as f64 / elapsed.as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// Everything a batch produced: converted documents in input order, and the
/// failures with the error each one hit.
pub struct BatchOutcome {
    pub documents: Vec<DocumentResult>,
    pub failures: Vec<(ReportFile, ConvertError)>,
    pub progress: ConversionProgress,
}

pub struct BatchConverter {
    converter: DocumentConverter,
    jobs: usize,
}

impl BatchConverter {
    pub fn new(converter: DocumentConverter) -> Self {
        Self { converter, jobs: 1 }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn converter(&self) -> &DocumentConverter {
        &self.converter
    }

    /// Convert every report. One document failing never stops the others;
    /// a shutdown request stops the batch between documents.
    pub fn convert_all(
        &self,
        reports: &[ReportFile],
        shutdown: &GracefulShutdown,
        progress_callback: Option<ProgressCallback<'_>>,
    ) -> Result<BatchOutcome> {
        let total_bytes = reports.iter().map(|r| r.size).sum();
        let progress = Mutex::new(ConversionProgress::new(reports.len(), total_bytes));

        let results = self.run(reports, |report| {
            if !shutdown.is_running() {
                return None;
            }
            let result = self.converter.convert_file(report);
            self.record(&progress, report, &result, progress_callback);
            Some(result)
        });

        shutdown.check_shutdown()?;

        let progress = progress
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for (report, result) in reports.iter().zip(results) {
            match result {
                Some(Ok(document)) => documents.push(document),
                Some(Err(e)) => failures.push((report.clone(), e)),
                None => return Err(ConvertError::Cancelled),
            }
        }

        Ok(BatchOutcome {
            documents,
            failures,
            progress,
        })
    }

    #[cfg(feature = "parallel")]
    fn run<F>(&self, reports: &[ReportFile], convert: F) -> Vec<Option<Result<DocumentResult>>>
    where
        F: Fn(&ReportFile) -> Option<Result<DocumentResult>> + Sync,
    {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build();

        match pool {
            Ok(pool) => pool.install(|| reports.par_iter().map(&convert).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable, converting sequentially");
                reports.iter().map(convert).collect()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run<F>(&self, reports: &[ReportFile], convert: F) -> Vec<Option<Result<DocumentResult>>>
    where
        F: Fn(&ReportFile) -> Option<Result<DocumentResult>> + Sync,
    {
        if self.jobs > 1 {
            tracing::debug!(jobs = self.jobs, "built without the parallel feature");
        }
        reports.iter().map(convert).collect()
    }

    fn record(
        &self,
        progress: &Mutex<ConversionProgress>,
        report: &ReportFile,
        result: &Result<DocumentResult>,
        progress_callback: Option<ProgressCallback<'_>>,
    ) {
        let mut progress = match progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match result {
            Ok(document) => {
                progress.update_file(report.display_path(), document.bytes_read, document.rows_processed)
            }
            Err(e) => {
                let message = format!("Failed to convert {}: {}", report.display_path(), e);
                progress.add_error(report.display_path(), message);
            }
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }
    }
}
