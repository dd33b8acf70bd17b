//! CSV result sink

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::SecondsFormat;
use parking_lot::Mutex;
use reco_bench_core::{AttemptOutcome, OutcomeSink, SinkError};

/// Column names, in order
pub const CSV_HEADER: [&str; 16] = [
    "request_id",
    "timestamp",
    "address",
    "timeSlot",
    "scene",
    "mood",
    "restrictions",
    "languageTag",
    "status",
    "elapsed_ms",
    "count",
    "first_category",
    "first_topicTitle",
    "first_categoryId",
    "first_imageUrl",
    "error",
];

/// Longest error message written to a row
pub const MAX_ERROR_CHARS: usize = 200;

/// Writes outcomes to a CSV file, one flushed row per outcome
pub struct CsvResultSink {
    path: PathBuf,
    writer: Mutex<Option<csv::Writer<File>>>,
    rows: AtomicU64,
}

impl CsvResultSink {
    /// Create (or truncate) the file at `path` and write the header
    ///
    /// Missing parent directories are created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(CSV_HEADER).map_err(csv_error)?;
        writer.flush()?;

        tracing::debug!(path = %path.display(), "Opened CSV result sink");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Some(writer)),
            rows: AtomicU64::new(0),
        })
    }

    /// File being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far, header excluded
    pub fn rows_written(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    /// Whether [`OutcomeSink::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }
}

impl OutcomeSink for CsvResultSink {
    fn write_outcome(&self, outcome: &AttemptOutcome) -> Result<(), SinkError> {
        let record = outcome_record(outcome);

        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;
        writer.write_record(&record).map_err(csv_error)?;
        writer.flush()?;
        drop(guard);

        self.rows.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.lock().take() else {
            return Ok(());
        };
        writer.flush()?;

        tracing::debug!(
            path = %self.path.display(),
            rows = self.rows_written(),
            "Closed CSV result sink"
        );
        Ok(())
    }
}

impl std::fmt::Debug for CsvResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvResultSink")
            .field("path", &self.path)
            .field("rows", &self.rows_written())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn outcome_record(outcome: &AttemptOutcome) -> [String; 16] {
    let params = &outcome.params;
    let (category, topic_title, category_id, image_url) = match &outcome.first_item {
        Some(item) => (
            item.category.clone(),
            item.topic_title.clone(),
            item.category_id.clone(),
            item.image_url.clone(),
        ),
        None => Default::default(),
    };

    [
        outcome.request_id.to_string(),
        outcome
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        params.address.clone(),
        params.time_slot.clone().unwrap_or_default(),
        params.scene.clone().unwrap_or_default(),
        params.mood.clone().unwrap_or_default(),
        params.restrictions_json(),
        params.language_tag.clone(),
        outcome.status.to_string(),
        outcome.elapsed_ms.to_string(),
        outcome.item_count.unwrap_or(0).to_string(),
        category,
        topic_title,
        category_id,
        image_url,
        sanitize_error(outcome.error.as_deref().unwrap_or_default()),
    ]
}

/// Collapse line breaks to single spaces, trim, and cap at
/// [`MAX_ERROR_CHARS`] characters
pub fn sanitize_error(message: &str) -> String {
    let collapsed = message
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match collapsed.char_indices().nth(MAX_ERROR_CHARS) {
        Some((idx, _)) => collapsed[..idx].to_string(),
        None => collapsed,
    }
}

fn csv_error(error: csv::Error) -> SinkError {
    SinkError::Csv(error.to_string())
}
