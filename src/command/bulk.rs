//! Bulk-load commands: CSV ingestion and job status lookups.
//!
//! `csv_data_load` carries a different field set from the other families
//! (`action` and an embedded CSV blob), so it has its own type. The server
//! answers with a status message and runs the load as an asynchronous job.

use serde::Serialize;
use tracing::debug;

use crate::error::{HarperError, Result};
use crate::response::{BulkLoadResult, JobStatus};
use crate::session::Session;

/// How loaded rows are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Insert,
    Update,
    Upsert,
}

impl std::str::FromStr for BulkAction {
    type Err = HarperError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "upsert" => Ok(Self::Upsert),
            other => Err(HarperError::invalid_input(format!(
                "Unknown bulk action '{other}'. Expected insert, update or upsert"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum BulkOperation {
    CsvDataLoad,
}

/// Request body for `csv_data_load`
#[derive(Debug, Clone, Serialize)]
pub struct BulkLoadCommand {
    operation: BulkOperation,

    pub action: BulkAction,

    /// Filled from the session when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub table: String,

    /// CSV text, one line per row
    pub data: String,
}

impl BulkLoadCommand {
    /// Create a command from CSV text that is already encoded
    pub fn new(table: impl Into<String>, action: BulkAction, data: impl Into<String>) -> Self {
        Self {
            operation: BulkOperation::CsvDataLoad,
            action,
            schema: None,
            table: table.into(),
            data: data.into(),
        }
    }

    /// Create a command by encoding rows of values as CSV
    pub fn from_rows<I, R, F>(table: impl Into<String>, action: BulkAction, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        Ok(Self::new(table, action, encode_csv(rows)?))
    }

    /// Use an explicit schema instead of the session default
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Send the command and decode the status message
    pub fn process(&mut self, session: &Session) -> Result<BulkLoadResult> {
        session.resolve_schema(&mut self.schema);
        debug!(
            action = ?self.action,
            schema = self.schema.as_deref().unwrap_or(""),
            table = %self.table,
            bytes = self.data.len(),
            "bulk load command"
        );
        session.execute_as(&*self)
    }
}

/// Encode rows as CSV text
///
/// Standard quoting: a field containing the delimiter, a quote or a line
/// break is wrapped in quotes with interior quotes doubled. Every row ends in
/// `\n`, including the last. Rows may differ in length.
pub fn encode_csv<I, R, F>(rows: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row).map_err(HarperError::encoding)?;
    }

    let bytes = writer.into_inner().map_err(|e| HarperError::encoding(e.error()))?;
    String::from_utf8(bytes).map_err(HarperError::encoding)
}

/// Request body for `get_job`
#[derive(Debug, Clone, Serialize)]
pub struct GetJobCommand {
    operation: &'static str,
    pub id: String,
}

impl GetJobCommand {
    pub fn new(id: impl Into<String>) -> Self {
        Self { operation: "get_job", id: id.into() }
    }

    /// Send the command and decode the job entries
    pub fn process(&self, session: &Session) -> Result<Vec<JobStatus>> {
        debug!(job_id = %self.id, "get job command");
        session.execute_as(self)
    }
}
