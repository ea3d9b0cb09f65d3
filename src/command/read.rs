//! Read commands: lookups by identifier or attribute value, and SQL queries.
//!
//! The response shape depends on the requested attributes or the query
//! projection, so reads decode into a caller-chosen type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{record_ids, RecordId};
use crate::error::Result;
use crate::session::Session;

/// Attribute list meaning "every attribute"
pub const ALL_ATTRIBUTES: &str = "*";

/// Operation names of the read family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOperation {
    SearchByHash,
    SearchByValue,
    Sql,
}

/// Request body for reads
#[derive(Debug, Clone, Serialize)]
pub struct ReadCommand {
    pub operation: ReadOperation,

    /// Filled from the session when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hash_values: Vec<RecordId>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub get_attributes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_attribute: Option<String>,

    /// Value to match; `*` acts as a wildcard on the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_value: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl ReadCommand {
    fn empty(operation: ReadOperation) -> Self {
        Self {
            operation,
            schema: None,
            table: None,
            hash_values: Vec::new(),
            get_attributes: Vec::new(),
            search_attribute: None,
            search_value: None,
            sql: None,
        }
    }

    /// Fetch every attribute of the records with the given identifiers
    pub fn by_hash<I, S>(table: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RecordId>,
    {
        Self {
            table: Some(table.to_string()),
            hash_values: record_ids(ids),
            get_attributes: vec![ALL_ATTRIBUTES.to_string()],
            ..Self::empty(ReadOperation::SearchByHash)
        }
    }

    /// Fetch every attribute of the records whose attribute matches a value
    pub fn by_value(
        table: &str,
        attribute: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            table: Some(table.to_string()),
            search_attribute: Some(attribute.into()),
            search_value: Some(value.into()),
            get_attributes: vec![ALL_ATTRIBUTES.to_string()],
            ..Self::empty(ReadOperation::SearchByValue)
        }
    }

    /// Run a self-contained SQL query
    pub fn sql(query: impl Into<String>) -> Self {
        Self { sql: Some(query.into()), ..Self::empty(ReadOperation::Sql) }
    }

    /// Use an explicit schema instead of the session default
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Restrict the returned attributes
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.get_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Send the command and decode the response into `T`
    ///
    /// Typically `T` is a `Vec` of the caller's record type. An unset schema
    /// is filled from the session first and stays on the command.
    pub fn process<T: DeserializeOwned>(&mut self, session: &Session) -> Result<T> {
        session.resolve_schema(&mut self.schema);
        debug!(
            operation = ?self.operation,
            schema = self.schema.as_deref().unwrap_or(""),
            table = self.table.as_deref().unwrap_or(""),
            "read command"
        );
        session.execute_as(&*self)
    }
}
