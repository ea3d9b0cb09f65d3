//! Mutation commands: insert, update, upsert, delete and SQL mutations.

use serde::Serialize;
use tracing::{debug, warn};

use super::{record_ids, RecordId};
use crate::error::{HarperError, Result};
use crate::response::MutationResult;
use crate::session::Session;
use crate::transport::decode;

/// Operation names of the mutation family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOperation {
    Insert,
    Update,
    Upsert,
    Delete,
    Sql,
}

/// Request body for data mutations, NoSQL or SQL
///
/// `records` is always an array on the wire, even for a single record.
/// Records are generic so callers can pass their own serializable structs;
/// the default is untyped JSON.
#[derive(Debug, Clone, Serialize)]
pub struct MutationCommand<R = serde_json::Value> {
    pub operation: MutationOperation,

    /// Filled from the session when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<R>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hash_values: Vec<RecordId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl<R> MutationCommand<R> {
    fn with_records(operation: MutationOperation, table: &str, records: Vec<R>) -> Self {
        Self {
            operation,
            schema: None,
            table: Some(table.to_string()),
            records: Some(records),
            hash_values: Vec::new(),
            sql: None,
        }
    }

    /// Insert records into a table
    pub fn insert(table: &str, records: Vec<R>) -> Self {
        Self::with_records(MutationOperation::Insert, table, records)
    }

    /// Update records, matched by their hash attribute
    pub fn update(table: &str, records: Vec<R>) -> Self {
        Self::with_records(MutationOperation::Update, table, records)
    }

    /// Insert new records and update existing ones
    pub fn upsert(table: &str, records: Vec<R>) -> Self {
        Self::with_records(MutationOperation::Upsert, table, records)
    }

    /// Use an explicit schema instead of the session default
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl MutationCommand {
    /// Delete records by identifier
    pub fn delete<I, S>(table: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RecordId>,
    {
        Self {
            operation: MutationOperation::Delete,
            schema: None,
            table: Some(table.to_string()),
            records: None,
            hash_values: record_ids(ids),
            sql: None,
        }
    }

    /// Mutate with a SQL statement (`UPDATE`, `INSERT`, `DELETE`)
    pub fn sql(statement: impl Into<String>) -> Self {
        Self {
            operation: MutationOperation::Sql,
            schema: None,
            table: None,
            records: None,
            hash_values: Vec::new(),
            sql: Some(statement.into()),
        }
    }
}

impl<R: Serialize> MutationCommand<R> {
    /// Send the command and decode the mutation result
    ///
    /// An unset schema is filled from the session first; the filled value
    /// stays on the command. Skipped identifiers turn a successful round trip
    /// into [`HarperError::PartialFailure`], which still carries the result.
    pub fn process(&mut self, session: &Session) -> Result<MutationResult> {
        session.resolve_schema(&mut self.schema);
        debug!(
            operation = ?self.operation,
            schema = self.schema.as_deref().unwrap_or(""),
            table = self.table.as_deref().unwrap_or(""),
            "mutation command"
        );

        let result: MutationResult = decode(session.execute(&*self)?)?;

        if result.has_skipped() {
            warn!(skipped = result.skipped_hashes.len(), "mutation skipped records");
            return Err(HarperError::partial_failure(result));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Serialize)]
    struct Dog {
        id: String,
        name: String,
    }

    #[test]
    fn test_insert_wire_shape() {
        let command = MutationCommand::insert(
            "dog",
            vec![Dog { id: "d-1".to_string(), name: "Penny".to_string() }],
        );
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "operation": "insert",
                "table": "dog",
                "records": [{"id": "d-1", "name": "Penny"}]
            })
        );
    }

    #[test]
    fn test_delete_sends_text_hash_values() {
        let command = MutationCommand::delete("dog", ["1", "a-2"]).schema("dev");
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "operation": "delete",
                "schema": "dev",
                "table": "dog",
                "hash_values": ["1", "a-2"]
            })
        );
    }

    #[test]
    fn test_sql_mutation_has_no_table_or_records() {
        let command = MutationCommand::sql("UPDATE dev.dog SET name = 'Rex' WHERE id = 'd-1'");
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "operation": "sql",
                "sql": "UPDATE dev.dog SET name = 'Rex' WHERE id = 'd-1'"
            })
        );
    }

    #[test]
    fn test_empty_records_array_is_sent() {
        let command: MutationCommand = MutationCommand::upsert("dog", Vec::new());
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["operation"], "upsert");
        assert_eq!(value["records"], json!([]));
    }
}
