//! Convenience Operations
//!
//! One-call helpers on [`Session`]. Each builds the matching command, lets
//! the command fill its schema from the session, sends it and decodes the
//! result. Reach for the command types directly when a call needs fields
//! these helpers do not expose.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::command::{
    AdminCommand, AdminOperation, BulkAction, BulkLoadCommand, GetJobCommand, MutationCommand,
    ReadCommand, RecordId,
};
use crate::error::Result;
use crate::response::{JobStatus, MutationResult};
use crate::session::Session;

impl Session {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert records into a table
    pub fn insert<R: Serialize>(&self, table: &str, records: Vec<R>) -> Result<MutationResult> {
        MutationCommand::insert(table, records).process(self)
    }

    /// Insert a single record; sent as a one-element array
    pub fn insert_one<R: Serialize>(&self, table: &str, record: R) -> Result<MutationResult> {
        self.insert(table, vec![record])
    }

    /// Update records, matched by their hash attribute
    pub fn update<R: Serialize>(&self, table: &str, records: Vec<R>) -> Result<MutationResult> {
        MutationCommand::update(table, records).process(self)
    }

    /// Update a single record; sent as a one-element array
    pub fn update_one<R: Serialize>(&self, table: &str, record: R) -> Result<MutationResult> {
        self.update(table, vec![record])
    }

    /// Insert new records and update existing ones
    pub fn upsert<R: Serialize>(&self, table: &str, records: Vec<R>) -> Result<MutationResult> {
        MutationCommand::upsert(table, records).process(self)
    }

    /// Upsert a single record; sent as a one-element array
    pub fn upsert_one<R: Serialize>(&self, table: &str, record: R) -> Result<MutationResult> {
        self.upsert(table, vec![record])
    }

    /// Delete records by identifier
    pub fn delete<I, S>(&self, table: &str, ids: I) -> Result<MutationResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<RecordId>,
    {
        MutationCommand::delete(table, ids).process(self)
    }

    /// Run a SQL `UPDATE`, `INSERT` or `DELETE`
    pub fn execute_sql(&self, statement: &str) -> Result<MutationResult> {
        MutationCommand::sql(statement).process(self)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch records by identifier with every attribute
    pub fn get<T, I, S>(&self, table: &str, ids: I) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<RecordId>,
    {
        ReadCommand::by_hash(table, ids).process(self)
    }

    /// Fetch records whose attribute matches a value, with every attribute
    pub fn search_by_value<T: DeserializeOwned>(
        &self,
        table: &str,
        attribute: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<T> {
        ReadCommand::by_value(table, attribute, value).process(self)
    }

    /// Run a SQL `SELECT`
    pub fn select<T: DeserializeOwned>(&self, query: &str) -> Result<T> {
        ReadCommand::sql(query).process(self)
    }

    // =========================================================================
    // Bulk load
    // =========================================================================

    /// Load rows as CSV and return the job identifier
    ///
    /// The identifier is [`JOB_ID_NOT_FOUND`](crate::response::JOB_ID_NOT_FOUND)
    /// when the server's status message does not contain one.
    pub fn csv_data_load<I, R, F>(&self, table: &str, action: BulkAction, rows: I) -> Result<String>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        let result = BulkLoadCommand::from_rows(table, action, rows)?.process(self)?;
        Ok(result.job_id())
    }

    /// Fetch the status of an asynchronous job
    pub fn get_job(&self, id: &str) -> Result<Vec<JobStatus>> {
        GetJobCommand::new(id).process(self)
    }

    // =========================================================================
    // Administration (schemas are never defaulted here)
    // =========================================================================

    /// Create a schema
    pub fn create_schema(&self, schema: &str) -> Result<serde_json::Value> {
        AdminCommand::new(AdminOperation::CreateSchema).schema(schema).process_as(self)
    }

    /// Create a table keyed by `hash_attribute`
    pub fn create_table(
        &self,
        schema: &str,
        table: &str,
        hash_attribute: &str,
    ) -> Result<serde_json::Value> {
        AdminCommand::new(AdminOperation::CreateTable)
            .schema(schema)
            .table(table)
            .hash_attribute(hash_attribute)
            .process_as(self)
    }

    /// Drop a table and its records
    pub fn drop_table(&self, schema: &str, table: &str) -> Result<serde_json::Value> {
        AdminCommand::new(AdminOperation::DropTable).schema(schema).table(table).process_as(self)
    }

    /// Describe a table's attributes, record count and hash attribute
    pub fn describe_table<T: DeserializeOwned>(&self, schema: &str, table: &str) -> Result<T> {
        AdminCommand::new(AdminOperation::DescribeTable)
            .schema(schema)
            .table(table)
            .process_as(self)
    }

    /// Create a user with the given role
    pub fn add_user(
        &self,
        username: &str,
        password: &str,
        role: &str,
        active: bool,
    ) -> Result<serde_json::Value> {
        AdminCommand::new(AdminOperation::AddUser)
            .username(username)
            .password(password)
            .role(role)
            .active(active)
            .process_as(self)
    }

    /// Remove a user
    pub fn drop_user(&self, username: &str) -> Result<serde_json::Value> {
        AdminCommand::new(AdminOperation::DropUser).username(username).process_as(self)
    }
}
