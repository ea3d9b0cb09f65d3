//! Administrative commands: schema, table, attribute, user and role lifecycle.
//!
//! These commands never inherit the session's default schema. Several of them
//! (`describe_all`, `list_users`, `add_user`, ...) are schema-less, and
//! silently adding one would change what they do.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::Result;
use crate::session::Session;

/// Operation names of the administrative family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOperation {
    CreateSchema,
    DropSchema,
    DescribeSchema,
    DescribeAll,
    CreateTable,
    DropTable,
    DescribeTable,
    CreateAttribute,
    DropAttribute,
    AddUser,
    AlterUser,
    DropUser,
    UserInfo,
    ListUsers,
    AddRole,
    AlterRole,
    DropRole,
    ListRoles,
    CreateAuthenticationTokens,
    RefreshOperationToken,
    /// Any operation name not listed above, sent verbatim
    Other(String),
}

impl AdminOperation {
    /// Wire name of the operation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateSchema => "create_schema",
            Self::DropSchema => "drop_schema",
            Self::DescribeSchema => "describe_schema",
            Self::DescribeAll => "describe_all",
            Self::CreateTable => "create_table",
            Self::DropTable => "drop_table",
            Self::DescribeTable => "describe_table",
            Self::CreateAttribute => "create_attribute",
            Self::DropAttribute => "drop_attribute",
            Self::AddUser => "add_user",
            Self::AlterUser => "alter_user",
            Self::DropUser => "drop_user",
            Self::UserInfo => "user_info",
            Self::ListUsers => "list_users",
            Self::AddRole => "add_role",
            Self::AlterRole => "alter_role",
            Self::DropRole => "drop_role",
            Self::ListRoles => "list_roles",
            Self::CreateAuthenticationTokens => "create_authentication_tokens",
            Self::RefreshOperationToken => "refresh_operation_token",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Parse a wire name, falling back to [`AdminOperation::Other`]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "create_schema" => Self::CreateSchema,
            "drop_schema" => Self::DropSchema,
            "describe_schema" => Self::DescribeSchema,
            "describe_all" => Self::DescribeAll,
            "create_table" => Self::CreateTable,
            "drop_table" => Self::DropTable,
            "describe_table" => Self::DescribeTable,
            "create_attribute" => Self::CreateAttribute,
            "drop_attribute" => Self::DropAttribute,
            "add_user" => Self::AddUser,
            "alter_user" => Self::AlterUser,
            "drop_user" => Self::DropUser,
            "user_info" => Self::UserInfo,
            "list_users" => Self::ListUsers,
            "add_role" => Self::AddRole,
            "alter_role" => Self::AlterRole,
            "drop_role" => Self::DropRole,
            "list_roles" => Self::ListRoles,
            "create_authentication_tokens" => Self::CreateAuthenticationTokens,
            "refresh_operation_token" => Self::RefreshOperationToken,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AdminOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AdminOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Request body for administrative operations
///
/// Load the fields the operation needs, then call [`AdminCommand::process`].
/// A schema the operation requires must be set here explicitly.
#[derive(Clone, Serialize)]
pub struct AdminCommand {
    pub operation: AdminOperation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_attribute: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// WARNING: Sensitive data, excluded from `Debug` output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// `None` omits the field; `Some(false)` deactivates a user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl AdminCommand {
    /// Create a command with only the operation set
    pub fn new(operation: AdminOperation) -> Self {
        Self {
            operation,
            schema: None,
            table: None,
            attribute: None,
            hash_attribute: None,
            role: None,
            username: None,
            password: None,
            active: None,
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn hash_attribute(mut self, hash_attribute: impl Into<String>) -> Self {
        self.hash_attribute = Some(hash_attribute.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Send the command and return the raw response body
    pub fn process(&self, session: &Session) -> Result<Vec<u8>> {
        debug!(operation = %self.operation, "admin command");
        session.execute(self)
    }

    /// Send the command and decode the response into `T`
    pub fn process_as<T: DeserializeOwned>(&self, session: &Session) -> Result<T> {
        debug!(operation = %self.operation, "admin command");
        session.execute_as(self)
    }
}

impl fmt::Debug for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCommand")
            .field("operation", &self.operation)
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("attribute", &self.attribute)
            .field("hash_attribute", &self.hash_attribute)
            .field("role", &self.role)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_operation_only_serializes_operation() {
        let command = AdminCommand::new(AdminOperation::DescribeAll);
        assert_eq!(serde_json::to_value(&command).unwrap(), json!({"operation": "describe_all"}));
    }

    #[test]
    fn test_create_table_wire_shape() {
        let command = AdminCommand::new(AdminOperation::CreateTable)
            .schema("dev")
            .table("dog")
            .hash_attribute("id");
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({"operation": "create_table", "schema": "dev", "table": "dog", "hash_attribute": "id"})
        );
    }

    #[test]
    fn test_active_false_is_sent() {
        let command = AdminCommand::new(AdminOperation::AlterUser).username("old").active(false);
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["active"], json!(false));
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_operation_names_round_trip() {
        for name in ["create_schema", "drop_table", "user_info", "create_authentication_tokens"] {
            assert_eq!(AdminOperation::from_name(name).as_str(), name);
        }
        assert_eq!(
            AdminOperation::from_name("cluster_status"),
            AdminOperation::Other("cluster_status".to_string())
        );
        assert_eq!(
            serde_json::to_value(AdminOperation::Other("cluster_status".into())).unwrap(),
            json!("cluster_status")
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let command = AdminCommand::new(AdminOperation::AddUser).username("ops").password("hunter2");
        let rendered = format!("{command:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("ops"));
    }
}
