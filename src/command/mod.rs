//! Command Envelopes
//!
//! Every request body is a JSON document whose `operation` field selects what
//! the server does. Commands fall into four families, each with its own type:
//!
//! | Family | Type | Schema defaulting |
//! |---|---|---|
//! | Administrative | [`AdminCommand`] | never |
//! | Mutation | [`MutationCommand`] | from the session when unset |
//! | Read | [`ReadCommand`] | from the session when unset |
//! | Bulk load | [`BulkLoadCommand`] | from the session when unset |
//!
//! # Wire Compatibility
//! Unset optional fields are omitted from the JSON entirely. The server treats
//! a present-but-empty field differently from an absent one, so every optional
//! field carries a `skip_serializing_if`.
//!
//! # Record Identifiers
//! Identifiers are always text ([`RecordId`]). Auto-generated identifiers are
//! alphanumeric and a numeric representation would corrupt or reject them.

use std::fmt;

use serde::{Deserialize, Serialize};

mod admin;
mod bulk;
mod mutation;
mod read;

pub use admin::{AdminCommand, AdminOperation};
pub use bulk::{encode_csv, BulkAction, BulkLoadCommand, GetJobCommand};
pub use mutation::{MutationCommand, MutationOperation};
pub use read::{ReadCommand, ReadOperation, ALL_ATTRIBUTES};

/// Text identifier of a record (the table's hash attribute value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an identifier from text
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the identifier text
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for RecordId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for RecordId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RecordId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Collect identifiers from anything that yields text
pub(crate) fn record_ids<I, S>(ids: I) -> Vec<RecordId>
where
    I: IntoIterator<Item = S>,
    S: Into<RecordId>,
{
    ids.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_serializes_as_string() {
        let id = RecordId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""42""#);
    }

    #[test]
    fn test_record_id_refuses_numbers() {
        assert!(serde_json::from_str::<RecordId>("42").is_err());
        assert_eq!(serde_json::from_str::<RecordId>(r#""0042""#).unwrap(), "0042");
    }

    #[test]
    fn test_record_ids_from_mixed_sources() {
        let owned = String::from("b-2");
        let ids = record_ids(vec!["a-1", owned.as_str()]);
        assert_eq!(ids, vec![RecordId::new("a-1"), RecordId::new("b-2")]);
        assert_eq!(ids[0].to_string(), "a-1");
    }
}
