//! Result Documents
//!
//! Typed shapes that response bodies are decoded into, one per command family.
//! Read commands decode into a caller-supplied type instead and have no entry here.
//!
//! # Job Identifiers
//! Bulk-load responses report their asynchronous job in a free-text message such as
//! `"Starting job with id 0a8b7e47-..."`. Pulling the identifier out of that text is
//! fragile, so it sits behind [`JobIdExtractor`]; callers go through
//! [`BulkLoadResult::job_id`] and never parse the message themselves.

use serde::{Deserialize, Serialize};

use crate::command::RecordId;

/// Sentinel returned when no job identifier can be located
pub const JOB_ID_NOT_FOUND: &str = "not found";

/// Result of insert, update, upsert, delete and SQL mutations
///
/// Every identifier list holds text identifiers. The server omits lists that
/// do not apply to the operation, so all of them default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    /// Human-readable summary from the server
    #[serde(default)]
    pub message: String,

    /// Identifiers of newly inserted records
    #[serde(default)]
    pub inserted_hashes: Vec<RecordId>,

    /// Identifiers of updated records
    #[serde(default, rename = "update_hashes")]
    pub updated_hashes: Vec<RecordId>,

    /// Identifiers of records inserted or updated by an upsert
    #[serde(default)]
    pub upserted_hashes: Vec<RecordId>,

    /// Identifiers of deleted records
    #[serde(default)]
    pub deleted_hashes: Vec<RecordId>,

    /// Identifiers the server did not apply
    #[serde(default)]
    pub skipped_hashes: Vec<RecordId>,
}

impl MutationResult {
    /// True when the server skipped at least one record
    #[must_use]
    pub fn has_skipped(&self) -> bool {
        !self.skipped_hashes.is_empty()
    }
}

/// Status document returned by a bulk-load command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkLoadResult {
    /// Human-readable status message, embeds the job identifier
    #[serde(default)]
    pub message: String,

    /// Structured job identifier, sent by newer servers alongside the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl BulkLoadResult {
    /// Job identifier using the default extraction strategy
    #[must_use]
    pub fn job_id(&self) -> String {
        self.job_id_with(&MessageMarkerExtractor)
    }

    /// Job identifier using a caller-chosen extraction strategy
    #[must_use]
    pub fn job_id_with(&self, extractor: &dyn JobIdExtractor) -> String {
        extractor.extract(self)
    }
}

/// Strategy for locating the job identifier in a bulk-load response
pub trait JobIdExtractor {
    /// Return the job identifier, or [`JOB_ID_NOT_FOUND`]
    fn extract(&self, result: &BulkLoadResult) -> String;
}

/// Default strategy: the structured `job_id` field when present, else the message marker
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageMarkerExtractor;

impl JobIdExtractor for MessageMarkerExtractor {
    fn extract(&self, result: &BulkLoadResult) -> String {
        match result.job_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => job_id_from_message(&result.message).to_string(),
        }
    }
}

/// Extract the job identifier from a bulk-load status message
///
/// Finds the first occurrence of `id` and returns everything after the
/// marker and the one separator character the server writes after it.
/// Returns [`JOB_ID_NOT_FOUND`] when the marker is absent. A message that
/// ends right after the marker yields an empty identifier.
#[must_use]
pub fn job_id_from_message(message: &str) -> &str {
    let Some(index) = message.find("id") else {
        return JOB_ID_NOT_FOUND;
    };
    let after_marker = &message[index + 2..];
    let mut rest = after_marker.chars();
    rest.next();
    rest.as_str()
}

/// One entry of a `get_job` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job identifier
    pub id: String,

    /// Lifecycle state, e.g. `IN_PROGRESS`, `COMPLETE`, `ERROR`
    #[serde(default)]
    pub status: String,

    /// Job kind, e.g. `csv_data_load`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    /// Completion or failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Remaining server-reported fields (timestamps, user, request echo)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mutation_result_decodes_wire_names() {
        let body = r#"{
            "message": "updated 1 of 2 records",
            "update_hashes": ["a1"],
            "skipped_hashes": ["b2"]
        }"#;
        let result: MutationResult = serde_json::from_str(body).unwrap();

        assert_eq!(result.message, "updated 1 of 2 records");
        assert_eq!(result.updated_hashes, vec![RecordId::from("a1")]);
        assert!(result.inserted_hashes.is_empty());
        assert!(result.deleted_hashes.is_empty());
        assert!(result.has_skipped());
    }

    #[test]
    fn test_mutation_result_rejects_numeric_identifiers() {
        let body = r#"{"message": "inserted 1 of 1 records", "inserted_hashes": [42]}"#;
        assert!(serde_json::from_str::<MutationResult>(body).is_err());
    }

    #[test]
    fn test_alphanumeric_identifiers_stay_text() {
        let body = r#"{"inserted_hashes": ["007", "1e3", "a9f-c2"]}"#;
        let result: MutationResult = serde_json::from_str(body).unwrap();
        let ids: Vec<&str> = result.inserted_hashes.iter().map(RecordId::as_str).collect();
        assert_eq!(ids, vec!["007", "1e3", "a9f-c2"]);
    }

    #[test]
    fn test_job_id_from_harper_message() {
        let message = "Starting job with id 0a8b7e47-4a3f-4c1b-9d2e-7a2b1c3d4e5f";
        assert_eq!(job_id_from_message(message), "0a8b7e47-4a3f-4c1b-9d2e-7a2b1c3d4e5f");
    }

    #[test]
    fn test_job_id_takes_rest_of_message() {
        assert_eq!(job_id_from_message("job id abc-123"), "abc-123");
        assert_eq!(
            job_id_from_message("id of abc-123 has been created"),
            "of abc-123 has been created"
        );
    }

    #[test]
    fn test_job_id_missing_marker_is_sentinel() {
        assert_eq!(job_id_from_message("Starting job"), JOB_ID_NOT_FOUND);
        assert_eq!(job_id_from_message(""), "not found");
    }

    #[test]
    fn test_job_id_marker_at_end() {
        assert_eq!(job_id_from_message("job id"), "");
        assert_eq!(job_id_from_message("id:"), "");
    }

    #[test]
    fn test_job_id_multibyte_separator() {
        assert_eq!(job_id_from_message("idé-123"), "-123");
        assert_eq!(job_id_from_message("job id\u{00a0}j-7"), "j-7");
        assert_eq!(job_id_from_message("idé"), "");
    }

    #[test]
    fn test_upsert_result_keeps_identifiers() {
        let body = r#"{"message": "upserted 2 of 2 records", "upserted_hashes": ["d-1", "d-2"]}"#;
        let result: MutationResult = serde_json::from_str(body).unwrap();

        assert_eq!(result.upserted_hashes, vec![RecordId::from("d-1"), RecordId::from("d-2")]);
        assert!(!result.has_skipped());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["upserted_hashes"], serde_json::json!(["d-1", "d-2"]));
    }

    #[test]
    fn test_structured_job_id_wins() {
        let result: BulkLoadResult = serde_json::from_str(
            r#"{"message": "Starting job with id stale", "job_id": "fresh-1"}"#,
        )
        .unwrap();
        assert_eq!(result.job_id(), "fresh-1");
    }

    #[test]
    fn test_custom_extractor() {
        struct LastWord;
        impl JobIdExtractor for LastWord {
            fn extract(&self, result: &BulkLoadResult) -> String {
                result.message.split_whitespace().last().unwrap_or(JOB_ID_NOT_FOUND).to_string()
            }
        }

        let result = BulkLoadResult {
            message: "job id of xyz-9".to_string(),
            job_id: None,
        };
        assert_eq!(result.job_id_with(&LastWord), "xyz-9");
        assert_eq!(result.job_id(), "of xyz-9");
    }

    #[test]
    fn test_job_status_keeps_extra_fields() {
        let body = r#"{
            "id": "j-1",
            "status": "COMPLETE",
            "type": "csv_data_load",
            "message": "successfully loaded 3 of 3 records",
            "start_datetime": 1700000000000
        }"#;
        let job: JobStatus = serde_json::from_str(body).unwrap();
        assert_eq!(job.id, "j-1");
        assert_eq!(job.job_type.as_deref(), Some("csv_data_load"));
        assert_eq!(job.extra["start_datetime"], 1_700_000_000_000_u64);
    }
}
