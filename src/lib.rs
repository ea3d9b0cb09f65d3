//! Harper - Client for the HarperDB Operations API
//!
//! Every HarperDB operation (schema management, inserts, lookups, SQL, bulk CSV
//! loads) is a JSON document POSTed to one endpoint, distinguished by its
//! `operation` field and authenticated with a bearer token.
//!
//! # Core Principles
//! - One pipeline: every command goes through [`Session::execute`]
//! - Blocking calls: each call holds the calling thread for one round trip
//! - No retries, caching or local validation; the server is the authority
//! - Record identifiers are text, never numbers
//! - Callers always learn about skipped records ([`HarperError::PartialFailure`])
//!
//! # Module Organization
//! - [`error`] - Error taxonomy
//! - [`session`] - Session context and builder
//! - [`transport`] - Transport executor, HTTP client capability, debug sink
//! - [`command`] - Command envelopes for the four families
//! - [`response`] - Result documents and job-id extraction
//! - [`config`] - Named connection profiles
//! - [`output`] - JSON envelopes printed by the CLI
//!
//! # Example
//!
//! ```no_run
//! use harper::{Session, BulkAction};
//! use serde_json::json;
//!
//! # fn example() -> harper::Result<()> {
//! let session = Session::builder()
//!     .endpoint("http://localhost:9925")
//!     .auth_token("operation-token")
//!     .schema("dev")
//!     .build()?;
//!
//! let result = session.insert_one("dog", json!({"id": "d-1", "name": "Penny"}))?;
//! println!("inserted {:?}", result.inserted_hashes);
//!
//! let dogs: Vec<serde_json::Value> = session.get("dog", ["d-1"])?;
//! let job_id = session.csv_data_load("dog", BulkAction::Insert, [["id", "name"], ["d-2", "Rex"]])?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod output;
pub mod response;
pub mod session;
pub mod transport;

mod ops;
mod tokens;

// Re-export commonly used types for convenience
pub use command::{
    encode_csv, AdminCommand, AdminOperation, BulkAction, BulkLoadCommand, GetJobCommand,
    MutationCommand, MutationOperation, ReadCommand, ReadOperation, RecordId,
};
pub use config::{
    list_profiles, resolve_default_profile, resolve_profile, save_profile, ConfigLocation,
    ProfileRegistry, ResolvedProfile, StoredProfile,
};
pub use error::{HarperError, Result};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use response::{
    job_id_from_message, BulkLoadResult, JobIdExtractor, JobStatus, MessageMarkerExtractor,
    MutationResult, JOB_ID_NOT_FOUND,
};
pub use session::{
    default_endpoint, set_default_endpoint, Session, SessionBuilder, DEFAULT_ENDPOINT,
};
pub use tokens::TokenPair;
pub use transport::{
    DebugSink, Direction, HttpClient, HttpRequest, HttpResponse, ReqwestClient, SendError,
    TracingSink,
};
