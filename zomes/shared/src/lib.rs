//! VisitWise Shared Utilities
//!
//! This crate provides common functionality for all VisitWise zomes:
//! - Practice ownership enforcement
//! - Error types and conversion from core errors
//! - Anchor management
//! - Record, link and cross-zome call helpers
//! - Record views exchanged between zomes and with the UI

use hdk::prelude::*;
use serde::de::DeserializeOwned;
use visitwise_core::{VisitwiseError, YearMonth};

// Re-export commonly used items
pub use access_control::*;
pub use anchors::*;
pub use records::*;
pub use types::*;
pub use views::*;

/// Access control: a practice's records belong to the practitioner who wrote them
pub mod access_control {
    use super::*;

    pub fn check_author(author: &AgentPubKey, caller: &AgentPubKey) -> Result<(), PracticeError> {
        if author != caller {
            return Err(PracticeError::Unauthorized(
                "Only the practitioner who created this record can change it".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject changes to a record authored by another agent
    pub fn require_author(record: &Record) -> ExternResult<()> {
        let caller = agent_info()?.agent_initial_pubkey;
        check_author(record.action().author(), &caller).map_err(|err| {
            warn!("Rejected change by {} to a record they did not author", caller);
            WasmError::from(err)
        })
    }

    /// Bulk changes keyed by a patient need the patient's author
    pub fn require_patient_author(patient_hash: &ActionHash) -> ExternResult<()> {
        require_author(&get_record(patient_hash.clone(), "Patient")?)
    }
}

/// Common types used across zomes
pub mod types {
    use super::*;

    /// Standard error types for consistent error handling
    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    pub enum PracticeError {
        NotFound(String),
        Unauthorized(String),
        ValidationError(String),
        /// The write would break a uniqueness rule (one visit per day)
        Conflict(String),
        BackendError(String),
    }

    impl std::fmt::Display for PracticeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                PracticeError::NotFound(msg) => write!(f, "Not found: {}", msg),
                PracticeError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
                PracticeError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
                PracticeError::Conflict(msg) => write!(f, "Conflict: {}", msg),
                PracticeError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            }
        }
    }

    impl From<PracticeError> for WasmError {
        fn from(err: PracticeError) -> Self {
            wasm_error!(WasmErrorInner::Guest(err.to_string()))
        }
    }

    impl From<VisitwiseError> for PracticeError {
        fn from(err: VisitwiseError) -> Self {
            match err {
                VisitwiseError::NotFound { .. } => PracticeError::NotFound(err.to_string()),
                VisitwiseError::DuplicateVisit { .. } => PracticeError::Conflict(err.to_string()),
                VisitwiseError::Validation(result) => PracticeError::ValidationError(result.to_string()),
                VisitwiseError::InvalidDate(_)
                | VisitwiseError::InvalidMonth(_)
                | VisitwiseError::InvalidPaymentMethod(_)
                | VisitwiseError::Config(_) => PracticeError::ValidationError(err.to_string()),
                VisitwiseError::Backend(_) | VisitwiseError::Json(_) | VisitwiseError::Io(_) => {
                    PracticeError::BackendError(err.to_string())
                }
            }
        }
    }

    /// `map_err` adapter for core results
    pub fn core_error(err: VisitwiseError) -> WasmError {
        PracticeError::from(err).into()
    }

    /// Conductor time in microseconds, the unit core timestamps use
    pub fn now_micros() -> ExternResult<i64> {
        Ok(sys_time()?.as_micros())
    }
}

/// Anchor utilities for consistent indexing
pub mod anchors {
    use super::*;

    /// Standard anchor entry type
    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    pub struct Anchor(pub String);

    /// Get the entry hash for an anchor by hashing the serialized bytes
    pub fn anchor_hash(anchor_text: &str) -> ExternResult<EntryHash> {
        let anchor = Anchor(anchor_text.to_string());
        let bytes = serde_json::to_vec(&anchor).map_err(|e| {
            wasm_error!(WasmErrorInner::Guest(format!("Failed to serialize anchor: {}", e)))
        })?;

        let entry = Entry::App(
            AppEntryBytes::try_from(
                SerializedBytes::try_from(UnsafeBytes::from(bytes)).map_err(|e| {
                    wasm_error!(WasmErrorInner::Guest(format!(
                        "Failed to create serialized bytes: {:?}",
                        e
                    )))
                })?,
            )
            .map_err(|e| {
                wasm_error!(WasmErrorInner::Guest(format!(
                    "Failed to create app entry bytes: {:?}",
                    e
                )))
            })?,
        );

        hash_entry(entry)
    }

    /// Anchor text for one practitioner's collection (`patients`, `payments`, ...)
    pub fn practice_anchor_text(agent: &AgentPubKey, collection: &str) -> String {
        format!("visitwise/{}/{}", agent, collection)
    }

    /// Anchor text indexing a patient's records by calendar month
    pub fn patient_month_anchor_text(collection: &str, patient_hash: &ActionHash, month: YearMonth) -> String {
        format!("visitwise/{}/{}/{}", collection, patient_hash, month)
    }

    /// Anchor for the calling practitioner's collection
    pub fn practice_anchor(collection: &str) -> ExternResult<EntryHash> {
        let agent = agent_info()?.agent_initial_pubkey;
        anchor_hash(&practice_anchor_text(&agent, collection))
    }

    pub fn patient_month_anchor(
        collection: &str,
        patient_hash: &ActionHash,
        month: YearMonth,
    ) -> ExternResult<EntryHash> {
        anchor_hash(&patient_month_anchor_text(collection, patient_hash, month))
    }
}

/// Record and link helpers
///
/// Provides:
/// - Entry decoding with a typed not-found error
/// - Link-to-record resolution, including latest-update lookup
/// - Typed local zome calls
pub mod records {
    use super::*;

    /// Stable string id for a record, used as the core model id
    pub fn hash_id(hash: &ActionHash) -> String {
        hash.to_string()
    }

    /// Fetch a record or fail with a not-found error naming `kind`
    pub fn get_record(hash: ActionHash, kind: &str) -> ExternResult<Record> {
        get(hash.clone(), GetOptions::default())?
            .ok_or_else(|| PracticeError::NotFound(format!("{} {}", kind, hash)).into())
    }

    /// Decode a record's app entry
    pub fn decode_entry<T>(record: &Record) -> ExternResult<T>
    where
        T: TryFrom<SerializedBytes, Error = SerializedBytesError>,
    {
        record
            .entry()
            .to_app_option::<T>()
            .map_err(|e| wasm_error!(WasmErrorInner::Guest(e.to_string())))?
            .ok_or_else(|| {
                wasm_error!(WasmErrorInner::Guest(format!(
                    "Record {} has no app entry",
                    record.action_address()
                )))
            })
    }

    /// Get records from links, skipping targets that are gone
    pub fn links_to_records(links: Vec<Link>) -> ExternResult<Vec<Record>> {
        let mut records = Vec::new();
        for link in links {
            if let Some(hash) = link.target.into_action_hash() {
                match get(hash, GetOptions::default())? {
                    Some(record) => records.push(record),
                    None => debug!("Link target missing, skipping"),
                }
            }
        }
        Ok(records)
    }

    /// The newest update of `original`, given its update links
    pub fn latest_record(original: Record, mut update_links: Vec<Link>) -> ExternResult<Record> {
        update_links.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        for link in update_links {
            if let Some(hash) = link.target.into_action_hash() {
                if let Some(record) = get(hash, GetOptions::default())? {
                    return Ok(record);
                }
            }
        }
        Ok(original)
    }

    pub fn delete_links(links: Vec<Link>) -> ExternResult<()> {
        for link in links {
            delete_link(link.create_link_hash, GetOptions::default())?;
        }
        Ok(())
    }

    /// Call another zome in this cell and decode its response
    pub fn call_local<I, T>(zome: &str, function: &str, input: &I) -> ExternResult<T>
    where
        I: Serialize + std::fmt::Debug,
        T: DeserializeOwned + std::fmt::Debug,
    {
        let response = call(
            CallTargetCell::Local,
            ZomeName::from(zome),
            FunctionName::from(function),
            None,
            input,
        )?;

        match response {
            ZomeCallResponse::Ok(io) => io.decode().map_err(|e| {
                wasm_error!(WasmErrorInner::Guest(format!(
                    "Failed to decode {}::{} response: {}",
                    zome, function, e
                )))
            }),
            ZomeCallResponse::Unauthorized(..) => Err(PracticeError::Unauthorized(format!(
                "Call to {}::{} was not authorized",
                zome, function
            ))
            .into()),
            ZomeCallResponse::NetworkError(e) => {
                Err(PracticeError::BackendError(format!("Network error: {}", e)).into())
            }
            ZomeCallResponse::CountersigningSession(e) => {
                Err(PracticeError::BackendError(format!("Countersigning error: {}", e)).into())
            }
            _ => Err(PracticeError::BackendError(format!(
                "Unexpected response from {}::{}",
                zome, function
            ))
            .into()),
        }
    }
}

/// Record views returned by coordinator externs
///
/// Zomes exchange core model values, never each other's entry types, so a
/// coordinator only needs this crate to read another zome's output.
pub mod views {
    use super::*;
    use visitwise_core::{MediaItem, Patient, Payment, Visit};

    pub const PATIENTS_ZOME: &str = "patients";
    pub const VISITS_ZOME: &str = "visits";
    pub const PAYMENTS_ZOME: &str = "payments";
    pub const MEDIA_ZOME: &str = "media";

    /// A patient with the hashes needed to address it again
    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    pub struct PatientRecord {
        /// Create action; stable identity across updates
        pub original_hash: ActionHash,
        /// Latest update (or the create when never updated)
        pub action_hash: ActionHash,
        pub patient: Patient,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    pub struct VisitRecord {
        pub original_hash: ActionHash,
        pub action_hash: ActionHash,
        pub visit: Visit,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    pub struct PaymentRecord {
        pub original_hash: ActionHash,
        pub action_hash: ActionHash,
        pub payment: Payment,
    }

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    pub struct MediaRecord {
        pub original_hash: ActionHash,
        pub media: MediaItem,
    }

    /// One patient's records within a calendar month
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PatientMonthInput {
        pub patient_hash: ActionHash,
        pub month: YearMonth,
    }
}
