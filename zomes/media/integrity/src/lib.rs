//! Media Integrity Zome
//!
//! Metadata for photos and videos attached to a patient. The files live in
//! object storage; only their download URL and storage path are kept here.

use hdi::prelude::*;
use visitwise_core::validation::validate_media as check_media;
use visitwise_core::MediaKind;

#[hdk_entry_helper]
#[derive(Clone, PartialEq)]
pub struct MediaItem {
    pub patient_hash: ActionHash,
    pub file_name: String,
    pub url: String,
    pub storage_path: Option<String>,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub uploaded_at: Timestamp,
    pub thumbhash: Option<String>,
    pub poster_url: Option<String>,
}

impl MediaItem {
    pub fn to_core(&self, id: String) -> visitwise_core::MediaItem {
        visitwise_core::MediaItem {
            id,
            patient_id: self.patient_hash.to_string(),
            file_name: self.file_name.clone(),
            url: self.url.clone(),
            storage_path: self.storage_path.clone(),
            kind: self.kind,
            size_bytes: self.size_bytes,
            uploaded_at: self.uploaded_at.as_micros(),
            thumbhash: self.thumbhash.clone(),
            poster_url: self.poster_url.clone(),
        }
    }
}

#[hdk_entry_types]
#[unit_enum(UnitEntryTypes)]
pub enum EntryTypes {
    MediaItem(MediaItem),
}

#[hdk_link_types]
pub enum LinkTypes {
    PatientToMedia,
}

/// Validation for MediaItem entries
#[hdk_extern]
pub fn validate(op: Op) -> ExternResult<ValidateCallbackResult> {
    match op.flattened::<EntryTypes, LinkTypes>()? {
        FlatOp::StoreEntry(store_entry) => match store_entry {
            OpEntry::CreateEntry { app_entry, .. } => match app_entry {
                EntryTypes::MediaItem(item) => validate_media_item(&item),
            },
            // Attachments are immutable; replace by delete + add
            OpEntry::UpdateEntry { .. } => Ok(ValidateCallbackResult::Invalid(
                "Media items cannot be updated".to_string(),
            )),
            _ => Ok(ValidateCallbackResult::Valid),
        },
        FlatOp::RegisterCreateLink { link_type, .. } => match link_type {
            LinkTypes::PatientToMedia => Ok(ValidateCallbackResult::Valid),
        },
        _ => Ok(ValidateCallbackResult::Valid),
    }
}

fn validate_media_item(item: &MediaItem) -> ExternResult<ValidateCallbackResult> {
    let result = check_media(&item.to_core(String::new()));
    if result.is_valid() {
        Ok(ValidateCallbackResult::Valid)
    } else {
        Ok(ValidateCallbackResult::Invalid(result.to_string()))
    }
}
