//! Media Coordinator Zome
//!
//! Attachment metadata per patient. Uploading and deleting the file bytes
//! is the client's job; deletion hands back the storage path to remove.

use hdk::prelude::*;
use media_integrity::*;
use visitwise_core::media::storage_path_from_url;
use visitwise_core::validation::validate_media;
use visitwise_core::{MediaKind, ValidationErrorCode, ValidationResult, VisitwiseError};
use visitwise_shared::{
    call_local, core_error, decode_entry, delete_links, get_record, hash_id, require_author, require_patient_author,
    MediaRecord, PatientRecord, PATIENTS_ZOME,
};

fn load_media(original_hash: ActionHash) -> ExternResult<Option<(MediaRecord, ActionHash)>> {
    let Some(record) = get(original_hash.clone(), GetOptions::default())? else {
        return Ok(None);
    };
    let entry: MediaItem = decode_entry(&record)?;
    Ok(Some((
        MediaRecord {
            media: entry.to_core(hash_id(&original_hash)),
            original_hash,
        },
        entry.patient_hash,
    )))
}

fn patient_media_links(patient_hash: &ActionHash) -> ExternResult<Vec<Link>> {
    get_links(
        LinkQuery::try_new(patient_hash.clone(), LinkTypes::PatientToMedia)?,
        GetStrategy::default(),
    )
}

fn load_patient_media(patient_hash: &ActionHash) -> ExternResult<Vec<MediaRecord>> {
    let mut items = Vec::new();
    for link in patient_media_links(patient_hash)? {
        if let Some(hash) = link.target.into_action_hash() {
            if let Some((item, _)) = load_media(hash)? {
                items.push(item);
            }
        }
    }
    items.sort_by(|a, b| b.media.uploaded_at.cmp(&a.media.uploaded_at));
    Ok(items)
}

/// Drop the entry and its patient link; returns the storage path to clean up
fn remove_media(item: &MediaRecord, patient_hash: &ActionHash) -> ExternResult<Option<String>> {
    let links: Vec<Link> = patient_media_links(patient_hash)?
        .into_iter()
        .filter(|link| link.target.clone().into_action_hash().as_ref() == Some(&item.original_hash))
        .collect();
    delete_links(links)?;
    delete_entry(item.original_hash.clone())?;

    let path = item
        .media
        .storage_path
        .clone()
        .or_else(|| storage_path_from_url(&item.media.url));
    if path.is_none() {
        warn!("No storage path for media {}; file must be removed by hand", item.original_hash);
    }
    Ok(path)
}

/// Metadata of a finished upload
#[derive(Serialize, Deserialize, Debug)]
pub struct AddMediaInput {
    pub patient_hash: ActionHash,
    pub file_name: String,
    /// Download URL from object storage
    pub url: String,
    #[serde(default)]
    pub storage_path: Option<String>,
    /// MIME type reported by the picker; the file extension is the fallback
    #[serde(default)]
    pub content_type: Option<String>,
    pub size_bytes: u64,
    #[serde(default)]
    pub thumbhash: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

#[hdk_extern]
pub fn add_media(input: AddMediaInput) -> ExternResult<MediaRecord> {
    let patient: Option<PatientRecord> = call_local(PATIENTS_ZOME, "get_patient", &input.patient_hash)?;
    if patient.is_none() {
        return Err(core_error(VisitwiseError::not_found(
            "Patient",
            hash_id(&input.patient_hash),
        )));
    }

    let kind = input
        .content_type
        .as_deref()
        .and_then(MediaKind::from_content_type)
        .or_else(|| MediaKind::from_file_name(&input.file_name))
        .ok_or_else(|| {
            let mut result = ValidationResult::new();
            result.add_error(
                "file_name",
                "Only images and videos can be attached",
                ValidationErrorCode::InvalidFormat,
            );
            core_error(VisitwiseError::Validation(result))
        })?;

    let entry = MediaItem {
        patient_hash: input.patient_hash.clone(),
        file_name: input.file_name,
        storage_path: input.storage_path.or_else(|| storage_path_from_url(&input.url)),
        url: input.url,
        kind,
        size_bytes: input.size_bytes,
        uploaded_at: sys_time()?,
        thumbhash: input.thumbhash,
        poster_url: input.poster_url,
    };
    validate_media(&entry.to_core(String::new()))
        .into_result()
        .map_err(core_error)?;

    let media_hash = create_entry(&EntryTypes::MediaItem(entry.clone()))?;
    create_link(
        input.patient_hash,
        media_hash.clone(),
        LinkTypes::PatientToMedia,
        (),
    )?;

    Ok(MediaRecord {
        media: entry.to_core(hash_id(&media_hash)),
        original_hash: media_hash,
    })
}

/// A patient's attachments, newest upload first
#[hdk_extern]
pub fn get_patient_media(patient_hash: ActionHash) -> ExternResult<Vec<MediaRecord>> {
    load_patient_media(&patient_hash)
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteMediaOutput {
    pub deleted: ActionHash,
    /// Object-storage path of the file, when it could be determined
    pub storage_path: Option<String>,
}

#[hdk_extern]
pub fn delete_media(original_hash: ActionHash) -> ExternResult<DeleteMediaOutput> {
    require_author(&get_record(original_hash.clone(), "Media")?)?;
    let (item, patient_hash) = load_media(original_hash.clone())?
        .ok_or_else(|| core_error(VisitwiseError::not_found("Media", hash_id(&original_hash))))?;

    let storage_path = remove_media(&item, &patient_hash)?;
    Ok(DeleteMediaOutput {
        deleted: original_hash,
        storage_path,
    })
}

/// Remove every attachment of a patient (patient deletion)
#[hdk_extern]
pub fn delete_patient_media(patient_hash: ActionHash) -> ExternResult<Vec<MediaRecord>> {
    require_patient_author(&patient_hash)?;
    let items = load_patient_media(&patient_hash)?;
    let mut removed = Vec::with_capacity(items.len());
    for mut item in items {
        item.media.storage_path = remove_media(&item, &patient_hash)?;
        removed.push(item);
    }
    Ok(removed)
}
