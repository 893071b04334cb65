//! Media attachment helpers
//!
//! Files live in object storage under `{root}/{patient_id}/media/{file}`.
//! Only the download URL is kept with the metadata, so deleting a file
//! means recovering its storage path from that URL.

use crate::model::MediaKind;

pub const DEFAULT_STORAGE_ROOT: &str = "patients";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "avif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "3gp", "mkv"];

pub fn storage_path(root: &str, patient_id: &str, file_name: &str) -> String {
    format!("{}/{}/media/{}", root.trim_end_matches('/'), patient_id, file_name)
}

/// Recover the storage path from a download URL.
///
/// Handles hosted download URLs of the form
/// `https://host/v0/b/<bucket>/o/<percent-encoded path>?alt=media&token=...`
/// and plain `https://host/<bucket>/<path>` URLs (first segment dropped).
pub fn storage_path_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next()?;
    let after_scheme = without_query.split_once("://").map(|(_, rest)| rest)?;
    let (_, path) = after_scheme.split_once('/')?;

    if let Some((_, encoded)) = path.split_once("/o/") {
        let decoded = percent_decode(encoded)?;
        return (!decoded.is_empty()).then_some(decoded);
    }

    let (_, object) = path.split_once('/')?;
    let decoded = percent_decode(object)?;
    (!decoded.is_empty()).then_some(decoded)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = input.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

impl MediaKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.trim().to_ascii_lowercase();
        if lower.starts_with("image/") {
            Some(MediaKind::Image)
        } else if lower.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = extension(file_name)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Collision-free upload name: `{micros}_{sanitized stem}.{ext}`
pub fn unique_file_name(original: &str, now_micros: i64) -> String {
    let (stem, ext) = match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_ascii_lowercase())),
        _ => (original, None),
    };
    let mut clean: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(40)
        .collect();
    if clean.is_empty() {
        clean.push_str("file");
    }
    match ext {
        Some(ext) => format!("{}_{}.{}", now_micros, clean, ext),
        None => format!("{}_{}", now_micros, clean),
    }
}

/// "1.5 MB"-style size for list rows
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
