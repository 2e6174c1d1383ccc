//! Receipt files attached to items

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, ItemId};

/// Longest accepted original filename, in characters
pub const MAX_FILE_NAME_LEN: usize = 200;

/// Byte budget for the filename part of a blob key
///
/// Filesystems limit a path component to 255 bytes; the key adds a short id
/// prefix and the blob store may add a temporary suffix.
pub const MAX_STORED_NAME_BYTES: usize = 150;

const MAX_EXTENSION_BYTES: usize = 16;

/// A stored receipt belonging to exactly one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub item_id: ItemId,
    /// Key of the file in blob storage
    pub stored_path: String,
    /// Filename as uploaded, used when packaging receipts
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates an invoice record for a file uploaded on `local_date`
    pub fn new(item_id: ItemId, file_name: &str, local_date: NaiveDate) -> Self {
        let id = InvoiceId::new_v7();
        let file_name = clean_file_name(file_name);
        Self {
            id,
            item_id,
            stored_path: storage_path(id, &file_name, local_date),
            file_name,
            uploaded_at: Utc::now(),
        }
    }
}

/// Blob key for an upload: `invoices/{YYYY}/{MM}/{DD}/{short-id}_{filename}`
///
/// The filename is shortened to [`MAX_STORED_NAME_BYTES`]; the original name
/// stays on the invoice record.
pub fn storage_path(id: InvoiceId, file_name: &str, local_date: NaiveDate) -> String {
    format!(
        "invoices/{:04}/{:02}/{:02}/{}_{}",
        local_date.year(),
        local_date.month(),
        local_date.day(),
        id.short(),
        stored_name(file_name)
    )
}

/// Cuts `file_name` to the stored byte budget on a char boundary, keeping a
/// short extension
fn stored_name(file_name: &str) -> String {
    if file_name.len() <= MAX_STORED_NAME_BYTES {
        return file_name.to_string();
    }
    let (stem, extension) = match file_name.rfind('.') {
        Some(dot) if dot > 0 && file_name.len() - dot <= MAX_EXTENSION_BYTES => file_name.split_at(dot),
        _ => (file_name, ""),
    };
    let budget = MAX_STORED_NAME_BYTES - extension.len();
    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], extension)
}

/// Reduces a client-supplied filename to its last path component
///
/// Browsers on some platforms send the full local path. Control characters
/// are dropped and an empty result becomes `receipt`.
pub fn clean_file_name(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILE_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "receipt".to_string()
    } else {
        cleaned.to_string()
    }
}
