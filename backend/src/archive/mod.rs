//! Zip container codec.
//!
//! Uploads are single-level zip files holding one CSV file at their root;
//! exports are built the same way, with the CSV stored as [`MEMBER_NAME`].

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ArchiveError, ArchiveResult};

/// Name of the CSV member written into exported containers.
pub const MEMBER_NAME: &str = "data.csv";

/// File extension a member must carry to be picked up on import.
const CSV_EXTENSION: &str = ".csv";

/// Largest uncompressed CSV member accepted on import (100 MiB).
pub const MAX_MEMBER_BYTES: u64 = 100 << 20;

/// A CSV member pulled out of an uploaded container.
#[derive(Debug, Clone)]
pub struct ExtractedMember {
    /// Entry name inside the container.
    pub name: String,
    /// Uncompressed member bytes.
    pub bytes: Vec<u8>,
}

/// True for root-level, non-directory `.csv` entries.
fn is_tabular_member(name: &str, is_dir: bool) -> bool {
    !is_dir
        && !name.contains('/')
        && !name.contains('\\')
        && name.to_ascii_lowercase().ends_with(CSV_EXTENSION)
}

/// Extract the first root-level CSV member from a zip container.
///
/// Entries are scanned in central-directory order; members nested in a
/// subdirectory and any later CSV files are ignored. Members larger than
/// [`MAX_MEMBER_BYTES`] once decompressed are refused.
pub fn extract(archive_bytes: &[u8]) -> ArchiveResult<ExtractedMember> {
    extract_with_limit(archive_bytes, MAX_MEMBER_BYTES)
}

/// [`extract`] with an explicit cap on the decompressed member size.
///
/// The size recorded in the container is never trusted: the member is read
/// until `limit` bytes and refused if there is more.
pub fn extract_with_limit(archive_bytes: &[u8], limit: u64) -> ArchiveResult<ExtractedMember> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !is_tabular_member(entry.name(), entry.is_dir()) {
            continue;
        }

        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        entry
            .by_ref()
            .take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Unreadable(format!("cannot read '{}': {}", name, e)))?;

        if bytes.len() as u64 > limit {
            return Err(ArchiveError::Unreadable(format!(
                "'{}' is larger than {} bytes uncompressed",
                name, limit
            )));
        }

        return Ok(ExtractedMember { name, bytes });
    }

    Err(ArchiveError::NoTabularMember)
}

/// Wrap CSV bytes into a new single-entry zip container.
pub fn package(csv_bytes: &[u8]) -> ArchiveResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    writer
        .start_file(MEMBER_NAME, options)
        .map_err(|e| ArchiveError::Write(e.to_string()))?;
    writer
        .write_all(csv_bytes)
        .map_err(|e| ArchiveError::Write(e.to_string()))?;

    let cursor = writer
        .finish()
        .map_err(|e| ArchiveError::Write(e.to_string()))?;

    Ok(cursor.into_inner())
}
