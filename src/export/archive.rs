// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Archive export assembler.
//!
//! Walks rows in order, optionally stamps every attachment, hands the bytes
//! to the archive sink under the image's final filename and records a
//! manifest row per entry. The sha256 digest covers the exact bytes written
//! into the archive, i.e. it is computed after stamping/recompression.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::media::MediaTransform;
use crate::model::Session;

use super::manifest::{manifest_csv, summary_text, ManifestEntry};
use super::{ArchiveSink, ExportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Stamp every entry and include `manifest.csv`/`summary.txt`. The
    /// "export without stamp" mode turns both off together.
    pub with_stamp: bool,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Image entries written (excluding manifest/summary).
    pub entries: usize,
    pub manifest: Vec<ManifestEntry>,
}

/// Assembles the archive export into `sink`. Fail-fast: the first transform
/// or sink failure aborts the export and the partial sink contents are the
/// caller's to discard.
pub fn generate_archive(
    session: &Session,
    media: &dyn MediaTransform,
    sink: &mut dyn ArchiveSink,
    options: &ArchiveOptions,
) -> Result<ArchiveReport, ExportError> {
    let mut manifest = Vec::new();
    let uploaded_at = options.generated_at.to_rfc3339();

    for row in session.rows() {
        for image in row.images() {
            let payload = if options.with_stamp {
                media
                    .stamp_for_export(image.payload(), row.rb())
                    .map_err(|source| ExportError::Transform {
                        filename: image.original_filename().to_owned(),
                        source,
                    })?
            } else {
                image.payload().clone()
            };

            let sha256 = lowercase_hex_digest(payload.bytes());

            sink.add_entry(image.final_filename(), payload.bytes())
                .map_err(|source| ExportError::Sink {
                    entry: image.final_filename().to_owned(),
                    source,
                })?;

            manifest.push(ManifestEntry {
                rb: row.rb(),
                naziv_artikla: row.article_name().to_owned(),
                brand: row.brand().to_owned(),
                original_filename: image.original_filename().to_owned(),
                final_filename: image.final_filename().to_owned(),
                sha256,
                uploaded_at: uploaded_at.clone(),
                note: String::new(),
            });
        }
    }

    if options.with_stamp {
        let csv = manifest_csv(&manifest);
        sink.add_entry("manifest.csv", csv.as_bytes())
            .map_err(|source| ExportError::Sink {
                entry: "manifest.csv".to_owned(),
                source,
            })?;

        let summary = summary_text(
            session.institution_name(),
            session.rows(),
            manifest.len(),
            &options.generated_at,
        );
        sink.add_entry("summary.txt", summary.as_bytes())
            .map_err(|source| ExportError::Sink {
                entry: "summary.txt".to_owned(),
                source,
            })?;
    }

    Ok(ArchiveReport {
        entries: manifest.len(),
        manifest,
    })
}

fn lowercase_hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
