// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Export assemblers.
//!
//! Both assemblers traverse the aggregate in row order and hand bytes to a
//! caller-provided sink; the archive/document byte formats themselves live
//! behind those sinks. A failure in any single file's transform aborts the
//! whole export; no partial artifact is returned.

mod archive;
mod document;
mod manifest;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::media::{RasterPage, TransformError};

pub use archive::{generate_archive, ArchiveOptions, ArchiveReport};
pub use document::{
    generate_document, DocumentOptions, DocumentQuality, DocumentReport, EXPORT_BATCH_WIDTH,
};
pub use manifest::{manifest_csv, summary_text, ManifestEntry};

/// Error surfaced by an export sink (archive writer, document writer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SinkError {}

/// Receives named archive entries, in row-then-image order.
pub trait ArchiveSink {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Receives rasterized pages, in row-then-image-then-page order.
pub trait PageSink {
    fn add_page(&mut self, page: &RasterPage) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// The selected rb range contains no attached files.
    EmptyRange { from_rb: u32, to_rb: u32 },
    Transform {
        filename: String,
        source: TransformError,
    },
    Sink {
        entry: String,
        source: SinkError,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRange { .. } => {
                f.write_str("Nema slika ili PDF dokumenata u odabranom rasponu")
            }
            Self::Transform { filename, source } => {
                write!(f, "Greška pri obradi datoteke {filename}: {source}")
            }
            Self::Sink { entry, source } => {
                write!(f, "Greška pri zapisivanju {entry}: {source}")
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EmptyRange { .. } => None,
            Self::Transform { source, .. } => Some(source),
            Self::Sink { source, .. } => Some(source),
        }
    }
}

/// Suggested download name for an archive export:
/// `{YYYY-MM-DD}_{institution}_deklaracije.zip`.
pub fn archive_download_filename(institution_name: &str, generated_at: &DateTime<Utc>) -> String {
    format!(
        "{}_{}_deklaracije.zip",
        generated_at.format("%Y-%m-%d"),
        sanitize_download_name(institution_name)
    )
}

/// Suggested download name for a document export:
/// `{YYYY-MM-DD}_{institution}_items_{from}-{to}.pdf`.
pub fn document_download_filename(
    institution_name: &str,
    generated_at: &DateTime<Utc>,
    from_rb: u32,
    to_rb: u32,
) -> String {
    format!(
        "{}_{}_items_{from_rb}-{to_rb}.pdf",
        generated_at.format("%Y-%m-%d"),
        sanitize_download_name(institution_name)
    )
}

fn sanitize_download_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|ch| {
            ch.is_ascii_alphanumeric()
                || ch.is_whitespace()
                || matches!(ch, 'č' | 'ć' | 'đ' | 'š' | 'ž' | 'Č' | 'Ć' | 'Đ' | 'Š' | 'Ž')
        })
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut pending_space = false;
    for ch in kept.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push('_');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}
