// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Manifest and summary records for the archive export.
//!
//! The CSV layout is bit-relevant for downstream consumers: fixed header,
//! text fields double-quote-wrapped with internal quotes doubled, numeric
//! and digest fields bare.

use chrono::{DateTime, Utc};

use crate::model::Row;

const MANIFEST_HEADER: &str =
    "rb,naziv_artikla,brand,original_filename,final_filename,sha256,uploaded_at,note";

/// One manifest row, mirroring one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub rb: u32,
    pub naziv_artikla: String,
    pub brand: String,
    pub original_filename: String,
    pub final_filename: String,
    pub sha256: String,
    pub uploaded_at: String,
    pub note: String,
}

/// Renders `manifest.csv`.
pub fn manifest_csv(entries: &[ManifestEntry]) -> String {
    let mut out = String::from(MANIFEST_HEADER);
    let mut rb_buffer = itoa::Buffer::new();

    for entry in entries {
        out.push('\n');
        out.push_str(rb_buffer.format(entry.rb));
        out.push(',');
        push_quoted(&mut out, &entry.naziv_artikla);
        out.push(',');
        push_quoted(&mut out, &entry.brand);
        out.push(',');
        push_quoted(&mut out, &entry.original_filename);
        out.push(',');
        push_quoted(&mut out, &entry.final_filename);
        out.push(',');
        out.push_str(&entry.sha256);
        out.push(',');
        out.push_str(&entry.uploaded_at);
        out.push(',');
        push_quoted(&mut out, &entry.note);
    }

    out
}

fn push_quoted(out: &mut String, field: &str) {
    out.push('"');
    for ch in field.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Renders `summary.txt`: institution, generation timestamp, counts and the
/// rows still lacking images.
pub fn summary_text(
    institution_name: &str,
    rows: &[Row],
    total_images: usize,
    generated_at: &DateTime<Utc>,
) -> String {
    let total_rows = rows.len();
    let rows_with_images = rows.iter().filter(|row| !row.images().is_empty()).count();
    let rows_without_images = total_rows - rows_with_images;

    let mut out = String::new();
    out.push_str("DEKLARACIJE - SAŽETAK\n");
    out.push_str("========================\n\n");
    out.push_str(&format!("Naziv ustanove: {institution_name}\n"));
    out.push_str(&format!(
        "Datum generiranja: {}\n\n",
        generated_at.format("%d.%m.%Y. %H:%M:%S")
    ));
    out.push_str("STATISTIKE:\n");
    out.push_str(&format!("- Ukupno stavki u troškovniku: {total_rows}\n"));
    out.push_str(&format!("- Stavki s fotografijama: {rows_with_images}\n"));
    out.push_str(&format!("- Stavki bez fotografija: {rows_without_images}\n"));
    out.push_str(&format!("- Ukupno fotografija: {total_images}\n"));

    if rows_without_images > 0 {
        out.push_str("\nSTAVKE BEZ FOTOGRAFIJA:\n");
        for row in rows.iter().filter(|row| row.images().is_empty()) {
            out.push_str(&format!("- {}. {}\n", row.rb(), row.article_name()));
        }
    }

    out.push_str("\nDATOTEKE U ARHIVI:\n");
    out.push_str("- manifest.csv (popis svih datoteka s metapodacima)\n");
    out.push_str(&format!("- {total_images} fotografija/dokumenata\n"));
    out.push_str("- summary.txt (ovaj dokument)\n\n");
    out.push_str("Generirano pomoću Deklaracije App\n");

    out
}
