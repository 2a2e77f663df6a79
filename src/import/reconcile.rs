// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Matching externally supplied files to existing rows.
//!
//! Files name their target row with a number prefix (`"3. "`, `"3 "`,
//! `"3_"`, `"3-"`). Archives arrive pre-expanded by an external collaborator
//! and are filtered here: directory entries, hidden paths and system folders
//! are discarded, as is anything without an allowed extension.
//! Reconciliation mismatches are counted and described per file, never fatal
//! to the batch.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::filename::is_allowed_file_type;
use crate::model::{new_image_id, FilePayload, Row, UploadedImage};

/// Extracts the target row number from a filename prefix.
///
/// Patterns are tried in priority order, anchored at the start; the first
/// match wins. Zero is not a valid row number.
pub fn extract_row_number(filename: &str) -> Option<u32> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [r"^(\d+)\.\s+", r"^(\d+)\s+", r"^(\d+)_", r"^(\d+)-"]
            .iter()
            .map(|pattern| Regex::new(pattern).expect("hard-coded pattern is valid"))
            .collect()
    });

    for pattern in patterns {
        if let Some(captures) = pattern.captures(filename) {
            if let Ok(rb) = captures[1].parse::<u32>() {
                if rb > 0 {
                    return Some(rb);
                }
            }
        }
    }

    None
}

/// One loose file handed to the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub payload: FilePayload,
}

/// One entry extracted from an archive by the external unpacker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub dir: bool,
    pub payload: FilePayload,
}

/// Import pipeline input: a loose file or a pre-expanded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportInput {
    File(ImportFile),
    Archive(Vec<ArchiveEntry>),
}

/// Per-batch reconciliation counters and user-visible reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// One matched file queued for `ops::add_image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAddition {
    pub rb: u32,
    pub image: UploadedImage,
}

/// Filters pre-expanded archive entries down to importable files.
pub fn filter_archive_entries(entries: Vec<ArchiveEntry>) -> (Vec<ImportFile>, Vec<String>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for entry in entries {
        if entry.dir || entry.path.starts_with('.') || entry.path.contains("__MACOSX") {
            continue;
        }

        let filename = entry
            .path
            .rsplit('/')
            .next()
            .unwrap_or(entry.path.as_str())
            .to_owned();

        if !is_allowed_file_type(&filename) {
            errors.push(format!("Preskačem datoteku {filename} - nepoznat tip"));
            continue;
        }

        files.push(ImportFile {
            name: filename,
            payload: entry.payload,
        });
    }

    (files, errors)
}

/// Expands a mixed batch of inputs into loose files, dropping everything the
/// import contract excludes.
pub fn flatten_import_inputs(inputs: Vec<ImportInput>) -> (Vec<ImportFile>, Vec<String>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for input in inputs {
        match input {
            ImportInput::Archive(entries) => {
                let (archive_files, archive_errors) = filter_archive_entries(entries);
                files.extend(archive_files);
                errors.extend(archive_errors);
            }
            ImportInput::File(file) => {
                if is_allowed_file_type(&file.name) {
                    files.push(file);
                } else {
                    errors.push(format!("Preskačem datoteku {} - nepoznat tip", file.name));
                }
            }
        }
    }

    (files, errors)
}

/// Matches files to rows by their number prefix.
///
/// Matched files become images whose final filename initially equals the
/// original one; the aggregate's own `add_image` regeneration renames them.
pub fn reconcile(files: Vec<ImportFile>, rows: &[Row]) -> (Vec<RowAddition>, ImportStats) {
    let known_rbs: BTreeSet<u32> = rows.iter().map(Row::rb).collect();

    let mut additions = Vec::new();
    let mut stats = ImportStats::default();

    for file in files {
        let Some(rb) = extract_row_number(&file.name) else {
            stats.errors.push(format!(
                "Nije moguće ekstraktirati redni broj iz datoteke: {}",
                file.name
            ));
            stats.skipped += 1;
            continue;
        };

        if !known_rbs.contains(&rb) {
            stats.errors.push(format!(
                "Nije pronađena stavka s rednim brojem {rb} za datoteku: {}",
                file.name
            ));
            stats.skipped += 1;
            continue;
        }

        let image = UploadedImage::new(
            new_image_id(),
            file.payload,
            file.name.clone(),
            file.name,
        );
        additions.push(RowAddition { rb, image });
        stats.imported += 1;
    }

    (additions, stats)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        extract_row_number, filter_archive_entries, flatten_import_inputs, reconcile,
        ArchiveEntry, ImportFile, ImportInput,
    };
    use crate::model::{FilePayload, Row};

    fn payload() -> FilePayload {
        FilePayload::new(b"bytes".to_vec(), "image/jpeg")
    }

    fn file(name: &str) -> ImportFile {
        ImportFile {
            name: name.to_owned(),
            payload: payload(),
        }
    }

    fn entry(path: &str, dir: bool) -> ArchiveEntry {
        ArchiveEntry {
            path: path.to_owned(),
            dir,
            payload: payload(),
        }
    }

    #[rstest]
    #[case("3. Item.jpg", Some(3))]
    #[case("03_Item.png", Some(3))]
    #[case("12 Ormar.pdf", Some(12))]
    #[case("7-slika.jpeg", Some(7))]
    #[case("Item.jpg", None)]
    #[case("0. Item.jpg", None)]
    #[case("0_Item.jpg", None)]
    #[case("3.Item.jpg", None)]
    #[case("a3. Item.jpg", None)]
    fn row_number_prefix_patterns(#[case] filename: &str, #[case] expected: Option<u32>) {
        assert_eq!(extract_row_number(filename), expected);
    }

    #[test]
    fn dot_space_pattern_wins_over_later_patterns() {
        // "5. " matches the first pattern before "5 " could match the second.
        assert_eq!(extract_row_number("5. 7_x.jpg"), Some(5));
    }

    #[test]
    fn archive_filtering_drops_dirs_hidden_and_system_entries() {
        let (files, errors) = filter_archive_entries(vec![
            entry("photos/", true),
            entry(".hidden/1. a.jpg", false),
            entry("__MACOSX/1. a.jpg", false),
            entry("photos/1. a.jpg", false),
            entry("photos/readme.txt", false),
        ]);

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "1. a.jpg");
        assert_eq!(errors, vec!["Preskačem datoteku readme.txt - nepoznat tip"]);
    }

    #[test]
    fn flatten_mixes_loose_files_and_archives() {
        let (files, errors) = flatten_import_inputs(vec![
            ImportInput::File(file("2. b.png")),
            ImportInput::File(file("notes.docx")),
            ImportInput::Archive(vec![entry("1. a.jpg", false)]),
        ]);

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["2. b.png", "1. a.jpg"]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("notes.docx"));
    }

    #[test]
    fn reconcile_matches_files_to_existing_rows() {
        let rows = vec![Row::new(1, "Stolica"), Row::new(2, "Stol")];

        let (additions, stats) = reconcile(
            vec![file("1. stolica.jpg"), file("2_stol.png")],
            &rows,
        );

        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 0);
        assert!(stats.errors.is_empty());
        assert_eq!(additions[0].rb, 1);
        assert_eq!(additions[1].rb, 2);
        // Renaming is the aggregate's job; the final name starts as the
        // original one.
        assert_eq!(additions[1].image.final_filename(), "2_stol.png");
        assert_eq!(additions[1].image.original_filename(), "2_stol.png");
    }

    #[test]
    fn unparseable_and_unknown_rows_are_skipped_with_reasons() {
        let rows = vec![Row::new(1, "Stolica")];

        let (additions, stats) = reconcile(
            vec![file("bez-broja.jpg"), file("9. nema.jpg")],
            &rows,
        );

        assert!(additions.is_empty());
        assert_eq!(stats.imported, 0);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.errors.len(), 2);
        assert!(stats.errors[0].contains("bez-broja.jpg"));
        assert!(stats.errors[1].contains("rednim brojem 9"));
    }
}
