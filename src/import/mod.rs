// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Inbound data paths: spreadsheet row validation and matching externally
//! supplied files to existing rows.

mod reconcile;
mod sheet;

pub use reconcile::{
    extract_row_number, filter_archive_entries, flatten_import_inputs, reconcile, ArchiveEntry,
    ImportFile, ImportInput, ImportStats, RowAddition,
};
pub use sheet::{build_rows, CellValue, ParsedSheet, MAX_SHEET_ROWS, SKIPPED_HEADER_ROWS};
