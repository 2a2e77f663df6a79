// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Validation of pre-parsed spreadsheet rows.
//!
//! Workbook decoding is an external collaborator; this module receives the
//! data rows that follow the two header rows and applies the import
//! contract: column A is a unique positive integer `rb`, column B a
//! non-blank article name, at most [`MAX_SHEET_ROWS`] rows survive.
//! Validation failures are collected, not fatal; the valid subset proceeds.

use crate::model::Row;

/// Maximum number of accepted cost-sheet rows; the excess is truncated with
/// a warning.
pub const MAX_SHEET_ROWS: usize = 200;

/// Header rows the workbook decoder skips before handing data rows here.
/// Positional error messages account for them (and 1-based counting).
pub const SKIPPED_HEADER_ROWS: usize = 2;

/// One decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

/// Outcome of a sheet import: the accepted rows plus the user-visible
/// validation errors for everything rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    pub rows: Vec<Row>,
    pub errors: Vec<String>,
}

/// Builds rows (no images, empty brand) from decoded data rows.
pub fn build_rows(data_rows: &[Vec<CellValue>]) -> ParsedSheet {
    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut used_rb = std::collections::BTreeSet::new();

    for (index, cells) in data_rows.iter().enumerate() {
        if cells.len() < 2 {
            continue;
        }
        let position = index + SKIPPED_HEADER_ROWS + 1;

        let Some(rb) = integer_rb(&cells[0]) else {
            errors.push(format!("Red {position}: Redni broj mora biti cijeli broj"));
            continue;
        };

        if !used_rb.insert(rb) {
            errors.push(format!("Red {position}: Duplikat rednog broja {rb}"));
            continue;
        }

        let article_name = match &cells[1] {
            CellValue::Text(text) if !text.trim().is_empty() => text.trim().to_owned(),
            _ => {
                errors.push(format!("Red {position}: Naziv artikla je obavezan"));
                continue;
            }
        };

        rows.push(Row::new(rb, article_name));
    }

    if rows.len() > MAX_SHEET_ROWS {
        errors.push(format!(
            "Troškovnik sadrži {} stavki. Maksimalno je dozvoljeno {MAX_SHEET_ROWS}.",
            rows.len()
        ));
        rows.truncate(MAX_SHEET_ROWS);
    }

    ParsedSheet { rows, errors }
}

fn integer_rb(cell: &CellValue) -> Option<u32> {
    let CellValue::Number(number) = cell else {
        return None;
    };
    if number.fract() != 0.0 || *number < 1.0 || *number > f64::from(u32::MAX) {
        return None;
    }
    Some(*number as u32)
}

#[cfg(test)]
mod tests {
    use super::{build_rows, CellValue, MAX_SHEET_ROWS};

    fn row(rb: f64, name: &str) -> Vec<CellValue> {
        vec![CellValue::Number(rb), CellValue::Text(name.to_owned())]
    }

    #[test]
    fn accepts_well_formed_rows() {
        let parsed = build_rows(&[row(1.0, "Stolica"), row(2.0, "  Stol  ")]);

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].rb(), 1);
        assert_eq!(parsed.rows[1].article_name(), "Stol");
        assert!(parsed.rows[1].brand().is_empty());
        assert!(parsed.rows[1].images().is_empty());
    }

    #[test]
    fn duplicate_rb_keeps_the_first_row_and_reports_once() {
        let parsed = build_rows(&[
            row(1.0, "Stolica"),
            row(2.0, "Stol"),
            row(2.0, "Stol2"),
        ]);

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.errors, vec!["Red 5: Duplikat rednog broja 2"]);
        assert_eq!(parsed.rows[1].article_name(), "Stol");
    }

    #[test]
    fn non_integer_and_non_positive_rb_are_rejected() {
        let parsed = build_rows(&[
            row(1.5, "Stolica"),
            row(0.0, "Stol"),
            vec![CellValue::Text("tri".to_owned()), CellValue::Text("Ormar".to_owned())],
        ]);

        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.errors.len(), 3);
        assert!(parsed
            .errors
            .iter()
            .all(|error| error.contains("Redni broj mora biti cijeli broj")));
    }

    #[test]
    fn blank_article_name_is_rejected_with_its_position() {
        let parsed = build_rows(&[
            row(1.0, "Stolica"),
            vec![CellValue::Number(2.0), CellValue::Text("   ".to_owned())],
            vec![CellValue::Number(3.0), CellValue::Empty],
        ]);

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(
            parsed.errors,
            vec![
                "Red 4: Naziv artikla je obavezan",
                "Red 5: Naziv artikla je obavezan"
            ]
        );
    }

    #[test]
    fn short_rows_are_skipped_silently() {
        let parsed = build_rows(&[Vec::new(), vec![CellValue::Number(1.0)], row(2.0, "Stol")]);

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].rb(), 2);
    }

    #[test]
    fn excess_rows_are_truncated_with_a_warning() {
        let data: Vec<_> = (1..=MAX_SHEET_ROWS as u32 + 5)
            .map(|rb| row(f64::from(rb), "Artikl"))
            .collect();

        let parsed = build_rows(&data);

        assert_eq!(parsed.rows.len(), MAX_SHEET_ROWS);
        assert_eq!(
            parsed.errors,
            vec!["Troškovnik sadrži 205 stavki. Maksimalno je dozvoljeno 200."]
        );
    }
}
