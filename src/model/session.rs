// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::row::Row;

/// The top-level container the application runs against.
///
/// Explicitly constructed and explicitly owned; there is no module-level
/// singleton. Lifecycle: empty → populated (spreadsheet import or storage
/// restore) → mutated in place → optionally reset to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    institution_name: String,
    rows: Vec<Row>,
    errors: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn institution_name(&self) -> &str {
        &self.institution_name
    }

    pub fn set_institution_name(&mut self, name: impl Into<String>) {
        self.institution_name = name.into();
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn find_row(&self, rb: u32) -> Option<&Row> {
        self.rows.iter().find(|row| row.rb() == rb)
    }

    pub fn find_row_mut(&mut self, rb: u32) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.rb() == rb)
    }

    /// Accumulated user-visible validation/reconciliation errors.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Resets the session to the empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
