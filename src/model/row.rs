// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::image::UploadedImage;

/// Completion state of a row, derived from its image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Incomplete,
    Complete,
}

/// One cost-sheet line item.
///
/// `rb` is the row's 1-based sequential identifier; it is simultaneously the
/// row's identity, its display/sort key and the storage key of its images.
/// Rows are only ever created in bulk from a spreadsheet parse; mid-session
/// mutations renumber but never insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    rb: u32,
    article_name: String,
    brand: String,
    images: Vec<UploadedImage>,
}

impl Row {
    pub fn new(rb: u32, article_name: impl Into<String>) -> Self {
        Self {
            rb,
            article_name: article_name.into(),
            brand: String::new(),
            images: Vec::new(),
        }
    }

    pub fn rb(&self) -> u32 {
        self.rb
    }

    pub fn set_rb(&mut self, rb: u32) {
        self.rb = rb;
    }

    pub fn article_name(&self) -> &str {
        &self.article_name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn set_brand(&mut self, brand: impl Into<String>) {
        self.brand = brand.into();
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut Vec<UploadedImage> {
        &mut self.images
    }

    /// `Complete` iff at least one image is attached. Derived, never set.
    pub fn status(&self) -> RowStatus {
        if self.images.is_empty() {
            RowStatus::Incomplete
        } else {
            RowStatus::Complete
        }
    }
}
