// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use super::ids::ImageId;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Binary file content plus its declared media type.
///
/// Bytes are reference-counted so that autosave snapshots and export
/// pipelines can share the payload without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    bytes: Arc<[u8]>,
    media_type: String,
}

impl FilePayload {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn share_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// One attached binary artifact (photo or PDF) belonging to a row.
///
/// `final_filename` is derived state: the aggregate's mutation pass
/// recomputes it from the owning row's `rb`, brand, article name and the
/// image's sibling position. `is_editing` and `thumbnail` are transient and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    id: ImageId,
    payload: FilePayload,
    original_filename: String,
    final_filename: String,
    is_editing: bool,
    thumbnail: Option<String>,
}

impl UploadedImage {
    pub fn new(
        id: ImageId,
        payload: FilePayload,
        original_filename: impl Into<String>,
        final_filename: impl Into<String>,
    ) -> Self {
        Self {
            id,
            payload,
            original_filename: original_filename.into(),
            final_filename: final_filename.into(),
            is_editing: false,
            thumbnail: None,
        }
    }

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    pub fn payload(&self) -> &FilePayload {
        &self.payload
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn final_filename(&self) -> &str {
        &self.final_filename
    }

    pub fn set_final_filename(&mut self, final_filename: impl Into<String>) {
        self.final_filename = final_filename.into();
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn toggle_editing(&mut self) {
        self.is_editing = !self.is_editing;
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, thumbnail: Option<String>) {
        self.thumbnail = thumbnail;
    }

    /// The lower-cased extension used for re-derivation: taken from the
    /// current final filename, falling back to the original upload name.
    pub fn derivation_extension(&self) -> String {
        let extension = crate::filename::file_extension(&self.final_filename);
        if extension.is_empty() {
            crate::filename::file_extension(&self.original_filename)
        } else {
            extension
        }
    }
}
