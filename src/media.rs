// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! External media collaborators.
//!
//! Watermarking, stamping, rasterization and thumbnailing are pixel work the
//! engine never does itself; it consumes them as "transform file → file" and
//! "rasterize file → pages" functions behind [`MediaTransform`].

use std::fmt;

use crate::model::FilePayload;

/// Error surfaced by a media collaborator. Carries the underlying message
/// verbatim; a single failing transform fails the enclosing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransformError {}

/// One rasterized, export-ready page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterPage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Rasterization knobs handed to the collaborator per export run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSettings {
    pub include_watermark: bool,
    pub max_dimension: u32,
    pub image_quality: f32,
}

pub trait MediaTransform {
    /// Burns the row watermark into image pixels at attach time.
    fn watermark_image(&self, payload: &FilePayload, rb: u32)
        -> Result<FilePayload, TransformError>;

    /// Stamps and recompresses a file for archive export.
    fn stamp_for_export(&self, payload: &FilePayload, rb: u32)
        -> Result<FilePayload, TransformError>;

    /// Rasterizes any attachment into pages: one for an image, one per page
    /// for a PDF.
    fn rasterize(
        &self,
        payload: &FilePayload,
        rb: u32,
        settings: &RasterSettings,
    ) -> Result<Vec<RasterPage>, TransformError>;

    /// Produces a small preview payload. Callers treat failure as
    /// best-effort and carry on without one.
    fn thumbnail(&self, payload: &FilePayload) -> Result<FilePayload, TransformError>;
}

/// A do-nothing collaborator: payloads pass through untouched and every file
/// rasterizes to a single page. Used by tests and benches, and usable as a
/// stand-in wherever no renderer is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransform;

impl MediaTransform for PassthroughTransform {
    fn watermark_image(
        &self,
        payload: &FilePayload,
        _rb: u32,
    ) -> Result<FilePayload, TransformError> {
        Ok(payload.clone())
    }

    fn stamp_for_export(
        &self,
        payload: &FilePayload,
        _rb: u32,
    ) -> Result<FilePayload, TransformError> {
        Ok(payload.clone())
    }

    fn rasterize(
        &self,
        payload: &FilePayload,
        _rb: u32,
        settings: &RasterSettings,
    ) -> Result<Vec<RasterPage>, TransformError> {
        Ok(vec![RasterPage {
            bytes: payload.bytes().to_vec(),
            width: settings.max_dimension,
            height: settings.max_dimension,
        }])
    }

    fn thumbnail(&self, payload: &FilePayload) -> Result<FilePayload, TransformError> {
        Ok(payload.clone())
    }
}
