// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Paginated-document export assembler.
//!
//! Attachments in the selected rb range are rasterized in small fixed-width
//! batches: the batch runs concurrently to bound peak decode/encode cost,
//! then its pages are emitted before the next batch starts, so page order
//! always matches row-then-image order.

use rayon::prelude::*;

use crate::media::{MediaTransform, RasterSettings};
use crate::model::{Row, Session};

use super::{ExportError, PageSink};

/// How many files of one batch are rasterized concurrently.
pub const EXPORT_BATCH_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentQuality {
    High,
    Medium,
    Low,
}

impl DocumentQuality {
    fn image_quality(self) -> f32 {
        match self {
            Self::High => 0.92,
            Self::Medium => 0.85,
            Self::Low => 0.75,
        }
    }

    fn max_dimension(self) -> u32 {
        match self {
            Self::High => 2400,
            Self::Medium => 1800,
            Self::Low => 1200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    pub from_rb: u32,
    pub to_rb: u32,
    pub include_watermark: bool,
    pub quality: DocumentQuality,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentReport {
    /// Source files rasterized.
    pub files: usize,
    /// Pages emitted (a PDF contributes one per page).
    pub pages: usize,
}

/// Assembles the paginated document into `sink`. Fail-fast on the first
/// transform or sink failure; progress reports completed files out of the
/// total in range.
pub fn generate_document(
    session: &Session,
    media: &(dyn MediaTransform + Sync),
    sink: &mut dyn PageSink,
    options: &DocumentOptions,
    mut on_progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Result<DocumentReport, ExportError> {
    let in_range: Vec<&Row> = session
        .rows()
        .iter()
        .filter(|row| {
            row.rb() >= options.from_rb && row.rb() <= options.to_rb && !row.images().is_empty()
        })
        .collect();

    let total_files: usize = in_range.iter().map(|row| row.images().len()).sum();
    if total_files == 0 {
        return Err(ExportError::EmptyRange {
            from_rb: options.from_rb,
            to_rb: options.to_rb,
        });
    }

    let settings = RasterSettings {
        include_watermark: options.include_watermark,
        max_dimension: options.quality.max_dimension(),
        image_quality: options.quality.image_quality(),
    };

    let mut report = DocumentReport::default();

    for row in in_range {
        for batch in row.images().chunks(EXPORT_BATCH_WIDTH) {
            let rasterized = batch
                .par_iter()
                .map(|image| {
                    media
                        .rasterize(image.payload(), row.rb(), &settings)
                        .map_err(|source| ExportError::Transform {
                            filename: image.original_filename().to_owned(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            for pages in rasterized {
                for page in &pages {
                    sink.add_page(page).map_err(|source| ExportError::Sink {
                        entry: format!("stranica {}", report.pages + 1),
                        source,
                    })?;
                    report.pages += 1;
                }
                report.files += 1;
                if let Some(on_progress) = on_progress.as_deref_mut() {
                    on_progress(report.files, total_files);
                }
            }
        }
    }

    Ok(report)
}
