// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for the row/image aggregate.
//!
//! Every operation that changes row identity, brand text, the image set or
//! row order re-derives the affected final filenames through the codec in
//! [`crate::filename`]. All operations are synchronous and atomic with
//! respect to each other; operations addressing an unknown `rb` or image id
//! are deliberate no-ops, surfaced through [`OpOutcome`] and a debug log
//! rather than an error.

use crate::filename::derive_filename;
use crate::model::{ImageId, Row, Session, UploadedImage};

/// Result of applying an aggregate operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpOutcome {
    /// Whether the addressed row/image existed and the operation took effect.
    pub matched: bool,
    /// How many final filenames were re-derived as a consequence.
    pub regenerated: usize,
}

/// Partial update for [`update_row`]. The article name is immutable after
/// import, so only the brand is patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    pub brand: Option<String>,
}

/// Replaces the entire row collection, dropping any previous rows and their
/// images wholesale. Used after a fresh spreadsheet import.
pub fn set_rows(session: &mut Session, rows: Vec<Row>) {
    *session.rows_mut() = rows;
}

/// Merges `patch` into the row matching `rb`. A brand change on a row with
/// images re-derives every filename in that row using the current sibling
/// ordering.
pub fn update_row(session: &mut Session, rb: u32, patch: RowPatch) -> OpOutcome {
    let Some(row) = session.find_row_mut(rb) else {
        return unmatched(rb, "update_row");
    };

    let mut outcome = OpOutcome {
        matched: true,
        regenerated: 0,
    };

    if let Some(brand) = patch.brand {
        let changed = row.brand() != brand;
        row.set_brand(brand);
        if changed && !row.images().is_empty() {
            outcome.regenerated = regenerate_row_filenames(row);
        }
    }

    outcome
}

/// Appends `image` to the matching row.
///
/// Filenames are re-derived only when the row ends up with two or more
/// images; a lone image keeps whatever final filename it arrived with (the
/// upload flow derives it up front, the import flow leaves the original name
/// until a sibling triggers regeneration).
pub fn add_image(session: &mut Session, rb: u32, image: UploadedImage) -> OpOutcome {
    let Some(row) = session.find_row_mut(rb) else {
        return unmatched(rb, "add_image");
    };

    row.images_mut().push(image);
    let regenerated = if row.images().len() > 1 {
        regenerate_row_filenames(row)
    } else {
        0
    };

    OpOutcome {
        matched: true,
        regenerated,
    }
}

/// Removes the image with `image_id` from the matching row and re-derives
/// the remaining filenames by their new positions. The row's status flips to
/// incomplete automatically when the list empties (status is derived).
pub fn remove_image(session: &mut Session, rb: u32, image_id: &ImageId) -> OpOutcome {
    let Some(row) = session.find_row_mut(rb) else {
        return unmatched(rb, "remove_image");
    };

    let before = row.images().len();
    row.images_mut().retain(|image| image.id() != image_id);
    let removed = row.images().len() != before;
    if !removed {
        tracing::debug!(rb, image_id = %image_id, "remove_image addressed an unknown image id; ignoring");
    }

    let regenerated = regenerate_row_filenames(row);

    OpOutcome {
        matched: removed,
        regenerated,
    }
}

/// Sets an image's final filename to a user-supplied value.
///
/// Best-effort, last-write-wins: the next structural regeneration in the row
/// (sibling add/remove, brand edit, row renumber) overwrites it.
pub fn rename_image(
    session: &mut Session,
    rb: u32,
    image_id: &ImageId,
    new_filename: impl Into<String>,
) -> OpOutcome {
    let Some(row) = session.find_row_mut(rb) else {
        return unmatched(rb, "rename_image");
    };

    let Some(image) = row
        .images_mut()
        .iter_mut()
        .find(|image| image.id() == image_id)
    else {
        tracing::debug!(rb, image_id = %image_id, "rename_image addressed an unknown image id; ignoring");
        return OpOutcome::default();
    };

    image.set_final_filename(new_filename);
    OpOutcome {
        matched: true,
        regenerated: 0,
    }
}

/// Flips an image's transient editing flag.
pub fn toggle_image_edit(session: &mut Session, rb: u32, image_id: &ImageId) -> OpOutcome {
    let Some(row) = session.find_row_mut(rb) else {
        return unmatched(rb, "toggle_image_edit");
    };

    let Some(image) = row
        .images_mut()
        .iter_mut()
        .find(|image| image.id() == image_id)
    else {
        tracing::debug!(rb, image_id = %image_id, "toggle_image_edit addressed an unknown image id; ignoring");
        return OpOutcome::default();
    };

    image.toggle_editing();
    OpOutcome {
        matched: true,
        regenerated: 0,
    }
}

/// Moves the row at `from_index` to `to_index` (splice semantics, not swap),
/// then reassigns `rb = position + 1` over the whole list and re-derives
/// every filename in every row.
pub fn reorder_rows(session: &mut Session, from_index: usize, to_index: usize) -> OpOutcome {
    if from_index == to_index {
        return OpOutcome::default();
    }
    if from_index >= session.rows().len() {
        tracing::debug!(from_index, "reorder_rows addressed an out-of-range index; ignoring");
        return OpOutcome::default();
    }

    let row = session.rows_mut().remove(from_index);
    let to_index = to_index.min(session.rows().len());
    session.rows_mut().insert(to_index, row);

    let mut regenerated = 0;
    for (index, row) in session.rows_mut().iter_mut().enumerate() {
        row.set_rb(index as u32 + 1);
        regenerated += regenerate_row_filenames(row);
    }

    OpOutcome {
        matched: true,
        regenerated,
    }
}

/// Re-derives every final filename in `row` from its current `rb`, brand,
/// article name and sibling ordering. Returns the number of images touched.
pub(crate) fn regenerate_row_filenames(row: &mut Row) -> usize {
    let rb = row.rb();
    let brand = row.brand().to_owned();
    let article_name = row.article_name().to_owned();
    let count = row.images().len();

    for index in 0..count {
        let image = &mut row.images_mut()[index];
        let extension = image.derivation_extension();
        let sibling_index = if count > 1 { Some(index) } else { None };
        image.set_final_filename(derive_filename(
            rb,
            &brand,
            &article_name,
            &extension,
            sibling_index,
        ));
    }

    count
}

fn unmatched(rb: u32, op: &'static str) -> OpOutcome {
    tracing::debug!(rb, op, "aggregate op targeted an unknown row; ignoring");
    OpOutcome::default()
}
