// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The application workspace: one explicitly owned state object wiring the
//! session aggregate to the durable store through the autosave scheduler.
//!
//! Every mutating call goes through here so that a durable write gets
//! scheduled; `clear_storage` is the one place ordering matters (cancel the
//! scheduler before clearing, or a stale flush resurrects deleted data).

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::autosave::{AutosaveManager, DEFAULT_QUIET_INTERVAL};
use crate::filename::{derive_filename, file_extension, is_allowed_file_type};
use crate::import::{
    flatten_import_inputs, reconcile, ImportFile, ImportInput, ImportStats, ParsedSheet,
};
use crate::media::MediaTransform;
use crate::model::{new_image_id, FilePayload, ImageId, Session, UploadedImage};
use crate::ops::{self, OpOutcome, RowPatch};
use crate::store::{PersistedState, StateFolder, StoreError};

#[derive(Debug)]
pub struct Workspace {
    session: Session,
    folder: StateFolder,
    autosave: AutosaveManager,
}

impl Workspace {
    pub fn new(folder: StateFolder) -> Self {
        Self::with_quiet_interval(folder, DEFAULT_QUIET_INTERVAL)
    }

    pub fn with_quiet_interval(folder: StateFolder, quiet_interval: Duration) -> Self {
        let autosave = AutosaveManager::new(folder.clone()).with_quiet_interval(quiet_interval);
        Self {
            session: Session::new(),
            folder,
            autosave,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn folder(&self) -> &StateFolder {
        &self.folder
    }

    pub fn errors(&self) -> &[String] {
        self.session.errors()
    }

    pub fn clear_errors(&mut self) {
        self.session.clear_errors();
    }

    /// Rebuilds the session from the durable store. Returns whether stored
    /// state existed. Does not schedule an autosave.
    pub fn restore(&mut self) -> Result<bool, StoreError> {
        let Some(restored) = self.folder.load_state()? else {
            return Ok(false);
        };

        self.session.set_institution_name(restored.institution_name);
        *self.session.rows_mut() = restored.rows;
        Ok(true)
    }

    pub fn set_institution_name(&mut self, name: impl Into<String>) {
        self.session.set_institution_name(name);
        self.schedule_autosave();
    }

    /// Replaces the row collection with a freshly parsed sheet, carrying its
    /// validation errors into the user-visible list.
    pub fn load_sheet(&mut self, parsed: ParsedSheet) {
        for error in &parsed.errors {
            self.session.push_error(error.clone());
        }
        ops::set_rows(&mut self.session, parsed.rows);
        self.schedule_autosave();
    }

    pub fn set_brand(&mut self, rb: u32, brand: impl Into<String>) -> OpOutcome {
        let outcome = ops::update_row(
            &mut self.session,
            rb,
            RowPatch {
                brand: Some(brand.into()),
            },
        );
        if outcome.matched {
            self.schedule_autosave();
        }
        outcome
    }

    /// Attaches uploaded files to a row: per-file type check, watermark
    /// transform, filename derivation, best-effort thumbnail, then
    /// `add_image`. Per-file failures are recorded and skipped; the batch
    /// continues. Returns the number attached.
    pub fn attach_files(
        &mut self,
        rb: u32,
        files: Vec<ImportFile>,
        media: &dyn MediaTransform,
    ) -> usize {
        let mut attached = 0;

        for file in files {
            if !is_allowed_file_type(&file.name) {
                self.session.push_error(format!(
                    "Datoteka {} nije dozvoljena. Dozvoljeni tipovi: JPG, PNG, PDF",
                    file.name
                ));
                continue;
            }

            let watermarked = match media.watermark_image(&file.payload, rb) {
                Ok(payload) => payload,
                Err(err) => {
                    self.session
                        .push_error(format!("Greška pri obradi datoteke {}: {err}", file.name));
                    continue;
                }
            };

            let extension = file_extension(&file.name);
            let final_filename = match self.session.find_row(rb) {
                Some(row) => {
                    let sibling_count = row.images().len();
                    let sibling_index = if sibling_count > 0 {
                        Some(sibling_count)
                    } else {
                        None
                    };
                    derive_filename(rb, row.brand(), row.article_name(), &extension, sibling_index)
                }
                None => file.name.clone(),
            };

            let mut image =
                UploadedImage::new(new_image_id(), watermarked, file.name.clone(), final_filename);
            image.set_thumbnail(thumbnail_data_url(media, image.payload()));

            if ops::add_image(&mut self.session, rb, image).matched {
                attached += 1;
            }
        }

        if attached > 0 {
            self.schedule_autosave();
        }
        attached
    }

    /// Runs the import pipeline: expand/filter inputs, reconcile against the
    /// current rows, attach what matched. Mismatches are counted per file
    /// and never fatal.
    pub fn import_files(
        &mut self,
        inputs: Vec<ImportInput>,
        media: &dyn MediaTransform,
    ) -> ImportStats {
        let (files, flatten_errors) = flatten_import_inputs(inputs);
        for error in &flatten_errors {
            self.session.push_error(error.clone());
        }

        let (additions, stats) = reconcile(files, self.session.rows());
        for error in &stats.errors {
            self.session.push_error(error.clone());
        }

        let mut imported = 0;
        for addition in additions {
            let mut image = addition.image;
            image.set_thumbnail(thumbnail_data_url(media, image.payload()));
            if ops::add_image(&mut self.session, addition.rb, image).matched {
                imported += 1;
            }
        }

        if imported > 0 {
            self.schedule_autosave();
        }
        stats
    }

    /// Removes an image from the aggregate and best-effort deletes its
    /// stored payload; a failed delete is logged, not fatal, since the next
    /// clear or orphan-dropping load reconciles it.
    pub fn remove_image(&mut self, rb: u32, image_id: &ImageId) -> OpOutcome {
        let outcome = ops::remove_image(&mut self.session, rb, image_id);
        if outcome.matched {
            if let Err(err) = self.folder.delete_binary(image_id) {
                tracing::warn!(
                    image_id = %image_id,
                    error = %err,
                    "deleting stored image failed; record stays until the next clear"
                );
            }
            self.schedule_autosave();
        }
        outcome
    }

    pub fn rename_image(
        &mut self,
        rb: u32,
        image_id: &ImageId,
        new_filename: impl Into<String>,
    ) -> OpOutcome {
        let outcome = ops::rename_image(&mut self.session, rb, image_id, new_filename);
        if outcome.matched {
            self.schedule_autosave();
        }
        outcome
    }

    pub fn toggle_image_edit(&mut self, rb: u32, image_id: &ImageId) -> OpOutcome {
        let outcome = ops::toggle_image_edit(&mut self.session, rb, image_id);
        if outcome.matched {
            self.schedule_autosave();
        }
        outcome
    }

    pub fn reorder_rows(&mut self, from_index: usize, to_index: usize) -> OpOutcome {
        let outcome = ops::reorder_rows(&mut self.session, from_index, to_index);
        if outcome.matched {
            self.schedule_autosave();
        }
        outcome
    }

    /// Forces any pending autosave to disk.
    pub fn flush(&self) {
        self.autosave.flush();
    }

    /// Wipes both store namespaces and resets the session.
    ///
    /// The scheduler is cancelled first and the cancel waits out an
    /// in-flight write, so a mutation made just before this call cannot
    /// reappear in the store afterwards.
    pub fn clear_storage(&mut self) -> Result<(), StoreError> {
        self.autosave.cancel();
        self.folder.clear_metadata()?;
        self.folder.clear_binaries()?;
        self.session.reset();
        Ok(())
    }

    pub fn has_stored_data(&self) -> bool {
        self.folder.has_stored_data()
    }

    pub fn stored_timestamp(&self) -> Option<i64> {
        self.folder.stored_timestamp()
    }

    pub fn storage_usage(&self) -> Result<u64, StoreError> {
        self.folder.storage_usage()
    }

    fn schedule_autosave(&self) {
        self.autosave.schedule(PersistedState::snapshot(&self.session));
    }
}

fn thumbnail_data_url(media: &dyn MediaTransform, payload: &FilePayload) -> Option<String> {
    match media.thumbnail(payload) {
        Ok(thumbnail) => Some(format!(
            "data:{};base64,{}",
            thumbnail.media_type(),
            BASE64_STANDARD.encode(thumbnail.bytes())
        )),
        Err(err) => {
            tracing::debug!(error = %err, "thumbnail generation failed; continuing without one");
            None
        }
    }
}
