// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deklaracije — cost-sheet declaration photo engine.
//!
//! Core of a single-user, client-resident tool: attach photos/PDFs to
//! cost-sheet rows, derive collision-free export filenames, mirror state to
//! a durable two-namespace store through a debounced autosave, and assemble
//! archive/document exports. UI, workbook decoding, pixel transforms and
//! archive/document byte formats are external collaborators.

pub mod app;
pub mod autosave;
pub mod export;
pub mod filename;
pub mod import;
pub mod media;
pub mod model;
pub mod ops;
pub mod store;
