// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Durable persistence for the session aggregate.

mod state_folder;

pub use state_folder::{
    BinaryMeta, BinaryRecord, ImageMeta, PersistedState, RestoredState, RowMeta, StateFolder,
    StateMeta, StoreError, StoredBinary, WriteDurability,
};
