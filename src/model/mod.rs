// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory model: the session aggregate, rows and attached images.

mod ids;
mod image;
mod row;
mod session;

pub use ids::{new_image_id, Id, IdError, ImageId, ImageIdTag};
pub use image::{FilePayload, UploadedImage, PDF_MEDIA_TYPE};
pub use row::{Row, RowStatus};
pub use session::Session;
