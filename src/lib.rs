// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Triptych — three-way diagram synchronization.
//!
//! Keeps a live collaborative shape store, an OCIF interchange file and a
//! JSON Canvas file mutually consistent, with stateless converters
//! between all representations and an SVG renderer on top.

pub mod format;
pub mod model;
pub mod render;
pub mod server;
pub mod sync;
pub mod validate;
