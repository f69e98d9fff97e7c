// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Presentation layer: axum router, request extractors and the HTTP
//! mapping of service errors.

pub mod api;
pub mod error;
pub mod upload;

pub use api::{app, router};
