// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Case aggregate, workflow state machine and the ports the application
//! layer depends on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits; no I/O

pub mod case;
pub mod config;
pub mod estimator;
pub mod mirror;
pub mod rc;
pub mod repository;
pub mod section;
pub mod sections;
pub mod storage;
pub mod workflow;
