// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer: persistence, blob storage and external provider
//! adapters behind the domain ports.

pub mod db;
pub mod llm;
pub mod rc_client;
pub mod repositories;
pub mod storage;
