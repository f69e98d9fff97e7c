// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// AI Valuation Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the ValuationEstimator port and an
// external model API.

pub mod openai;

pub use openai::OpenAiValuationEstimator;
