// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible model integration for classification, translation, and
//! ticket drafting.

pub mod client;

pub use client::OpenAiModel;
