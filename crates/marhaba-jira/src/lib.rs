// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira Cloud ticket tracker integration.

pub mod client;

pub use client::JiraClient;
