// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marketplace backend HTTP client for Oficio.
//!
//! Implements [`oficio_core::MarketplaceApi`] over JSON-over-HTTP, covering
//! chats, messages, read receipts, and budgets. Wire casing and timestamp
//! formats are contained in [`wire`]; everything leaving this crate uses the
//! workspace domain types.

pub mod client;
pub mod wire;

pub use client::ApiClient;
