// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime channel client for Oficio.
//!
//! One WebSocket connection shared by the whole app, with room-scoped
//! subscribe/unsubscribe and typed event decoding. Implements
//! [`oficio_core::RealtimeChannel`]; sessions hold receivers, never the
//! transport.

pub mod events;
pub mod socket;

pub use events::Frame;
pub use socket::SocketManager;
