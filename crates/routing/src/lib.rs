//! Sluice - Routing
//!
//! The many-to-many relation between connection names and stream ids,
//! queried from both directions by the channel engine.
//!
//! # Architecture
//!
//! ```text
//! [Inputs]                [RoutingMap]                [Outputs]
//!    cam_in ──┐                                    ┌──→ mix_out
//!    mic_in ──┼──→ (name, stream id) pairs ────────┼──→ monitor_out
//!             │     two hashed indexes, O(matches) └──→ record_out
//! ```
//!
//! # Key Design
//!
//! - **Built once**: all pairs are added during channel configuration;
//!   the map is read-only on the hot path, so lookups take no locks
//! - **Two indexes**: connection→streams and stream→connections are
//!   maintained together, so neither direction pays a scan
//! - **Deterministic order**: lookups return entries in bind order
//! - **Single input per stream**: `bind` rejects a second input-direction
//!   connection for a stream that already has one

mod error;
mod map;

pub use error::{Result, RoutingError};
pub use map::{Direction, DirectionFilter, RoutingMap};
