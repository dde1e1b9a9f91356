//! Sluice - Payload types
//!
//! The shared data types that flow through a sluice channel: the
//! reference-counted [`Payload`] handle, the [`StreamId`] that tags every
//! payload with its logical stream, and the [`PayloadKind`] classification
//! carried by stream metadata.
//!
//! # Design
//!
//! - **Zero-copy fan-out**: `Payload` wraps its byte region in
//!   `bytes::Bytes`, so cloning is O(1) and the same payload can sit in
//!   several output queues at once.
//! - **Opaque bytes**: the engine never inspects payload data. Framing and
//!   decoding are transport and endpoint concerns.
//! - **Small identifiers**: `StreamId` is a 2-byte `Copy` newtype, cheap to
//!   pass around and to use as a hash key.

mod kind;
mod payload;
mod stream_id;

pub use kind::PayloadKind;
pub use payload::Payload;
pub use stream_id::StreamId;
