//! Routing map for stream↔connection lookup in both directions
//!
//! The map is populated once during channel configuration. All
//! allocations happen at bind time - the dispatch path only reads.

use std::collections::HashMap;

use serde::Deserialize;
use sluice_payload::StreamId;

use crate::error::{Result, RoutingError};

/// Direction of a connection relative to the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Payloads flow from the connection into the channel
    In,
    /// Payloads flow from the channel out of the connection
    Out,
}

impl Direction {
    /// Get the lowercase name of this direction
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction filter for stream→connection lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionFilter {
    /// Input connections only
    In,
    /// Output connections only
    Out,
    /// Both directions
    Any,
}

impl DirectionFilter {
    /// Check whether a connection direction passes this filter
    #[inline]
    pub fn matches(self, direction: Direction) -> bool {
        match self {
            Self::In => direction == Direction::In,
            Self::Out => direction == Direction::Out,
            Self::Any => true,
        }
    }
}

impl From<Direction> for DirectionFilter {
    #[inline]
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => Self::In,
            Direction::Out => Self::Out,
        }
    }
}

/// Per-connection entry: direction plus bound streams in bind order
#[derive(Debug, Clone)]
struct ConnectionEntry {
    direction: Direction,
    streams: Vec<StreamId>,
}

/// Bidirectional many-to-many index between connections and streams
///
/// # Design
///
/// Two hashed indexes are maintained together: connection name → stream
/// ids and stream id → connection names. Lookups cost O(matches) and are
/// independent of the total relation size. Result order is bind order,
/// so a given configuration always routes deterministically.
///
/// Direction filtering joins against the per-connection direction
/// recorded at registration; the single-input-per-stream invariant is
/// enforced when a pair is bound, not at lookup time.
///
/// # Example
///
/// ```
/// use sluice_payload::StreamId;
/// use sluice_routing::{Direction, DirectionFilter, RoutingMap};
///
/// let mut map = RoutingMap::new();
/// map.register_connection("cam_in", Direction::In).unwrap();
/// map.register_connection("mix_out", Direction::Out).unwrap();
///
/// let video = StreamId::new(100);
/// map.bind("cam_in", video).unwrap();
/// map.bind("mix_out", video).unwrap();
///
/// let outputs = map.connections_of(video, DirectionFilter::Out);
/// assert_eq!(outputs, ["mix_out"]);
/// assert_eq!(map.streams_of("cam_in"), [video]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutingMap {
    /// Connection name → direction + bound streams
    connections: HashMap<String, ConnectionEntry>,

    /// Stream id → connection names carrying it, in bind order
    by_stream: HashMap<StreamId, Vec<String>>,

    /// Total number of bound pairs
    bindings: usize,
}

impl RoutingMap {
    /// Create an empty routing map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a connection and its direction
    ///
    /// Connections must be registered before any pair can be bound to
    /// them. The direction is fixed for the lifetime of the map.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::DuplicateConnection`] if the name is
    /// already registered.
    pub fn register_connection(&mut self, name: impl Into<String>, direction: Direction) -> Result<()> {
        let name = name.into();
        if self.connections.contains_key(&name) {
            return Err(RoutingError::duplicate_connection(name));
        }

        self.connections.insert(
            name,
            ConnectionEntry {
                direction,
                streams: Vec::new(),
            },
        );
        Ok(())
    }

    /// Bind a (connection, stream) pair
    ///
    /// # Errors
    ///
    /// - [`RoutingError::UnknownConnection`] if the name was never
    ///   registered
    /// - [`RoutingError::DuplicateBinding`] if the pair already exists
    /// - [`RoutingError::InputConflict`] if the connection is an input
    ///   and the stream already has one; the error names both connections
    pub fn bind(&mut self, name: &str, stream: StreamId) -> Result<()> {
        let direction = self
            .connections
            .get(name)
            .map(|entry| entry.direction)
            .ok_or_else(|| RoutingError::unknown_connection(name))?;

        if let Some(carriers) = self.by_stream.get(&stream) {
            if carriers.iter().any(|carrier| carrier == name) {
                return Err(RoutingError::duplicate_binding(name, stream));
            }

            if direction == Direction::In {
                if let Some(existing) = carriers
                    .iter()
                    .find(|carrier| self.connections[carrier.as_str()].direction == Direction::In)
                {
                    return Err(RoutingError::input_conflict(stream, existing.clone(), name));
                }
            }
        }

        self.by_stream.entry(stream).or_default().push(name.to_owned());
        if let Some(entry) = self.connections.get_mut(name) {
            entry.streams.push(stream);
        }
        self.bindings += 1;
        Ok(())
    }

    /// Get the connections carrying a stream, direction filtered
    ///
    /// Returns names in bind order; O(number of carriers). Unknown
    /// streams yield an empty result.
    pub fn connections_of(&self, stream: StreamId, filter: DirectionFilter) -> Vec<&str> {
        self.by_stream
            .get(&stream)
            .map(|carriers| {
                carriers
                    .iter()
                    .filter(|carrier| filter.matches(self.connections[carrier.as_str()].direction))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the single input connection of a stream, if one is bound
    pub fn input_of(&self, stream: StreamId) -> Option<&str> {
        self.by_stream.get(&stream).and_then(|carriers| {
            carriers
                .iter()
                .find(|carrier| self.connections[carrier.as_str()].direction == Direction::In)
                .map(String::as_str)
        })
    }

    /// Get the streams bound to a connection, in bind order
    ///
    /// Unknown connections yield an empty slice.
    pub fn streams_of(&self, name: &str) -> &[StreamId] {
        self.connections
            .get(name)
            .map(|entry| entry.streams.as_slice())
            .unwrap_or_default()
    }

    /// Get the registered direction of a connection
    #[inline]
    pub fn direction_of(&self, name: &str) -> Option<Direction> {
        self.connections.get(name).map(|entry| entry.direction)
    }

    /// Check whether a connection has at least one stream bound
    #[inline]
    pub fn is_bound(&self, name: &str) -> bool {
        !self.streams_of(name).is_empty()
    }

    /// Get the number of registered connections
    #[inline]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of bound pairs
    #[inline]
    pub fn binding_count(&self) -> usize {
        self.bindings
    }

    /// Check whether the map has no bound pairs
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings == 0
    }

    /// Iterate over the streams that have at least one carrier
    pub fn streams(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.by_stream.keys().copied()
    }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod map_test;
