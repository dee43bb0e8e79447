//! Connection state machine
//!
//! Tracks the delivery client's single connection handle from creation to
//! discard. Every handle gets a generation number; completions and close
//! notifications only apply if they refer to the current generation, so a
//! superseded handle can never move the state of its replacement.

use std::sync::Arc;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handle held
    Closed,
    /// Handle created, start not yet confirmed
    Connecting,
    /// Start confirmed, sends are attempted
    Open,
}

/// The client's current connection handle and its state
#[derive(Debug)]
pub struct ConnectionSlot<T> {
    /// Current phase
    state: ConnectionState,

    /// Current handle (None iff Closed)
    handle: Option<Arc<T>>,

    /// Generation of the current handle
    generation: u64,
}

impl<T> ConnectionSlot<T> {
    /// Create a closed slot
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Closed,
            handle: None,
            generation: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current handle, if any
    pub fn handle(&self) -> Option<Arc<T>> {
        self.handle.clone()
    }

    /// Install a fresh handle (Closed → Connecting)
    ///
    /// Returns the generation the caller must quote when reporting back.
    pub fn begin(&mut self, handle: Arc<T>) -> u64 {
        self.generation += 1;
        self.handle = Some(handle);
        self.state = ConnectionState::Connecting;
        self.generation
    }

    /// Start completed (Connecting → Open)
    ///
    /// Returns false if the handle was superseded or discarded meanwhile.
    pub fn open(&mut self, generation: u64) -> bool {
        if self.is_current(generation) && self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
            true
        } else {
            false
        }
    }

    /// Start failed or the connection dropped (→ Closed)
    ///
    /// Discards the handle. Returns false if `generation` is stale.
    pub fn close(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.handle = None;
            self.state = ConnectionState::Closed;
            true
        } else {
            false
        }
    }

    /// Explicit shutdown (→ Closed), handing back the handle to stop
    pub fn reset(&mut self) -> Option<Arc<T>> {
        self.state = ConnectionState::Closed;
        self.handle.take()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }
}

impl<T> Default for ConnectionSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
