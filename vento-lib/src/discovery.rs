//! Network search for controllers.
//!
//! A search is a READ of the search parameter addressed to the broadcast
//! device id with an empty password. Every controller that hears it answers
//! with its own id in the search field; the datagram source is its address.

use crate::constants::SEARCH_DEVICE_ID;
use crate::error::EncodeError;
use crate::parameter::{Parameter, ParameterCatalog};
use crate::packet::Request;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, trace};

/// Called once per newly found device id.
pub type DiscoveryCallback = Arc<dyn Fn(&str, SocketAddr) + Send + Sync>;

/// READ of the search parameter.
pub fn search_request() -> Request {
    Request::read([Parameter::Search])
}

/// Encoded search packet, ready to broadcast.
pub fn search_packet(catalog: &ParameterCatalog) -> Result<Bytes, EncodeError> {
    search_request().encode(SEARCH_DEVICE_ID, "", catalog)
}

/// One search round: remembers the ids already reported.
pub struct DiscoveryRound {
    seen: HashMap<String, SocketAddr>,
    callback: DiscoveryCallback,
}

impl DiscoveryRound {
    pub fn new(callback: DiscoveryCallback) -> Self {
        Self {
            seen: HashMap::new(),
            callback,
        }
    }

    /// Record a search reply. Only the first reply for an id counts; later
    /// ones, including replies from a different source port, are ignored.
    ///
    /// Returns the callback to run for a new id. The caller runs it after
    /// releasing whatever lock guards this round.
    pub fn observe(&mut self, device_id: &str, source: SocketAddr) -> Option<DiscoveryCallback> {
        if self.seen.contains_key(device_id) {
            trace!(device_id, %source, "Duplicate search reply");
            return None;
        }
        self.seen.insert(device_id.to_string(), source);
        info!(device_id, %source, "Found device");
        Some(self.callback.clone())
    }

    /// Devices found so far with the address of their first reply.
    pub fn found(&self) -> Vec<(String, SocketAddr)> {
        let mut found: Vec<_> = self.seen.iter().map(|(id, addr)| (id.clone(), *addr)).collect();
        found.sort();
        found
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
