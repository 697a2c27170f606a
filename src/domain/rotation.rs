//! Round-robin signer identity pool.
//!
//! Each submission attempt takes the next address. The cursor is a single
//! atomic counter, so concurrent retries from different requests never
//! receive the same index within one pass over the pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::GatewayError;

#[derive(Debug)]
pub struct SignerRotation {
    addresses: Vec<String>,
    cursor: AtomicUsize,
}

impl SignerRotation {
    pub fn new(addresses: Vec<String>) -> Result<Self, GatewayError> {
        if addresses.is_empty() {
            return Err(GatewayError::Config("signer pool must not be empty".into()));
        }
        Ok(Self {
            addresses,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Claim the next signer address.
    pub fn next(&self) -> &str {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        &self.addresses[i]
    }
}
