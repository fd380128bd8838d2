//! Store Entry Module
//!
//! A stored byte payload with TTL metadata, used by the in-process store.

use std::time::{SystemTime, UNIX_EPOCH};

// == Store Entry ==
/// Represents a single stored payload with TTL metadata.
#[derive(Debug, Clone)]
pub(crate) struct StoreEntry {
    /// Encoded payload bytes
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry with optional TTL in seconds.
    pub fn new(value: Vec<u8>, ttl_seconds: Option<u64>) -> Self {
        Self {
            value,
            expires_at: ttl_seconds.and_then(expiry_from_now),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// time, so a fully elapsed TTL is never served.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    /// Replaces the TTL, counting from now.
    pub fn set_ttl(&mut self, ttl_seconds: u64) {
        self.expires_at = expiry_from_now(ttl_seconds);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Expiration timestamp `ttl_seconds` from now. A TTL past the end of the
/// millisecond clock means the entry never expires.
fn expiry_from_now(ttl_seconds: u64) -> Option<u64> {
    ttl_seconds
        .checked_mul(1000)
        .and_then(|ms| current_timestamp_ms().checked_add(ms))
}

/// Returns current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = StoreEntry::new(b"payload".to_vec(), None);

        assert_eq!(entry.value, b"payload");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = StoreEntry::new(b"payload".to_vec(), Some(1));
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), Some(0));
    }

    #[test]
    fn test_set_ttl_on_persistent_entry() {
        let mut entry = StoreEntry::new(b"payload".to_vec(), None);
        entry.set_ttl(10);

        let remaining = entry.ttl_remaining_ms().unwrap();
        assert!(remaining <= 10_000);
        assert!(remaining >= 9_000);
    }

    #[test]
    fn test_overflowing_ttl_never_expires() {
        let entry = StoreEntry::new(b"payload".to_vec(), Some(u64::MAX / 1000));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());

        let mut entry = StoreEntry::new(b"payload".to_vec(), Some(10));
        entry.set_ttl(u64::MAX);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = StoreEntry {
            value: Vec::new(),
            expires_at: Some(now),
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
