//! Cache Entry Module
//!
//! Defines a cached piece of key material together with its lifetime and
//! access bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cached payload with TTL and access metadata.
///
/// All timestamps are Unix milliseconds taken from [`current_timestamp_ms`],
/// so creation and every later expiry comparison share one clock.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The opaque cached payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Validator returned by the origin, if any
    pub etag: Option<String>,
    /// `Last-Modified` validator returned by the origin, if any
    pub last_modified: Option<String>,
    /// Number of live hits served from this entry
    pub access_count: u64,
    /// Timestamp of the last live hit (Unix milliseconds)
    pub last_accessed: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that lives for `ttl_seconds`.
    ///
    /// A zero TTL is bumped to one millisecond so that `expires_at` is always
    /// strictly after `created_at`.
    pub fn new(
        value: String,
        ttl_seconds: u64,
        etag: Option<String>,
        last_modified: Option<String>,
    ) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = ttl_seconds.saturating_mul(1000).max(1);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
            etag,
            last_modified,
            access_count: 0,
            last_accessed: now,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// An entry is live strictly before `expires_at`; at the boundary it is
    /// already expired.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    // == Record Access ==
    /// Records a live hit at `now`.
    pub fn record_access(&mut self, now: u64) {
        self.access_count += 1;
        self.last_accessed = now;
    }

    // == Lifetime Fraction ==
    /// Fraction of the entry's TTL that has elapsed at `now`, in `[0, +inf)`.
    pub fn elapsed_fraction(&self, now: u64) -> f64 {
        let ttl = self.expires_at.saturating_sub(self.created_at);
        if ttl == 0 {
            return 1.0;
        }
        now.saturating_sub(self.created_at) as f64 / ttl as f64
    }

    /// Returns true once `threshold` of the TTL has elapsed at `now`.
    pub fn needs_refresh(&self, now: u64, threshold: f64) -> bool {
        self.elapsed_fraction(now) >= threshold
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds at `now`, saturating at zero.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    // == Size ==
    /// Approximate heap footprint of the entry's payload and validators.
    pub fn payload_size(&self) -> usize {
        self.value.len()
            + self.etag.as_ref().map_or(0, String::len)
            + self.last_modified.as_ref().map_or(0, String::len)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the Unix epoch reads as zero.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn entry_at(created_at: u64, expires_at: u64) -> CacheEntry {
        CacheEntry {
            value: "jwks".to_string(),
            created_at,
            expires_at,
            etag: None,
            last_modified: None,
            access_count: 0,
            last_accessed: created_at,
        }
    }

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string(), 60, None, None);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.expires_at - entry.created_at, 60_000);
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.last_accessed, entry.created_at);
        assert!(!entry.is_expired_at(current_timestamp_ms()));
    }

    #[test]
    fn test_entry_zero_ttl_still_expires_after_creation() {
        let entry = CacheEntry::new("v".to_string(), 0, None, None);
        assert!(entry.expires_at > entry.created_at);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("test_value".to_string(), 1, None, None);

        assert!(!entry.is_expired_at(current_timestamp_ms()));

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired_at(current_timestamp_ms()));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry_at(1_000, 2_000);

        assert!(!entry.is_expired_at(1_999));
        assert!(entry.is_expired_at(2_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(2_001));
    }

    #[test]
    fn test_record_access() {
        let mut entry = entry_at(1_000, 11_000);

        entry.record_access(1_500);
        entry.record_access(2_500);

        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed, 2_500);
    }

    #[test]
    fn test_needs_refresh_threshold() {
        let entry = entry_at(0, 10_000);

        assert!(!entry.needs_refresh(7_999, 0.8));
        assert!(entry.needs_refresh(8_000, 0.8));
        assert!(entry.needs_refresh(9_999, 0.8));
        assert!(entry.needs_refresh(10_000, 1.0));
        assert!(!entry.needs_refresh(9_999, 1.0));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = entry_at(1_000, 11_000);

        assert_eq!(entry.ttl_remaining_ms(1_000), 10_000);
        assert_eq!(entry.ttl_remaining_ms(7_500), 3_500);
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = entry_at(0, 1);
        assert_eq!(entry.ttl_remaining_ms(1), 0);
        assert_eq!(entry.ttl_remaining_ms(50_000), 0);
    }

    #[test]
    fn test_payload_size_counts_validators() {
        let entry = CacheEntry::new(
            "12345".to_string(),
            60,
            Some("\"abc\"".to_string()),
            Some("Wed".to_string()),
        );
        assert_eq!(entry.payload_size(), 5 + 5 + 3);
    }
}
