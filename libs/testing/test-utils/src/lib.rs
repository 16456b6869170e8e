//! Shared test utilities for the event journal crates
//!
//! - `TestRedis`: Redis container with automatic cleanup (feature: "redis")
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestDataBuilder`: deterministic names and instants (always available)
//!
//! # Features
//!
//! - `redis` (default): Redis test infrastructure
//! - `mongo`: MongoDB test infrastructure
//! - `all`: everything
//!
//! Container-backed tests need Docker and are marked `#[ignore]` by the
//! crates that use them; run them with `cargo test -- --ignored`.
//!
//! ```rust,ignore
//! use test_utils::TestMongo;
//!
//! #[tokio::test]
//! #[ignore]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let db = mongo.database("journal_test");
//! }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

#[cfg(feature = "redis")]
pub use redis::TestRedis;

/// Deterministic test data keyed by a seed.
///
/// Two builders with the same seed produce the same names and instants, so a
/// failing test can be replayed exactly.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name. This is the usual way to build one.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_report_buckets");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Unique name such as a collection or channel.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("logs", "main"), "test-logs-7-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Fixed reference instant: 2024-01-01T00:00:00Z shifted by up to a day
    /// depending on the seed, truncated to whole minutes.
    pub fn base_time(&self) -> DateTime<Utc> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let start = start.unwrap_or(DateTime::UNIX_EPOCH);
        start + Duration::minutes((self.seed % 1440) as i64)
    }

    /// `base_time` plus `minutes`, in epoch milliseconds.
    pub fn timestamp_ms(&self, minutes: i64) -> i64 {
        (self.base_time() + Duration::minutes(minutes)).timestamp_millis()
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that `items` is sorted by `key`, newest (largest) first.
    pub fn assert_descending<T, K: PartialOrd + std::fmt::Debug>(
        items: &[T],
        key: impl Fn(&T) -> K,
        context: &str,
    ) {
        for pair in items.windows(2) {
            let (a, b) = (key(&pair[0]), key(&pair[1]));
            assert!(a >= b, "{}: {:?} came before {:?}", context, a, b);
        }
    }
}
