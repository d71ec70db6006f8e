//! TTL Policy Module
//!
//! Maps the entity-type prefix of a cache key to a lifetime.

use std::collections::HashMap;
use std::time::Duration;

/// Lifetime applied to entity types absent from the table.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

// == TTL Policy ==
/// Immutable entity-type → lifetime table.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    entries: HashMap<String, Duration>,
    default_ttl: Duration,
}

impl TtlPolicy {
    // == Constructors ==
    /// Creates an empty table that resolves every key to `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    /// The marketplace table: product 1h, category 2h, user 30m,
    /// producer 30m, order 10m, cart 5m.
    pub fn reference() -> Self {
        Self::new(DEFAULT_TTL)
            .with_entry("product", Duration::from_secs(60 * 60))
            .with_entry("category", Duration::from_secs(2 * 60 * 60))
            .with_entry("user", Duration::from_secs(30 * 60))
            .with_entry("producer", Duration::from_secs(30 * 60))
            .with_entry("order", Duration::from_secs(10 * 60))
            .with_entry("cart", Duration::from_secs(5 * 60))
    }

    /// Adds or replaces the lifetime of one entity type.
    ///
    /// # Arguments
    /// * `entity_type` - First key segment, e.g. `cart` for `cart:items:user:7`
    /// * `ttl` - Lifetime for keys of that type
    pub fn with_entry(mut self, entity_type: impl Into<String>, ttl: Duration) -> Self {
        self.entries.insert(entity_type.into(), ttl);
        self
    }

    /// Replaces the fallback lifetime.
    pub fn with_default(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    // == Resolve ==
    /// Returns the lifetime for `key`, looked up by its entity type.
    ///
    /// # Returns
    /// The table entry for the key's first segment, or the default lifetime.
    pub fn resolve(&self, key: &str) -> Duration {
        self.entries
            .get(entity_type(key))
            .copied()
            .unwrap_or(self.default_ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

// == Key Helpers ==
/// Substring before the first `:`, or the whole key when it has none.
pub fn entity_type(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

/// Last colon-separated segment parsed as an integer id.
pub fn entity_id(key: &str) -> Option<i64> {
    key.rsplit(':').next().and_then(|segment| segment.parse().ok())
}
