//! Id generation
//!
//! Post and user ids are opaque short strings. The generator sits behind a
//! trait so tests can swap in a deterministic implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Port for generating opaque record ids.
pub trait IdGenerator: Send + Sync {
    /// Produce a new id
    fn generate(&self) -> String;
}

/// Default generator: the first six hex characters of a v4 UUID.
///
/// Six characters keep ids short enough to share in a URL; uniqueness is
/// enforced by the primary key, and a clash simply fails the insert.
#[derive(Debug, Default)]
pub struct ShortUuidGenerator;

impl IdGenerator for ShortUuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()[..6].to_string()
    }
}

/// Deterministic generator for tests: "id-0", "id-1", ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("id-{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_short_uuid_generator_length_and_charset() {
        let id = ShortUuidGenerator.generate();
        assert_eq!(id.len(), 6);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_uuid_generator_varies() {
        let gen = ShortUuidGenerator;
        let ids: HashSet<String> = (0..100).map(|_| gen.generate()).collect();
        // 6 hex chars give 16^6 combinations; 100 draws colliding would
        // point at a broken generator
        assert!(ids.len() > 90);
    }

    #[test]
    fn test_sequential_generator_is_deterministic() {
        let gen = SequentialIdGenerator::default();
        assert_eq!(gen.generate(), "id-0");
        assert_eq!(gen.generate(), "id-1");
        assert_eq!(gen.generate(), "id-2");
    }
}
