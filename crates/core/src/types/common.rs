//! Common types and utilities shared across domain models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one day
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Timestamp in milliseconds since Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp for the current moment
    ///
    /// If system time is somehow before UNIX_EPOCH (should never happen),
    /// falls back to timestamp 0 instead of panicking.
    pub fn now() -> Self {
        Self(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_else(|_| std::time::Duration::from_secs(0))
                .as_millis() as i64,
        )
    }

    /// Creates a timestamp from milliseconds since Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since Unix epoch
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch
    pub fn as_seconds(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns this timestamp shifted forward by whole days
    pub fn plus_days(&self, days: u32) -> Self {
        Self(self.0.saturating_add(i64::from(days) * DAY_MILLIS))
    }

    /// Whole days elapsed from `earlier` to `self`, truncated toward zero
    pub fn whole_days_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0) / DAY_MILLIS
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares an integer row-id newtype for an entity
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database row id
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw database row id
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for an author
    AuthorId
);
entity_id!(
    /// Unique identifier for a book
    BookId
);
entity_id!(
    /// Unique identifier for a physical copy of a book
    CopyId
);
entity_id!(
    /// Unique identifier for a library member
    MemberId
);
entity_id!(
    /// Unique identifier for a loan
    LoanId
);

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_now() {
        let t1 = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let t2 = Timestamp::now();
        assert!(t2 > t1);
    }

    #[test]
    fn test_timestamp_from_millis() {
        let t = Timestamp::from_millis(1234567890123);
        assert_eq!(t.as_millis(), 1234567890123);
        assert_eq!(t.as_seconds(), 1234567890);
    }

    #[test]
    fn test_plus_days() {
        let t = Timestamp::from_millis(1_000);
        assert_eq!(t.plus_days(15).as_millis(), 1_000 + 15 * DAY_MILLIS);
        assert_eq!(t.plus_days(0), t);
    }

    #[test]
    fn test_whole_days_since_truncates() {
        let start = Timestamp::from_millis(0);
        let later = Timestamp::from_millis(2 * DAY_MILLIS + DAY_MILLIS / 2);
        assert_eq!(later.whole_days_since(start), 2);

        let half_day = Timestamp::from_millis(DAY_MILLIS / 2);
        assert_eq!(half_day.whole_days_since(start), 0);
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let id: BookId = "42".parse().unwrap();
        assert_eq!(id, BookId::new(42));
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<BookId>().is_err());
    }

    #[test]
    fn test_entity_id_ordering() {
        assert!(CopyId::new(1) < CopyId::new(2));
    }

    #[test]
    fn test_validator_trait() {
        struct TestType {
            value: i32,
        }

        impl Validator for TestType {
            fn validate(&self) -> Result<(), Vec<String>> {
                if self.value < 0 {
                    Err(vec!["Value must be positive".to_string()])
                } else {
                    Ok(())
                }
            }
        }

        assert!(TestType { value: 10 }.is_valid());
        assert!(!TestType { value: -5 }.is_valid());
    }
}
