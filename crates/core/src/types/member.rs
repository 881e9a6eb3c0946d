//! Library member domain model

use crate::types::{MemberId, Timestamp, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Social security number; unique across members
    pub ssn: String,
    pub member_since: Timestamp,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.ssn, self.name)
    }
}

impl Validator for Member {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_member(&self.name, &self.ssn)
    }
}

/// A member that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub ssn: String,
    pub member_since: Timestamp,
}

impl NewMember {
    /// Creates a membership starting now
    pub fn new(name: impl Into<String>, ssn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ssn: ssn.into(),
            member_since: Timestamp::now(),
        }
    }

    /// Attaches the id assigned by the store
    pub fn with_id(self, id: MemberId) -> Member {
        Member {
            id,
            name: self.name,
            ssn: self.ssn,
            member_since: self.member_since,
        }
    }
}

impl Validator for NewMember {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_member(&self.name, &self.ssn)
    }
}

fn validate_member(name: &str, ssn: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push("Name can't be empty".to_string());
    }

    if ssn.trim().is_empty() {
        errors.push("SSN can't be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
