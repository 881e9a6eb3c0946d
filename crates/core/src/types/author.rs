//! Author domain model

use crate::types::{AuthorId, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Validator for Author {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_name(&self.name)
    }
}

/// An author that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
}

impl NewAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Attaches the id assigned by the store
    pub fn with_id(self, id: AuthorId) -> Author {
        Author {
            id,
            name: self.name,
        }
    }
}

impl Validator for NewAuthor {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_name(&self.name)
    }
}

fn validate_name(name: &str) -> Result<(), Vec<String>> {
    if name.trim().is_empty() {
        Err(vec!["Name can't be empty".to_string()])
    } else {
        Ok(())
    }
}
