//! Book domain model

use crate::types::{AuthorId, BookId, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted book title; physical copies are tracked as `BookCopy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub author_id: AuthorId,
    pub title: String,
    pub description: String,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_title(&self.title)
    }
}

/// A book that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub author_id: AuthorId,
    pub title: String,
    pub description: String,
}

impl NewBook {
    pub fn new(author_id: AuthorId, title: impl Into<String>) -> Self {
        Self {
            author_id,
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attaches the id assigned by the store
    pub fn with_id(self, id: BookId) -> Book {
        Book {
            id,
            author_id: self.author_id,
            title: self.title,
            description: self.description,
        }
    }
}

impl Validator for NewBook {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_title(&self.title)
    }
}

fn validate_title(title: &str) -> Result<(), Vec<String>> {
    if title.trim().is_empty() {
        Err(vec!["Title cannot be empty".to_string()])
    } else {
        Ok(())
    }
}
