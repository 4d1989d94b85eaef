use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sheet metadata. Setters bump the edited time; the sheet engine owns
/// firing the edited-time callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    title: Option<String>,
    author: Option<String>,
    created_time: DateTime<Utc>,
    edited_time: DateTime<Utc>,
}

impl Metadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            title: None,
            author: None,
            created_time: now,
            edited_time: now,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn created_time(&self) -> DateTime<Utc> {
        self.created_time
    }

    pub fn edited_time(&self) -> DateTime<Utc> {
        self.edited_time
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.update_edited_time();
        self.title = Some(title.into());
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.update_edited_time();
        self.author = Some(author.into());
    }

    pub fn update_edited_time(&mut self) {
        self.edited_time = Utc::now();
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}
