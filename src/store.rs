//! The two tabular stores the core reads and writes at parse boundaries
//! (spec §6). Grounded in the original Python `LogStorage` /
//! `NoSuchLogDataException` pair (`original_source/.../drain.py`) — the
//! teacher crate has no matching file, so this module is new.
//!
//! Only the column names and dtypes below are contractual (spec §9 "Heavy
//! tabular abstraction"); row-oriented `Vec`s are the natural Rust shape,
//! not a dataframe reimplementation.

use crate::error::StoreError;

/// One row of the structured log table: the original record enriched with
/// the event id/template assigned to it, and optionally its parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredLogRow {
    pub line_id: usize,
    /// Format-declared fields in pattern order, including `Content`.
    pub fields: Vec<(String, String)>,
    pub event_id: usize,
    pub event_template: String,
    pub parameter_list: Option<Vec<String>>,
}

impl StructuredLogRow {
    pub fn content(&self) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| k == "Content")
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredLogTable {
    pub rows: Vec<StructuredLogRow>,
}

/// One row of the event-template catalog: `(EventId, EventTemplate, Occurrences)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTemplateRow {
    pub event_id: usize,
    pub event_template: String,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTemplateTable {
    pub rows: Vec<EventTemplateRow>,
}

impl EventTemplateTable {
    pub fn find_by_template(&self, template: &str) -> Option<&EventTemplateRow> {
        self.rows.iter().find(|r| r.event_template == template)
    }
}

/// A tabular store supporting `get`/`save`, generic over the table shape it
/// holds. Implementations own how `T` is persisted (file, database, ...);
/// the core only assumes `get`/`save` are called exactly once per parse
/// boundary (spec §5).
pub trait LogStore<T> {
    fn get(&self) -> Result<T, StoreError>;
    fn save(&mut self, table: &T) -> Result<(), StoreError>;
}

/// In-memory `LogStore`, useful for tests and for hosts that don't need a
/// real backing store between runs. Raises `NoSuchLogData` until the first
/// `save`.
#[derive(Debug, Default)]
pub struct MemoryLogStore<T> {
    data: Option<T>,
}

impl<T> MemoryLogStore<T> {
    pub fn new() -> Self {
        Self { data: None }
    }

    pub fn seeded(table: T) -> Self {
        Self { data: Some(table) }
    }
}

impl<T: Clone> LogStore<T> for MemoryLogStore<T> {
    fn get(&self) -> Result<T, StoreError> {
        self.data.clone().ok_or(StoreError::NoSuchLogData)
    }

    fn save(&mut self, table: &T) -> Result<(), StoreError> {
        self.data = Some(table.clone());
        Ok(())
    }
}
