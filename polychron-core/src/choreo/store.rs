//! Choreography persistence
//!
//! Choreographies live in a flat store of named JSON documents. The
//! trait keeps the engine independent of the medium: hosts use the
//! in-memory store below, firmware backs it with flash. Load and save
//! move whole documents; there is no partial update.

use heapless::Vec;

use crate::choreo::model::{ChoreoName, Choreography, MAX_CHOREOGRAPHIES};

/// Errors from the choreography store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No document under that name
    NotFound,
    /// Document exists but does not parse
    Corrupt,
    /// Store capacity reached
    Full,
    /// Underlying medium failed
    Io,
}

/// Flat named-document store for choreographies.
///
/// `list` order is stable between calls as long as the store is not
/// mutated; auto-play picks "the first enabled" against that order.
/// A failed load leaves the store and any loaded choreography
/// untouched.
pub trait ChoreoStore {
    /// Names of the stored choreographies, in store order.
    fn list(&mut self) -> Vec<ChoreoName, MAX_CHOREOGRAPHIES>;

    /// Parse and return one stored choreography.
    fn load(&mut self, name: &str) -> Result<Choreography, StoreError>;

    /// Store a choreography under its own name, replacing any previous
    /// document with that name.
    fn save(&mut self, choreo: &Choreography) -> Result<(), StoreError>;

    /// Remove one stored choreography.
    fn delete(&mut self, name: &str) -> Result<(), StoreError>;
}

/// RAM-backed store holding serialized documents.
///
/// Keeps the JSON form rather than parsed values so every load runs
/// the same codec path a flash-backed store would.
#[cfg(feature = "json")]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<(ChoreoName, alloc::string::String), MAX_CHOREOGRAPHIES>,
}

#[cfg(feature = "json")]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key.as_str() == name)
    }
}

#[cfg(feature = "json")]
impl ChoreoStore for MemoryStore {
    fn list(&mut self) -> Vec<ChoreoName, MAX_CHOREOGRAPHIES> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    fn load(&mut self, name: &str) -> Result<Choreography, StoreError> {
        let index = self.position(name).ok_or(StoreError::NotFound)?;
        let mut choreo = crate::choreo::json::from_json(&self.entries[index].1)?;
        if choreo.name.is_empty() {
            choreo.name = self.entries[index].0.clone();
        }
        Ok(choreo)
    }

    fn save(&mut self, choreo: &Choreography) -> Result<(), StoreError> {
        let doc = crate::choreo::json::to_json(choreo)?;
        match self.position(choreo.name.as_str()) {
            Some(index) => {
                self.entries[index].1 = doc;
                Ok(())
            }
            None => self
                .entries
                .push((choreo.name.clone(), doc))
                .map_err(|_| StoreError::Full),
        }
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        let index = self.position(name).ok_or(StoreError::NotFound)?;
        self.entries.remove(index);
        Ok(())
    }
}
