//! Common test utilities for the morph-core integration tests.
//!
//! Provides:
//! - MemoryStore, an in-memory item collection
//! - Fixture builders in `fixtures`

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;

use morph_core::{ItemRecord, ItemStore, ItemUpdate, MorphError, Result};

/// Item collection held in memory. Applied updates replace fields and tags.
#[derive(Default)]
pub struct MemoryStore {
    pub items: Vec<ItemRecord>,
    pub updates: HashMap<i64, ItemUpdate>,
    /// Item ids whose writes fail.
    pub failing: Vec<i64>,
}

impl MemoryStore {
    pub fn new(items: Vec<ItemRecord>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn item(&self, id: i64) -> &ItemRecord {
        self.items
            .iter()
            .find(|i| i.id == id)
            .expect("item exists")
    }

    pub fn field(&self, id: i64, name: &str) -> Option<String> {
        self.item(id).field(name).map(str::to_string)
    }

    pub fn index(&self, id: i64) -> Option<i64> {
        self.updates.get(&id).map(|u| u.index)
    }
}

impl ItemStore for MemoryStore {
    fn items(&self) -> Result<Vec<ItemRecord>> {
        Ok(self.items.clone())
    }

    fn apply(&mut self, update: ItemUpdate) -> Result<()> {
        if self.failing.contains(&update.item_id) {
            return Err(MorphError::Store(format!("item {} is locked", update.item_id)));
        }
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == update.item_id)
            .ok_or_else(|| MorphError::Store(format!("no item {}", update.item_id)))?;
        for (name, value) in &update.fields {
            if let Some(slot) = item.fields.iter_mut().find(|(n, _)| n == name) {
                slot.1 = value.clone();
            }
        }
        item.tags = update.tags.clone();
        self.updates.insert(update.item_id, update);
        Ok(())
    }
}
