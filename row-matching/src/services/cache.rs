//! Identity-keyed entity cache with field-level read-modify-write.
//!
//! Entities are stored as JSON objects so partial updates can touch a single
//! field without knowing the full type. Each `modify` holds the entry's shard
//! lock for the duration of the closure, so concurrent writers never lose
//! updates and a reader always sees the latest write.

use crate::models::{CandidateOrder, ImportStats, ImportedRow, OrderRef, TransactionsImport};
use dashmap::DashMap;
use recon_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

pub const ROW_TYPENAME: &str = "TransactionsImportRow";
pub const IMPORT_TYPENAME: &str = "TransactionsImport";
pub const ORDER_TYPENAME: &str = "Order";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub typename: &'static str,
    pub id: String,
}

impl EntityKey {
    pub fn row(id: &str) -> Self {
        Self {
            typename: ROW_TYPENAME,
            id: id.to_string(),
        }
    }

    pub fn import(id: &str) -> Self {
        Self {
            typename: IMPORT_TYPENAME,
            id: id.to_string(),
        }
    }

    pub fn order(id: &str) -> Self {
        Self {
            typename: ORDER_TYPENAME,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.typename, self.id)
    }
}

#[derive(Default)]
pub struct EntityCache {
    entries: DashMap<EntityKey, Map<String, Value>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `entity`'s fields into whatever is cached under `key`.
    pub fn write<T: Serialize>(&self, key: EntityKey, entity: &T) -> Result<(), AppError> {
        let fields = match serde_json::to_value(entity)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Cannot cache {}: {}", key, e)))?
        {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::InternalError(anyhow::anyhow!(
                    "Cannot cache {}: expected an object, got {}",
                    key,
                    other
                )))
            }
        };

        self.entries.entry(key).or_default().extend(fields);
        Ok(())
    }

    pub fn read<T: DeserializeOwned>(&self, key: &EntityKey) -> Result<Option<T>, AppError> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(Value::Object(entry.value().clone()))
            .map(Some)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Corrupt cache entry {}: {}", key, e)))
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Apply `f` to the cached fields of `key`. Returns false if the entity is
    /// not cached.
    pub fn modify<F>(&self, key: &EntityKey, f: F) -> bool
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn evict(&self, key: &EntityKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    pub fn put_row(&self, row: &ImportedRow) -> Result<(), AppError> {
        self.write(EntityKey::row(&row.id), row)
    }

    pub fn row(&self, row_id: &str) -> Result<Option<ImportedRow>, AppError> {
        self.read(&EntityKey::row(row_id))
    }

    pub fn put_import(&self, import: &TransactionsImport) -> Result<(), AppError> {
        self.write(EntityKey::import(&import.id), import)
    }

    pub fn import_stats(&self, import_id: &str) -> Result<Option<ImportStats>, AppError> {
        Ok(self
            .read::<TransactionsImport>(&EntityKey::import(import_id))?
            .map(|import| import.stats))
    }

    pub fn put_order(&self, order: &CandidateOrder) -> Result<(), AppError> {
        self.write(EntityKey::order(&order.id), order)
    }

    /// Point the cached row at `order`.
    pub fn link_row_order(&self, row_id: &str, order: &OrderRef) -> Result<bool, AppError> {
        let order_value = serde_json::to_value(order)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Cannot cache order: {}", e)))?;

        let key = EntityKey::row(row_id);
        let found = self.modify(&key, |fields| {
            fields.insert("order".to_string(), order_value);
        });

        if found {
            debug!(row_id = %row_id, order_id = %order.id, "Cached row linked to order");
        } else {
            warn!(row_id = %row_id, "Row not cached, skipping order link");
        }
        Ok(found)
    }

    /// Count one more processed row backed by an order.
    pub fn increment_import_stats(&self, import_id: &str) -> bool {
        let key = EntityKey::import(import_id);
        let found = self.modify(&key, |fields| {
            let stats = fields
                .entry("stats")
                .or_insert_with(|| Value::Object(Map::new()));
            if !stats.is_object() {
                *stats = Value::Object(Map::new());
            }
            if let Value::Object(stats) = stats {
                for counter in ["processed", "orders"] {
                    let current = stats.get(counter).and_then(Value::as_u64).unwrap_or(0);
                    stats.insert(counter.to_string(), Value::from(current + 1));
                }
            }
        });

        if !found {
            warn!(import_id = %import_id, "Import not cached, skipping stats update");
        }
        found
    }
}
