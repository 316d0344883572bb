//! Item, resource and currency holdings.
use serde::{Deserialize, Serialize};

use crate::error::{TrackerResult, require_name};
use crate::records::{Collection, Record, Timestamp, new_id, now};
use crate::storage::{KeyValueStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Item,
    Resource,
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for InventoryItem {
    const KIND: &'static str = "inventory item";
    const STORAGE_KEY: &'static str = keys::INVENTORY;

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

impl InventoryItem {
    fn matches(&self, name: &str, kind: ItemKind) -> bool {
        self.kind == kind && self.name.eq_ignore_ascii_case(name.trim())
    }
}

/// Fields for a new inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewItem {
    pub name: String,
    pub kind: ItemKind,
    pub quantity: u32,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, kind: ItemKind, quantity: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            quantity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn into_record(self, at: Timestamp) -> InventoryItem {
        InventoryItem {
            id: new_id(),
            name: self.name.trim().to_string(),
            kind: self.kind,
            quantity: self.quantity,
            description: self.description,
            image_url: self.image_url,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Partial update; `None` leaves a field unchanged, `Some(None)` clears an
/// optional field.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub kind: Option<ItemKind>,
    pub quantity: Option<u32>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

pub type Inventory<S> = Collection<InventoryItem, S>;

impl<S: KeyValueStore> Collection<InventoryItem, S> {
    /// Append a new entry. Entries with the same name are kept apart; see
    /// [`Collection::stack`] for merging.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn add(&mut self, item: NewItem) -> TrackerResult<String> {
        require_name("item name", &item.name)?;
        self.insert(item.into_record(now()))
    }

    /// Add to an existing entry of the same kind whose name matches
    /// case-insensitively, or append a new one. Used for reward grants.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a storage error.
    pub fn stack(&mut self, item: NewItem) -> TrackerResult<String> {
        require_name("item name", &item.name)?;
        let existing = self
            .list()
            .iter()
            .find(|held| held.matches(&item.name, item.kind))
            .map(|held| held.id.clone());
        match existing {
            Some(id) => {
                let amount = item.quantity;
                self.modify(&id, |held| {
                    held.quantity = held.quantity.saturating_add(amount);
                    Ok(())
                })?;
                log::debug!("stacked {amount} onto `{}`", item.name);
                Ok(id)
            }
            None => self.insert(item.into_record(now())),
        }
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error for a blank name, or a storage
    /// error.
    pub fn update(&mut self, id: &str, patch: ItemPatch) -> TrackerResult<()> {
        self.modify(id, |item| {
            if let Some(name) = patch.name {
                require_name("item name", &name)?;
                item.name = name.trim().to_string();
            }
            if let Some(kind) = patch.kind {
                item.kind = kind;
            }
            if let Some(quantity) = patch.quantity {
                item.quantity = quantity;
            }
            if let Some(description) = patch.description {
                item.description = description;
            }
            if let Some(image_url) = patch.image_url {
                item.image_url = image_url;
            }
            Ok(())
        })
    }

    /// Remove `quantity` units, or the whole entry when `quantity` is `None`
    /// or covers everything held. Returns what is left.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a storage error.
    pub fn take(&mut self, id: &str, quantity: Option<u32>) -> TrackerResult<u32> {
        let held = self.require(id)?.quantity;
        match quantity {
            Some(amount) if amount < held => {
                self.modify(id, |item| {
                    item.quantity = held - amount;
                    Ok(())
                })?;
                Ok(held - amount)
            }
            _ => {
                self.remove(id)?;
                Ok(0)
            }
        }
    }

    #[must_use]
    pub fn by_kind(&self, kind: ItemKind) -> Vec<&InventoryItem> {
        self.list().iter().filter(|item| item.kind == kind).collect()
    }

    /// First entry whose name matches case-insensitively.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&InventoryItem> {
        let name = name.trim();
        self.list()
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn inventory() -> Inventory<MemoryStore> {
        Inventory::open(MemoryStore::new())
    }

    #[test]
    fn add_keeps_same_named_items_apart() {
        let mut inv = inventory();
        inv.add(NewItem::new("Potion", ItemKind::Item, 2)).unwrap();
        inv.add(NewItem::new("Potion", ItemKind::Item, 3)).unwrap();
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn stack_merges_by_name_and_kind() {
        let mut inv = inventory();
        let first = inv.stack(NewItem::new("Iron Ore", ItemKind::Resource, 2)).unwrap();
        let again = inv.stack(NewItem::new("iron ore", ItemKind::Resource, 5)).unwrap();
        assert_eq!(first, again);
        assert_eq!(inv.get(&first).unwrap().quantity, 7);
        inv.stack(NewItem::new("Iron Ore", ItemKind::Item, 1)).unwrap();
        assert_eq!(inv.len(), 2);
    }

    #[test]
    fn take_reduces_then_removes() {
        let mut inv = inventory();
        let id = inv.add(NewItem::new("Arrows", ItemKind::Item, 10)).unwrap();
        assert_eq!(inv.take(&id, Some(4)).unwrap(), 6);
        assert_eq!(inv.get(&id).unwrap().quantity, 6);
        assert_eq!(inv.take(&id, Some(6)).unwrap(), 0);
        assert!(inv.get(&id).is_none());
        assert!(inv.take(&id, None).unwrap_err().is_not_found());
    }

    #[test]
    fn blank_names_are_rejected_without_mutation() {
        let mut inv = inventory();
        assert!(inv.add(NewItem::new("  ", ItemKind::Item, 1)).is_err());
        let id = inv.add(NewItem::new("Gem", ItemKind::Currency, 1)).unwrap();
        let patch = ItemPatch {
            name: Some(String::new()),
            quantity: Some(9),
            ..ItemPatch::default()
        };
        assert!(inv.update(&id, patch).is_err());
        assert_eq!(inv.get(&id).unwrap().quantity, 1);
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn lookups_by_kind_and_name() {
        let mut inv = inventory();
        inv.add(NewItem::new("Gold Coin", ItemKind::Currency, 5)).unwrap();
        inv.add(NewItem::new("Herb", ItemKind::Resource, 1)).unwrap();
        assert_eq!(inv.by_kind(ItemKind::Currency).len(), 1);
        assert_eq!(inv.find_by_name("gold coin").unwrap().quantity, 5);
        assert!(inv.find_by_name("Dragon Scale").is_none());
    }

    #[test]
    fn documents_use_type_field() {
        let mut inv = inventory();
        let id = inv.add(NewItem::new("Herb", ItemKind::Resource, 1)).unwrap();
        let json = serde_json::to_value(inv.get(&id).unwrap()).unwrap();
        assert_eq!(json["type"], "resource");
        assert!(json.get("createdAt").is_some());
    }
}
