use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::ItemId;

/// A single record in the tree.
///
/// An item has a stable identifier, an optional parent identifier, a display
/// label and an open set of extra attributes. The store never interprets the
/// extra attributes; they are carried verbatim.
///
/// The serialized form is a flat record:
///
/// ```json
/// { "id": 2, "parent": 1, "label": "Child", "color": "red" }
/// ```
///
/// `parent` may be `null` or omitted for top-level items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique, immutable identifier.
    pub(crate) id: ItemId,
    /// Identifier of the parent item, `None` for top-level items.
    #[serde(default)]
    pub(crate) parent: Option<ItemId>,
    /// Display label.
    pub(crate) label: String,
    /// Extension attributes.
    #[serde(flatten)]
    pub(crate) extra: BTreeMap<String, Value>,
}

impl Item {
    /// Construct a new item with no extra attributes.
    #[must_use]
    pub fn new(
        id: impl Into<ItemId>,
        parent: Option<ItemId>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent,
            label: label.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Construct a new top-level item.
    #[must_use]
    pub fn root(id: impl Into<ItemId>, label: impl Into<String>) -> Self {
        Self::new(id, None, label)
    }

    /// Construct a new item parented at `parent`.
    #[must_use]
    pub fn child(
        id: impl Into<ItemId>,
        parent: impl Into<ItemId>,
        label: impl Into<String>,
    ) -> Self {
        Self::new(id, Some(parent.into()), label)
    }

    /// Builder-style setter for an extension attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// The item's identifier.
    #[must_use]
    pub const fn id(&self) -> &ItemId {
        &self.id
    }

    /// The item's parent identifier, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&ItemId> {
        self.parent.as_ref()
    }

    /// The item's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Look up a single extension attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// All extension attributes, ordered by name.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Merge an update onto this record.
    ///
    /// Fields present on the update overwrite; absent fields are kept. The
    /// identifier is never touched.
    pub(crate) fn merge(&mut self, update: ItemUpdate) {
        if let Some(parent) = update.parent {
            self.parent = parent;
        }
        if let Some(label) = update.label {
            self.label = label;
        }
        self.extra.extend(update.extra);
    }
}

/// A partial update to an existing [`Item`].
///
/// Only the fields that are present are applied. `parent` distinguishes
/// "leave unchanged" (`None`) from "move to the top level" (`Some(None)`).
/// When deserialized, an omitted `parent` means unchanged and an explicit
/// `null` means top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    /// Identifier of the item to update.
    pub id: ItemId,
    /// New parent, if the parent should change.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<Option<ItemId>>,
    /// New label, if the label should change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extension attributes to set or overwrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ItemUpdate {
    /// An update for `id` that changes nothing yet.
    #[must_use]
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            label: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the new parent (`None` moves the item to the top level).
    #[must_use]
    pub fn parent(mut self, parent: Option<ItemId>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the new label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set or overwrite an extension attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

impl From<Item> for ItemUpdate {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            parent: Some(item.parent),
            label: Some(item.label),
            extra: item.extra,
        }
    }
}

// Maps a present field (including an explicit `null`) to `Some`, so that an
// absent field can fall through to `#[serde(default)]`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_flat_record_with_extras() {
        let item: Item = serde_json::from_value(json!({
            "id": 3,
            "parent": "root",
            "label": "Leaf",
            "color": "red",
            "weight": 2.5,
        }))
        .unwrap();

        assert_eq!(item.id(), &ItemId::Int(3));
        assert_eq!(item.parent(), Some(&ItemId::from("root")));
        assert_eq!(item.label(), "Leaf");
        assert_eq!(item.attribute("color"), Some(&json!("red")));
        assert_eq!(item.attributes().len(), 2);
    }

    #[test]
    fn missing_and_null_parent_are_top_level() {
        let absent: Item = serde_json::from_value(json!({"id": 1, "label": "a"})).unwrap();
        let null: Item =
            serde_json::from_value(json!({"id": 1, "parent": null, "label": "a"})).unwrap();
        assert_eq!(absent.parent(), None);
        assert_eq!(absent, null);
    }

    #[test]
    fn serializes_back_to_flat_record() {
        let item = Item::child(2, 1, "Child").with_attribute("color", "blue");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({"id": 2, "parent": 1, "label": "Child", "color": "blue"})
        );
    }

    #[test]
    fn update_distinguishes_absent_from_null_parent() {
        let absent: ItemUpdate = serde_json::from_value(json!({"id": 1, "label": "x"})).unwrap();
        assert_eq!(absent.parent, None);

        let null: ItemUpdate = serde_json::from_value(json!({"id": 1, "parent": null})).unwrap();
        assert_eq!(null.parent, Some(None));
        assert_eq!(null.label, None);
    }

    #[test]
    fn merge_keeps_fields_missing_from_update() {
        let mut item = Item::child(1, 0, "old").with_attribute("color", "red");
        item.merge(ItemUpdate::new(1).label("new").attribute("size", 3));

        assert_eq!(item.label(), "new");
        assert_eq!(item.parent(), Some(&ItemId::Int(0)));
        assert_eq!(item.attribute("color"), Some(&json!("red")));
        assert_eq!(item.attribute("size"), Some(&json!(3)));
    }

    #[test]
    fn merge_overwrites_same_named_attributes() {
        let mut item = Item::root(1, "a").with_attribute("color", "red");
        item.merge(ItemUpdate::new(1).attribute("color", "green"));
        assert_eq!(item.attribute("color"), Some(&json!("green")));
    }
}
