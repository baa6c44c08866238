//! The indexed, in-memory tree store.
//!
//! The [`TreeStore`] owns every item exactly once, in an arena of slots. The
//! canonical insertion order, the identifier index and the children index all
//! refer to records by slot:
//! - Canonical sequence: `Vec<Slot>` (insertion order)
//! - Identifier index: `HashMap<ItemId, Slot>`
//! - Children index: one bucket per parent identifier, plus a separate root
//!   bucket for items without a parent
//!
//! Every mutating operation updates the arena and both indices before it
//! returns.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::domain::{Config, Item, ItemId, ItemUpdate};

/// Position of a record in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Slot(usize);

/// Children buckets keyed by parent.
///
/// Top-level items live in `roots`, so the "no parent" key can never collide
/// with a real identifier.
#[derive(Debug, Clone, Default)]
struct Buckets {
    roots: Vec<Slot>,
    by_parent: HashMap<ItemId, Vec<Slot>>,
}

impl Buckets {
    fn get(&self, parent: Option<&ItemId>) -> &[Slot] {
        match parent {
            None => &self.roots,
            Some(id) => self.by_parent.get(id).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    fn entry(&mut self, parent: Option<&ItemId>) -> &mut Vec<Slot> {
        match parent {
            None => &mut self.roots,
            Some(id) => self.by_parent.entry(id.clone()).or_default(),
        }
    }

    fn remove_slot(&mut self, parent: Option<&ItemId>, slot: Slot) {
        let bucket = match parent {
            None => Some(&mut self.roots),
            Some(id) => self.by_parent.get_mut(id),
        };
        if let Some(bucket) = bucket {
            bucket.retain(|&member| member != slot);
        }
    }

    fn drop_parent(&mut self, id: &ItemId) {
        self.by_parent.remove(id);
    }

    fn retain(&mut self, mut keep: impl FnMut(Slot) -> bool) {
        self.roots.retain(|&slot| keep(slot));
        for bucket in self.by_parent.values_mut() {
            bucket.retain(|&slot| keep(slot));
        }
    }

    fn clear(&mut self) {
        self.roots.clear();
        self.by_parent.clear();
    }
}

/// Errors that can occur when mutating a [`TreeStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An item with this identifier already exists.
    #[error("item with id {0} already exists")]
    DuplicateIdentifier(ItemId),

    /// No item with this identifier exists.
    #[error("item with id {0} not found")]
    NotFound(ItemId),

    /// The referenced parent does not exist.
    ///
    /// Only returned when [`Config::enforce_parent_integrity`] is set.
    #[error("parent {parent} of item {id} not found")]
    ParentNotFound {
        /// Identifier of the item being added or updated.
        id: ItemId,
        /// The missing parent identifier.
        parent: ItemId,
    },

    /// Re-parenting would make the item its own ancestor.
    ///
    /// Only returned when [`Config::enforce_parent_integrity`] is set.
    #[error("moving item {id} under {parent} would create a cycle")]
    Cycle {
        /// Identifier of the item being moved.
        id: ItemId,
        /// The requested parent.
        parent: ItemId,
    },
}

/// An in-memory store for a flat collection of tree-structured items.
///
/// Lookups by identifier and of an item's direct children are O(1).
/// Subtree enumeration and removal are O(subtree size).
///
/// The store keeps a copy of the items it was constructed with; see
/// [`TreeStore::get_initial_state`].
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    config: Config,

    /// Owning storage. Removed records leave a `None` behind until the slot
    /// is reused.
    arena: Vec<Option<Item>>,

    /// Free slots available for reuse.
    vacant: Vec<Slot>,

    /// Canonical sequence, in insertion order.
    order: Vec<Slot>,

    /// Identifier lookup.
    index: HashMap<ItemId, Slot>,

    /// Children lookup.
    buckets: Buckets,

    /// The items as they were at construction time.
    initial: Vec<Item>,
}

impl TreeStore {
    /// Builds a store from an ordered collection of items, using the default
    /// [`Config`].
    ///
    /// Identifiers are not checked for uniqueness here. If the input contains
    /// a duplicate, both records stay in the collection and the later one
    /// wins identifier lookups.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self::with_config(items, Config::default())
    }

    /// Builds a store with the given configuration.
    #[must_use]
    #[instrument(level = "debug", skip(items), fields(count = items.len()))]
    pub fn with_config(items: Vec<Item>, config: Config) -> Self {
        let initial = items.clone();
        let mut store = Self {
            config,
            initial,
            ..Self::default()
        };
        store.rebuild(items);
        store
    }

    /// The configuration this store was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of items in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether an item with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates over all items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order.iter().filter_map(|&slot| self.record(slot))
    }

    /// Returns a copy of the full collection, in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Item> {
        self.iter().cloned().collect()
    }

    /// Returns a copy of the collection as it was at construction time.
    ///
    /// Later mutations, including [`TreeStore::update_items`], never affect
    /// this snapshot.
    #[must_use]
    pub fn get_initial_state(&self) -> Vec<Item> {
        self.initial.clone()
    }

    /// Looks up an item by identifier.
    #[must_use]
    pub fn get_item(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).and_then(|&slot| self.record(slot))
    }

    /// Iterates over the direct children of `id`, in sibling order.
    pub fn children(&self, id: &ItemId) -> impl Iterator<Item = &Item> + '_ {
        self.bucket_items(Some(id))
    }

    /// Iterates over the top-level items, in sibling order.
    pub fn roots(&self) -> impl Iterator<Item = &Item> + '_ {
        self.bucket_items(None)
    }

    /// Returns a copy of the direct children of `id`.
    ///
    /// Empty if `id` is unknown or has no children.
    #[must_use]
    pub fn get_children(&self, id: &ItemId) -> Vec<Item> {
        self.children(id).cloned().collect()
    }

    /// Borrows every descendant of `id`, in breadth-first (level) order.
    ///
    /// Each record is visited at most once, so a parent cycle terminates
    /// the traversal instead of looping.
    #[must_use]
    pub fn descendants(&self, id: &ItemId) -> Vec<&Item> {
        self.descendant_slots(id)
            .into_iter()
            .filter_map(|slot| self.record(slot))
            .collect()
    }

    /// Returns a copy of every descendant of `id`, in breadth-first order.
    #[must_use]
    pub fn get_all_children(&self, id: &ItemId) -> Vec<Item> {
        self.descendants(id).into_iter().cloned().collect()
    }

    /// Follows parent links upwards from `id`, nearest ancestor first.
    ///
    /// Stops at a top-level item, at a parent that is not present, or when a
    /// record would be visited twice. The item itself is not included.
    #[must_use]
    pub fn ancestors(&self, id: &ItemId) -> Vec<&Item> {
        let mut ancestors = Vec::new();
        let Some(&start) = self.index.get(id) else {
            return ancestors;
        };

        let mut seen = HashSet::from([start]);
        let mut current = self.record(start);

        while let Some(parent_slot) = current
            .and_then(|item| item.parent.as_ref())
            .and_then(|parent| self.index.get(parent).copied())
        {
            if !seen.insert(parent_slot) {
                break;
            }
            current = self.record(parent_slot);
            if let Some(item) = current {
                ancestors.push(item);
            }
        }

        ancestors
    }

    /// Adds a new item to the end of the collection and of its parent's
    /// children.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateIdentifier`] if the identifier already
    /// exists, or [`StoreError::ParentNotFound`] if parent integrity is
    /// enforced and the parent is missing. The store is unchanged on error.
    #[instrument(level = "debug", skip(self, item), fields(id = %item.id))]
    pub fn add_item(&mut self, item: Item) -> Result<(), StoreError> {
        if self.index.contains_key(&item.id) {
            return Err(StoreError::DuplicateIdentifier(item.id));
        }

        if self.config.enforce_parent_integrity {
            if let Some(parent) = &item.parent {
                if !self.index.contains_key(parent) {
                    return Err(StoreError::ParentNotFound {
                        id: item.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let id = item.id.clone();
        let parent = item.parent.clone();
        let slot = self.allocate(item);

        self.order.push(slot);
        self.index.insert(id, slot);
        self.buckets.entry(parent.as_ref()).push(slot);

        Ok(())
    }

    /// Removes `id` and its entire subtree.
    ///
    /// Returns the removed records in insertion order. Removing an unknown
    /// identifier is not an error; any items still pointing at it as their
    /// parent are treated as its subtree and removed too.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_item(&mut self, id: &ItemId) -> Vec<Item> {
        if !self.index.contains_key(id) {
            debug!("removing unknown item");
        }

        let mut doomed: HashSet<ItemId> = self
            .descendant_slots(id)
            .into_iter()
            .filter_map(|slot| self.record(slot))
            .map(|item| item.id.clone())
            .collect();
        doomed.insert(id.clone());

        let mut freed = Vec::new();
        self.order
            .retain(|&slot| match self.arena.get(slot.0).and_then(Option::as_ref) {
                Some(item) if doomed.contains(&item.id) => {
                    freed.push(slot);
                    false
                }
                Some(_) => true,
                None => false,
            });

        for doomed_id in &doomed {
            self.index.remove(doomed_id);
            self.buckets.drop_parent(doomed_id);
        }

        let freed_set: HashSet<Slot> = freed.iter().copied().collect();
        self.buckets.retain(|slot| !freed_set.contains(&slot));

        let removed: Vec<Item> = freed.iter().filter_map(|&slot| self.release(slot)).collect();
        trace!(removed = removed.len(), "subtree removed");
        removed
    }

    /// Merges an update onto an existing item.
    ///
    /// If the parent changes, the item moves to the end of its new parent's
    /// children. If only the label changes and
    /// [`Config::reorder_on_label_change`] is set (the default), the item is
    /// moved to the end of its current sibling list.
    ///
    /// Fields absent from the update are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no item has the update's
    /// identifier. With parent integrity enforced, also returns
    /// [`StoreError::ParentNotFound`] or [`StoreError::Cycle`] for an invalid
    /// new parent. The store is unchanged on error.
    #[instrument(level = "debug", skip(self, update))]
    pub fn update_item(&mut self, update: impl Into<ItemUpdate>) -> Result<(), StoreError> {
        let update = update.into();

        let Some((slot, stored)) = self
            .index
            .get(&update.id)
            .and_then(|&slot| self.record(slot).map(|item| (slot, item)))
        else {
            return Err(StoreError::NotFound(update.id));
        };

        let parent_changed = update
            .parent
            .as_ref()
            .is_some_and(|parent| *parent != stored.parent);
        let label_changed = self.config.reorder_on_label_change
            && update
                .label
                .as_ref()
                .is_some_and(|label| *label != stored.label);

        if parent_changed && self.config.enforce_parent_integrity {
            if let Some(Some(parent)) = &update.parent {
                self.check_reparent(&update.id, parent)?;
            }
        }

        if parent_changed || label_changed {
            let old_parent = stored.parent.clone();
            let new_parent = update.parent.clone().unwrap_or_else(|| old_parent.clone());
            debug!(id = %update.id, ?old_parent, ?new_parent, "moving item between buckets");

            self.buckets.remove_slot(old_parent.as_ref(), slot);
            self.buckets.entry(new_parent.as_ref()).push(slot);
        }

        if let Some(record) = self.arena.get_mut(slot.0).and_then(Option::as_mut) {
            record.merge(update);
        }

        Ok(())
    }

    /// Replaces the entire collection and rebuilds both indices.
    ///
    /// The construction-time snapshot is not affected.
    #[instrument(level = "debug", skip(self, items), fields(count = items.len()))]
    pub fn update_items(&mut self, items: Vec<Item>) {
        self.rebuild(items);
    }

    /// Items whose parent is set but not present in the store.
    #[must_use]
    pub fn dangling_parents(&self) -> Vec<&Item> {
        self.iter()
            .filter(|item| {
                item.parent
                    .as_ref()
                    .is_some_and(|parent| !self.index.contains_key(parent))
            })
            .collect()
    }

    /// Identifiers that occur more than once in the collection, in order of
    /// first occurrence.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<&ItemId> {
        let mut counts: HashMap<&ItemId, usize> = HashMap::new();
        for item in self.iter() {
            *counts.entry(&item.id).or_default() += 1;
        }

        let mut reported = HashSet::new();
        self.iter()
            .map(|item| &item.id)
            .filter(|id| counts.get(id).is_some_and(|&count| count > 1) && reported.insert(*id))
            .collect()
    }

    /// Determine whether the parent links contain any cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.parent_graph())
    }

    /// Return all parent-link cycles as sorted sets of identifiers.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<ItemId>> {
        let graph = self.parent_graph();
        let mut cycles = Vec::new();

        for component in tarjan_scc(&graph) {
            let is_cycle = match component.as_slice() {
                [] => false,
                [node] => graph.contains_edge(*node, *node),
                _ => true,
            };
            if !is_cycle {
                continue;
            }

            let mut ids: Vec<_> = component
                .iter()
                .filter_map(|&slot| self.record(slot))
                .map(|item| item.id.clone())
                .collect();
            ids.sort();
            cycles.push(ids);
        }

        cycles.sort();
        cycles
    }
}

impl TreeStore {
    fn record(&self, slot: Slot) -> Option<&Item> {
        self.arena.get(slot.0).and_then(Option::as_ref)
    }

    fn bucket_items(&self, parent: Option<&ItemId>) -> impl Iterator<Item = &Item> + '_ {
        self.buckets
            .get(parent)
            .iter()
            .filter_map(|&slot| self.record(slot))
    }

    fn allocate(&mut self, item: Item) -> Slot {
        if let Some(slot) = self.vacant.pop() {
            self.arena[slot.0] = Some(item);
            slot
        } else {
            self.arena.push(Some(item));
            Slot(self.arena.len() - 1)
        }
    }

    fn release(&mut self, slot: Slot) -> Option<Item> {
        let item = self.arena.get_mut(slot.0)?.take()?;
        self.vacant.push(slot);
        Some(item)
    }

    /// Discards all records and indices and rebuilds them from `items`.
    fn rebuild(&mut self, items: Vec<Item>) {
        self.arena = items.into_iter().map(Some).collect();
        self.vacant.clear();
        self.order = (0..self.arena.len()).map(Slot).collect();
        self.index.clear();
        self.buckets.clear();

        for (position, record) in self.arena.iter().enumerate() {
            let Some(item) = record else {
                continue;
            };
            let slot = Slot(position);
            if self.index.insert(item.id.clone(), slot).is_some() {
                debug!(id = %item.id, "duplicate identifier, later record wins lookups");
            }
            self.buckets.entry(item.parent.as_ref()).push(slot);
        }
    }

    /// Breadth-first walk of the subtree below `id`, excluding `id` itself.
    fn descendant_slots(&self, id: &ItemId) -> Vec<Slot> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<Slot> = self.buckets.get(Some(id)).iter().copied().collect();

        while let Some(slot) = queue.pop_front() {
            if !visited.insert(slot) {
                continue;
            }
            result.push(slot);
            if let Some(item) = self.record(slot) {
                queue.extend(self.buckets.get(Some(&item.id)));
            }
        }

        result
    }

    fn check_reparent(&self, id: &ItemId, parent: &ItemId) -> Result<(), StoreError> {
        if !self.index.contains_key(parent) {
            return Err(StoreError::ParentNotFound {
                id: id.clone(),
                parent: parent.clone(),
            });
        }

        let creates_cycle = id == parent
            || self
                .descendant_slots(id)
                .into_iter()
                .filter_map(|slot| self.record(slot))
                .any(|item| &item.id == parent);

        if creates_cycle {
            return Err(StoreError::Cycle {
                id: id.clone(),
                parent: parent.clone(),
            });
        }

        Ok(())
    }

    /// Parent links as a graph. Nodes are slots, edges point from child to
    /// parent. Links to missing parents are skipped.
    fn parent_graph(&self) -> DiGraphMap<Slot, ()> {
        let mut graph = DiGraphMap::with_capacity(self.order.len(), self.order.len());
        for &slot in &self.order {
            graph.add_node(slot);
            let parent_slot = self
                .record(slot)
                .and_then(|item| item.parent.as_ref())
                .and_then(|parent| self.index.get(parent));
            if let Some(&parent_slot) = parent_slot {
                graph.add_edge(slot, parent_slot, ());
            }
        }
        graph
    }
}
