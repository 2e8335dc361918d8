//! Index-addressable handle bound to one stored list.

use super::{EasyStore, StoreResult};
use serde::Serialize;
use serde_json::Value;

/// Handle to the list stored under one name.
///
/// Holds no data of its own: every call goes to the store, so two views of
/// the same name always agree.
#[derive(Clone, Copy)]
pub struct ListView<'s> {
    store: &'s EasyStore,
    name: &'s str,
}

impl<'s> ListView<'s> {
    pub(crate) fn new(store: &'s EasyStore, name: &'s str) -> Self {
        Self { store, name }
    }

    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn get(&self, index: usize) -> StoreResult<Value> {
        self.store.list_get_item(self.name, index)
    }

    /// Writes `value` at `index`.
    ///
    /// Writing past the end first fills every missing index with `null`, so
    /// `set(i, v)` on a list of length `n <= i` leaves length `i + 1`.
    pub fn set<T: Serialize + ?Sized>(&self, index: usize, value: &T) -> StoreResult<()> {
        self.store.list_set_extending(self.name, index, value)
    }

    pub fn len(&self) -> StoreResult<usize> {
        self.store.list_len(self.name)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(!self.store.list_exists(self.name)?)
    }

    pub fn append<T: Serialize + ?Sized>(&self, value: &T) -> StoreResult<()> {
        self.store.list_append(self.name, value)
    }

    /// Removes the item at `index`; later items move down by one.
    pub fn remove(&self, index: usize) -> StoreResult<()> {
        self.store.list_remove(self.name, index)
    }

    /// Materializes the whole list in index order.
    pub fn to_vec(&self) -> StoreResult<Vec<Value>> {
        self.store.list_get_all(self.name)
    }
}

impl std::fmt::Debug for ListView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView").field("name", &self.name).finish()
    }
}

impl EasyStore {
    /// Returns a view over the list stored under `name`.
    ///
    /// The list does not need to exist yet; the first write creates it.
    pub fn list_view<'s>(&'s self, name: &'s str) -> ListView<'s> {
        ListView::new(self, name)
    }
}
