//! In-memory instance store.

use super::{InstanceFilter, InstanceStore, StoreError};
use crate::model::Instance;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Instance store backed by a concurrent map.
///
/// Locking is scoped to one shard of the map, so writers on different
/// instances rarely contend.
#[derive(Debug, Default)]
pub struct InMemoryInstanceStore {
    instances: DashMap<String, Instance>,
}

impl InMemoryInstanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl InstanceStore for InMemoryInstanceStore {
    fn insert(&self, mut instance: Instance) -> Result<Instance, StoreError> {
        match self.instances.entry(instance.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(instance.id)),
            Entry::Vacant(slot) => {
                instance.version = 1;
                slot.insert(instance.clone());
                Ok(instance)
            }
        }
    }

    fn get(&self, instance_id: &str) -> Result<Option<Instance>, StoreError> {
        Ok(self.instances.get(instance_id).map(|entry| entry.value().clone()))
    }

    fn update(&self, mut instance: Instance, expected_version: u64) -> Result<Instance, StoreError> {
        let mut stored = self
            .instances
            .get_mut(&instance.id)
            .ok_or_else(|| StoreError::NotFound(instance.id.clone()))?;

        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                instance_id: instance.id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        instance.version = expected_version + 1;
        *stored = instance.clone();
        Ok(instance)
    }

    fn find(&self, filter: &InstanceFilter) -> Result<Vec<Instance>, StoreError> {
        let mut found: Vec<Instance> = self
            .instances
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.initiated_at.cmp(&b.initiated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InstanceStatus;
    use crate::testing::fixtures::draft_instance;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_and_get() {
        let store = InMemoryInstanceStore::new();
        let stored = store.insert(draft_instance("inst-1", "part", "p-1")).unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(store.get("inst-1").unwrap(), Some(stored));
        assert_eq!(store.get("missing").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let store = InMemoryInstanceStore::new();
        store.insert(draft_instance("inst-1", "part", "p-1")).unwrap();

        let err = store.insert(draft_instance("inst-1", "part", "p-1")).unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("inst-1".to_string()));
    }

    #[test]
    fn test_update_bumps_version() {
        let store = InMemoryInstanceStore::new();
        let mut inst = store.insert(draft_instance("inst-1", "part", "p-1")).unwrap();

        inst.status = InstanceStatus::Active;
        let updated = store.update(inst, 1).unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(store.get("inst-1").unwrap().unwrap().status, InstanceStatus::Active);
    }

    #[test]
    fn test_stale_update_is_rejected() {
        let store = InMemoryInstanceStore::new();
        let first = store.insert(draft_instance("inst-1", "part", "p-1")).unwrap();
        let second = first.clone();

        store.update(first, 1).unwrap();
        let err = store.update(second, 1).unwrap_err();

        assert!(matches!(err, StoreError::Conflict { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn test_update_missing_instance() {
        let store = InMemoryInstanceStore::new();
        let err = store.update(draft_instance("ghost", "part", "p-1"), 0).unwrap_err();
        assert_eq!(err, StoreError::NotFound("ghost".to_string()));
    }

    #[test]
    fn test_find_filters() {
        let store = InMemoryInstanceStore::new();
        store.insert(draft_instance("inst-1", "part", "p-1")).unwrap();
        store.insert(draft_instance("inst-2", "part", "p-2")).unwrap();
        store.insert(draft_instance("inst-3", "document", "p-1")).unwrap();

        let found = store.find(&InstanceFilter::for_entity("part", "p-1")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "inst-1");

        assert_eq!(store.find(&InstanceFilter::all()).unwrap().len(), 3);
        assert!(store.find(&InstanceFilter::in_progress()).unwrap().is_empty());
    }
}
