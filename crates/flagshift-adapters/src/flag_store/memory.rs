//! In-memory flag store.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use flagshift_core::{
    application::{ApplicationError, ports::FlagStore},
    domain::{DomainError, FlagKey, FlagVariant},
    error::FlagshiftResult,
};

type Environments = BTreeMap<String, BTreeMap<FlagKey, FlagVariant>>;

/// Thread-safe in-memory flag store.
///
/// Clones share state, so a clone handed to a service stays observable.
#[derive(Clone, Default)]
pub struct InMemoryFlagStore {
    inner: Arc<RwLock<Environments>>,
}

impl InMemoryFlagStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one environment.
    pub fn with_environment(
        environment: impl Into<String>,
        flags: BTreeMap<FlagKey, FlagVariant>,
    ) -> Self {
        let mut data = Environments::new();
        data.insert(environment.into(), flags);
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Total number of flags across environments.
    pub fn len(&self) -> FlagshiftResult<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.values().map(BTreeMap::len).sum())
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> FlagshiftResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Clear all environments.
    pub fn clear(&self) -> FlagshiftResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.clear();
        Ok(())
    }
}

impl FlagStore for InMemoryFlagStore {
    fn get(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<Option<FlagVariant>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        Ok(inner.get(environment).and_then(|env| env.get(key)).cloned())
    }

    fn put(&self, environment: &str, key: &FlagKey, variant: FlagVariant) -> FlagshiftResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner
            .entry(environment.to_string())
            .or_default()
            .insert(key.clone(), variant);
        Ok(())
    }

    fn delete(&self, environment: &str, key: &FlagKey) -> FlagshiftResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        let removed = inner.get_mut(environment).and_then(|env| env.remove(key));
        if removed.is_none() {
            return Err(DomainError::FlagNotFound {
                environment: environment.to_string(),
                key: key.to_string(),
            }
            .into());
        }

        // Drop emptied environments so `environments()` stays accurate.
        if inner.get(environment).is_some_and(BTreeMap::is_empty) {
            inner.remove(environment);
        }
        Ok(())
    }

    fn list(&self, environment: &str) -> FlagshiftResult<BTreeMap<FlagKey, FlagVariant>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        Ok(inner.get(environment).cloned().unwrap_or_default())
    }

    fn environments(&self) -> FlagshiftResult<Vec<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        Ok(inner.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagshift_core::domain::{BooleanFlag, IntegerFlag};

    fn key(raw: &str) -> FlagKey {
        FlagKey::parse(raw).unwrap()
    }

    #[test]
    fn environments_are_isolated() {
        let store = InMemoryFlagStore::new();
        let flag = FlagVariant::Boolean(BooleanFlag::new(true));
        store.put("dev", &key("a"), flag.clone()).unwrap();

        assert_eq!(store.get("dev", &key("a")).unwrap(), Some(flag));
        assert_eq!(store.get("prod", &key("a")).unwrap(), None);
        assert!(store.list("prod").unwrap().is_empty());
    }

    #[test]
    fn put_replaces() {
        let store = InMemoryFlagStore::new();
        store
            .put("dev", &key("n"), FlagVariant::Integer(IntegerFlag::new(0, 1, 0)))
            .unwrap();
        store
            .put("dev", &key("n"), FlagVariant::Integer(IntegerFlag::new(0, 9, 3)))
            .unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(
            store.get("dev", &key("n")).unwrap(),
            Some(FlagVariant::Integer(IntegerFlag::new(0, 9, 3)))
        );
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = InMemoryFlagStore::new();
        assert!(store.delete("dev", &key("ghost")).is_err());
    }

    #[test]
    fn deleting_last_flag_drops_environment() {
        let store = InMemoryFlagStore::new();
        store
            .put("qa", &key("a"), FlagVariant::Boolean(BooleanFlag::new(false)))
            .unwrap();
        assert_eq!(store.environments().unwrap(), ["qa"]);

        store.delete("qa", &key("a")).unwrap();
        assert!(store.environments().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn list_is_sorted_by_key() {
        let mut seed = BTreeMap::new();
        for raw in ["zeta", "alpha", "mid/x"] {
            seed.insert(key(raw), FlagVariant::Boolean(BooleanFlag::new(true)));
        }
        let store = InMemoryFlagStore::with_environment("dev", seed);

        let keys: Vec<_> = store
            .list("dev")
            .unwrap()
            .into_keys()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, ["alpha", "mid/x", "zeta"]);
    }
}
