use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use outletops_core::{AggregateRoot, DomainError, ExpectedVersion};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for DomainError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Concurrency(msg) => DomainError::conflict(msg),
            RepositoryError::Unavailable(msg) => DomainError::unavailable(msg),
        }
    }
}

/// Keyed aggregate storage with optimistic concurrency.
///
/// `save` compares `expected` against the version currently stored under the
/// aggregate's id and replaces it atomically when they match.
pub trait Repository<A: AggregateRoot>: Send + Sync {
    fn get(&self, id: &A::Id) -> Result<Option<A>, RepositoryError>;

    fn save(&self, aggregate: A, expected: ExpectedVersion) -> Result<(), RepositoryError>;

    fn upsert(&self, aggregate: A) -> Result<(), RepositoryError> {
        self.save(aggregate, ExpectedVersion::Any)
    }

    /// Returns whether something was removed.
    fn delete(&self, id: &A::Id) -> Result<bool, RepositoryError>;

    fn list(&self) -> Result<Vec<A>, RepositoryError>;
}

impl<A, S> Repository<A> for Arc<S>
where
    A: AggregateRoot,
    S: Repository<A> + ?Sized,
{
    fn get(&self, id: &A::Id) -> Result<Option<A>, RepositoryError> {
        (**self).get(id)
    }

    fn save(&self, aggregate: A, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        (**self).save(aggregate, expected)
    }

    fn delete(&self, id: &A::Id) -> Result<bool, RepositoryError> {
        (**self).delete(id)
    }

    fn list(&self) -> Result<Vec<A>, RepositoryError> {
        (**self).list()
    }
}

/// In-memory repository for tests/dev. Lists in id order, which for UUIDv7
/// ids is creation order.
#[derive(Debug)]
pub struct InMemoryRepository<A: AggregateRoot> {
    inner: RwLock<BTreeMap<A::Id, A>>,
}

impl<A: AggregateRoot> InMemoryRepository<A>
where
    A::Id: Ord,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<A: AggregateRoot> Default for InMemoryRepository<A>
where
    A::Id: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("repository lock poisoned".to_string())
}

impl<A> Repository<A> for InMemoryRepository<A>
where
    A: AggregateRoot + Clone + Send + Sync + 'static,
    A::Id: Ord + Send + Sync,
{
    fn get(&self, id: &A::Id) -> Result<Option<A>, RepositoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    fn save(&self, aggregate: A, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let current = map.get(aggregate.id()).map(AggregateRoot::version);

        if !expected.matches(current) {
            return Err(RepositoryError::Concurrency(format!(
                "expected {expected:?}, found {current:?}"
            )));
        }

        map.insert(aggregate.id().clone(), aggregate);
        Ok(())
    }

    fn delete(&self, id: &A::Id) -> Result<bool, RepositoryError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<A>, RepositoryError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}
