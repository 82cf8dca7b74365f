//! Repository factory keyed by storage engine.
//!
//! Each engine registers an async constructor during wiring. At startup the
//! configured engine is resolved and built once; the caller owns the returned
//! [`ReleaseHandle`] and must release it on shutdown. The factory keeps no
//! reference to what it created.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::config::DatabaseEngine;
use crate::domain::foundation::ErrorCode;
use crate::ports::RepositoryError;

/// Errors raised while registering or resolving engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactoryError {
    #[error("repository engine already registered: {0}")]
    DuplicateEngine(DatabaseEngine),

    #[error("repository engine not registered: {0}")]
    EngineNotFound(DatabaseEngine),

    /// The constructor itself failed (connectivity, migrations).
    #[error(transparent)]
    Construction(#[from] RepositoryError),
}

impl FactoryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FactoryError::DuplicateEngine(_) => ErrorCode::Conflict,
            FactoryError::EngineNotFound(_) => ErrorCode::NotFound,
            FactoryError::Construction(e) => e.code(),
        }
    }
}

/// Shutdown hook for a constructed repository.
pub struct ReleaseHandle {
    release: Option<Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>>,
}

impl ReleaseHandle {
    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn new<F, Fut>(release: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            release: Some(Box::new(move || Box::pin(release()))),
        }
    }

    /// Closes whatever the constructor opened.
    pub async fn release(self) {
        if let Some(release) = self.release {
            release().await;
        }
    }
}

impl fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("noop", &self.release.is_none())
            .finish()
    }
}

/// A repository together with its release hook.
#[derive(Debug)]
pub struct CreatedRepository<R> {
    pub repository: R,
    pub release: ReleaseHandle,
}

type Constructor<R> =
    Box<dyn Fn() -> BoxFuture<'static, Result<(R, ReleaseHandle), RepositoryError>> + Send + Sync>;

/// Registry of repository constructors keyed by engine.
pub struct RepositoryFactory<R> {
    constructors: HashMap<DatabaseEngine, Constructor<R>>,
}

impl<R: Send + 'static> RepositoryFactory<R> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers the constructor for `engine`.
    ///
    /// # Errors
    ///
    /// - `DuplicateEngine` if the engine already has a constructor
    pub fn register_repository<F, Fut>(
        &mut self,
        engine: DatabaseEngine,
        constructor: F,
    ) -> Result<(), FactoryError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(R, ReleaseHandle), RepositoryError>> + Send + 'static,
    {
        if self.constructors.contains_key(&engine) {
            return Err(FactoryError::DuplicateEngine(engine));
        }
        self.constructors
            .insert(engine, Box::new(move || Box::pin(constructor())));
        Ok(())
    }

    /// Builds the repository for `engine`.
    ///
    /// # Errors
    ///
    /// - `EngineNotFound` for an unregistered engine
    /// - `Construction` wrapping the constructor's error unchanged
    #[tracing::instrument(skip(self))]
    pub async fn create_repository(
        &self,
        engine: DatabaseEngine,
    ) -> Result<CreatedRepository<R>, FactoryError> {
        let constructor = self
            .constructors
            .get(&engine)
            .ok_or(FactoryError::EngineNotFound(engine))?;

        let (repository, release) = constructor().await?;
        tracing::info!(%engine, "repository created");
        Ok(CreatedRepository {
            repository,
            release,
        })
    }

    /// Returns the registered engines, sorted by name.
    pub fn registered_engines(&self) -> Vec<DatabaseEngine> {
        let mut engines: Vec<_> = self.constructors.keys().copied().collect();
        engines.sort_by_key(|e| e.as_str());
        engines
    }
}

impl<R: Send + 'static> Default for RepositoryFactory<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for RepositoryFactory<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut engines: Vec<_> = self.constructors.keys().map(|e| e.as_str()).collect();
        engines.sort_unstable();
        f.debug_struct("RepositoryFactory")
            .field("engines", &engines)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn factory() -> RepositoryFactory<&'static str> {
        let mut factory = RepositoryFactory::new();
        factory
            .register_repository(DatabaseEngine::InMemory, || async {
                Ok(("memory", ReleaseHandle::noop()))
            })
            .unwrap();
        factory
    }

    #[tokio::test]
    async fn creates_registered_engine() {
        let created = factory()
            .create_repository(DatabaseEngine::InMemory)
            .await
            .unwrap();

        assert_eq!(created.repository, "memory");
        created.release.release().await;
    }

    #[tokio::test]
    async fn unknown_engine_is_not_found() {
        let err = factory()
            .create_repository(DatabaseEngine::Postgres)
            .await
            .unwrap_err();

        assert_eq!(err, FactoryError::EngineNotFound(DatabaseEngine::Postgres));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn duplicate_engine_is_rejected() {
        let mut factory = factory();

        let err = factory
            .register_repository(DatabaseEngine::InMemory, || async {
                Ok(("again", ReleaseHandle::noop()))
            })
            .unwrap_err();

        assert_eq!(err, FactoryError::DuplicateEngine(DatabaseEngine::InMemory));
        assert_eq!(factory.registered_engines(), vec![DatabaseEngine::InMemory]);
    }

    #[tokio::test]
    async fn construction_errors_propagate_unchanged() {
        let mut factory: RepositoryFactory<&'static str> = RepositoryFactory::new();
        factory
            .register_repository(DatabaseEngine::Postgres, || async {
                Err(RepositoryError::Connection("refused".into()))
            })
            .unwrap();

        let err = factory
            .create_repository(DatabaseEngine::Postgres)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FactoryError::Construction(RepositoryError::Connection("refused".into()))
        );
    }

    #[tokio::test]
    async fn each_create_invokes_the_constructor_and_release_runs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicBool::new(false));
        let mut factory = RepositoryFactory::new();
        let (b, r) = (built.clone(), released.clone());
        factory
            .register_repository(DatabaseEngine::InMemory, move || {
                let n = b.fetch_add(1, Ordering::SeqCst);
                let r = r.clone();
                async move {
                    let release = ReleaseHandle::new(move || async move {
                        r.store(true, Ordering::SeqCst);
                    });
                    Ok((n, release))
                }
            })
            .unwrap();

        let first = factory.create_repository(DatabaseEngine::InMemory).await.unwrap();
        let second = factory.create_repository(DatabaseEngine::InMemory).await.unwrap();

        assert_eq!((first.repository, second.repository), (0, 1));
        assert!(!released.load(Ordering::SeqCst));
        first.release.release().await;
        assert!(released.load(Ordering::SeqCst));
    }
}
