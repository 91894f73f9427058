//! Service context - dependency container for services
//!
//! Holds the repositories, the history cache, the idempotency map and the
//! background task executor. Built once per process and shared by every
//! connection.

use std::sync::Arc;

use market_cache::HistoryCache;
use market_common::ChatConfig;
use market_core::{
    AttachmentRepository, BidRepository, MessageRepository, ProjectRepository, UserRepository,
};

use super::error::{ServiceError, ServiceResult};
use super::idempotency::IdempotencyStore;
use super::tasks::BackgroundTasks;

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    bid_repo: Arc<dyn BidRepository>,
    message_repo: Arc<dyn MessageRepository>,
    attachment_repo: Arc<dyn AttachmentRepository>,

    // Cache
    cache: HistoryCache,

    // Process-local state
    idempotency: Arc<IdempotencyStore>,
    tasks: BackgroundTasks,

    config: ChatConfig,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the project repository
    pub fn project_repo(&self) -> &dyn ProjectRepository {
        self.project_repo.as_ref()
    }

    /// Get the bid repository
    pub fn bid_repo(&self) -> &dyn BidRepository {
        self.bid_repo.as_ref()
    }

    /// Get the message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    /// Owned handle to the message repository, for background tasks
    pub fn shared_message_repo(&self) -> Arc<dyn MessageRepository> {
        Arc::clone(&self.message_repo)
    }

    /// Get the attachment repository
    pub fn attachment_repo(&self) -> &dyn AttachmentRepository {
        self.attachment_repo.as_ref()
    }

    // === Cache / state ===

    /// Get the history cache
    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// Get the idempotency map
    pub fn idempotency(&self) -> &IdempotencyStore {
        self.idempotency.as_ref()
    }

    /// Get the background task executor
    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Get the chat tuning
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("idempotency_entries", &self.idempotency.len())
            .field("tasks_in_flight", &self.tasks.in_flight())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    project_repo: Option<Arc<dyn ProjectRepository>>,
    bid_repo: Option<Arc<dyn BidRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    attachment_repo: Option<Arc<dyn AttachmentRepository>>,
    cache: Option<HistoryCache>,
    config: Option<ChatConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one store for every repository
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: UserRepository
            + ProjectRepository
            + BidRepository
            + MessageRepository
            + AttachmentRepository
            + 'static,
    {
        self.user_repo(store.clone())
            .project_repo(store.clone())
            .bid_repo(store.clone())
            .message_repo(store.clone())
            .attachment_repo(store)
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn project_repo(mut self, repo: Arc<dyn ProjectRepository>) -> Self {
        self.project_repo = Some(repo);
        self
    }

    pub fn bid_repo(mut self, repo: Arc<dyn BidRepository>) -> Self {
        self.bid_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn attachment_repo(mut self, repo: Arc<dyn AttachmentRepository>) -> Self {
        self.attachment_repo = Some(repo);
        self
    }

    pub fn cache(mut self, cache: HistoryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a repository or the cache is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let config = self.config.unwrap_or_default();
        let idempotency =
            IdempotencyStore::new(config.idempotency_ttl(), config.idempotency_sweep_interval());

        Ok(ServiceContext {
            user_repo: self.user_repo.ok_or_else(|| missing("user_repo"))?,
            project_repo: self.project_repo.ok_or_else(|| missing("project_repo"))?,
            bid_repo: self.bid_repo.ok_or_else(|| missing("bid_repo"))?,
            message_repo: self.message_repo.ok_or_else(|| missing("message_repo"))?,
            attachment_repo: self.attachment_repo.ok_or_else(|| missing("attachment_repo"))?,
            cache: self.cache.ok_or_else(|| missing("cache"))?,
            idempotency: Arc::new(idempotency),
            tasks: BackgroundTasks::new(),
            config,
        })
    }
}

fn missing(dependency: &str) -> ServiceError {
    ServiceError::validation(format!("{dependency} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_cache::MemoryCacheStore;
    use market_db::InMemoryStore;

    #[test]
    fn test_build_requires_repositories() {
        let err = ServiceContext::builder().build().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: user_repo is required");
    }

    #[test]
    fn test_build_with_store() {
        let ctx = ServiceContext::builder()
            .store(Arc::new(InMemoryStore::new()))
            .cache(HistoryCache::new(Arc::new(MemoryCacheStore::new())))
            .build()
            .unwrap();
        assert_eq!(ctx.config().heartbeat_interval_secs, 30);
        assert!(ctx.idempotency().is_empty());
    }
}
