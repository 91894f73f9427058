//! Test fixtures and data generators
//!
//! Seeds users, projects and bids straight into the in-memory store.

use std::sync::atomic::{AtomicU64, Ordering};

use market_core::{Bid, EntityId, Project, User, UserRole};
use market_db::InMemoryStore;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Insert a user with a unique name
pub fn seed_user(store: &InMemoryStore, prefix: &str, role: UserRole) -> User {
    let user = User::new(
        EntityId::generate(),
        format!("{prefix}{}", unique_suffix()),
        role,
    );
    store.insert_user(user.clone());
    user
}

/// A client, a freelancer who bid on the client's project, and the project
pub struct Marketplace {
    pub client: User,
    pub freelancer: User,
    pub project: Project,
}

impl Marketplace {
    pub fn seed(store: &InMemoryStore) -> Self {
        let client = seed_user(store, "client", UserRole::Client);
        let freelancer = seed_user(store, "freelancer", UserRole::Freelancer);
        let project = Project::new(
            EntityId::generate(),
            format!("Project {}", unique_suffix()),
            client.id,
        );
        store.insert_project(project.clone());
        store.insert_bid(Bid::new(EntityId::generate(), project.id, freelancer.id));

        Self {
            client,
            freelancer,
            project,
        }
    }
}
