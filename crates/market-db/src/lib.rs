//! # market-db
//!
//! Database layer implementing the persistence traits of `market-core`.
//!
//! ## Overview
//!
//! - Connection pool management and runtime migrations
//! - Database models with SQLx `FromRow` derives
//! - Model -> entity mappers
//! - PostgreSQL repository implementations
//! - [`memory::InMemoryStore`], a process-local store implementing every
//!   repository trait, selected with `DATABASE_URL=memory://`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use market_db::{create_pool, run_migrations, PgUserRepository};
//!
//! let pool = create_pool(&config.database).await?;
//! run_migrations(&pool).await?;
//! let users = PgUserRepository::new(pool);
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::InMemoryStore;
pub use pool::{create_pool, run_migrations, PgPool};
pub use repositories::{
    PgAttachmentRepository, PgBidRepository, PgMessageRepository, PgProjectRepository,
    PgUserRepository,
};
