//! Repository layer for data access.
//!
//! `PersistentStore` is the system of record; `GenericRepository` puts a
//! cache-aside layer in front of any store; `UserRepository` is the
//! user-facing contract the services depend on.

pub mod entities;
mod generic;
mod memory;
mod sea_store;
mod store;
mod user_repository;

pub use generic::{GenericRepository, Page};
pub use memory::MemoryStore;
pub use sea_store::SeaOrmUserStore;
pub use store::{PersistentStore, UserStore};
pub use user_repository::{CachedUserRepository, UserRepository};

#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
