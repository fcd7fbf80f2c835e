//! # Viva Store
//!
//! Repository implementations for the interview engine:
//! [`MemoryRepository`] for tests and in-process embedding, and
//! [`SqliteRepository`] for durable storage.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;
