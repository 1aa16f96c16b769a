//! Database layer - document stores and backend queries

pub mod memory;
pub mod postgres;
pub mod query;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use query::{CollectionQuery, WriteBatch, WriteOp};
pub use traits::DocumentStore;
