pub mod memory_store;
pub mod postgres_store;

pub use memory_store::InMemoryWalletStore;
pub use postgres_store::PostgresWalletStore;
