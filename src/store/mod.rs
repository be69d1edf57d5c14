//! Settings persistence.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlSettings;
pub use memory::InMemorySettings;
pub use traits::SettingsRepository;
