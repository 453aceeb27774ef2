pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::InMemoryTaskRecordStore;
pub use postgres::PgTaskRecordStore;
