//! Port contracts for the records context.

mod repository;

pub use repository::{RecordStore, RecordStoreError, RecordStoreResult};
