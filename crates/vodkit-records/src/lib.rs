//! Durable record store contract for jobs, assets and variants.
//!
//! The transcode core only requires atomic read-modify-write per entity and
//! the ability to compose multi-entity updates into one transaction. The
//! contract is expressed as a scoped-transaction primitive: `begin` a
//! transaction, read and stage writes through it, then `commit`. Dropping an
//! uncommitted transaction discards every staged write.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{RecordError, RecordResult};
pub use memory::MemoryRecordStore;
pub use store::{RecordStore, RecordTx};
