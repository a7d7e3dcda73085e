//! Object location: object id → storage path
//!
//! Pattern adapted from the doorway MongoDB wrapper, reduced to the one
//! lookup the gateway needs.

pub mod locator;
pub mod memory;
pub mod mongo;
pub mod schemas;

pub use locator::{ObjectLocator, ResolvedObject};
pub use memory::MemoryObjectLocator;
pub use mongo::MongoObjectLocator;
pub use schemas::MediaRecord;
