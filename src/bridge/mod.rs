//! Bridge between the pool controller and the HAP attributes.
//!
//! - `engine`: synchronization in both directions
//! - `handle`: per-attribute getter/setter for the HAP server

pub mod engine;
pub mod handle;

pub use engine::{DEFAULT_WRITE_TIMEOUT, SyncEngine};
pub use handle::AttributeHandle;
