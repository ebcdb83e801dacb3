//! In-process collaborator implementations
//!
//! - [`memory`] - row / blob / auth kept in memory
//! - [`fs`] - blob store on a local directory

pub mod fs;
pub mod memory;

pub use fs::FsBlobStore;
pub use memory::{MemoryBlobStore, MemoryRowStore, StaticAuthProvider};
