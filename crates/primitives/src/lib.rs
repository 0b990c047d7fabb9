//! Primitive types shared across the batch submission and data derivation core.

pub use block::{BlockInfo, L1BlockRef, L2Block, L2BlockRef};
mod block;

pub use blob::IndexedBlobHash;
mod blob;

pub use config::{RollupConfig, SystemConfig};
mod config;

pub use sync::SyncStatus;
mod sync;
