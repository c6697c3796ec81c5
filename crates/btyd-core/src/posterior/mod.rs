//! Posterior samples after a fit: the in-memory store and its snapshots.

pub mod persist;
pub mod store;

pub use persist::{
    load_snapshot, save_snapshot, PosteriorSnapshot, SnapshotFormat, SNAPSHOT_SCHEMA_VERSION,
};
pub use store::PosteriorStore;
