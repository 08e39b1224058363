//! Regeneration cycles and the published, content-hashed snapshot.

mod publisher;
mod snapshot;

pub use publisher::{build_snapshot, Publisher, RegenerateError, ScheduleConfig};
pub use snapshot::{
    normalize_for_hash, read_snapshot, snapshot_hash, verify_snapshot_hash, write_snapshot,
    Snapshot, SnapshotError, SnapshotFiles, VerificationResult, SNAPSHOT_FILE,
};
