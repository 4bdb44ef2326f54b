//! Build cache
//!
//! Keeps dependencies from being rebuilt when nothing about them changed.
//! After a successful build the pipeline writes a version file recording
//! the commit-ish and the fingerprint of every platform's artifact. Before
//! the next build the evaluator compares that record against the checkout
//! and the artifacts on disk.
//!
//! # Staleness
//!
//! | Check | Stale when |
//! |-------|------------|
//! | Record | No version file, or it does not parse |
//! | Commit-ish | Recorded commit-ish differs from the checkout |
//! | Platform | Record has no fingerprint for the platform |
//! | Fingerprint | Artifact on disk hashes differently |

pub mod fingerprint;
pub mod record;
pub mod staleness;

pub use fingerprint::{ContentFingerprinter, Fingerprint, Fingerprinter};
pub use record::{VersionRecord, VersionRecordStore};
pub use staleness::BuildCacheEvaluator;
