//! Repository mirrors
//!
//! Each dependency is mirrored once per machine under the mirror directory
//! and checked out of that mirror into the project. The coordinator decides
//! whether a mirror must be cloned, fetched or left alone; the throttle keeps
//! a remote from being fetched more than once per window.

pub mod coordinator;
pub mod git;
pub mod throttle;
pub mod transport;

pub use coordinator::{CloneOrFetchCoordinator, ProjectEvent, Resolution};
pub use git::GitTransport;
pub use throttle::{FetchThrottle, DEFAULT_FETCH_WINDOW};
pub use transport::RepositoryTransport;
