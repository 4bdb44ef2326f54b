//! Dependency builds
//!
//! The orchestrator ties the pieces together: it merges the manifests,
//! mirrors and checks out each dependency, orders them by their own
//! manifests and rebuilds only what the build cache cannot vouch for.

pub mod graph;
pub mod layout;
pub mod options;
pub mod orchestrator;
pub mod toolchain;

pub use graph::DependencyGraph;
pub use layout::ProjectLayout;
pub use options::BuildOptions;
pub use orchestrator::{BuildOrchestrator, BuildResult, BuiltScheme, EventHandler};
pub use toolchain::{BuildRequest, CommandToolchain, Toolchain};
