//! Quarry - source-based dependency manager
//!
//! Resolves a project's declared dependencies, keeps local mirrors of their
//! repositories up to date and builds each dependency once per platform,
//! skipping builds that are provably current.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod project;
pub mod ui;

pub use error::{QuarryError, QuarryResult};
