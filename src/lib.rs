//! nightly-sync: keep a nightly integration branch merged with upstream PR testing branches
//!
//! Finds the upstream PRs that landed between the previous and current
//! toolchain marker, merges each one's downstream testing branch into the
//! integration branch, and reports what merged and what did not.

pub mod config;
pub mod error;
pub mod git;
pub mod notify;
pub mod progress;
pub mod report;
pub mod sync;
pub mod types;
pub mod upstream;
pub mod vcs;
