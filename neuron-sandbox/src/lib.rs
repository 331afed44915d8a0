#![deny(missing_docs)]
//! `SandboxManager` & `LoopPool` — per-sandbox single-worker affinity for
//! async-generator safety (spec component C6, §4.5).

mod error;
mod manager;

pub use error::SandboxError;
pub use manager::{SandboxManager, WorkerId};
