//! Purchase-request arbitration: which request on a product wins, and what
//! happens to the others.

mod engine;
mod resolution;

pub use engine::ArbitrationEngine;
pub use resolution::{resolve, Decision, Resolution, Snapshot, Transition};
