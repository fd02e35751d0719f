//! Drives the `gauge_proofs` artifacts end to end: resolve an epoch to a
//! block, derive the storage keys, fetch the proof material from a node or
//! a recorded fixture, and assemble verifier-ready bundles, one epoch at a
//! time.

pub mod batch;
pub mod config;
pub mod env;
pub mod fixture;
pub mod pipeline;
pub mod rpc;
pub mod source;
pub mod tracing;
