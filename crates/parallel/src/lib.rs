//! # huctrend Parallel
//!
//! Processing modes for running independent jobs (one watershed-year
//! each) sequentially, on the global rayon pool, or on a dedicated pool
//! of a fixed size.

pub mod strategy;

pub use strategy::{ParallelError, ParallelStrategy, ProcessingMode};
