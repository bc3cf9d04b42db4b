//! Benchmarks for room simulation workloads.

mod batch;
mod rir;

pub use batch::bench_batch;
pub use rir::bench_rir;
