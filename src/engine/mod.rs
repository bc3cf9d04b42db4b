pub mod pool;
pub mod scheduler;

pub use self::{
    pool::{JobHandle, JobPool},
    scheduler::{Batch, BatchPlan, Scheduler, SourceOutcome, SourceRequest, WetSignal},
};
