pub mod collector;
pub mod scheduler;
pub mod source;

pub use collector::{Collector, CycleReport, ProjectOutcome};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use source::MeasuresSource;
