//! Background services.

mod auto_release;

pub use auto_release::{AutoReleaseScheduler, AutoReleaseSchedulerConfig};
