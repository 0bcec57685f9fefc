pub mod scheduler;
pub mod supervisor;

pub use scheduler::{MonitorScheduler, MonitorSchedulerBuilder};
pub use supervisor::{MonitorEntry, MonitorSupervisor, SchedulerCommand};
