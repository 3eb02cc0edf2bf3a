//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache maintenance: sweeps expired entries and re-probes a dropped backend

mod maintenance;

pub use maintenance::spawn_maintenance_task;
