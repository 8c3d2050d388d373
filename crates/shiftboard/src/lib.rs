pub mod audit;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod formats;
pub mod memory;
pub mod notifications;
pub mod telemetry;
pub mod workflows;
