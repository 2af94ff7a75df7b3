// src/shutdown/mod.rs

//! Shutdown rendezvous and ordered teardown.

pub mod coordinator;
pub mod signal;

pub use coordinator::ShutdownCoordinator;
pub use signal::ShutdownSignal;
