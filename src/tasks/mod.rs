//! Background Tasks Module
//!
//! Contains detached tasks started outside the request path.
//!
//! # Tasks
//! - Cache warm: seeds hot categories without blocking any caller

mod warm;

pub use warm::spawn_warm_task;
