//! Application core: pure domain logic, zero I/O.
//!
//! Turns driver events into alarm decisions and change-filtered radio
//! publications.  All interaction with hardware happens through the
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod alarm;
pub mod events;
pub mod monitor;
pub mod ports;
pub mod publication;
pub mod service;
