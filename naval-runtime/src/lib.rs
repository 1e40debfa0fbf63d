//! Naval Dashboard Runtime
//!
//! A mounted dashboard session owns the state, drives the simulation timer
//! and applies user commands one at a time.

pub mod monitor;

pub use monitor::*;
