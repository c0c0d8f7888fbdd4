//! Fermenator library.
//!
//! Exposes every module for integration testing and external inspection.
//! The optional `gpio` feature gates the Raspberry Pi relay backend; the
//! rest of the crate is platform-independent.

#![deny(unused_must_use)]

pub mod beer;
pub mod config;
pub mod datasource;
pub mod error;
pub mod manager;
pub mod relay;
pub mod sample;
pub mod supervisor;
pub mod units;
