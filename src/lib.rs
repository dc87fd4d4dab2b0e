//! Chartsnap: snapshot testing for Helm charts.
//!
//! Renders a chart through `helm template`, masks known-nondeterministic
//! fields, and compares the canonical result against a stored baseline.
//! See the module docs for the pipeline stages: [`render`] -> [`manifest`]
//! -> [`mask`] -> [`snapshot`] -> [`diff`], composed per test case by
//! [`snap`] and orchestrated concurrently by [`runner`].

pub use crate::errors::{Result, SnapError};

pub mod cli;
pub mod config;
pub mod diff;
pub mod errors;
pub mod manifest;
pub mod mask;
pub mod render;
pub mod runner;
pub mod snap;
pub mod snapshot;
