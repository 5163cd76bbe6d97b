//! Transit network data fusion.
//!
//! Builds one consistent stop and line document for a public transport
//! network out of three independently published sources: the stop registry,
//! the operator's line pages, and the route geometry export.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod fusion;
pub mod geometry;
pub mod pipeline;
pub mod projection;
pub mod registry;
pub mod source;
