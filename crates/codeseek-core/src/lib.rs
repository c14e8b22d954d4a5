//! Configuration loading, pipeline bootstrap and user-facing notices.

pub mod bootstrap;
pub mod config;
pub mod notice;
