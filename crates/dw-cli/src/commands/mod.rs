//! Subcommand implementations.

pub mod clear;
pub mod report;
pub mod track;
