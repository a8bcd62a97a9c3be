//! CLI subcommands

pub mod containers;
