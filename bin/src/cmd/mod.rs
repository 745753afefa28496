//! CLI subcommand modules.
//!
//! This module contains the implementations for all sentfolio CLI subcommands.

pub(crate) mod cleanup;
pub(crate) mod indicators;
pub(crate) mod news;
pub(crate) mod portfolio;
pub(crate) mod prices;
pub(crate) mod rank;
