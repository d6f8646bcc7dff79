//! flowband: intraday capital-flow momentum classifier for A-shares.
//!
//! Hexagonal architecture: classification logic in [`domain`], port traits in
//! [`ports`], concrete snapshot sources, config and report writers in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
