//! Core domain types and classification logic.

pub mod quote;
pub mod board;
pub mod calendar;
pub mod flow;
pub mod band;
pub mod trap;
pub mod percentile;
pub mod decision;
pub mod market;
pub mod scanner;
pub mod diff;
pub mod config;
pub mod config_validation;
pub mod error;
