//! KrishiCash core — the game-state engine for a farmer household's
//! monthly cash-flow simulation.
//!
//! Layering (leaf first):
//!   types → catalog/state → rules → engine
//!   config feeds every layer; store/snapshot sit behind the
//!   persistence port consumed by the controller.

pub mod action;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod outcome;
pub mod rng;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
