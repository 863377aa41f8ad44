//! ILI Dashboard - Weekly Influenza-Like Illness Explorer
//!
//! Loads a weekly ILI surveillance CSV, smooths each state's series with a
//! trailing rolling mean and fits an exponential distribution to its values.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod logging;
pub mod report;
pub mod stats;
