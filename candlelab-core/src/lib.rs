//! CandleLab Core — quote aggregation, action sources, and the portfolio simulator.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (quotes, bars, action series)
//! - Epoch-aligned OHLCV bar aggregation from raw quotes
//! - Action sources: perfect-foresight benchmark, seeded random baselines, fixed series
//! - Deterministic seed hierarchy for reproducible random strategies
//! - Bar-by-bar portfolio simulator producing a per-bar trace

pub mod data;
pub mod domain;
pub mod engine;
pub mod rng;
pub mod strategy;
