//! Turnstile - Sliding Window Request Rate Limiter
//!
//! This crate implements the in-memory rate limiter that guards the textbook
//! marketplace's login and API endpoints. Request history is kept per
//! identifier and action class, admission is decided against per-minute and
//! per-hour sliding windows, and a background sweeper evicts idle state.

pub mod cleanup;
pub mod config;
pub mod driver;
pub mod error;
pub mod ratelimit;
