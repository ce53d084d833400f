//! Adserver - Ad Serving Backend
//!
//! This crate implements a small ad-serving service: an in-memory ad store
//! with lazy, read-time TTL expiry, fronted by a per-client token-bucket
//! rate limiter and a JSON HTTP API.

pub mod ads;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
