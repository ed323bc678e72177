//! Integration tests for the izza-back API.
//!
//! `api` drives the full router over the in-memory store. `postgres`
//! needs a reachable database and is ignored by default.
//! Run with: cargo test --test integration -- --ignored

mod api;
mod postgres;
