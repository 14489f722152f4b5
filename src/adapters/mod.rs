//! Adapters - concrete implementations of the ports.
//!
//! Each submodule targets one kind of infrastructure:
//! - `events` - event publishing (in-memory, Redis)
//! - `gateway` - payment providers (mock, Stripe-style HTTP)
//! - `http` - REST API surface (Axum)
//! - `memory` - in-memory stores for tests and local development
//! - `orders` - order service client
//! - `postgres` - PostgreSQL stores

pub mod events;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod orders;
pub mod postgres;
