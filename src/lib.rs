//! Marketpay - multi-tenant escrow payment engine for marketplace orders.
//!
//! Collects buyer payments through a provider gateway, withholds supplier
//! funds in escrow until release conditions are met, and settles payouts,
//! refunds, and disputes on top of a tenant-scoped ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod scheduler;
