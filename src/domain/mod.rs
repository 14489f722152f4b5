//! Domain layer: entities, value objects, events, and domain errors.
//!
//! Nothing in this module performs IO. Persistence and transport live behind
//! the traits in `crate::ports`.

pub mod billing;
pub mod foundation;
