//! In-memory adapters for tests and local development.

mod collaborators;
mod ledger;

pub use collaborators::{RecordingOrderNotifier, StaticDisputeLookup};
pub use ledger::InMemoryLedger;
