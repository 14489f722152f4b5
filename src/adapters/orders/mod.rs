//! Order service adapters.

mod http_notifier;

pub use http_notifier::HttpOrderNotifier;
