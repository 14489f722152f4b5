//! Event bus adapters.
//!
//! - `InMemoryEventBus` - synchronous, in-process bus for testing
//! - `RedisEventPublisher` - pub/sub publisher for multi-server deployments

mod in_memory;
mod redis;

pub use in_memory::InMemoryEventBus;
pub use redis::RedisEventPublisher;
