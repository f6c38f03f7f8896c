//! Weather lookups for Stratus.
//!
//! Fetches current conditions from the Visual Crossing timeline API and
//! keeps serialized results in a TTL cache (cache-aside).

pub mod cache;
pub mod provider;
pub mod redis_store;
pub mod resolver;
pub mod types;

pub use cache::{CacheStore, MemoryCache};
pub use provider::{WeatherProvider, WeatherSource};
pub use redis_store::RedisCache;
pub use resolver::{CacheStatus, Resolved, WeatherResolver};
pub use stratus_core::{CacheError, WeatherError};
pub use types::WeatherRecord;
