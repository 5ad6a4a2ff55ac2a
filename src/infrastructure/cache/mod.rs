pub mod redis_aggregate;
pub mod redis_realtime;

pub use redis_aggregate::RedisAggregateCache;
pub use redis_realtime::RedisRealtimeCache;
