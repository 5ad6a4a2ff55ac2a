pub mod notification_client;
pub mod redis_channel;
pub mod session_directory_client;

pub use notification_client::{HttpNotificationSender, NoopNotificationSender};
pub use redis_channel::RedisRealtimeChannel;
pub use session_directory_client::HttpSessionDirectory;
