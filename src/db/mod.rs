pub mod user_queries;
pub mod thread_queries;
pub mod message_queries;
pub mod usage_queries;
