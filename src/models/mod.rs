mod user;
mod thread;
mod message;
mod usage;

pub use user::{User, NewUser, PreferredModel, SignupRequest, TokenRequest, RefreshRequest, TokenPair, AccessToken};
pub use thread::{ChatThread, ThreadTitle};
pub use message::{ChatMessage, NewChatMessage, ChatRequest};
pub use usage::UsageCounter;
