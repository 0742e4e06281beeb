pub mod event;
pub mod id;

pub use event::{InboundStatus, StatusAuthor, TweetEvent, ViewerMessage};
pub use id::SessionId;
