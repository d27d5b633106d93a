pub mod ai;
pub mod config;
pub mod error;
pub mod query;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{Citation, GeminiClient, Generation, Generator};
pub use config::Config;
pub use error::{ConfigError, GenerateError, ServiceError};
pub use query::{Answer, QueryService};
pub use session::{Clipboard, SessionController, SessionState};
pub use state::{Conversation, Message, MessageId, Sender, Source};
