//! OpenAI-compatible structured chat backend.
//!
//! Used for lyrics composition. Requests use `response_format: json_schema`
//! with `strict: true`, so the endpoint must support structured outputs
//! (OpenAI `gpt-4o-2024-08-06` and later, or a compatible server).
//!
//! # Example
//!
//! ```rust,no_run
//! use geosong_core::{ChatMessage, StructuredChatBackend};
//! use geosong_inference::openai::{OpenAIChatBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIChatBackend::new(OpenAIConfig {
//!         api_key: Some("sk-...".to_string()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     let schema = serde_json::json!({
//!         "type": "object",
//!         "properties": {"title": {"type": "string"}},
//!         "required": ["title"],
//!         "additionalProperties": false
//!     });
//!     let json = backend
//!         .complete_structured(&[ChatMessage::user("Name a song")], "song", &schema, 100)
//!         .await
//!         .unwrap();
//!     println!("{}", json);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIChatBackend, OpenAIConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{to_geosong_error, OpenAIErrorCode};
pub use types::*;
