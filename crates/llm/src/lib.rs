pub mod chain;
pub mod error;
pub mod openai;
pub mod parse;
pub mod pricing;
pub mod transport;

pub use chain::{ModelCallResult, ModelChain};
pub use error::{ErrorClass, LlmError};
pub use parse::parse_llm_json;
pub use transport::{ChatRequest, ChatResponse, ChatTransport, TokenUsage};
