pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod message;
pub mod request;
pub mod sse;
pub mod transcript;
pub mod transport;
