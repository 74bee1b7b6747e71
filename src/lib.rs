//! Gotcha is a terminal chat client for the OpenAI Responses API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the Responses request/response payloads.
//! - [`core`] owns request building, transport, stream demultiplexing, the
//!   streaming-with-fallback client, transcript reconciliation, and
//!   configuration.
//! - [`cli`] parses arguments and runs the `say`, `chat`, and `config`
//!   commands.
//! - [`logging`] installs the `tracing` subscriber.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
