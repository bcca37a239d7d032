//! TCP server exposing a replica node over the binary wire protocol
//! defined in `oolite-wire`.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                   oolite-server                     │
//! │  ┌──────────┐   ┌──────────────┐   ┌────────────┐  │
//! │  │ Listener │ → │ Connections  │ → │  Handler   │  │
//! │  │  (TCP)   │   │ (one thread) │   │ (→ replica)│  │
//! │  └──────────┘   └──────────────┘   └────────────┘  │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! One OS thread per connection. The coordinator dials other replicas
//! synchronously from inside a request, so connection handling has to block
//! without stalling the rest of the server; a thread each keeps that simple.

mod connection;
mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use handler::Handler;
pub use server::{Server, ServerHandle};
