//! # Nakama Client
//!
//! Client SDK for the Nakama game server. It forwards calls to the server's
//! REST and socket APIs and hands results back through callbacks.
//!
//! ## Execution Model
//!
//! Operations never block and never return results directly. Each one takes
//! an optional success callback and an optional error callback, registers
//! them under a [`RequestHandle`] and starts the request. Network I/O runs on
//! a tokio runtime; completions are queued and only delivered when the owner
//! calls `tick()`, so every callback runs on the owner's thread.
//!
//! * **[`Client`]** - one method per REST operation, authenticated with the
//!   server key or a [`Session`]
//! * **[`RtClient`]** - socket operations plus server-pushed events through
//!   an [`RtClientListener`]
//! * **[`ClientConfig`]** - host, port, keys and timing, loadable from TOML
//!   or the environment
//!
//! ## Example
//!
//! ```rust,ignore
//! use nakama_client::{Client, ClientConfig};
//! use std::collections::HashMap;
//!
//! let mut client = Client::with_reqwest(ClientConfig::default(), tokio::runtime::Handle::current())?;
//! client.authenticate_device(
//!     "2b5c4e0a-device",
//!     None,
//!     true,
//!     &HashMap::new(),
//!     Some(Box::new(|session| println!("hello {}", session.username()))),
//!     None,
//! );
//! client.tick();
//! ```
//!
//! ## Failure Delivery
//!
//! Every failure reaches exactly one place: the request's error callback, the
//! client-wide callback installed with `set_error_callback`, or a `warn!`
//! log line. Requests pending when `disconnect()` is called are abandoned and
//! never called back.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod http;
pub mod realtime;
pub mod registry;
pub mod session;
pub mod types;

pub use client::{AuthMethod, Client, ErrorCallback};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorCode, NakamaError, RtError, RtErrorCode};
pub use handle::RequestHandle;
pub use http::{HttpTransport, ReqwestTransport};
pub use realtime::{ConnectionState, RtClient, RtClientListener, RtErrorCallback, RtTransport, TransportEvent};
pub use registry::Callback;
pub use session::Session;
