//! Shard Serve: a static development server for a built output directory.
//!
//! Files are read from the output directory on every request, so a rebuild
//! is visible without restarting the server. With history fallback enabled,
//! unknown extension-less paths answer with the HTML document so client-side
//! routes survive a reload.

#![warn(missing_docs)]

mod error;
mod route;
mod server;

pub use error::ServeError;
pub use route::{content_type, resolve_request, Resolved};
pub use server::{bind, respond, serve, ServeConfig};
