//! Inbound transports

pub mod http;
pub mod stdio;

pub use http::{HttpConfig, SESSION_HEADER, SessionRouter};
