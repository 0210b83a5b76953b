//! Inbound adapters that translate external requests into discovery service
//! calls while keeping framework details at the edge.
//!
//! HTTP handlers live under [`http`].

pub mod http;
