//! pan-http: HTTP adapter for the pan CLI client
//!
//! This crate provides the implementation of the CloudApi trait on top of
//! a raw byte `Transport`. It is the only crate that directly depends on
//! reqwest and on the service's wire format.

pub mod client;
pub mod transport;
mod wire;

pub use client::{FamilyRoutes, PanClient, PersonalRoutes, Routes};
pub use transport::{HttpTransport, Transport, TransportConfig};
