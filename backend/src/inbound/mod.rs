//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! The REST API lives under [`http`]; the `import-donors` binary drives the
//! same import port from the command line.

pub mod http;
