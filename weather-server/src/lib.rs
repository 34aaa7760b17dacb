//! HTTP transport for the cached weather service.
//!
//! The binary (`weather`) wires configuration, logging and the CLI around
//! the router exposed here.

pub mod http;
