//! API client library for aynaepg.
//!
//! Provides the client for the Ayna channel directory and EPG feed APIs.

/// Ayna upstream API client.
pub mod ayna;
