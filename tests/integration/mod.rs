//! Integration tests for the consent relay

mod config_integration;
mod error_payload;
mod test_utils;
mod unsupported_environment;
