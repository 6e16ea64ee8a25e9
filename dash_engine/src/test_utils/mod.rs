//! Helpers for tests: throwaway SQLite databases and in-memory stand-ins for the external gateways.
pub mod fakes;
pub mod prepare_env;
