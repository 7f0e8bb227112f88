//! Integration test modules.

mod session_flow_test;
mod store_persistence_test;
