//! # Scenario Tests
//!
//! Whole-pipeline tests that drive the library the way the binary does,
//! plus tests of the binary's own input handling.

mod scenario_tests;
