//! # Test Suite for Tide Windows
//!
//! Scenario tests exercise the scanner end to end on hand-built forecasts;
//! property tests check the invariants every scan must satisfy on random ones.
//! Forecast source tests cover how the binary picks between cache, download
//! and the offline model.
