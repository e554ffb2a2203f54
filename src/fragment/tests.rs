//! Unit tests for fragment planning and scheduling.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.
