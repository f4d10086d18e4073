//! Integration test harness crate; all content lives under `tests/`
