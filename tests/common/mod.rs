// file: tests/common/mod.rs
// version: 1.1.0
// guid: d6a1f083-92c5-4e7b-bf14-3c80e5a27d91

//! Shared fixtures for integration tests

#[cfg(unix)]
#[path = "../../src/vbox/test_support.rs"]
mod test_support;

#[cfg(unix)]
pub(crate) use test_support::FakeVBoxManage;
