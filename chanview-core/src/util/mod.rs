/// gRPC-style error status
pub mod status;
/// Helpers for tests
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
