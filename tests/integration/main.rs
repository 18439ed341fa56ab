//! Integration tests: source → balancer → report, driven through the
//! public library API.

mod balancing;
mod mock_source;
