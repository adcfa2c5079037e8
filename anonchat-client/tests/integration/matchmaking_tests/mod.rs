pub mod test_concurrent_claims;
pub mod test_simultaneous_search;
pub mod test_teardown_idempotent;
