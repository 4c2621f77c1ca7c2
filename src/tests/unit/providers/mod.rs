//! Model provider unit tests
//!
//! Uses wiremock for HTTP mocking to test:
//! - API request formatting
//! - Response parsing (text and inline image)
//! - Rate limit, auth and server error handling
//! - Timeout handling

mod google_tests;
