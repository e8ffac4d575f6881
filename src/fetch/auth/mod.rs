//! Credential-injecting [`HttpClient`](super::HttpClient) wrappers.
//!
//! Keys are handed over once at construction and only ever attached to the
//! outbound vendor request.

mod url_param;

pub use url_param::UrlParam;
