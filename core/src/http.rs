//! Response model returned by every request operation.
//!
//! # Design
//! A response is plain owned data, filled in by the transfer callbacks and
//! handed to the caller by value. Nothing in it aliases the transfer handle,
//! so it stays valid after the handle is reset or dropped.

use std::borrow::Cow;
use std::collections::HashMap;

/// Status, headers and body of a completed transfer.
///
/// `body` is empty for downloads; the bytes went to the local file instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
