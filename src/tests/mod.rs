//! Tests for the document uploader.


#[cfg(test)]
mod client_tests;
