//! Helpers for OpenCL string arguments and info queries

use crate::error::{MatpowError, Result};
use std::ffi::CString;

/// Converts a string to a NUL-terminated C string
pub fn to_c_string(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| MatpowError::invalid(format!("interior NUL in {:?}", s)))
}

/// Decodes a NUL-terminated byte buffer returned by a `clGet*Info` query
pub fn info_bytes_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_string_is_nul_terminated() {
        let s = to_c_string("matrix_multiply").unwrap();
        assert_eq!(s.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(to_c_string("bad\0name").is_err());
    }

    #[test]
    fn info_bytes_stop_at_nul() {
        assert_eq!(info_bytes_to_string(b"Intel(R) Graphics \0junk"), "Intel(R) Graphics");
        assert_eq!(info_bytes_to_string(b"no terminator"), "no terminator");
    }
}
