//! UTF-16 conversion for Win32 string parameters.

/// Encodes a Rust string as a null-terminated UTF-16 buffer.
///
/// The buffer must stay alive for as long as any `PCWSTR` built from it
/// is in use.
pub fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}
