// file: src/vbox/registry.rs
// version: 1.1.0
// guid: 94f0d3a8-1c27-4e5b-a6d9-3b8e72c05f14

//! Windows registry access

use crate::error::{VBoxError, Result};
use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::System::Registry::{
    RegGetValueW, HKEY_LOCAL_MACHINE, REG_SZ, REG_VALUE_TYPE, RRF_NOEXPAND, RRF_RT_ANY,
    RRF_SUBKEY_WOW6464KEY,
};

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Read a `REG_SZ` value from `HKEY_LOCAL_MACHINE` using the 64-bit view.
///
/// Any other value type is rejected, including `REG_EXPAND_SZ`, which is
/// read unexpanded so its real type is reported.
pub fn read_hklm_string(key_path: &str, value_name: &str) -> Result<String> {
    let key = to_wide(key_path);
    let value = to_wide(value_name);
    let flags = RRF_RT_ANY | RRF_NOEXPAND | RRF_SUBKEY_WOW6464KEY;

    let mut kind: REG_VALUE_TYPE = 0;
    let mut size: u32 = 0;
    // SAFETY: key and value are NUL-terminated and outlive the call; a null
    // data pointer asks only for the type and size.
    let status = unsafe {
        RegGetValueW(
            HKEY_LOCAL_MACHINE,
            key.as_ptr(),
            value.as_ptr(),
            flags,
            &mut kind,
            std::ptr::null_mut(),
            &mut size,
        )
    };
    if status != ERROR_SUCCESS {
        return Err(VBoxError::registry(format!(
            "Failed to read HKLM\\{}\\{}: error {}",
            key_path, value_name, status
        )));
    }
    if kind != REG_SZ {
        return Err(VBoxError::registry(format!(
            "HKLM\\{}\\{} is not a string value (type {})",
            key_path, value_name, kind
        )));
    }

    let mut buf = vec![0u16; (size as usize + 1) / 2];
    // SAFETY: buf holds `size` bytes as reported by the previous call.
    let status = unsafe {
        RegGetValueW(
            HKEY_LOCAL_MACHINE,
            key.as_ptr(),
            value.as_ptr(),
            flags,
            &mut kind,
            buf.as_mut_ptr().cast(),
            &mut size,
        )
    };
    if status != ERROR_SUCCESS {
        return Err(VBoxError::registry(format!(
            "Failed to read HKLM\\{}\\{}: error {}",
            key_path, value_name, status
        )));
    }

    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    Ok(String::from_utf16_lossy(&buf[..len]))
}
