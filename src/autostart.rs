//! Start-with-Windows registration.
//!
//! Uses the current user's `Run` registry key, which needs no elevation.
//! The value holds the quoted path of the running executable.

/// Registers and unregisters the app for login autostart.
pub trait AutostartRegistrar: Send {
    fn is_enabled(&self) -> bool;

    /// Applies the desired state. Returns false when the OS-level
    /// registration fails; callers must then treat the toggle as
    /// unchanged.
    fn set_enabled(&self, enabled: bool) -> bool;
}

#[cfg(windows)]
pub use registry::RegistryAutostart;

#[cfg(windows)]
mod registry {
    use super::AutostartRegistrar;
    use crate::winapi_utils::to_wide;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS, WIN32_ERROR};
    use windows::Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_READ, KEY_SET_VALUE, REG_SAM_FLAGS, REG_SZ,
    };

    const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
    const VALUE_NAME: &str = "Nudge";

    /// RAII handle for an open registry key.
    struct RegKey(HKEY);

    impl RegKey {
        fn open(access: REG_SAM_FLAGS) -> Option<Self> {
            let subkey = to_wide(RUN_KEY);
            let mut hkey = HKEY::default();
            let status: WIN32_ERROR = unsafe {
                RegOpenKeyExW(
                    HKEY_CURRENT_USER,
                    PCWSTR::from_raw(subkey.as_ptr()),
                    0,
                    access,
                    &mut hkey,
                )
            };

            if status == ERROR_SUCCESS {
                Some(Self(hkey))
            } else {
                tracing::warn!(code = status.0, "Failed to open Run registry key");
                None
            }
        }
    }

    impl Drop for RegKey {
        fn drop(&mut self) {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }

    /// Autostart via `HKCU\...\CurrentVersion\Run`.
    pub struct RegistryAutostart {
        /// Quoted command line written into the Run value.
        command: String,
    }

    impl RegistryAutostart {
        pub fn new() -> std::io::Result<Self> {
            let exe = std::env::current_exe()?;
            Ok(Self {
                command: format!("\"{}\"", exe.display()),
            })
        }
    }

    impl AutostartRegistrar for RegistryAutostart {
        fn is_enabled(&self) -> bool {
            let Some(key) = RegKey::open(KEY_READ) else {
                return false;
            };

            let name = to_wide(VALUE_NAME);
            let status = unsafe {
                RegQueryValueExW(
                    key.0,
                    PCWSTR::from_raw(name.as_ptr()),
                    None,
                    None,
                    None,
                    None,
                )
            };
            status == ERROR_SUCCESS
        }

        fn set_enabled(&self, enabled: bool) -> bool {
            let Some(key) = RegKey::open(KEY_SET_VALUE) else {
                return false;
            };

            let name = to_wide(VALUE_NAME);
            if enabled {
                let data = to_wide(&self.command);
                let bytes: Vec<u8> = data.iter().flat_map(|c| c.to_le_bytes()).collect();
                let status = unsafe {
                    RegSetValueExW(
                        key.0,
                        PCWSTR::from_raw(name.as_ptr()),
                        0,
                        REG_SZ,
                        Some(&bytes),
                    )
                };

                if status != ERROR_SUCCESS {
                    tracing::warn!(code = status.0, "Failed to write autostart value");
                    return false;
                }
                tracing::info!(command = %self.command, "Autostart enabled");
                true
            } else {
                let status = unsafe { RegDeleteValueW(key.0, PCWSTR::from_raw(name.as_ptr())) };

                // Deleting a value that is not there is still disabled.
                if status != ERROR_SUCCESS && status != ERROR_FILE_NOT_FOUND {
                    tracing::warn!(code = status.0, "Failed to delete autostart value");
                    return false;
                }
                tracing::info!("Autostart disabled");
                true
            }
        }
    }
}
