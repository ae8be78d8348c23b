//! User-visible alerts.
//!
//! On Windows these are message boxes; elsewhere they degrade to log
//! output so the portable core stays testable.

#[cfg(windows)]
pub fn show_warning(title: &str, message: &str) {
    tracing::warn!(title, message, "Showing warning dialog");
    message_box(
        title,
        message,
        windows::Win32::UI::WindowsAndMessaging::MB_ICONWARNING,
    );
}

#[cfg(windows)]
pub fn show_error(title: &str, message: &str) {
    tracing::error!(title, message, "Showing error dialog");
    message_box(
        title,
        message,
        windows::Win32::UI::WindowsAndMessaging::MB_ICONERROR,
    );
}

#[cfg(windows)]
fn message_box(
    title: &str,
    message: &str,
    icon: windows::Win32::UI::WindowsAndMessaging::MESSAGEBOX_STYLE,
) {
    use crate::winapi_utils::to_wide;
    use windows::core::PCWSTR;
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_OK};

    let title = to_wide(title);
    let message = to_wide(message);
    unsafe {
        MessageBoxW(
            None,
            PCWSTR::from_raw(message.as_ptr()),
            PCWSTR::from_raw(title.as_ptr()),
            MB_OK | icon,
        );
    }
}

#[cfg(not(windows))]
pub fn show_warning(title: &str, message: &str) {
    tracing::warn!(title, message, "User warning");
}

#[cfg(not(windows))]
pub fn show_error(title: &str, message: &str) {
    tracing::error!(title, message, "User error");
}
