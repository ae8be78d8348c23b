//! Win32 implementations of the platform queries.

use windows::Win32::System::SystemInformation::GetTickCount64;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetLastInputInfo, SendInput, INPUT, INPUT_0, INPUT_MOUSE, LASTINPUTINFO, MOUSEEVENTF_MOVE,
    MOUSEINPUT,
};

/// Seconds since the last keyboard or mouse input, system-wide.
///
/// `LASTINPUTINFO.dwTime` is a 32-bit tick count while `GetTickCount64`
/// is 64-bit, so the subtraction is masked to 32 bits to survive the
/// ~49-day rollover of the input timestamp. Returns 0.0 when the query
/// fails.
pub fn idle_seconds() -> f64 {
    let mut info = LASTINPUTINFO {
        cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };

    let ok = unsafe { GetLastInputInfo(&mut info) };
    if !ok.as_bool() {
        tracing::debug!("GetLastInputInfo failed, reporting zero idle time");
        return 0.0;
    }

    let now = unsafe { GetTickCount64() };
    let elapsed_ms = now.wrapping_sub(info.dwTime as u64) & 0xFFFF_FFFF;
    elapsed_ms as f64 / 1000.0
}

/// Injects a relative mouse movement of (`dx`, `dy`) pixels.
///
/// Uses `SendInput` without `MOUSEEVENTF_ABSOLUTE`, so the offsets are
/// applied to the current cursor position and behave the same on any
/// monitor layout. Returns true when the event was accepted.
pub fn send_relative_motion(dx: i32, dy: i32) -> bool {
    let input = INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: MOUSEEVENTF_MOVE,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };

    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    sent == 1
}
