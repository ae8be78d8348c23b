//! Windows message pump utilities.
//!
//! The tray icon lives on the main thread, which must both pump window
//! messages and drain the controller's update channel. The pump is
//! therefore non-blocking: `pump_messages` dispatches everything pending
//! and returns, and the main loop interleaves it with channel reads.

use std::sync::atomic::{AtomicU32, Ordering};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG, PM_REMOVE, WM_QUIT,
};

/// Stores the main thread ID for cross-thread quit signaling.
static MAIN_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Records the calling thread as the target for [`post_quit_message`].
/// Call once from the main thread before entering the UI loop.
pub fn register_main_thread() {
    let thread_id = unsafe { GetCurrentThreadId() };
    MAIN_THREAD_ID.store(thread_id, Ordering::SeqCst);
    tracing::debug!(thread_id, "Main thread registered for quit messages");
}

/// Dispatches all pending window messages.
///
/// Returns `false` once a `WM_QUIT` message is seen, signalling the UI
/// loop to end.
pub fn pump_messages() -> bool {
    let mut msg = MSG::default();

    unsafe {
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            if msg.message == WM_QUIT {
                tracing::debug!("WM_QUIT received");
                return false;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    true
}

/// Posts a WM_QUIT message to the main thread's queue.
///
/// Safe to call from any thread, including signal handlers.
pub fn post_quit_message(exit_code: i32) {
    let main_thread_id = MAIN_THREAD_ID.load(Ordering::SeqCst);

    if main_thread_id == 0 {
        tracing::warn!("Main thread ID not set, cannot post quit message");
        return;
    }

    unsafe {
        let result = PostThreadMessageW(
            main_thread_id,
            WM_QUIT,
            windows::Win32::Foundation::WPARAM(exit_code as usize),
            windows::Win32::Foundation::LPARAM(0),
        );

        if let Err(e) = result {
            tracing::error!(?e, "Failed to post quit message to main thread");
        }
    }
}
