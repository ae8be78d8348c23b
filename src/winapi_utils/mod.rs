//! Safe wrappers around Windows API calls.
//!
//! Message-pump control, process queries for the single-instance guard,
//! and UTF-16 string helpers.

pub mod message_loop;
pub mod process;
pub mod strings;

pub use message_loop::*;
pub use process::*;
pub use strings::*;
