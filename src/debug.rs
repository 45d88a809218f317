use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Name of the calling thread, so interleaved output from pool workers stays readable.
pub fn worker_label() -> String {
    thread::current().name().unwrap_or("main").to_string()
}

#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            println!("[{}] {}", $crate::debug::worker_label(), format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[{}] {}", $crate::debug::worker_label(), format_args!($($arg)*));
        }
    };
}
