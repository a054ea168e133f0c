//! Log macros used across the workspace.
//!
//! They forward to [`tracing`] with a fixed target so the terminal formatter
//! can pick a prefix and color per kind of message.

pub const INFO_TARGET: &str = "subscratch::info";
pub const SUCCESS_TARGET: &str = "subscratch::success";
pub const PRINT_TARGET: &str = "subscratch::print";

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "subscratch::info", $($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "subscratch::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::__tracing::error!($($arg)*)
    };
}
