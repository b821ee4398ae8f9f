use std::fmt::Arguments;

use chrono::Local;

/// Timestamped stdout/stderr logger. Use through the `logger!` macro.
pub struct Logger;

impl Logger {
    fn stamp() -> String {
        Local::now().format("%d/%m/%Y %H:%M:%S").to_string()
    }

    pub fn info(args: Arguments) {
        println!("[INFO ] [{}] {args}", Logger::stamp());
    }

    pub fn debug(args: Arguments) {
        println!("[DEBUG] [{}] {args}", Logger::stamp());
    }

    pub fn warn(args: Arguments) {
        eprintln!("[WARN ] [{}] {args}", Logger::stamp());
    }

    pub fn error(args: Arguments) {
        eprintln!("[ERROR] [{}] {args}", Logger::stamp());
    }
}

#[macro_export]
macro_rules! logger {
    (INFO, $($arg:tt)*) => {
        Logger::info(format_args!($($arg)*))
    };
    (DEBUG, $($arg:tt)*) => {
        Logger::debug(format_args!($($arg)*))
    };
    (WARN, $($arg:tt)*) => {
        Logger::warn(format_args!($($arg)*))
    };
    (ERROR, $($arg:tt)*) => {
        Logger::error(format_args!($($arg)*))
    };
}
