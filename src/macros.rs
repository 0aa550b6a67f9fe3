//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and record the full
//! call site: file, line, module path and enclosing function. The message is
//! only formatted when the logger's threshold admits the level.
//!
//! # Examples
//!
//! ```
//! use formatted_logger::prelude::*;
//! use formatted_logger::info;
//!
//! let logger = Logger::builder()
//!     .level(Level::INFO)
//!     .format("%s:%s - %s\nfuncname, lineno, message")
//!     .sink(ConsoleSink::stderr())
//!     .sync_mode()
//!     .build()
//!     .unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Path of the function the macro is expanded in, e.g. `app::server::run`
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        match name.strip_suffix("::f") {
            Some(path) => path,
            None => name,
        }
    }};
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use formatted_logger::prelude::*;
/// # let logger = Logger::builder().sink(ConsoleSink::stderr()).sync_mode().build().unwrap();
/// use formatted_logger::log;
/// log!(logger, Level::ERROR, "Simple message");
/// log!(logger, Level::new(45), "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::Level = $level;
        if logger.is_enabled_for(level) {
            logger.log_at(
                level,
                $crate::CallSite::caller()
                    .with_module_path(::std::module_path!())
                    .with_function($crate::__function_path!()),
                ::std::format!($($arg)+),
            );
        }
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use formatted_logger::prelude::*;
/// # let logger = Logger::builder().sink(ConsoleSink::stderr()).sync_mode().build().unwrap();
/// use formatted_logger::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARNING, $($arg)+)
    };
}

/// Alias for [`warning!`].
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARN, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use formatted_logger::prelude::*;
/// # let logger = Logger::builder().sink(ConsoleSink::stderr()).sync_mode().build().unwrap();
/// use formatted_logger::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::CRITICAL, $($arg)+)
    };
}

/// Alias for [`critical!`].
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::FATAL, $($arg)+)
    };
}
