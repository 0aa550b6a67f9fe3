//! Per-call log record with memoized derived fields

use super::context::ContextProvider;
use super::log_level::Level;
use chrono::{DateTime, Local};
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Placeholder for string fields that could not be determined
pub const UNKNOWN_FIELD: &str = "???";

/// Where a log call was issued from
///
/// `log` and the leveled methods capture the file and line through
/// `#[track_caller]`; the crate macros additionally record the module path
/// and enclosing function.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallSite {
    location: Option<&'static Location<'static>>,
    module_path: Option<&'static str>,
    function: Option<&'static str>,
}

impl CallSite {
    /// Capture the location of the caller
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        Self {
            location: Some(Location::caller()),
            module_path: None,
            function: None,
        }
    }

    /// A call site with nothing known about it
    pub const fn unknown() -> Self {
        Self {
            location: None,
            module_path: None,
            function: None,
        }
    }

    #[must_use]
    pub fn with_module_path(mut self, module_path: &'static str) -> Self {
        self.module_path = Some(module_path);
        self
    }

    #[must_use]
    pub fn with_function(mut self, function: &'static str) -> Self {
        self.function = Some(function);
        self
    }
}

/// Source location resolved from a [`CallSite`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub pathname: String,
    pub filename: String,
    pub module: String,
    pub lineno: i64,
}

impl SourceLocation {
    fn resolve(call_site: &CallSite) -> Self {
        let (pathname, filename, lineno) = match call_site.location {
            Some(location) => {
                let file = location.file();
                let filename = Path::new(file)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or(file);
                (file.to_string(), filename.to_string(), i64::from(location.line()))
            }
            None => (UNKNOWN_FIELD.to_string(), UNKNOWN_FIELD.to_string(), -1),
        };

        let module = call_site.module_path.unwrap_or(UNKNOWN_FIELD).to_string();

        Self {
            pathname,
            filename,
            module,
            lineno,
        }
    }
}

/// Short name of the function a call was issued from
///
/// Uses the name the macros recorded when there is one. Otherwise the stack
/// is walked for the frame whose debug info points at the call site's file
/// and line, which needs symbols; without them the name is unknown.
fn resolve_function(call_site: &CallSite) -> String {
    let name = match call_site.function {
        Some(path) => Some(short_function_name(path).to_string()),
        None => call_site
            .location
            .and_then(function_at)
            .map(|path| short_function_name(&path).to_string()),
    };
    name.filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
}

/// Full path of the function containing `location` on the current stack
fn function_at(location: &Location<'_>) -> Option<String> {
    let file = Path::new(location.file());
    let mut found = None;

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            if found.is_some() || symbol.lineno() != Some(location.line()) {
                return;
            }
            if symbol.filename().is_some_and(|path| path.ends_with(file)) {
                found = symbol.name().map(|name| format!("{:#}", name));
            }
        });
        found.is_none()
    });
    found
}

/// Last path segment of a function path, skipping closure frames
fn short_function_name(path: &str) -> &str {
    let mut path = path;
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// Data for one log call
///
/// Derived fields are computed on first access and cached, so a format that
/// references the same field twice renders the same value twice.
#[derive(Debug, Clone)]
pub struct Record {
    level: Level,
    message: String,
    call_site: CallSite,
    seqid: Option<u64>,
    location: Option<SourceLocation>,
    funcname: Option<String>,
    time: Option<DateTime<Local>>,
    thread: Option<u64>,
    thread_name: Option<String>,
    process: Option<u32>,
}

impl Record {
    /// Escape line breaks so a record stays on one line; everything else is kept
    fn sanitize_message(message: &str) -> String {
        if !message.contains(['\n', '\r']) {
            return message.to_string();
        }
        message.replace('\n', "\\n").replace('\r', "\\r")
    }

    pub fn new(level: Level, message: impl Into<String>, call_site: CallSite) -> Self {
        let message = message.into();
        Self {
            level,
            message: Self::sanitize_message(&message),
            call_site,
            seqid: None,
            location: None,
            funcname: None,
            time: None,
            thread: None,
            thread_name: None,
            process: None,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sequence id, drawn from `counter` the first time it is asked for
    pub fn seqid(&mut self, counter: &AtomicU64) -> u64 {
        *self
            .seqid
            .get_or_insert_with(|| counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn location(&mut self) -> &SourceLocation {
        let call_site = &self.call_site;
        self.location
            .get_or_insert_with(|| SourceLocation::resolve(call_site))
    }

    /// Enclosing function of the call site, `"???"` when it cannot be found
    pub fn funcname(&mut self) -> &str {
        let call_site = &self.call_site;
        self.funcname
            .get_or_insert_with(|| resolve_function(call_site))
    }

    /// Rendering time, fixed on first access
    pub fn time(&mut self) -> DateTime<Local> {
        *self.time.get_or_insert_with(Local::now)
    }

    pub fn thread(&mut self, provider: &dyn ContextProvider) -> u64 {
        *self.thread.get_or_insert_with(|| provider.thread_id())
    }

    pub fn thread_name(&mut self, provider: &dyn ContextProvider) -> &str {
        self.thread_name
            .get_or_insert_with(|| provider.thread_name())
    }

    pub fn process(&mut self, provider: &dyn ContextProvider) -> u32 {
        *self.process.get_or_insert_with(|| provider.process_id())
    }
}
