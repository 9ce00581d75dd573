//! Observability for the job manager
//!
//! Structured JSON log lines keyed by a typed [`Event`]. Logging is
//! synchronous and never fails the caller.
//!
//! ```ignore
//! use jobmgr::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RestartJobsLoaded, &[("count", "12")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
