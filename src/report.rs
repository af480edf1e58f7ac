// src/report.rs

/// Callback invoked with a human-readable message whenever an internal
/// synchronization primitive fails.
///
/// The hook is a diagnostics collaborator, not an error channel: every
/// failure it observes is also surfaced to the caller as a result value.
/// Timeouts of the timed operations are expected outcomes and are never
/// routed through it.
///
/// A hook is supplied per buffer at construction
/// ([`with_error_report`](crate::buffer::BoundedBuffer::with_error_report)),
/// so diagnostics can be redirected without process-wide mutable state.
pub type ErrorReport = Box<dyn Fn(&str) + Send + Sync>;

/// Default reporter: writes the message to standard error.
pub fn stderr_report() -> ErrorReport {
    Box::new(|message| eprintln!("bounded_buffer: {message}"))
}
