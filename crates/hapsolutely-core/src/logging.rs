//! Logging facilities for Hapsolutely.
//!
//! Hapsolutely uses the `tracing` crate for instrumentation. Library code
//! never installs a subscriber; to see logs, install one in the application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("hapsolutely_model=debug,hapsolutely_phase=info")
//!     .init();
//! ```

/// Span names used throughout Hapsolutely for tracing.
pub mod span_names {
    /// Performance measurement span.
    pub const PERF: &str = "hapsolutely::perf";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core systems target.
    pub const CORE: &str = "hapsolutely_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "hapsolutely_core::signal";
    /// Settings target.
    pub const CONFIG: &str = "hapsolutely_core::config";
    /// Item store target.
    pub const STORE: &str = "hapsolutely_model::store";
    /// Index proxy target.
    pub const PROXY: &str = "hapsolutely_model::proxy";
    /// Shared result slot target.
    pub const SHARED_RESULT: &str = "hapsolutely_model::shared";
    /// Batch preparation target.
    pub const PHASE: &str = "hapsolutely_phase";
}

/// A guard for timing an operation.
///
/// Creates an `info` level span that records the operation name. The span
/// stays entered until the guard is dropped, and [`elapsed_secs`] reports the
/// wall time spent so far.
///
/// [`elapsed_secs`]: PerfSpan::elapsed_secs
///
/// # Example
///
/// ```
/// use hapsolutely_core::logging::PerfSpan;
///
/// let span = PerfSpan::new("prepare_run");
/// // ... work ...
/// let _seconds = span.elapsed_secs();
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
    started: std::time::Instant,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "hapsolutely::perf", "perf", operation = name);
        Self {
            span: span.entered(),
            started: std::time::Instant::now(),
        }
    }

    /// Seconds elapsed since the span was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
