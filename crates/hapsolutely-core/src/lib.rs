//! Core systems for Hapsolutely.
//!
//! This crate provides the foundational pieces shared by the model and batch
//! layers:
//!
//! - **Signal/Slot System**: Synchronous change notification ([`Signal`], [`ModelSignals`])
//! - **Change Stamps**: Process-wide event ordering ([`Stamp`], [`next_stamp`])
//! - **Settings**: Labels and conventions loaded from TOML ([`Settings`])
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use hapsolutely_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod config;
mod error;
pub mod logging;
pub mod signal;
pub mod stamp;

pub use config::Settings;
pub use error::{Error, Result};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, ModelSignals, Signal};
pub use stamp::{Stamp, next_stamp};
