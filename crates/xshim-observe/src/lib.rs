//! xshim Observability
//!
//! Shim handlers do no logging of their own. The dispatcher reports every
//! call as a [`ShimEvent`] and this crate decides what happens to it:
//!
//! - [`EventDispatcher`]: fans events out to subscribers
//! - [`LoggingSubscriber`]: turns events into `tracing` records
//! - [`CollectingSubscriber`]: keeps events in memory, mostly for tests
//! - [`MetricsCollector`]: per-export call counts and timings
//!
//! # Event Subscription
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use xshim_core::XResult;
//! use xshim_observe::{EventDispatcher, EventSubscriber, MetricsCollector, ShimEvent};
//!
//! let dispatcher = EventDispatcher::new();
//! let metrics = Arc::new(MetricsCollector::new());
//! dispatcher.subscribe(Arc::clone(&metrics) as Arc<dyn EventSubscriber>);
//!
//! dispatcher.emit(ShimEvent::ShimCalled {
//!     module: "xam.xex".to_string(),
//!     name: "XamInputGetState".to_string(),
//!     args: vec![("user_index", 0), ("state_ptr", 0x1000)],
//!     result: XResult::SUCCESS,
//!     duration: Duration::from_micros(4),
//! });
//!
//! assert_eq!(metrics.snapshot().total_calls, 1);
//! ```

pub mod events;
pub mod metrics;

// Re-export main types
pub use events::{
    CollectingSubscriber, EventDispatcher, EventSubscriber, LoggingSubscriber, ShimEvent,
};
pub use metrics::{ExportMetrics, MetricsCollector, MetricsSnapshot};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{EventDispatcher, EventSubscriber, ShimEvent};
    pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
}
