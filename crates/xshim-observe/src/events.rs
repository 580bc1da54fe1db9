//! Observable events around guest calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use xshim_core::XResult;

/// Events that can be observed while the kernel dispatches guest calls.
#[derive(Debug, Clone)]
pub enum ShimEvent {
    /// An export was added to the resolver.
    ExportRegistered {
        /// Guest module name.
        module: String,
        /// Export name.
        name: String,
    },
    /// A call site was bound to an export.
    ExportBound {
        /// Guest module name.
        module: String,
        /// Export name.
        name: String,
    },
    /// A shim ran to completion.
    ShimCalled {
        /// Guest module name.
        module: String,
        /// Export name.
        name: String,
        /// Named 32-bit arguments, in call order.
        args: Vec<(&'static str, u32)>,
        /// The value left in the result register.
        result: XResult,
        /// Time spent inside the handler.
        duration: Duration,
    },
    /// A call site asked for something the kernel could not provide.
    Error {
        /// Error message.
        message: String,
    },
}

impl ShimEvent {
    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            ShimEvent::ExportRegistered { .. } => "export_registered",
            ShimEvent::ExportBound { .. } => "export_bound",
            ShimEvent::ShimCalled { .. } => "shim_called",
            ShimEvent::Error { .. } => "error",
        }
    }
}

/// Formats named arguments the way a call trace shows them.
///
/// ```
/// use xshim_observe::events::format_call_args;
///
/// assert_eq!(format_call_args(&[("user_index", 0), ("state_ptr", 0x1000)]),
///            "user_index=0x0, state_ptr=0x1000");
/// ```
pub fn format_call_args(args: &[(&'static str, u32)]) -> String {
    args.iter()
        .map(|(name, value)| format!("{name}={value:#x}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Subscriber for shim events.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &ShimEvent);

    /// Filter for event types this subscriber is interested in.
    /// Returns None to receive all events.
    fn event_filter(&self) -> Option<Vec<&'static str>> {
        None
    }
}

/// A subscriber that turns events into `tracing` records.
#[derive(Debug, Default)]
pub struct LoggingSubscriber;

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, event: &ShimEvent) {
        match event {
            ShimEvent::ExportRegistered { module, name } => {
                tracing::debug!(
                    event = "export_registered",
                    module = module,
                    name = name,
                    "Export registered"
                );
            }
            ShimEvent::ExportBound { module, name } => {
                tracing::trace!(
                    event = "export_bound",
                    module = module,
                    name = name,
                    "Export bound"
                );
            }
            ShimEvent::ShimCalled {
                module,
                name,
                args,
                result,
                duration,
            } => {
                let args = format_call_args(args);
                if result.succeeded() {
                    tracing::trace!(
                        event = "shim_called",
                        module = module,
                        name = name,
                        args = %args,
                        result = %result,
                        duration_us = duration.as_micros(),
                        "Shim called"
                    );
                } else {
                    tracing::debug!(
                        event = "shim_called",
                        module = module,
                        name = name,
                        args = %args,
                        result = %result,
                        duration_us = duration.as_micros(),
                        "Shim failed"
                    );
                }
            }
            ShimEvent::Error { message } => {
                tracing::error!(event = "error", message = message, "Error occurred");
            }
        }
    }
}

/// A subscriber that collects events for later analysis.
///
/// Events beyond `max_events` are dropped.
pub struct CollectingSubscriber {
    events: RwLock<Vec<(Instant, ShimEvent)>>,
    max_events: usize,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<(Instant, ShimEvent)> {
        self.events.read().clone()
    }

    /// Collected `ShimCalled` events as `(name, result)` pairs.
    pub fn calls(&self) -> Vec<(String, XResult)> {
        self.events
            .read()
            .iter()
            .filter_map(|(_, event)| match event {
                ShimEvent::ShimCalled { name, result, .. } => Some((name.clone(), *result)),
                _ => None,
            })
            .collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, event: &ShimEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((Instant::now(), event.clone()));
        }
    }
}

/// Event dispatcher that manages subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove a subscriber previously added with [`subscribe`](Self::subscribe).
    ///
    /// Returns `true` if it was found.
    pub fn unsubscribe(&self, subscriber: &Arc<dyn EventSubscriber>) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| !Arc::ptr_eq(s, subscriber));
        subscribers.len() != before
    }

    /// Remove all subscribers.
    pub fn clear_subscribers(&self) {
        self.subscribers.write().clear();
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check whether anyone is listening.
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.read().is_empty()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: ShimEvent) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if let Some(filter) = subscriber.event_filter() {
                if !filter.contains(&event.event_type()) {
                    continue;
                }
            }
            subscriber.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn called(name: &str, result: XResult) -> ShimEvent {
        ShimEvent::ShimCalled {
            module: "xam.xex".to_string(),
            name: name.to_string(),
            args: vec![("user_index", 0), ("state_ptr", 0x1000)],
            result,
            duration: Duration::from_micros(3),
        }
    }

    struct CallsOnly(CollectingSubscriber);

    impl EventSubscriber for CallsOnly {
        fn on_event(&self, event: &ShimEvent) {
            self.0.on_event(event);
        }

        fn event_filter(&self) -> Option<Vec<&'static str>> {
            Some(vec!["shim_called"])
        }
    }

    #[test]
    fn test_event_type() {
        let event = ShimEvent::ExportRegistered {
            module: "xam.xex".to_string(),
            name: "XamInputGetState".to_string(),
        };
        assert_eq!(event.event_type(), "export_registered");
        assert_eq!(called("XamInputGetState", XResult::SUCCESS).event_type(), "shim_called");
    }

    #[test]
    fn test_collecting_subscriber() {
        let subscriber = CollectingSubscriber::new(100);

        subscriber.on_event(&called("XamInputGetState", XResult::DEVICE_NOT_CONNECTED));

        assert_eq!(subscriber.len(), 1);
        assert_eq!(
            subscriber.calls(),
            vec![("XamInputGetState".to_string(), XResult::DEVICE_NOT_CONNECTED)]
        );

        match &subscriber.events()[0].1 {
            ShimEvent::ShimCalled { args, .. } => {
                assert_eq!(args[1], ("state_ptr", 0x1000));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_collecting_subscriber_max_events() {
        let subscriber = CollectingSubscriber::new(2);

        for i in 0..5 {
            subscriber.on_event(&ShimEvent::Error {
                message: format!("error_{}", i),
            });
        }

        assert_eq!(subscriber.len(), 2);
    }

    #[test]
    fn test_event_dispatcher_filter() {
        let dispatcher = EventDispatcher::new();
        let calls = Arc::new(CallsOnly(CollectingSubscriber::new(100)));
        dispatcher.subscribe(Arc::clone(&calls) as Arc<dyn EventSubscriber>);

        dispatcher.emit(ShimEvent::Error {
            message: "ignored".to_string(),
        });
        dispatcher.emit(called("XamInputSetState", XResult::SUCCESS));

        assert_eq!(calls.0.len(), 1);
    }

    #[test]
    fn test_event_dispatcher_unsubscribe() {
        let dispatcher = EventDispatcher::new();
        let collector = Arc::new(CollectingSubscriber::new(100));
        let handle = Arc::clone(&collector) as Arc<dyn EventSubscriber>;

        dispatcher.subscribe(Arc::clone(&handle));
        dispatcher.subscribe(Arc::new(LoggingSubscriber::new()));
        assert_eq!(dispatcher.subscriber_count(), 2);

        dispatcher.emit(called("XamInputGetKeystroke", XResult::EMPTY));
        assert!(dispatcher.unsubscribe(&handle));
        assert!(!dispatcher.unsubscribe(&handle));
        dispatcher.emit(called("XamInputGetKeystroke", XResult::EMPTY));

        assert_eq!(collector.len(), 1);
        assert_eq!(dispatcher.subscriber_count(), 1);
    }
}
