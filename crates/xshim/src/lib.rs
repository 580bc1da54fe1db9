//! # xshim - guest-call shim layer
//!
//! xshim sits between statically translated guest code and the host. Guest
//! code calls system exports by `(module, name)`; xshim resolves each export
//! once to a host handler, hands the handler the emulated call frame and
//! guest memory, and reports every call to an observability hook.
//!
//! ## Quick Start
//!
//! ```
//! use xshim::prelude::*;
//!
//! let kernel = Kernel::builder()
//!     .with_driver(VirtualPadDriver::new(0))
//!     .build()?;
//!
//! // Bind once, call as often as the guest likes.
//! let get_state = kernel.bind("xam.xex", "XamInputGetState")?;
//!
//! let mut memory = kernel.new_memory();
//! let mut ctx = PpcContext::with_args(&[0, 0x1000]);
//! let result = get_state.dispatch(&mut ctx, &mut memory);
//!
//! assert_eq!(result, XResult::SUCCESS);
//! assert_eq!(kernel.metrics().total_calls(), 1);
//! # Ok::<(), KernelError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Translated guest code                   │
//! ├─────────────────────────────────────────────────────────┤
//! │                    xshim (facade)                       │
//! │             Kernel ── bind ──> Dispatcher               │
//! │                            │                            │
//! │  ┌────────────┬────────────┴─┬──────────────────────┐   │
//! │  │ xshim-host │  xshim-xam   │    xshim-observe     │   │
//! │  │ (exports)  │  (shims)     │  (events, metrics)   │   │
//! │  └────────────┴──────┬───────┴──────────────────────┘   │
//! │          xshim-codec │ xshim-input (backend, drivers)   │
//! ├─────────────────────────────────────────────────────────┤
//! │            xshim-core (memory, call frame)              │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use xshim_core::{
    CallContext, ConfigError, FlatMemory, GuestMemory, KernelConfig, MemoryConfig, PadConfig,
    XResult,
};
use xshim_host::{BoundExport, ExportError, ExportResolver, ExportResolverBuilder, ShimCall};
use xshim_input::{InputDriver, InputError, InputSystem, SharedBackend, SharedDriver};
use xshim_observe::{
    EventDispatcher, EventSubscriber, LoggingSubscriber, MetricsCollector, ShimEvent,
};

// Re-export from sub-crates
pub use xshim_codec;
pub use xshim_core;
pub use xshim_host;
pub use xshim_input;
pub use xshim_observe;
pub use xshim_xam;

/// Builder for configuring a kernel.
pub struct KernelBuilder {
    config: KernelConfig,
    drivers: Vec<SharedDriver>,
    backend: Option<SharedBackend>,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl KernelBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            drivers: Vec::new(),
            backend: None,
            event_subscribers: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML file.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Result<Self, KernelError> {
        self.config = KernelConfig::from_file(path.as_ref())?;
        Ok(self)
    }

    /// Set the guest memory size in bytes.
    pub fn with_memory_size(mut self, bytes: u64) -> Self {
        self.config.memory = MemoryConfig::with_size(bytes);
        self
    }

    /// Log every call through `tracing`.
    pub fn with_trace_calls(mut self, enabled: bool) -> Self {
        self.config.trace_calls = enabled;
        self
    }

    /// Add a configured virtual pad.
    pub fn with_pad(mut self, pad: PadConfig) -> Self {
        self.config.input.pads.push(pad);
        self
    }

    // Input

    /// Attach an input driver.
    ///
    /// Explicit drivers replace the pads from the configuration.
    pub fn with_driver<D: InputDriver + 'static>(mut self, driver: D) -> Self {
        self.drivers.push(Arc::new(driver));
        self
    }

    /// Attach a shared input driver.
    pub fn with_shared_driver(mut self, driver: SharedDriver) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Use `backend` for the input exports instead of building an input
    /// system from drivers.
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    // Observability

    /// Add an event subscriber.
    pub fn with_event_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.event_subscribers.push(subscriber);
        self
    }

    /// Build the kernel.
    pub fn build(self) -> Result<Kernel, KernelError> {
        self.config.validate()?;

        let input: SharedBackend = match self.backend {
            Some(backend) => backend,
            None if !self.drivers.is_empty() => {
                let builder = self
                    .drivers
                    .into_iter()
                    .fold(InputSystem::builder(), |b, d| b.with_shared(d));
                Arc::new(builder.build()?)
            }
            None => Arc::new(InputSystem::from_config(&self.config.input)?),
        };

        let event_dispatcher = EventDispatcher::new();
        let metrics = Arc::new(MetricsCollector::new());
        event_dispatcher.subscribe(Arc::clone(&metrics) as Arc<dyn EventSubscriber>);
        if self.config.trace_calls {
            event_dispatcher.subscribe(Arc::new(LoggingSubscriber::new()));
        }
        for subscriber in self.event_subscribers {
            event_dispatcher.subscribe(subscriber);
        }

        let mut exports = ExportResolverBuilder::new();
        xshim_xam::register_input_exports(&mut exports, Arc::clone(&input))?;
        let resolver = exports.build();

        for record in resolver.exports() {
            event_dispatcher.emit(ShimEvent::ExportRegistered {
                module: record.module().to_string(),
                name: record.name().to_string(),
            });
        }

        info!(
            exports = resolver.len(),
            memory = self.config.memory.size,
            "Kernel ready"
        );

        Ok(Kernel {
            config: self.config,
            resolver: Arc::new(resolver),
            input,
            event_dispatcher: Arc::new(event_dispatcher),
            metrics,
        })
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured kernel: the frozen export table plus the services behind it.
pub struct Kernel {
    config: KernelConfig,
    resolver: Arc<ExportResolver>,
    input: SharedBackend,
    event_dispatcher: Arc<EventDispatcher>,
    metrics: Arc<MetricsCollector>,
}

impl Kernel {
    /// Create a new kernel builder.
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    /// Create a kernel with default configuration.
    pub fn with_defaults() -> Result<Kernel, KernelError> {
        KernelBuilder::new().build()
    }

    /// Get the configuration the kernel was built with.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get the export table.
    pub fn resolver(&self) -> &Arc<ExportResolver> {
        &self.resolver
    }

    /// Get the input backend behind the input exports.
    pub fn input(&self) -> &SharedBackend {
        &self.input
    }

    /// Get the event dispatcher.
    pub fn event_dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.event_dispatcher
    }

    /// Get the per-export metrics.
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Allocate zeroed guest memory of the configured size.
    pub fn new_memory(&self) -> FlatMemory {
        FlatMemory::new(self.config.memory.size as usize)
    }

    /// Resolve an export for a call site.
    ///
    /// # Errors
    ///
    /// Fails with [`ExportError::UnknownExport`] if nothing is registered
    /// under `(module, name)`.
    pub fn bind(&self, module: &str, name: &str) -> Result<Dispatcher, KernelError> {
        let export = match self.resolver.resolve(module, name) {
            Ok(export) => export,
            Err(err) => {
                self.event_dispatcher.emit(ShimEvent::Error {
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        };
        self.event_dispatcher.emit(ShimEvent::ExportBound {
            module: export.module().to_string(),
            name: export.name().to_string(),
        });
        Ok(Dispatcher {
            export,
            event_dispatcher: Arc::clone(&self.event_dispatcher),
        })
    }

    /// Resolve and invoke an export in one step.
    pub fn call(
        &self,
        module: &str,
        name: &str,
        ctx: &mut dyn CallContext,
        memory: &mut dyn GuestMemory,
    ) -> Result<XResult, KernelError> {
        Ok(self.bind(module, name)?.dispatch(ctx, memory))
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("exports", &self.resolver.len())
            .finish()
    }
}

/// A call site bound to one export.
///
/// Dispatch goes straight to the handler; the observability hook sees the
/// named arguments, the result, and the time spent.
#[derive(Clone)]
pub struct Dispatcher {
    export: BoundExport,
    event_dispatcher: Arc<EventDispatcher>,
}

impl Dispatcher {
    /// Get the bound export.
    pub fn export(&self) -> &BoundExport {
        &self.export
    }

    /// Guest module name.
    pub fn module(&self) -> &str {
        self.export.module()
    }

    /// Export name.
    pub fn name(&self) -> &str {
        self.export.name()
    }

    /// Run the export against a call frame and guest memory.
    ///
    /// Returns the value left in the result register.
    pub fn dispatch(&self, ctx: &mut dyn CallContext, memory: &mut dyn GuestMemory) -> XResult {
        let mut call = ShimCall::new(ctx, memory);

        // r3 doubles as the first argument, so capture before invoking.
        let args: Vec<(&'static str, u32)> = if self.event_dispatcher.has_subscribers() {
            let params = self.export.params();
            params
                .iter()
                .copied()
                .zip(call.args32(params.len()))
                .collect()
        } else {
            Vec::new()
        };

        let start = Instant::now();
        self.export.invoke(&mut call);
        let duration = start.elapsed();
        let result = call.result();

        self.event_dispatcher.emit(ShimEvent::ShimCalled {
            module: self.export.module().to_string(),
            name: self.export.name().to_string(),
            args,
            result,
            duration,
        });

        result
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("module", &self.module())
            .field("name", &self.name())
            .finish()
    }
}

/// Errors from building or using a kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Export table error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Input subsystem error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{Dispatcher, Kernel, KernelBuilder, KernelError};

    // Core types
    pub use xshim_core::{
        CallContext, FlatMemory, GuestMemory, KernelConfig, MemoryConfig, PadConfig, PpcContext,
        XResult,
    };

    // Records
    pub use xshim_codec::{
        GuestRecord, InputCapabilities, InputGamepad, InputKeystroke, InputState, InputVibration,
    };

    // Input types
    pub use xshim_input::{InputBackend, InputDriver, InputSystem, NopDriver, VirtualPadDriver};

    // Observability types
    pub use xshim_observe::{
        CollectingSubscriber, EventDispatcher, EventSubscriber, MetricsCollector, ShimEvent,
    };

    // Common std types
    pub use std::sync::Arc;
}
