//! The `XamInput*` exports.
//!
//! Every shim follows the same sequence: pull the arguments out of the call
//! frame, reject null or unusable pointers with `BAD_ARGUMENTS`, ask the
//! backend, and only when the backend succeeded copy the output record into
//! guest memory. The backend's status always ends up in the result register.

use std::sync::Arc;

use tracing::debug;
use xshim_codec::{
    GuestRecord, InputCapabilities, InputKeystroke, InputState, InputVibration, XUSER_INDEX_ANY,
};
use xshim_core::{MemoryError, NULL_GUEST_PTR, XResult};
use xshim_host::{ExportResolverBuilder, ExportResult, Handler, ShimCall};
use xshim_input::{InputBackend, SharedBackend};

/// Guest module that exports the input shims.
pub const INPUT_MODULE: &str = "xam.xex";

/// One of the input exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputShim {
    /// `XamInputGetCapabilities(user_index, flags, caps_ptr)`
    GetCapabilities,
    /// `XamInputGetState(user_index, state_ptr)`
    GetState,
    /// `XamInputSetState(user_index, vibration_ptr)`
    SetState,
    /// `XamInputGetKeystroke(user_index, flags, keystroke_ptr)`
    GetKeystroke,
    /// `XamInputGetKeystrokeEx(user_index_ptr, flags, keystroke_ptr)`
    GetKeystrokeEx,
}

impl InputShim {
    /// Every input export, in registration order.
    pub const ALL: [InputShim; 5] = [
        InputShim::GetCapabilities,
        InputShim::GetState,
        InputShim::SetState,
        InputShim::GetKeystroke,
        InputShim::GetKeystrokeEx,
    ];

    /// Export name in the guest module.
    pub fn name(self) -> &'static str {
        match self {
            InputShim::GetCapabilities => "XamInputGetCapabilities",
            InputShim::GetState => "XamInputGetState",
            InputShim::SetState => "XamInputSetState",
            InputShim::GetKeystroke => "XamInputGetKeystroke",
            InputShim::GetKeystrokeEx => "XamInputGetKeystrokeEx",
        }
    }

    /// Argument names, in call order.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            InputShim::GetCapabilities => &["user_index", "flags", "caps_ptr"],
            InputShim::GetState => &["user_index", "state_ptr"],
            InputShim::SetState => &["user_index", "vibration_ptr"],
            InputShim::GetKeystroke => &["user_index", "flags", "keystroke_ptr"],
            InputShim::GetKeystrokeEx => &["user_index_ptr", "flags", "keystroke_ptr"],
        }
    }

    /// Look an export up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shim| shim.name() == name)
    }

    /// Run this shim against `backend`, leaving the status in the result
    /// register.
    pub fn call(self, call: &mut ShimCall<'_>, backend: &dyn InputBackend) {
        let outcome = match self {
            InputShim::GetCapabilities => get_capabilities(call, backend),
            InputShim::GetState => get_state(call, backend),
            InputShim::SetState => set_state(call, backend),
            InputShim::GetKeystroke => get_keystroke(call, backend),
            InputShim::GetKeystrokeEx => get_keystroke_ex(call, backend),
        };
        call.set_return(outcome.unwrap_or(XResult::BAD_ARGUMENTS));
    }
}

/// An input shim bound to the backend it forwards to.
pub struct InputHandler {
    shim: InputShim,
    backend: SharedBackend,
}

impl InputHandler {
    /// Bind `shim` to `backend`.
    pub fn new(shim: InputShim, backend: SharedBackend) -> Self {
        Self { shim, backend }
    }

    /// The export this handler implements.
    pub fn shim(&self) -> InputShim {
        self.shim
    }
}

impl Handler for InputHandler {
    fn invoke(&self, call: &mut ShimCall<'_>) {
        self.shim.call(call, self.backend.as_ref());
    }
}

impl std::fmt::Debug for InputHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandler")
            .field("shim", &self.shim.name())
            .finish()
    }
}

/// Register all input exports under [`INPUT_MODULE`].
///
/// # Errors
///
/// Fails with `DuplicateExport` if any of them is already registered.
pub fn register_input_exports(
    builder: &mut ExportResolverBuilder,
    backend: SharedBackend,
) -> ExportResult<()> {
    for shim in InputShim::ALL {
        builder.register(
            INPUT_MODULE,
            shim.name(),
            shim.params(),
            InputHandler::new(shim, Arc::clone(&backend)),
        )?;
    }
    debug!(module = INPUT_MODULE, count = InputShim::ALL.len(), "Input exports registered");
    Ok(())
}

/// A pointer argument was null or does not address usable guest memory.
#[derive(Debug)]
struct BadArguments;

impl From<MemoryError> for BadArguments {
    fn from(_: MemoryError) -> Self {
        BadArguments
    }
}

type ShimResult = Result<XResult, BadArguments>;

/// Validate an output pointer for record `R`.
///
/// The whole destination is checked up front so a successful backend call
/// is never followed by a failed write.
fn output_ptr<R: GuestRecord>(call: &ShimCall<'_>, ptr: u32) -> Result<u32, BadArguments> {
    if ptr == NULL_GUEST_PTR {
        return Err(BadArguments);
    }
    R::check_writable(call.memory(), ptr)?;
    Ok(ptr)
}

fn get_capabilities(call: &mut ShimCall<'_>, backend: &dyn InputBackend) -> ShimResult {
    let user_index = call.arg32(0);
    let flags = call.arg32(1);
    let caps_ptr = output_ptr::<InputCapabilities>(call, call.arg32(2))?;

    let mut caps = InputCapabilities::default();
    let result = backend.get_capabilities(user_index, flags, &mut caps);
    if result.succeeded() {
        caps.write_to(call.memory_mut(), caps_ptr)?;
    }
    Ok(result)
}

fn get_state(call: &mut ShimCall<'_>, backend: &dyn InputBackend) -> ShimResult {
    let user_index = call.arg32(0);
    let state_ptr = output_ptr::<InputState>(call, call.arg32(1))?;

    let mut state = InputState::default();
    let result = backend.get_state(user_index, &mut state);
    if result.succeeded() {
        state.write_to(call.memory_mut(), state_ptr)?;
    }
    Ok(result)
}

fn set_state(call: &mut ShimCall<'_>, backend: &dyn InputBackend) -> ShimResult {
    let user_index = call.arg32(0);
    let vibration_ptr = call.arg32(1);
    if vibration_ptr == NULL_GUEST_PTR {
        return Err(BadArguments);
    }

    let vibration = InputVibration::read_from(call.memory(), vibration_ptr)?;
    Ok(backend.set_state(user_index, &vibration))
}

fn get_keystroke(call: &mut ShimCall<'_>, backend: &dyn InputBackend) -> ShimResult {
    let user_index = call.arg32(0);
    let flags = call.arg32(1);
    let keystroke_ptr = output_ptr::<InputKeystroke>(call, call.arg32(2))?;

    let mut keystroke = InputKeystroke::default();
    let result = backend.get_keystroke(user_index, flags, &mut keystroke);
    if result.succeeded() {
        keystroke.write_to(call.memory_mut(), keystroke_ptr)?;
    }
    Ok(result)
}

fn get_keystroke_ex(call: &mut ShimCall<'_>, backend: &dyn InputBackend) -> ShimResult {
    let user_index_ptr = call.arg32(0);
    let flags = call.arg32(1);
    let keystroke_ptr = output_ptr::<InputKeystroke>(call, call.arg32(2))?;

    let user_index = if user_index_ptr == NULL_GUEST_PTR {
        XUSER_INDEX_ANY
    } else {
        call.memory().check_writable(user_index_ptr, 4)?;
        call.memory().read_u32(user_index_ptr)?
    };

    let mut keystroke = InputKeystroke::default();
    let result = backend.get_keystroke(user_index, flags, &mut keystroke);
    if result.succeeded() {
        if user_index_ptr != NULL_GUEST_PTR {
            call.memory_mut()
                .write_u32(user_index_ptr, u32::from(keystroke.user_index))?;
        }
        keystroke.write_to(call.memory_mut(), keystroke_ptr)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use xshim_codec::{InputGamepad, XINPUT_KEYSTROKE_KEYDOWN, buttons, vk};
    use xshim_core::{
        AddressFault, CallContext, FlatMemory, GuestMemory, MemoryResult, PpcContext,
    };
    use xshim_host::ExportError;
    use xshim_input::VirtualPadDriver;

    /// Backend double with a fixed answer and a call counter.
    struct StubBackend {
        result: XResult,
        state: InputState,
        keystroke: InputKeystroke,
        calls: AtomicUsize,
        last_user_index: Mutex<Option<u32>>,
        last_vibration: Mutex<Option<InputVibration>>,
    }

    impl StubBackend {
        fn new(result: XResult) -> Self {
            Self {
                result,
                state: InputState {
                    packet_number: 0x0102_0304,
                    gamepad: InputGamepad {
                        buttons: buttons::A | buttons::DPAD_UP,
                        left_trigger: 0x80,
                        right_trigger: 0xFF,
                        thumb_lx: -1,
                        thumb_ly: i16::MAX,
                        thumb_rx: i16::MIN,
                        thumb_ry: 0x1234,
                    },
                },
                keystroke: InputKeystroke {
                    virtual_key: vk::PAD_A,
                    unicode: 0,
                    flags: XINPUT_KEYSTROKE_KEYDOWN,
                    user_index: 2,
                    hid_code: 0,
                },
                calls: AtomicUsize::new(0),
                last_user_index: Mutex::new(None),
                last_vibration: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self, user_index: u32) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user_index.lock() = Some(user_index);
        }
    }

    impl InputBackend for StubBackend {
        fn get_capabilities(
            &self,
            user_index: u32,
            _flags: u32,
            out: &mut InputCapabilities,
        ) -> XResult {
            self.hit(user_index);
            out.kind = 1;
            out.gamepad.buttons = 0xF7FF;
            self.result
        }

        fn get_state(&self, user_index: u32, out: &mut InputState) -> XResult {
            self.hit(user_index);
            *out = self.state;
            self.result
        }

        fn set_state(&self, user_index: u32, vibration: &InputVibration) -> XResult {
            self.hit(user_index);
            *self.last_vibration.lock() = Some(*vibration);
            self.result
        }

        fn get_keystroke(&self, user_index: u32, _flags: u32, out: &mut InputKeystroke) -> XResult {
            self.hit(user_index);
            *out = self.keystroke;
            self.result
        }
    }

    /// Flat memory with one page that rejects writes.
    struct ReadOnlyPage {
        inner: FlatMemory,
        page: std::ops::Range<u32>,
    }

    impl ReadOnlyPage {
        fn new(size: usize, page: std::ops::Range<u32>) -> Self {
            Self {
                inner: FlatMemory::new(size),
                page,
            }
        }

        fn overlaps(&self, address: u32, len: usize) -> bool {
            let end = u64::from(address) + len as u64;
            u64::from(address) < u64::from(self.page.end) && end > u64::from(self.page.start)
        }
    }

    impl GuestMemory for ReadOnlyPage {
        fn size(&self) -> u64 {
            self.inner.size()
        }

        fn read_bytes(&self, address: u32, buf: &mut [u8]) -> MemoryResult<()> {
            self.inner.read_bytes(address, buf)
        }

        fn write_bytes(&mut self, address: u32, data: &[u8]) -> MemoryResult<()> {
            self.check_writable(address, data.len())?;
            self.inner.write_bytes(address, data)
        }

        fn check_writable(&self, address: u32, len: usize) -> MemoryResult<()> {
            self.check_range(address, len)?;
            if self.overlaps(address, len) {
                return Err(MemoryError::InvalidAddress {
                    address,
                    len,
                    fault: AddressFault::ReadOnly,
                });
            }
            Ok(())
        }
    }

    fn run(
        shim: InputShim,
        backend: &StubBackend,
        memory: &mut FlatMemory,
        args: &[u32],
    ) -> XResult {
        let mut ctx = PpcContext::with_args(args);
        shim.call(&mut ShimCall::new(&mut ctx, memory), backend);
        XResult::from_u32(ctx.return32())
    }

    #[test]
    fn test_null_pointers_are_bad_arguments() {
        let cases: [(InputShim, &[u32]); 5] = [
            (InputShim::GetCapabilities, &[0, 0, 0]),
            (InputShim::GetState, &[0, 0]),
            (InputShim::SetState, &[0, 0]),
            (InputShim::GetKeystroke, &[0, 0, 0]),
            (InputShim::GetKeystrokeEx, &[0x100, 0, 0]),
        ];

        for (shim, args) in cases {
            let backend = StubBackend::new(XResult::SUCCESS);
            let mut memory = FlatMemory::new(0x2000);

            assert_eq!(run(shim, &backend, &mut memory, args), XResult::BAD_ARGUMENTS);
            assert_eq!(backend.calls(), 0, "{} reached the backend", shim.name());
            assert!(memory.as_slice().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_get_state_writes_exact_bytes() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);

        let result = run(InputShim::GetState, &backend, &mut memory, &[0, 0x1000]);

        assert_eq!(result, XResult::SUCCESS);
        assert_eq!(
            memory.slice(0x1000, 16).unwrap(),
            &[
                0x01, 0x02, 0x03, 0x04, // packet number
                0x10, 0x01, 0x80, 0xFF, // buttons, triggers
                0xFF, 0xFF, 0x7F, 0xFF, 0x80, 0x00, 0x12, 0x34, // thumbs
            ]
        );
    }

    #[test]
    fn test_failure_writes_nothing() {
        let backend = StubBackend::new(XResult::DEVICE_NOT_CONNECTED);
        let mut memory = FlatMemory::new(0x2000);

        assert_eq!(
            run(InputShim::GetState, &backend, &mut memory, &[3, 0x1000]),
            XResult::DEVICE_NOT_CONNECTED
        );
        assert_eq!(
            run(InputShim::GetCapabilities, &backend, &mut memory, &[3, 0, 0x1000]),
            XResult::DEVICE_NOT_CONNECTED
        );
        assert_eq!(
            run(InputShim::GetKeystroke, &backend, &mut memory, &[3, 0, 0x1000]),
            XResult::DEVICE_NOT_CONNECTED
        );
        assert_eq!(backend.calls(), 3);
        assert!(memory.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_output_range_skips_backend() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);

        // Misaligned, then running off the end of memory.
        assert_eq!(
            run(InputShim::GetState, &backend, &mut memory, &[0, 0x1002]),
            XResult::BAD_ARGUMENTS
        );
        assert_eq!(
            run(InputShim::GetCapabilities, &backend, &mut memory, &[0, 0, 0x1FF0]),
            XResult::BAD_ARGUMENTS
        );
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_get_capabilities_success() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);

        let result = run(InputShim::GetCapabilities, &backend, &mut memory, &[1, 1, 0x800]);

        assert_eq!(result, XResult::SUCCESS);
        assert_eq!(*backend.last_user_index.lock(), Some(1));
        let caps = InputCapabilities::read_from(&memory, 0x800).unwrap();
        assert_eq!(caps.kind, 1);
        assert_eq!(caps.gamepad.buttons, 0xF7FF);
    }

    #[test]
    fn test_set_state_forwards_vibration() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);
        memory.write_bytes(0x40, &[0xAB, 0xCD, 0x00, 0x01]).unwrap();

        let result = run(InputShim::SetState, &backend, &mut memory, &[0, 0x40]);

        assert_eq!(result, XResult::SUCCESS);
        assert_eq!(
            *backend.last_vibration.lock(),
            Some(InputVibration {
                left_motor_speed: 0xABCD,
                right_motor_speed: 0x0001,
            })
        );
        assert_eq!(memory.slice(0x40, 4).unwrap(), &[0xAB, 0xCD, 0x00, 0x01]);
    }

    #[test]
    fn test_set_state_unreadable_vibration() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x100);

        let result = run(InputShim::SetState, &backend, &mut memory, &[0, 0x1000]);

        assert_eq!(result, XResult::BAD_ARGUMENTS);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_set_state_passes_backend_status_through() {
        let backend = StubBackend::new(XResult::DEVICE_NOT_CONNECTED);
        let mut memory = FlatMemory::new(0x100);

        let result = run(InputShim::SetState, &backend, &mut memory, &[3, 0x10]);

        assert_eq!(result, XResult::DEVICE_NOT_CONNECTED);
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_get_keystroke_success() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);

        let result = run(InputShim::GetKeystroke, &backend, &mut memory, &[0xFF, 0, 0x200]);

        assert_eq!(result, XResult::SUCCESS);
        assert_eq!(*backend.last_user_index.lock(), Some(0xFF));
        assert_eq!(
            memory.slice(0x200, 8).unwrap(),
            &[0x58, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x00]
        );
    }

    #[test]
    fn test_get_keystroke_ex_writes_back_index() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);
        memory.write_u32(0x100, XUSER_INDEX_ANY).unwrap();

        let result = run(InputShim::GetKeystrokeEx, &backend, &mut memory, &[0x100, 0, 0x200]);

        assert_eq!(result, XResult::SUCCESS);
        assert_eq!(*backend.last_user_index.lock(), Some(XUSER_INDEX_ANY));
        assert_eq!(memory.read_u32(0x100).unwrap(), 2);
        assert_eq!(
            InputKeystroke::read_from(&memory, 0x200).unwrap(),
            backend.keystroke
        );
    }

    #[test]
    fn test_get_keystroke_ex_failure_leaves_memory() {
        let backend = StubBackend::new(XResult::EMPTY);
        let mut memory = FlatMemory::new(0x2000);
        memory.write_u32(0x100, 1).unwrap();

        let result = run(InputShim::GetKeystrokeEx, &backend, &mut memory, &[0x100, 0, 0x200]);

        assert_eq!(result, XResult::EMPTY);
        assert_eq!(*backend.last_user_index.lock(), Some(1));
        assert_eq!(memory.read_u32(0x100).unwrap(), 1);
        assert!(memory.slice(0x200, 8).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_get_keystroke_ex_null_index_pointer() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);

        let result = run(InputShim::GetKeystrokeEx, &backend, &mut memory, &[0, 0, 0x200]);

        assert_eq!(result, XResult::SUCCESS);
        assert_eq!(*backend.last_user_index.lock(), Some(XUSER_INDEX_ANY));
        assert_eq!(memory.read_u16(0x200).unwrap(), vk::PAD_A);
    }

    #[test]
    fn test_get_keystroke_ex_unreadable_index_pointer() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = FlatMemory::new(0x2000);

        let result = run(InputShim::GetKeystrokeEx, &backend, &mut memory, &[0x1FFE, 0, 0x200]);

        assert_eq!(result, XResult::BAD_ARGUMENTS);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_read_only_output_skips_backend() {
        let backend = StubBackend::new(XResult::SUCCESS);
        let mut memory = ReadOnlyPage::new(0x2000, 0x1000..0x1100);

        let cases: [(InputShim, &[u32]); 4] = [
            (InputShim::GetCapabilities, &[0, 0, 0x1000]),
            (InputShim::GetState, &[0, 0x1010]),
            (InputShim::GetKeystroke, &[0, 0, 0x10F8]),
            (InputShim::GetKeystrokeEx, &[0x1000, 0, 0x200]),
        ];
        for (shim, args) in cases {
            let mut ctx = PpcContext::with_args(args);
            shim.call(&mut ShimCall::new(&mut ctx, &mut memory), &backend);
            assert_eq!(ctx.return32(), 0xA0, "{}", shim.name());
        }

        assert_eq!(backend.calls(), 0);
        assert!(memory.inner.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_only_index_keeps_keystroke_queued() {
        let pad = VirtualPadDriver::new(0);
        pad.push_keystroke(InputKeystroke {
            virtual_key: vk::PAD_A,
            flags: XINPUT_KEYSTROKE_KEYDOWN,
            ..Default::default()
        });
        let mut memory = ReadOnlyPage::new(0x2000, 0x100..0x104);

        let mut ctx = PpcContext::with_args(&[0x100, 0, 0x200]);
        InputShim::GetKeystrokeEx.call(&mut ShimCall::new(&mut ctx, &mut memory), &pad);

        assert_eq!(XResult::from_u32(ctx.return32()), XResult::BAD_ARGUMENTS);
        assert_eq!(pad.pending_keystrokes(), 1);
        assert!(memory.inner.slice(0x200, 8).unwrap().iter().all(|&b| b == 0));

        // Same call with a writable index delivers the keystroke.
        let mut memory = FlatMemory::new(0x2000);
        let mut ctx = PpcContext::with_args(&[0x100, 0, 0x200]);
        InputShim::GetKeystrokeEx.call(&mut ShimCall::new(&mut ctx, &mut memory), &pad);

        assert_eq!(XResult::from_u32(ctx.return32()), XResult::SUCCESS);
        assert_eq!(pad.pending_keystrokes(), 0);
        assert_eq!(memory.read_u16(0x200).unwrap(), vk::PAD_A);
    }

    #[test]
    fn test_shim_names_round_trip() {
        for shim in InputShim::ALL {
            assert_eq!(InputShim::from_name(shim.name()), Some(shim));
        }
        assert_eq!(InputShim::from_name("XamInputGetDeviceStats"), None);
    }

    #[test]
    fn test_register_input_exports() {
        let backend: SharedBackend = Arc::new(StubBackend::new(XResult::SUCCESS));
        let mut builder = ExportResolverBuilder::new();

        register_input_exports(&mut builder, Arc::clone(&backend)).unwrap();
        assert_eq!(builder.len(), 5);
        assert!(matches!(
            register_input_exports(&mut builder, backend),
            Err(ExportError::DuplicateExport { .. })
        ));

        let resolver = builder.build();
        let bound = resolver.resolve(INPUT_MODULE, "XamInputGetKeystrokeEx").unwrap();
        assert_eq!(bound.params(), &["user_index_ptr", "flags", "keystroke_ptr"]);
    }

    #[test]
    fn test_resolved_export_end_to_end() {
        let mut builder = ExportResolverBuilder::new();
        register_input_exports(&mut builder, Arc::new(StubBackend::new(XResult::SUCCESS))).unwrap();
        let resolver = builder.build();
        let get_caps = resolver.resolve(INPUT_MODULE, "XamInputGetCapabilities").unwrap();

        let mut ctx = PpcContext::with_args(&[0, 0, 0]);
        let mut memory = FlatMemory::new(0x100);
        get_caps.invoke(&mut ShimCall::new(&mut ctx, &mut memory));

        assert_eq!(ctx.return32(), 0xA0);
    }
}
