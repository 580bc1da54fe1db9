//! xshim XAM - guest exports of the XAM module
//!
//! The input exports (`XamInputGetCapabilities`, `XamInputGetState`,
//! `XamInputSetState`, `XamInputGetKeystroke`, `XamInputGetKeystrokeEx`)
//! translate guest calls into [`InputBackend`](xshim_input::InputBackend)
//! requests. Register them with [`register_input_exports`].

pub mod input;

pub use input::{INPUT_MODULE, InputHandler, InputShim, register_input_exports};
