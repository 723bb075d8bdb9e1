//! Sandbox: isolated execution of untrusted candidate programs.
//!
//! Model-produced program text is never evaluated in this process. The
//! production runner ships it to a short-lived child process with a fixed
//! hash seed and a hard wall-clock limit, then validates whatever comes back
//! on stdout. Misbehaviour in the child (crash, infinite loop, garbage
//! output) is reported as a typed [`ExitReason`], never as a caller failure.
//!
//! # Modules
//!
//! - [`runner`] — `TransformRunner` trait, `ProcessSandbox`, `SandboxOutcome`
//! - [`error`]  — `SandboxError` / `SandboxResult`

pub mod error;
pub mod runner;

pub use error::{SandboxError, SandboxResult};
pub use runner::{ExitReason, ProcessSandbox, SandboxConfig, SandboxOutcome, TransformRunner};
