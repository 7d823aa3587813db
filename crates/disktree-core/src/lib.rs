/// disktree Core — scanning engine and data model.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`] — Arena-allocated entry tree and supporting types.
/// - [`scanner`] — Background filesystem traversal with live progress
///   reporting and cooperative cancellation.
pub mod model;
pub mod scanner;
