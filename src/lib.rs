//! bodypass
//!
//! Transformation passes over compiled method bodies, applied between code
//! generation and target emission.
//!
//! ## Architecture
//!
//! - **ir**: the method body model (unit chain, trap table, tags)
//! - **scene**: program-level method set and its call graph
//! - **transform**: the passes, trap splitting and taint annotation
//! - **config** / **error**: pass configuration and the crate error type
//!
//! ## Passes
//!
//! The trap splitter rewrites a body's exception-handler table so that no
//! two ranges overlap, for targets whose tables cannot represent handler
//! hierarchies; first-match dispatch is preserved exactly. The taint
//! annotator walks the scene call graph and flags method parameters whose
//! values reach a configured dangerous sink.

pub mod config;
pub mod error;
pub mod ir;
pub mod scene;
pub mod transform;

pub use config::Config;
pub use error::{Error, Result};
pub use ir::{
    Body, Local, MethodSig, Tag, TagContainer, TaintTag, Trap, TrapChain, TrapId, UnitChain,
    UnitId, UnitKind, TAINT_TAG_NAME,
};
pub use scene::{CallEdge, CallGraph, Method, MethodId, Scene};
pub use transform::{
    run_passes, split_traps, BodyTransform, TaintAnalysis, TaintReport, TrapSplitter, UnsafeParam,
};

/// Split a single body's traps in place.
///
/// Convenience wrapper over [`transform::split_traps`] for callers holding
/// a whole [`Body`].
pub fn split_body_traps(body: &mut Body) -> Result<()> {
    transform::split_traps(&body.units, &mut body.traps)
}
