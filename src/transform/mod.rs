//! Transformation passes over method bodies
//!
//! - **trap_splitter**: rewrites a body's trap table so that no two ranges
//!   overlap while preserving first-match dispatch
//! - **taint**: interprocedural taint annotation over the scene call graph
//!
//! Body-local passes implement [`BodyTransform`] and receive their inputs
//! as explicit arguments; there is no shared transform state.

pub mod taint;
pub mod trap_splitter;

pub use taint::{TaintAnalysis, TaintReport, UnsafeParam};
pub use trap_splitter::{split_traps, TrapSplitter};

use crate::error::Result;
use crate::ir::Body;

/// A transformation applied to one method body at a time
pub trait BodyTransform {
    /// Pass name used in logs
    fn name(&self) -> &'static str;

    /// Rewrite the body in place
    fn apply(&self, body: &mut Body) -> Result<()>;
}

/// Apply a list of body passes in order, stopping at the first failure
pub fn run_passes(body: &mut Body, passes: &[&dyn BodyTransform]) -> Result<()> {
    for pass in passes {
        log::debug!("running body pass: {}", pass.name());
        pass.apply(body)?;
    }
    Ok(())
}
