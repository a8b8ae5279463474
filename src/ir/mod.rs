//! Method body intermediate representation
//!
//! This module holds the in-memory shape of one compiled method body as the
//! transform passes see it:
//!
//! - **unit**: single instructions ("units") and the statement shapes the
//!   passes inspect
//! - **chain**: the ordered instruction stream with a stable successor
//!   relation
//! - **trap**: exception-handler entries and the ordered trap table
//! - **tags**: attribute tags attachable to methods
//! - **body**: one method body tying the above together

pub mod body;
pub mod chain;
pub mod tags;
pub mod trap;
pub mod unit;

pub use body::Body;
pub use chain::UnitChain;
pub use tags::{Tag, TagContainer, TaintTag, TAINT_TAG_NAME};
pub use trap::{Trap, TrapChain, TrapId};
pub use unit::{Local, MethodSig, UnitId, UnitKind};
