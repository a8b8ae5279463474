//! One compiled method body: instruction stream plus trap table

use super::chain::UnitChain;
use super::trap::TrapChain;
use super::unit::{Local, UnitKind};

/// A compiled method body as the transform passes see it
#[derive(Default)]
pub struct Body {
    pub units: UnitChain,
    pub traps: TrapChain,
}

impl Body {
    pub fn new() -> Self {
        Self { units: UnitChain::new(), traps: TrapChain::new() }
    }

    /// Parameter locals in declaration order, read off the identity units
    /// at method entry.
    ///
    /// Parameters are zero-indexed, so ordering by the bound index is safe.
    pub fn parameter_locals(&self) -> Vec<Local> {
        let mut params: Vec<(usize, Local)> = Vec::new();
        for id in self.units.iter() {
            if let Some(UnitKind::Identity { local, param_index }) = self.units.kind(id) {
                params.push((*param_index, local.clone()));
            }
        }
        params.sort_by_key(|(index, _)| *index);
        params.into_iter().map(|(_, local)| local).collect()
    }
}
