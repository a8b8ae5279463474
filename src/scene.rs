/*!
 * Scene - the set of methods an interprocedural pass works over
 *
 * The scene and its call graph are plain values handed to passes as
 * explicit arguments; there is no process-wide current scene.
 */

use crate::ir::tags::TagContainer;
use crate::ir::unit::{MethodSig, UnitId, UnitKind};
use crate::ir::Body;

/// Stable identity of a method inside a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(usize);

/// One method of the scene
pub struct Method {
    pub sig: MethodSig,
    /// Methods without a body (externals, natives) carry `None`
    pub body: Option<Body>,
    pub tags: TagContainer,
}

/// The methods of one program under analysis
#[derive(Default)]
pub struct Scene {
    methods: Vec<Method>,
}

impl Scene {
    pub fn new() -> Self {
        Self { methods: Vec::new() }
    }

    pub fn add_method(&mut self, sig: MethodSig, body: Option<Body>) -> MethodId {
        let id = MethodId(self.methods.len());
        self.methods.push(Method { sig, body, tags: TagContainer::new() });
        id
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.0]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.methods[id.0]
    }

    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> {
        (0..self.methods.len()).map(MethodId)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Resolve a fully-qualified name to a scene method
    pub fn find_method(&self, full_name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .position(|m| m.sig.full_name() == full_name)
            .map(MethodId)
    }
}

/// A call edge out of a method
#[derive(Debug, Clone)]
pub struct CallEdge {
    /// Call-site unit inside the caller's body
    pub src_unit: UnitId,
    /// Signature at the call site
    pub callee_sig: MethodSig,
    /// Callee resolved within the scene; `None` for external targets
    pub callee: Option<MethodId>,
}

/// Out-edges per method, built from the invoke units of every body
pub struct CallGraph {
    edges: Vec<Vec<CallEdge>>,
}

impl CallGraph {
    /// Scan every body in the scene for call sites
    pub fn build(scene: &Scene) -> Self {
        let mut edges = vec![Vec::new(); scene.len()];
        for id in scene.method_ids() {
            let method = scene.method(id);
            let Some(body) = &method.body else { continue };
            for unit in body.units.iter() {
                if let Some(UnitKind::Invoke { callee, .. }) = body.units.kind(unit) {
                    edges[id.0].push(CallEdge {
                        src_unit: unit,
                        callee_sig: callee.clone(),
                        callee: scene.find_method(&callee.full_name()),
                    });
                }
            }
        }
        log::debug!("call graph built: {} methods", edges.len());
        Self { edges }
    }

    /// Call edges leaving the given method, in body order
    pub fn edges_out(&self, id: MethodId) -> &[CallEdge] {
        &self.edges[id.0]
    }
}
