/*!
 * Taint annotation over the scene call graph
 *
 * Every parameter of an analyzed method starts out sensitive. The pass
 * walks call edges looking for argument values that reach one of the
 * configured dangerous sink methods, directly or through further calls
 * inside the scene, and records the result as per-parameter compromised
 * flags on a [`TaintTag`] attached to the method. A parameter that is both
 * sensitive and compromised is reported unsafe.
 */

use std::collections::HashMap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ir::{Local, TaintTag, UnitKind, TAINT_TAG_NAME};
use crate::scene::{CallGraph, MethodId, Scene};

/// One parameter that reaches a dangerous sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeParam {
    /// Fully-qualified name of the declaring method
    pub method: String,
    /// Name of the parameter local
    pub param: String,
    /// Zero-based parameter index
    pub index: usize,
}

/// Result of one analysis run
#[derive(Debug, Default)]
pub struct TaintReport {
    pub unsafe_params: Vec<UnsafeParam>,
}

impl TaintReport {
    pub fn is_empty(&self) -> bool {
        self.unsafe_params.is_empty()
    }
}

/// Interprocedural taint annotation pass
pub struct TaintAnalysis {
    config: Config,
}

impl TaintAnalysis {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Analyze every method with a body, attach the resulting tags to the
    /// scene, and report unsafe parameters.
    pub fn run(&self, scene: &mut Scene) -> Result<TaintReport> {
        let call_graph = CallGraph::build(scene);
        let mut tags: HashMap<MethodId, TaintTag> = HashMap::new();

        let method_ids: Vec<MethodId> = scene.method_ids().collect();
        for &id in &method_ids {
            if scene.method(id).body.is_none() {
                continue;
            }
            log::debug!("taint entry point: {}", scene.method(id).sig.full_name());
            let params = self.entry_params(scene, id);
            let tag = tags.entry(id).or_insert_with(|| TaintTag::new(params.len()));
            tag.mark_all_sensitive();
            self.analyze_method(scene, &call_graph, &mut tags, id)?;
        }

        let report = self.collect_report(scene, &tags);
        self.attach_tags(scene, tags);
        Ok(report)
    }

    fn entry_params(&self, scene: &Scene, id: MethodId) -> Vec<Local> {
        match &scene.method(id).body {
            Some(body) => body.parameter_locals(),
            None => Vec::new(),
        }
    }

    /// Walk the out-edges of one method, at most once per method.
    fn analyze_method(
        &self,
        scene: &Scene,
        call_graph: &CallGraph,
        tags: &mut HashMap<MethodId, TaintTag>,
        id: MethodId,
    ) -> Result<()> {
        let method = scene.method(id);
        if method.sig.is_constructor() {
            return Ok(());
        }
        let Some(body) = &method.body else {
            return Ok(());
        };
        let params = body.parameter_locals();

        let tag = tags.entry(id).or_insert_with(|| TaintTag::new(params.len()));
        if tag.is_visited() {
            return Ok(());
        }
        tag.set_visited(true);

        for edge in call_graph.edges_out(id) {
            let Some(UnitKind::Invoke { callee, args }) = body.units.kind(edge.src_unit) else {
                continue;
            };

            if self.config.is_dangerous(&callee.full_name()) {
                // Arguments fed straight into a sink compromise the caller
                // parameters they name.
                let mut compromised = vec![false; params.len()];
                for arg in args {
                    if let Some(index) = find_param_index(&params, arg) {
                        compromised[index] = true;
                    }
                }
                log::debug!(
                    "dangerous call to {} in {}",
                    callee.full_name(),
                    method.sig.full_name()
                );
                merge_into(tags, id, &params, &compromised)?;
            } else if args.iter().any(|arg| find_param_index(&params, arg).is_some()) {
                let Some(callee_id) = edge.callee else {
                    continue;
                };
                // Analyze the callee first, then map its compromised
                // parameters back through the argument positions.
                self.analyze_method(scene, call_graph, tags, callee_id)?;
                let Some(callee_tag) = tags.get(&callee_id) else {
                    continue;
                };
                if callee_tag.param_count() != args.len() {
                    return Err(Error::malformed(format!(
                        "call to {} passes {} arguments but it declares {} parameters",
                        callee.full_name(),
                        args.len(),
                        callee_tag.param_count()
                    )));
                }
                let mut compromised = vec![false; params.len()];
                for (arg_index, arg) in args.iter().enumerate() {
                    if callee_tag.compromised()[arg_index] {
                        if let Some(param_index) = find_param_index(&params, arg) {
                            compromised[param_index] = true;
                        }
                    }
                }
                merge_into(tags, id, &params, &compromised)?;
            }
        }

        Ok(())
    }

    fn collect_report(&self, scene: &Scene, tags: &HashMap<MethodId, TaintTag>) -> TaintReport {
        let mut report = TaintReport::default();
        for id in scene.method_ids() {
            let Some(tag) = tags.get(&id) else { continue };
            let Some(body) = &scene.method(id).body else { continue };
            let params = body.parameter_locals();
            let full_name = scene.method(id).sig.full_name();
            for (index, param) in params.iter().enumerate() {
                if tag.sensitive()[index] && tag.compromised()[index] {
                    log::warn!(
                        "parameter {} of method {} is unsafe",
                        param.name,
                        full_name
                    );
                    report.unsafe_params.push(UnsafeParam {
                        method: full_name.clone(),
                        param: param.name.clone(),
                        index,
                    });
                }
            }
        }
        report
    }

    /// Replace any previous taint tag on each analyzed method
    fn attach_tags(&self, scene: &mut Scene, tags: HashMap<MethodId, TaintTag>) {
        for (id, tag) in tags {
            let container = &mut scene.method_mut(id).tags;
            container.remove_tag(TAINT_TAG_NAME);
            container.add_tag(Box::new(tag));
        }
    }
}

fn merge_into(
    tags: &mut HashMap<MethodId, TaintTag>,
    id: MethodId,
    params: &[Local],
    compromised: &[bool],
) -> Result<()> {
    tags.entry(id)
        .or_insert_with(|| TaintTag::new(params.len()))
        .merge_compromised(compromised)
}

/// Index of the parameter local an argument refers to, if any
fn find_param_index(params: &[Local], arg: &Local) -> Option<usize> {
    params.iter().position(|p| p.name == arg.name)
}
