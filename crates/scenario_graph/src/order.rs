//! Evaluation order produced by the builder.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use scenario_core::types::VariableDefinition;

/// Ordered view over a validated dependency graph.
///
/// `outputs()` is the sequence in which OUTPUT variables must be evaluated:
/// each one appears exactly once and after every variable it depends on.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOrder {
    pub(crate) inputs: Vec<VariableDefinition>,
    pub(crate) outputs: Vec<VariableDefinition>,
    pub(crate) levels: BTreeMap<String, usize>,
    /// Variable-to-variable edges, dependency names only.
    pub(crate) edges: BTreeMap<String, Vec<String>>,
    /// Dependency names that are not variables (parameters, typically).
    pub(crate) external: BTreeSet<String>,
}

impl EvaluationOrder {
    /// OUTPUT variables in evaluation order.
    pub fn outputs(&self) -> &[VariableDefinition] {
        &self.outputs
    }

    /// INPUT variables, sorted by `(display_order, name)`.
    pub fn inputs(&self) -> &[VariableDefinition] {
        &self.inputs
    }

    /// Number of OUTPUT variables.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// True when there is nothing to evaluate.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Level of a variable: 0 for INPUTs, `1 + max(dependency level)` for OUTPUTs.
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.levels.get(name).copied()
    }

    /// Highest level in the graph, 0 when only inputs exist.
    pub fn max_level(&self) -> usize {
        self.levels.values().copied().max().unwrap_or(0)
    }

    /// Variable names grouped by level, index 0 holding the inputs.
    ///
    /// Within a level, names follow evaluation order.
    pub fn levels(&self) -> Vec<Vec<&str>> {
        let mut grouped: Vec<Vec<&str>> = vec![Vec::new(); self.max_level() + 1];
        for var in self.inputs.iter().chain(self.outputs.iter()) {
            if let Some(level) = self.levels.get(&var.name) {
                grouped[*level].push(var.name.as_str());
            }
        }
        grouped
    }

    /// Direct variable dependencies of `name`. Parameters are not included.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every variable that depends on `name`, directly or transitively.
    pub fn dependents_of(&self, name: &str) -> BTreeSet<String> {
        let mut reverse: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (node, deps) in &self.edges {
            for dep in deps {
                reverse.entry(dep.as_str()).or_default().push(node.as_str());
            }
        }

        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for &next in reverse.get(current).into_iter().flatten() {
                if seen.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Dependency names that matched no variable definition.
    ///
    /// These are expected to be parameters; anything else surfaces at
    /// evaluation time as an unknown identifier.
    pub fn external_references(&self) -> &BTreeSet<String> {
        &self.external
    }
}
