//! Evaluation order construction.
//!
//! Depth-first search with three colours. A node met again while still
//! in progress closes a cycle; the current DFS path from that node onward is
//! the cycle reported to the caller.
//!
//! Edges come from the declared `dependencies` plus every variable the
//! formula text references, so an undeclared reference still orders and
//! cycles like a declared one.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use scenario_core::types::VariableDefinition;
use scenario_formula::parse;

use crate::error::GraphError;
use crate::order::EvaluationOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Dfs<'a> {
    variables: &'a [VariableDefinition],
    deps: Vec<Vec<usize>>,
    marks: Vec<Mark>,
    levels: Vec<usize>,
    path: Vec<usize>,
}

impl<'a> Dfs<'a> {
    fn visit(&mut self, node: usize) -> Result<usize, GraphError> {
        match self.marks[node] {
            Mark::Done => return Ok(self.levels[node]),
            Mark::InProgress => return Err(self.cycle_from(node)),
            Mark::Unvisited => {}
        }

        if self.variables[node].is_input() {
            self.marks[node] = Mark::Done;
            self.levels[node] = 0;
            return Ok(0);
        }

        self.marks[node] = Mark::InProgress;
        self.path.push(node);

        let mut level = 1;
        for i in 0..self.deps[node].len() {
            let child = self.deps[node][i];
            level = level.max(self.visit(child)? + 1);
        }

        self.path.pop();
        self.marks[node] = Mark::Done;
        self.levels[node] = level;
        Ok(level)
    }

    fn cycle_from(&self, node: usize) -> GraphError {
        let start = self.path.iter().position(|&n| n == node).unwrap_or(0);
        let mut cycle: Vec<String> = self.path[start..]
            .iter()
            .map(|&n| self.variables[n].name.clone())
            .collect();
        cycle.push(self.variables[node].name.clone());
        GraphError::CircularDependency { cycle }
    }
}

/// Builds the evaluation order for a set of variable definitions.
///
/// INPUT variables are level 0 and their (invalid) dependencies are not
/// followed. An OUTPUT depends on its declared variable dependencies and on
/// any variable its formula names; a formula that does not parse contributes
/// no edges and fails later, at evaluation. Declared dependencies naming no
/// variable are treated as parameters and recorded in
/// [`EvaluationOrder::external_references`]. OUTPUTs are returned sorted by
/// `(level, display_order, name)`.
///
/// # Errors
///
/// - [`GraphError::DuplicateVariable`] when two definitions share a name.
/// - [`GraphError::CircularDependency`] when the dependencies form a cycle.
pub fn build_evaluation_order(
    variables: &[VariableDefinition],
) -> Result<EvaluationOrder, GraphError> {
    let mut index = HashMap::with_capacity(variables.len());
    for (i, var) in variables.iter().enumerate() {
        if index.insert(var.name.as_str(), i).is_some() {
            return Err(GraphError::DuplicateVariable(var.name.clone()));
        }
    }

    // Visit roots in a fixed order so cycle paths are reproducible.
    let mut roots: Vec<usize> = (0..variables.len()).collect();
    roots.sort_by(|&a, &b| sort_key(&variables[a]).cmp(&sort_key(&variables[b])));

    let deps: Vec<Vec<usize>> = variables
        .iter()
        .map(|var| variable_dependencies(var, &index))
        .collect();

    let mut dfs = Dfs {
        variables,
        deps,
        marks: vec![Mark::Unvisited; variables.len()],
        levels: vec![0; variables.len()],
        path: Vec::new(),
    };
    for &root in &roots {
        dfs.visit(root)?;
    }

    let mut levels = BTreeMap::new();
    let mut edges = BTreeMap::new();
    let mut external = BTreeSet::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for &i in &roots {
        let var = &variables[i];
        levels.insert(var.name.clone(), dfs.levels[i]);
        if var.is_input() {
            inputs.push(var.clone());
            continue;
        }
        for dep in &var.dependencies {
            if !index.contains_key(dep.as_str()) {
                external.insert(dep.clone());
            }
        }
        let deps = dfs.deps[i]
            .iter()
            .map(|&d| variables[d].name.clone())
            .collect();
        edges.insert(var.name.clone(), deps);
        outputs.push((dfs.levels[i], var.clone()));
    }

    outputs.sort_by(|(la, a), (lb, b)| (la, sort_key(a)).cmp(&(lb, sort_key(b))));

    Ok(EvaluationOrder {
        inputs,
        outputs: outputs.into_iter().map(|(_, var)| var).collect(),
        levels,
        edges,
        external,
    })
}

/// Variables an OUTPUT reads: declared ones first, then undeclared formula
/// references in name order. INPUTs read nothing.
fn variable_dependencies(var: &VariableDefinition, index: &HashMap<&str, usize>) -> Vec<usize> {
    let mut deps: Vec<usize> = Vec::new();
    if var.is_input() {
        return deps;
    }
    let mut add = |name: &str| {
        if let Some(&i) = index.get(name) {
            if !deps.contains(&i) {
                deps.push(i);
            }
        }
    };
    for dep in &var.dependencies {
        add(dep.as_str());
    }
    if let Some(expr) = var.formula.as_deref().and_then(|text| parse(text).ok()) {
        for name in expr.identifiers() {
            add(name);
        }
    }
    deps
}

fn sort_key(var: &VariableDefinition) -> (i32, &str) {
    (var.display_order, var.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(order: &EvaluationOrder) -> Vec<&str> {
        order.outputs().iter().map(|v| v.name.as_str()).collect()
    }

    fn supply_chain() -> Vec<VariableDefinition> {
        vec![
            VariableDefinition::output(
                "OUTPUT_VOORRAAD_PALLETS",
                "PARAM_BASELINE_VOORRAAD * (OUTPUT_OMZET_PERCENTAGE/100) * (OUTPUT_SKU_GROWTH/100) * (OUTPUT_VOORRAAD_WEKEN_PERCENTAGE/100)",
                [
                    "PARAM_BASELINE_VOORRAAD",
                    "OUTPUT_OMZET_PERCENTAGE",
                    "OUTPUT_SKU_GROWTH",
                    "OUTPUT_VOORRAAD_WEKEN_PERCENTAGE",
                ],
            ),
            VariableDefinition::input("INPUT_OMZET"),
            VariableDefinition::input("INPUT_SKU"),
            VariableDefinition::input("INPUT_VOORRAAD_WEKEN"),
            VariableDefinition::output(
                "OUTPUT_OMZET_PERCENTAGE",
                "(INPUT_OMZET / PARAM_BASELINE_OMZET) * 100",
                ["INPUT_OMZET", "PARAM_BASELINE_OMZET"],
            ),
            VariableDefinition::output(
                "OUTPUT_SKU_GROWTH",
                "(INPUT_SKU / PARAM_BASELINE_SKU) * 100",
                ["INPUT_SKU"],
            ),
            VariableDefinition::output(
                "OUTPUT_VOORRAAD_WEKEN_PERCENTAGE",
                "(INPUT_VOORRAAD_WEKEN / PARAM_BASELINE_WEKEN) * 100",
                ["INPUT_VOORRAAD_WEKEN"],
            ),
        ]
    }

    #[test]
    fn test_supply_chain_order() {
        let order = build_evaluation_order(&supply_chain()).unwrap();
        assert_eq!(
            names(&order),
            vec![
                "OUTPUT_OMZET_PERCENTAGE",
                "OUTPUT_SKU_GROWTH",
                "OUTPUT_VOORRAAD_WEKEN_PERCENTAGE",
                "OUTPUT_VOORRAAD_PALLETS",
            ]
        );
        assert_eq!(order.level_of("INPUT_OMZET"), Some(0));
        assert_eq!(order.level_of("OUTPUT_SKU_GROWTH"), Some(1));
        assert_eq!(order.level_of("OUTPUT_VOORRAAD_PALLETS"), Some(2));
        assert_eq!(order.level_of("PARAM_BASELINE_VOORRAAD"), None);
        assert_eq!(order.max_level(), 2);
    }

    #[test]
    fn test_parameters_are_external() {
        let order = build_evaluation_order(&supply_chain()).unwrap();
        let external: Vec<&str> = order
            .external_references()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(
            external,
            vec!["PARAM_BASELINE_OMZET", "PARAM_BASELINE_VOORRAAD"]
        );
        assert_eq!(
            order.dependencies_of("OUTPUT_OMZET_PERCENTAGE"),
            &["INPUT_OMZET".to_string()]
        );
    }

    #[test]
    fn test_levels_grouping() {
        let order = build_evaluation_order(&supply_chain()).unwrap();
        let levels = order.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(
            levels[0],
            vec!["INPUT_OMZET", "INPUT_SKU", "INPUT_VOORRAAD_WEKEN"]
        );
        assert_eq!(levels[1].len(), 3);
        assert_eq!(levels[2], vec!["OUTPUT_VOORRAAD_PALLETS"]);
    }

    #[test]
    fn test_dependents_are_transitive() {
        let order = build_evaluation_order(&supply_chain()).unwrap();
        let downstream = order.dependents_of("INPUT_OMZET");
        let expected: BTreeSet<String> = ["OUTPUT_OMZET_PERCENTAGE", "OUTPUT_VOORRAAD_PALLETS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(downstream, expected);
        assert!(order.dependents_of("OUTPUT_VOORRAAD_PALLETS").is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let vars = vec![
            VariableDefinition::output("A", "B + 1", ["B"]),
            VariableDefinition::output("B", "A + 1", ["A"]),
        ];
        let err = build_evaluation_order(&vars).unwrap_err();
        assert_eq!(
            err,
            GraphError::CircularDependency {
                cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
            }
        );
    }

    #[test]
    fn test_self_reference_cycle() {
        let vars = vec![VariableDefinition::output("A", "A * 2", ["A"])];
        let err = build_evaluation_order(&vars).unwrap_err();
        assert_eq!(err.cycle_members(), &["A".to_string()]);
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("A", "IN + B", ["IN", "B"]),
            VariableDefinition::output("B", "C", ["C"]),
            VariableDefinition::output("C", "B", ["B"]),
        ];
        match build_evaluation_order(&vars) {
            Err(GraphError::CircularDependency { cycle }) => {
                assert_eq!(cycle, vec!["B", "C", "B"]);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_formula_reference_orders_after_target() {
        let vars = vec![
            VariableDefinition::input("IN"),
            // Sorts first by name but reads Z_OUT without declaring it.
            VariableDefinition::output("A_USES_Z", "Z_OUT * 2", ["IN"]),
            VariableDefinition::output("Z_OUT", "IN + 1", ["IN"]),
        ];
        let order = build_evaluation_order(&vars).unwrap();
        assert_eq!(names(&order), vec!["Z_OUT", "A_USES_Z"]);
        assert_eq!(order.level_of("A_USES_Z"), Some(2));
        assert_eq!(
            order.dependencies_of("A_USES_Z"),
            &["IN".to_string(), "Z_OUT".to_string()]
        );
        assert!(order.external_references().is_empty());
    }

    #[test]
    fn test_undeclared_formula_reference_closes_cycle() {
        let vars = vec![
            VariableDefinition::output("A", "B + 1", Vec::<String>::new()),
            VariableDefinition::output("B", "A + 1", ["A"]),
        ];
        assert_eq!(
            build_evaluation_order(&vars).unwrap_err().cycle_members(),
            &["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn test_unparsable_formula_keeps_declared_edges() {
        let vars = vec![
            VariableDefinition::input("IN"),
            VariableDefinition::output("BROKEN", "IN +", ["IN"]),
        ];
        let order = build_evaluation_order(&vars).unwrap();
        assert_eq!(order.dependencies_of("BROKEN"), &["IN".to_string()]);
        assert_eq!(order.level_of("BROKEN"), Some(1));
    }

    #[test]
    fn test_duplicate_name() {
        let vars = vec![
            VariableDefinition::input("INPUT_OMZET"),
            VariableDefinition::input("INPUT_OMZET"),
        ];
        assert_eq!(
            build_evaluation_order(&vars).unwrap_err(),
            GraphError::DuplicateVariable("INPUT_OMZET".to_string())
        );
    }

    #[test]
    fn test_display_order_breaks_ties() {
        let vars = vec![
            VariableDefinition::output("A", "1", Vec::<String>::new()).with_display_order(2),
            VariableDefinition::output("B", "2", Vec::<String>::new()).with_display_order(1),
            VariableDefinition::output("C", "3", Vec::<String>::new()).with_display_order(1),
        ];
        let order = build_evaluation_order(&vars).unwrap();
        assert_eq!(names(&order), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_input_dependencies_ignored() {
        let mut input = VariableDefinition::input("IN");
        input.dependencies.push("OUT".to_string());
        let vars = vec![input, VariableDefinition::output("OUT", "IN", ["IN"])];
        let order = build_evaluation_order(&vars).unwrap();
        assert_eq!(names(&order), vec!["OUT"]);
        assert_eq!(order.level_of("IN"), Some(0));
    }

    #[test]
    fn test_empty_input() {
        let order = build_evaluation_order(&[]).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.levels(), vec![Vec::<&str>::new()]);
    }
}
