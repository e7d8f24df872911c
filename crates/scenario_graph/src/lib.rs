//! # scenario_graph: Variable Dependency Graph
//!
//! Turns a set of variable definitions into an evaluation order in which
//! every OUTPUT variable comes after everything it depends on.
//!
//! ## Levels
//!
//! ```text
//! level 0   INPUT_OMZET   INPUT_SKU   INPUT_VOORRAAD_WEKEN
//!              │             │              │
//! level 1   OUTPUT_OMZET_PERCENTAGE  OUTPUT_SKU_GROWTH  OUTPUT_VOORRAAD_WEKEN_PERCENTAGE
//!                         └──────────────┼──────────────┘
//! level 2                     OUTPUT_VOORRAAD_PALLETS
//! ```
//!
//! INPUT variables sit at level 0. An OUTPUT sits one level above its
//! deepest variable dependency, declared or named in its formula. Parameters
//! are constants available at every level and never influence ordering.
//!
//! ## Cycles
//!
//! A cycle is always an error: [`GraphError::CircularDependency`] carries
//! the full path, first member repeated at the end.
//!
//! ```rust
//! use scenario_core::types::VariableDefinition;
//! use scenario_graph::{build_evaluation_order, GraphError};
//!
//! let vars = vec![
//!     VariableDefinition::output("A", "B + 1", ["B"]),
//!     VariableDefinition::output("B", "A + 1", ["A"]),
//! ];
//! match build_evaluation_order(&vars) {
//!     Err(GraphError::CircularDependency { cycle }) => {
//!         assert_eq!(cycle, vec!["A", "B", "A"]);
//!     }
//!     other => panic!("expected a cycle, got {:?}", other),
//! }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

mod builder;
mod error;
mod order;

pub use builder::build_evaluation_order;
pub use error::GraphError;
pub use order::EvaluationOrder;
