//! Stage dependency graph for an execution.
//!
//! Design:
//! - Forward edges: stage -> stages it depends on (upstream)
//! - Reverse edges: stage -> stages that depend on it (downstream)
//! - Invariant: edges and reverse_edges are kept in sync
//!
//! The graph is rebuilt from `Stage::upstream` whenever a handler needs it;
//! the execution stays the single source of truth.

use std::collections::{HashMap, HashSet};

use super::execution::Execution;
use super::ids::StageId;
use super::status::ExecutionStatus;

pub struct StageGraph {
    /// Declaration order, so fan-out is deterministic.
    order: Vec<StageId>,

    /// Forward edges: stage -> upstream stages.
    edges: HashMap<StageId, HashSet<StageId>>,

    /// Reverse edges: stage -> downstream stages.
    reverse_edges: HashMap<StageId, HashSet<StageId>>,
}

impl StageGraph {
    pub fn from_execution(execution: &Execution) -> Self {
        let mut graph = Self {
            order: Vec::with_capacity(execution.stages.len()),
            edges: HashMap::new(),
            reverse_edges: HashMap::new(),
        };
        for stage in &execution.stages {
            graph.order.push(stage.id);
            for &upstream in &stage.upstream {
                graph.add_dependency(stage.id, upstream);
            }
        }
        graph
    }

    /// `stage` waits for `depends_on`.
    fn add_dependency(&mut self, stage: StageId, depends_on: StageId) {
        self.edges.entry(stage).or_default().insert(depends_on);
        self.reverse_edges
            .entry(depends_on)
            .or_default()
            .insert(stage);
    }

    /// Stages with no upstream dependency.
    pub fn initial_stages(&self) -> Vec<StageId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.upstream_of(*id).is_empty())
            .collect()
    }

    pub fn upstream_of(&self, stage: StageId) -> Vec<StageId> {
        self.sorted(self.edges.get(&stage))
    }

    /// All stages waiting on `stage`, even if they also wait on others.
    pub fn downstream_of(&self, stage: StageId) -> Vec<StageId> {
        self.sorted(self.reverse_edges.get(&stage))
    }

    /// Downstream stages of `completed` whose upstream stages have all succeeded.
    pub fn ready_after(&self, completed: StageId, execution: &Execution) -> Vec<StageId> {
        self.downstream_of(completed)
            .into_iter()
            .filter(|&candidate| {
                self.upstream_of(candidate).iter().all(|upstream| {
                    execution
                        .stage(*upstream)
                        .is_some_and(|s| s.status == ExecutionStatus::Succeeded)
                })
            })
            .collect()
    }

    fn sorted(&self, set: Option<&HashSet<StageId>>) -> Vec<StageId> {
        let Some(set) = set else {
            return Vec::new();
        };
        self.order
            .iter()
            .copied()
            .filter(|id| set.contains(id))
            .collect()
    }
}
