//! Workflow graph driver
//!
//! The engine never owns the workflow. It talks to the DAG-refinement
//! driver through [`Refiner`]: adding jobs and edges, and asking how
//! transfers should be routed. [`WorkflowGraph`] is the petgraph-backed
//! driver used by the planner binary and by tests.

use crate::error::GraphError;
use indexmap::IndexMap;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use xfer_model::{JobClass, WorkflowNode};

/// Callbacks into the DAG-refinement driver
pub trait Refiner {
    /// Register a job
    ///
    /// # Errors
    /// Returns error if the driver rejects the job
    fn add_job(&mut self, job: WorkflowNode) -> Result<(), GraphError>;

    /// Add a `parent -> child` edge
    ///
    /// # Errors
    /// Returns error if the edge would break the partial order
    fn add_relation(
        &mut self,
        parent: &str,
        child: &str,
        site: &str,
        parent_is_transfer: bool,
    ) -> Result<(), GraphError>;

    /// Whether transfers of `class` for `site` run in third-party mode
    fn is_site_third_party(&self, site: &str, class: JobClass) -> bool;

    /// Whether third-party transfers of `class` for `site` run on `site`
    /// itself instead of the submit host
    fn run_tpt_on_remote_site(&self, site: &str, class: JobClass) -> bool;
}

/// Metadata carried on an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Site the relation was registered for
    pub site: String,
    /// Whether the parent is a transfer job
    pub parent_is_transfer: bool,
}

/// One edge, by job name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// Parent job
    pub parent: String,
    /// Child job
    pub child: String,
    /// Edge metadata
    #[serde(flatten)]
    pub relation: Relation,
}

/// Site set per job class; `*` matches every site
#[derive(Debug, Clone, Default)]
struct SiteSets(HashMap<JobClass, HashSet<String>>);

impl SiteSets {
    fn insert(&mut self, class: JobClass, site: &str) {
        self.0.entry(class).or_default().insert(site.to_string());
    }

    fn matches(&self, site: &str, class: JobClass) -> bool {
        self.0
            .get(&class)
            .is_some_and(|s| s.contains("*") || s.contains(site))
    }
}

/// In-memory acyclic workflow graph keyed by job name
///
/// Edges may name jobs that have not been added yet; such endpoints are
/// registered as placeholders and filled in by a later [`Refiner::add_job`].
#[derive(Debug, Default)]
pub struct WorkflowGraph {
    nodes: IndexMap<String, Option<WorkflowNode>>,
    edges: DiGraphMap<usize, Relation>,
    third_party: SiteSets,
    remote_tpt: SiteSets,
}

impl WorkflowGraph {
    /// Create an empty graph with no third-party sites
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a third-party site for `class`
    #[must_use]
    pub fn with_third_party_site(mut self, class: JobClass, site: &str) -> Self {
        self.third_party.insert(class, site);
        self
    }

    /// With a site whose third-party transfers of `class` run remotely
    #[must_use]
    pub fn with_remote_tpt_site(mut self, class: JobClass, site: &str) -> Self {
        self.remote_tpt.insert(class, site);
        self
    }

    fn index_of(&mut self, name: &str) -> usize {
        if let Some(idx) = self.nodes.get_index_of(name) {
            return idx;
        }
        let (idx, _) = self.nodes.insert_full(name.to_string(), None);
        self.edges.add_node(idx);
        idx
    }

    fn name_at(&self, idx: usize) -> &str {
        self.nodes
            .get_index(idx)
            .map_or("", |(name, _)| name.as_str())
    }

    /// Number of known jobs, placeholders included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// Whether a job with this name is known
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// The job registered under `name`, if it was added
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&WorkflowNode> {
        self.nodes.get(name).and_then(Option::as_ref)
    }

    /// Registered jobs in insertion order
    pub fn jobs(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values().filter_map(Option::as_ref)
    }

    /// Direct parents of `name`, sorted
    #[must_use]
    pub fn parents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct children of `name`, sorted
    #[must_use]
    pub fn children(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(idx) = self.nodes.get_index_of(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .edges
            .neighbors_directed(idx, dir)
            .map(|n| self.name_at(n))
            .collect();
        out.sort_unstable();
        out
    }

    /// Whether `parent -> child` exists
    #[must_use]
    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        match (self.nodes.get_index_of(parent), self.nodes.get_index_of(child)) {
            (Some(p), Some(c)) => self.edges.contains_edge(p, c),
            _ => false,
        }
    }

    /// All edges in insertion order
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.edges
            .all_edges()
            .map(|(p, c, relation)| Edge {
                parent: self.name_at(p).to_string(),
                child: self.name_at(c).to_string(),
                relation: relation.clone(),
            })
            .collect()
    }

    /// Job names in a topological order
    #[must_use]
    pub fn topological_order(&self) -> Vec<&str> {
        // Edges are checked for cycles on insert, so toposort cannot fail.
        toposort(&self.edges, None)
            .map(|order| order.into_iter().map(|i| self.name_at(i)).collect())
            .unwrap_or_default()
    }
}

impl Refiner for WorkflowGraph {
    fn add_job(&mut self, job: WorkflowNode) -> Result<(), GraphError> {
        let name = job.name().to_string();
        match self.nodes.get_mut(&name) {
            Some(Some(_)) => Err(GraphError::DuplicateJob(name)),
            Some(slot) => {
                *slot = Some(job);
                Ok(())
            }
            None => {
                let (idx, _) = self.nodes.insert_full(name, Some(job));
                self.edges.add_node(idx);
                Ok(())
            }
        }
    }

    fn add_relation(
        &mut self,
        parent: &str,
        child: &str,
        site: &str,
        parent_is_transfer: bool,
    ) -> Result<(), GraphError> {
        if parent == child {
            return Err(GraphError::SelfLoop(parent.to_string()));
        }
        let p = self.index_of(parent);
        let c = self.index_of(child);
        let previous = self.edges.add_edge(
            p,
            c,
            Relation {
                site: site.to_string(),
                parent_is_transfer,
            },
        );
        if is_cyclic_directed(&self.edges) {
            match previous {
                Some(old) => {
                    self.edges.add_edge(p, c, old);
                }
                None => {
                    self.edges.remove_edge(p, c);
                }
            }
            return Err(GraphError::CycleDetected {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        Ok(())
    }

    fn is_site_third_party(&self, site: &str, class: JobClass) -> bool {
        self.third_party.matches(site, class)
    }

    fn run_tpt_on_remote_site(&self, site: &str, class: JobClass) -> bool {
        self.remote_tpt.matches(site, class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xfer_model::ComputeJob;

    #[test]
    fn relation_registers_placeholders() {
        let mut g = WorkflowGraph::new();
        g.add_relation("tx_a", "a", "site1", true).unwrap();
        assert!(g.contains("tx_a"));
        assert!(g.node("tx_a").is_none());

        g.add_job(ComputeJob::new("a", "site1").into()).unwrap();
        assert_eq!(g.node("a").map(WorkflowNode::site), Some("site1"));
        assert_eq!(g.parents("a"), vec!["tx_a"]);
        assert_eq!(g.children("tx_a"), vec!["a"]);
    }

    #[test]
    fn duplicate_job_is_rejected() {
        let mut g = WorkflowGraph::new();
        g.add_job(ComputeJob::new("a", "site1").into()).unwrap();
        assert_eq!(
            g.add_job(ComputeJob::new("a", "site2").into()),
            Err(GraphError::DuplicateJob("a".to_string()))
        );
    }

    #[test]
    fn rejects_self_loop_and_cycle() {
        let mut g = WorkflowGraph::new();
        assert!(matches!(g.add_relation("a", "a", "s", false), Err(GraphError::SelfLoop(_))));

        g.add_relation("a", "b", "s", false).unwrap();
        g.add_relation("b", "c", "s", false).unwrap();
        assert!(matches!(
            g.add_relation("c", "a", "s", false),
            Err(GraphError::CycleDetected { .. })
        ));
        assert!(!g.has_edge("c", "a"));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.topological_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn third_party_star_matches_every_site() {
        let g = WorkflowGraph::new()
            .with_third_party_site(JobClass::StageIn, "*")
            .with_third_party_site(JobClass::StageOut, "site1")
            .with_remote_tpt_site(JobClass::StageOut, "site1");
        assert!(g.is_site_third_party("anything", JobClass::StageIn));
        assert!(g.is_site_third_party("site1", JobClass::StageOut));
        assert!(!g.is_site_third_party("site2", JobClass::StageOut));
        assert!(!g.is_site_third_party("site1", JobClass::InterSite));
        assert!(g.run_tpt_on_remote_site("site1", JobClass::StageOut));
        assert!(!g.run_tpt_on_remote_site("site1", JobClass::StageIn));
    }
}
