use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};
use crate::error::PlanError;

/// One curriculum concept. Immutable once the graph is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptNode {
    pub id: String,
    pub phase: u8,
    #[serde(default)]
    pub dependency_ids: BTreeSet<String>,
    pub title: String,
}

#[derive(Deserialize)]
struct CurriculumFile {
    #[serde(default)]
    concepts: Vec<ConceptNode>,
}

/// Read-only catalog of concepts keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    nodes: BTreeMap<String, ConceptNode>,
}

impl ConceptGraph {
    /// Build a graph, rejecting out-of-range phases, duplicate ids and
    /// prerequisites that point outside the graph.
    pub fn from_nodes(nodes: Vec<ConceptNode>) -> Result<Self, PlanError> {
        let mut map = BTreeMap::new();
        for node in nodes {
            if !(1..=4).contains(&node.phase) {
                return Err(PlanError::validation(format!(
                    "concept '{}' has phase {} outside [1, 4]",
                    node.id, node.phase
                )));
            }
            if map.contains_key(&node.id) {
                return Err(PlanError::validation(format!("duplicate concept id '{}'", node.id)));
            }
            map.insert(node.id.clone(), node);
        }

        for node in map.values() {
            if let Some(missing) = node.dependency_ids.iter().find(|d| !map.contains_key(*d)) {
                return Err(PlanError::validation(format!(
                    "concept '{}' depends on unknown concept '{}'",
                    node.id, missing
                )));
            }
        }

        Ok(ConceptGraph { nodes: map })
    }

    /// Build from a TOML document with a `[[concepts]]` array.
    pub fn from_toml_str(content: &str) -> Result<Self, PlanError> {
        let file: CurriculumFile = toml::from_str(content)?;
        Self::from_nodes(file.concepts)
    }

    pub fn get(&self, id: &str) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Concepts of a phase in id order.
    pub fn in_phase(&self, phase: u8) -> Vec<&ConceptNode> {
        self.nodes.values().filter(|n| n.phase == phase).collect()
    }

    pub fn prerequisites(&self, id: &str) -> Vec<&ConceptNode> {
        self.nodes
            .get(id)
            .map(|n| n.dependency_ids.iter().filter_map(|d| self.nodes.get(d)).collect())
            .unwrap_or_default()
    }

    /// Titles of a concept's prerequisites, used as content subtopics.
    pub fn prerequisite_titles(&self, id: &str) -> Vec<String> {
        self.prerequisites(id).into_iter().map(|n| n.title.clone()).collect()
    }

    /// Pick the concept a learner should work on within a phase.
    ///
    /// `mastery_of` returns the known mastery score of a concept. The first
    /// concept (id order) whose prerequisites are all at least `unlock_at` and
    /// which is itself below `mastered_at` wins; otherwise the first concept
    /// of the phase.
    pub fn next_in_phase<F>(&self, phase: u8, mastery_of: F) -> Option<&ConceptNode>
    where
        F: Fn(&str) -> Option<u8>,
    {
        const UNLOCK_AT: u8 = 50;
        const MASTERED_AT: u8 = 75;

        let candidates = self.in_phase(phase);
        candidates
            .iter()
            .find(|node| {
                let unlocked = node
                    .dependency_ids
                    .iter()
                    .all(|dep| mastery_of(dep).unwrap_or(0) >= UNLOCK_AT);
                let mastered = mastery_of(&node.id).unwrap_or(0) >= MASTERED_AT;
                unlocked && !mastered
            })
            .or_else(|| candidates.first())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, phase: u8, deps: &[&str]) -> ConceptNode {
        ConceptNode {
            id: id.to_string(),
            phase,
            dependency_ids: deps.iter().map(|d| d.to_string()).collect(),
            title: id.replace('_', " "),
        }
    }

    fn graph() -> ConceptGraph {
        ConceptGraph::from_nodes(vec![
            node("a_vars", 1, &[]),
            node("b_loops", 1, &["a_vars"]),
            node("c_funcs", 1, &["b_loops"]),
            node("d_traits", 2, &["c_funcs"]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_dangling_prerequisite() {
        let err = ConceptGraph::from_nodes(vec![node("x", 1, &["ghost"])]).unwrap_err();
        assert!(err.message.contains("ghost"));
    }

    #[test]
    fn rejects_phase_out_of_range() {
        assert!(ConceptGraph::from_nodes(vec![node("x", 5, &[])]).is_err());
    }

    #[test]
    fn next_in_phase_skips_mastered_and_locked() {
        let g = graph();
        let scores = |id: &str| match id {
            "a_vars" => Some(90),
            "b_loops" => Some(40),
            _ => None,
        };
        assert_eq!(g.next_in_phase(1, scores).unwrap().id, "b_loops");

        // nothing unlocked and unmastered: fall back to the first concept
        let all_mastered = |_: &str| Some(100);
        assert_eq!(g.next_in_phase(1, all_mastered).unwrap().id, "a_vars");
        assert!(g.next_in_phase(3, all_mastered).is_none());
    }

    #[test]
    fn loads_from_toml() {
        let g = ConceptGraph::from_toml_str(
            r#"
            [[concepts]]
            id = "ownership"
            phase = 1
            title = "Ownership"

            [[concepts]]
            id = "lifetimes"
            phase = 2
            dependencyIds = ["ownership"]
            title = "Lifetimes"
            "#,
        )
        .unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.prerequisite_titles("lifetimes"), vec!["Ownership".to_string()]);
    }
}
