//! Decision trees for guided regimen selection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One answer to a decision-tree question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeOption {
    pub text: String,
    /// Next node id
    #[serde(default)]
    pub next: Option<String>,
    /// Scenario key of the recommended regimen
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub criteria: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeNode {
    pub question: String,
    #[serde(default)]
    pub options: Vec<TreeOption>,
}

/// Outcome of answering a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionStep {
    Next(String),
    Treatment(String),
    /// Option leads nowhere.
    End,
}

/// Question nodes keyed by id, in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DecisionTree {
    pub nodes: IndexMap<String, TreeNode>,
}

impl DecisionTree {
    /// Entry node: `start` when present, otherwise the first node.
    pub fn entry(&self) -> Option<(&str, &TreeNode)> {
        self.nodes
            .get_key_value("start")
            .or_else(|| self.nodes.first())
            .map(|(id, node)| (id.as_str(), node))
    }

    pub fn node(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Follow an answer. `None` for an unknown node or option index.
    pub fn answer(&self, node_id: &str, option_index: usize) -> Option<DecisionStep> {
        let option = self.nodes.get(node_id)?.options.get(option_index)?;
        let step = match (&option.treatment, &option.next) {
            (Some(treatment), _) => DecisionStep::Treatment(treatment.clone()),
            (None, Some(next)) => DecisionStep::Next(next.clone()),
            (None, None) => DecisionStep::End,
        };
        Some(step)
    }
}
