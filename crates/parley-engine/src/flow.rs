//! Node-based scripted dialogues.
//!
//! A flow is a graph of canned messages joined by input triggers. While
//! a flow is active it outranks free-form understanding; an input that
//! matches no trigger falls back out of the script for that turn.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use parley_core::{CoreError, Result};

/// How an input matches a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Trigger {
    /// Whole trimmed input equals the token (case-insensitive).
    Exact(String),
    /// Input contains the substring (case-insensitive).
    Contains(String),
    /// Matches anything.
    Wildcard,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transition {
    pub trigger: Trigger,
    pub to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowNode {
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub start: String,
    pub nodes: HashMap<String, FlowNode>,
}

impl Flow {
    /// Parses a flow definition from JSON. Graph validity is still
    /// checked by [`FlowEngine::new`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Flow(e.to_string()))
    }
}

/// The canned output of entering a node.
#[derive(Clone, Debug)]
pub struct FlowStep {
    pub node: String,
    pub message: String,
    pub suggestions: Vec<String>,
    /// True when the node has no outgoing transitions.
    pub is_terminal: bool,
}

/// Validated, read-only registry of flows.
pub struct FlowEngine {
    flows: HashMap<String, Flow>,
}

impl FlowEngine {
    /// Validates at construction: the start node and every transition
    /// target must exist.
    pub fn new(flows: Vec<Flow>) -> Result<Self> {
        let mut registry = HashMap::new();
        for flow in flows {
            if !flow.nodes.contains_key(&flow.start) {
                return Err(CoreError::Flow(format!(
                    "flow '{}' starts at unknown node '{}'",
                    flow.id, flow.start
                )));
            }
            for (node_id, node) in &flow.nodes {
                for transition in &node.transitions {
                    if !flow.nodes.contains_key(&transition.to) {
                        return Err(CoreError::Flow(format!(
                            "flow '{}' node '{}' transitions to unknown node '{}'",
                            flow.id, node_id, transition.to
                        )));
                    }
                }
            }
            registry.insert(flow.id.clone(), flow);
        }
        Ok(Self { flows: registry })
    }

    pub fn has_flow(&self, flow_id: &str) -> bool {
        self.flows.contains_key(flow_id)
    }

    /// Enters a flow at its start node.
    pub fn start(&self, flow_id: &str) -> Option<FlowStep> {
        let flow = self.flows.get(flow_id)?;
        self.step_for(flow, &flow.start)
    }

    /// Advances from a node on user input. Exact triggers are checked
    /// before contains, and wildcard only fires when nothing else did.
    /// `None` when no trigger matches or the node is terminal.
    pub fn advance(&self, flow_id: &str, node_id: &str, input: &str) -> Option<FlowStep> {
        let flow = self.flows.get(flow_id)?;
        let node = flow.nodes.get(node_id)?;
        let input = input.trim().to_lowercase();

        let target = node
            .transitions
            .iter()
            .find(|t| matches!(&t.trigger, Trigger::Exact(token) if token.to_lowercase() == input))
            .or_else(|| {
                node.transitions.iter().find(
                    |t| matches!(&t.trigger, Trigger::Contains(s) if input.contains(&s.to_lowercase())),
                )
            })
            .or_else(|| {
                node.transitions
                    .iter()
                    .find(|t| t.trigger == Trigger::Wildcard)
            })?;

        self.step_for(flow, &target.to)
    }

    fn step_for(&self, flow: &Flow, node_id: &str) -> Option<FlowStep> {
        let node = flow.nodes.get(node_id)?;
        Some(FlowStep {
            node: node_id.to_string(),
            message: node.message.clone(),
            suggestions: node.suggestions.clone(),
            is_terminal: node.transitions.is_empty(),
        })
    }
}

/// The built-in guided tour offered from the menu.
pub fn guided_tour() -> Flow {
    let mut nodes = HashMap::new();
    nodes.insert(
        "intro".to_string(),
        FlowNode {
            message: "Welcome to the tour! Want to start with the work history or the skill set?"
                .to_string(),
            suggestions: vec!["work history".to_string(), "skill set".to_string()],
            transitions: vec![
                Transition {
                    trigger: Trigger::Contains("work".to_string()),
                    to: "work".to_string(),
                },
                Transition {
                    trigger: Trigger::Contains("skill".to_string()),
                    to: "skills".to_string(),
                },
                Transition {
                    trigger: Trigger::Wildcard,
                    to: "work".to_string(),
                },
            ],
        },
    );
    nodes.insert(
        "work".to_string(),
        FlowNode {
            message: "The work history spans several roles — ask about any company for details. Want the skills next?".to_string(),
            suggestions: vec!["yes".to_string(), "done".to_string()],
            transitions: vec![
                Transition {
                    trigger: Trigger::Exact("yes".to_string()),
                    to: "skills".to_string(),
                },
                Transition {
                    trigger: Trigger::Wildcard,
                    to: "done".to_string(),
                },
            ],
        },
    );
    nodes.insert(
        "skills".to_string(),
        FlowNode {
            message: "The skill set covers several categories — ask about any one of them. That's the tour!".to_string(),
            suggestions: vec!["done".to_string()],
            transitions: vec![Transition {
                trigger: Trigger::Wildcard,
                to: "done".to_string(),
            }],
        },
    );
    nodes.insert(
        "done".to_string(),
        FlowNode {
            message: "Tour finished — ask me anything else you'd like to know.".to_string(),
            suggestions: vec!["experience".to_string(), "contact".to_string()],
            transitions: vec![],
        },
    );
    Flow {
        id: "tour".to_string(),
        start: "intro".to_string(),
        nodes,
    }
}
