// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Manifest Tree
// ─────────────────────────────────────────────────────────────────────
//! Schema-agnostic view of a manifest store.
//!
//! Manifest stores from different generators disagree on field names, so
//! Layer A never looks at keys. The store is rebuilt as a tagged tree
//! (`Map | Sequence | Scalar`) and every text leaf is collected.
//!
//! Both the build and the flatten walk use explicit worklists, so nesting
//! depth costs heap, not call stack. `ManifestLimits` bounds depth and node
//! count; exceeding either is a provenance failure, never a crash.

use serde_json::Value;

use provenance_types::{KernelError, KernelResult};

/// Depth and size bounds for a manifest tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestLimits {
    /// Root is depth 0.
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for ManifestLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 100_000,
        }
    }
}

/// Leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// One node of a manifest tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestNode {
    Map(Vec<(String, ManifestNode)>),
    Sequence(Vec<ManifestNode>),
    Scalar(Scalar),
}

enum BuildTask<'a> {
    Visit(&'a Value, usize),
    FinishMap(Vec<&'a str>),
    FinishSequence(usize),
}

impl ManifestNode {
    pub fn text(s: impl Into<String>) -> Self {
        ManifestNode::Scalar(Scalar::Text(s.into()))
    }

    /// Parse manifest store JSON text into a bounded tree.
    pub fn parse(json: &str, limits: &ManifestLimits) -> KernelResult<Self> {
        if json.trim().is_empty() {
            return Ok(ManifestNode::Scalar(Scalar::Null));
        }
        let value: Value = serde_json::from_str(json)
            .map_err(|e| KernelError::Provenance(format!("manifest JSON: {e}")))?;
        Self::from_json(&value, limits)
    }

    /// Convert a JSON value into a tree, enforcing `limits`.
    ///
    /// Children are visited in map order and parked on an output
    /// stack; a finish task then pops exactly its own children back off.
    pub fn from_json(value: &Value, limits: &ManifestLimits) -> KernelResult<Self> {
        let mut tasks = vec![BuildTask::Visit(value, 0)];
        let mut built: Vec<ManifestNode> = Vec::new();
        let mut nodes = 0usize;

        while let Some(task) = tasks.pop() {
            match task {
                BuildTask::Visit(value, depth) => {
                    nodes += 1;
                    check_limits(depth, nodes, limits)?;
                    match value {
                        Value::Object(map) => {
                            tasks.push(BuildTask::FinishMap(
                                map.keys().map(String::as_str).collect(),
                            ));
                            for child in map.values().rev() {
                                tasks.push(BuildTask::Visit(child, depth + 1));
                            }
                        }
                        Value::Array(items) => {
                            tasks.push(BuildTask::FinishSequence(items.len()));
                            for child in items.iter().rev() {
                                tasks.push(BuildTask::Visit(child, depth + 1));
                            }
                        }
                        Value::String(s) => built.push(Self::text(s.as_str())),
                        Value::Number(n) => built.push(ManifestNode::Scalar(Scalar::Number(
                            n.as_f64().unwrap_or(f64::NAN),
                        ))),
                        Value::Bool(b) => built.push(ManifestNode::Scalar(Scalar::Bool(*b))),
                        Value::Null => built.push(ManifestNode::Scalar(Scalar::Null)),
                    }
                }
                BuildTask::FinishMap(keys) => {
                    let children = built.split_off(built.len() - keys.len());
                    let entries = keys
                        .into_iter()
                        .map(str::to_string)
                        .zip(children)
                        .collect();
                    built.push(ManifestNode::Map(entries));
                }
                BuildTask::FinishSequence(len) => {
                    let children = built.split_off(built.len() - len);
                    built.push(ManifestNode::Sequence(children));
                }
            }
        }

        built
            .pop()
            .ok_or_else(|| KernelError::Provenance("empty manifest tree".to_string()))
    }

    /// True for a store that carries no provenance at all.
    pub fn is_empty(&self) -> bool {
        match self {
            ManifestNode::Map(entries) => entries.is_empty(),
            ManifestNode::Sequence(items) => items.is_empty(),
            ManifestNode::Scalar(Scalar::Null) => true,
            ManifestNode::Scalar(Scalar::Text(s)) => s.is_empty(),
            ManifestNode::Scalar(_) => false,
        }
    }

    /// Every text leaf, lowercased, in traversal order.
    ///
    /// Map values and sequence elements are visited; map keys are not.
    pub fn collect_text(&self, limits: &ManifestLimits) -> KernelResult<Vec<String>> {
        let mut out = Vec::new();
        let mut stack: Vec<(&ManifestNode, usize)> = vec![(self, 0)];
        let mut nodes = 0usize;

        while let Some((node, depth)) = stack.pop() {
            nodes += 1;
            check_limits(depth, nodes, limits)?;
            match node {
                ManifestNode::Map(entries) => {
                    stack.extend(entries.iter().rev().map(|(_, child)| (child, depth + 1)));
                }
                ManifestNode::Sequence(items) => {
                    stack.extend(items.iter().rev().map(|child| (child, depth + 1)));
                }
                ManifestNode::Scalar(Scalar::Text(s)) => out.push(s.to_lowercase()),
                ManifestNode::Scalar(_) => {}
            }
        }

        Ok(out)
    }
}

fn check_limits(depth: usize, nodes: usize, limits: &ManifestLimits) -> KernelResult<()> {
    if depth > limits.max_depth {
        return Err(KernelError::Provenance(format!(
            "manifest nesting exceeds depth limit of {}",
            limits.max_depth
        )));
    }
    if nodes > limits.max_nodes {
        return Err(KernelError::Provenance(format!(
            "manifest exceeds node limit of {}",
            limits.max_nodes
        )));
    }
    Ok(())
}
