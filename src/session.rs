//! Edit Session State
//!
//! The hosting layer owns which node is in edit mode and when conversion
//! results may be written back. The core exposes that as two small state
//! machines: `EditSession` (`Idle | EditingAt(path)`, with a snapshot for
//! cancel) and `PendingEdits` (the last requested edit at a path wins; a
//! superseded conversion completes into nothing). Neither holds any global
//! state.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::alias::apply_aliases;
use crate::error::{ExprError, Result};

// =============================================================================
// Node Paths
// =============================================================================

/// One step from a node to a child: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Path from the expression root to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodePath(pub Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The containing node's path (root's parent is root)
    pub fn parent(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for NodePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Injected Capabilities
// =============================================================================

/// The evaluation capability supplied by the host. Only used for
/// "evaluate at this node" actions; classification and conversion never
/// call it.
pub trait Evaluator {
    fn evaluate(&self, expression: &Value, data: &Value) -> std::result::Result<Value, String>;
}

/// Path-addressed substitution supplied by the hosting tree widget
pub trait TreeStore {
    fn replace(&mut self, path: &NodePath, value: Value);
}

/// Evaluate a node outside the scope that declared its aliases, by merging
/// the in-scope bindings in first. A rejection is surfaced as
/// [`ExprError::Evaluation`] and leaves the tree untouched.
pub fn evaluate_isolated<E: Evaluator>(
    evaluator: &E,
    node: &Value,
    scope: &Map<String, Value>,
    data: &Value,
) -> Result<Value> {
    let expression = apply_aliases(node, scope);
    evaluator
        .evaluate(&expression, data)
        .map_err(ExprError::Evaluation)
}

// =============================================================================
// Edit Session
// =============================================================================

/// Which node, if any, is currently in edit mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    EditingAt(NodePath),
}

/// Tracks the single node being edited, the snapshot to restore on cancel,
/// and whether the edit survived a node-type switch (operator <-> fragment
/// changes the node's shape but must not end the edit).
#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
    snapshot: Option<Value>,
    switched_node_type: bool,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self, path: &NodePath) -> bool {
        matches!(&self.state, EditState::EditingAt(editing) if editing == path)
    }

    /// Begin editing at `path`, snapshotting the node for cancel
    pub fn start_editing(&mut self, path: NodePath, snapshot: Value) {
        self.snapshot = Some(snapshot);
        self.switched_node_type = false;
        self.state = EditState::EditingAt(path);
    }

    /// Keep the edit alive across an operator/fragment switch that moved the
    /// node to a new path
    pub fn switch_node_type(&mut self, new_path: NodePath) {
        self.switched_node_type = true;
        self.state = EditState::EditingAt(new_path);
    }

    pub fn has_switched_node_type(&self) -> bool {
        self.switched_node_type
    }

    /// Accept the edit; the submitted value becomes the next cancel snapshot
    pub fn submit(&mut self, submitted: Value) {
        self.snapshot = Some(submitted);
        self.switched_node_type = false;
        self.state = EditState::Idle;
    }

    /// Abandon the edit, returning the snapshot the caller must restore
    pub fn cancel(&mut self) -> Option<Value> {
        self.state = EditState::Idle;
        self.switched_node_type = false;
        self.snapshot.take()
    }
}

// =============================================================================
// Pending Edits
// =============================================================================

/// Handle for one requested conversion/edit at a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTicket {
    path: NodePath,
    id: u64,
}

/// A completed edit ready to be written back through [`TreeStore::replace`]
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub path: NodePath,
    pub value: Value,
}

/// Orders conversion results: only the most recently requested edit at a
/// given path may be applied. Completing a superseded ticket yields nothing,
/// so stale conversions are dropped instead of queued.
#[derive(Debug, Default)]
pub struct PendingEdits {
    current: HashMap<String, u64>,
    next_id: u64,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new edit request at `path`, superseding any outstanding one
    pub fn begin(&mut self, path: &NodePath) -> EditTicket {
        self.next_id += 1;
        self.current.insert(path.to_string(), self.next_id);
        EditTicket {
            path: path.clone(),
            id: self.next_id,
        }
    }

    /// Has a later request at the same path superseded this ticket?
    pub fn is_superseded(&self, ticket: &EditTicket) -> bool {
        self.current
            .get(&ticket.path.to_string())
            .map(|id| *id != ticket.id)
            .unwrap_or(true)
    }

    /// Complete a request. Returns the replacement to apply, or `None` when
    /// the ticket was superseded or cancelled in the meantime.
    pub fn complete(&mut self, ticket: EditTicket, value: Value) -> Option<Replacement> {
        if self.is_superseded(&ticket) {
            return None;
        }
        self.current.remove(&ticket.path.to_string());
        Some(Replacement {
            path: ticket.path,
            value,
        })
    }

    /// Drop any outstanding request at `path`
    pub fn cancel(&mut self, path: &NodePath) {
        self.current.remove(&path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_display() {
        let path: NodePath = NodePath::root()
            .child("values")
            .child(0)
            .child("operator");
        assert_eq!(path.to_string(), "values.0.operator");
        assert_eq!(path.parent().to_string(), "values.0");
        assert!(NodePath::root().is_root());
    }

    #[test]
    fn test_edit_session_flow() {
        let mut session = EditSession::new();
        let path = NodePath::root().child("values").child(1);
        assert_eq!(session.state(), &EditState::Idle);

        session.start_editing(path.clone(), json!({"operator": "+", "values": [1, 2]}));
        assert!(session.is_editing(&path));
        assert!(!session.is_editing(&NodePath::root()));

        let restored = session.cancel().unwrap();
        assert_eq!(restored, json!({"operator": "+", "values": [1, 2]}));
        assert_eq!(session.state(), &EditState::Idle);
    }

    #[test]
    fn test_switch_node_type_keeps_editing() {
        let mut session = EditSession::new();
        let operator_path = NodePath::root().child("operator");
        let fragment_path = NodePath::root().child("fragment");

        session.start_editing(operator_path.clone(), json!({"operator": "+"}));
        session.switch_node_type(fragment_path.clone());

        assert!(!session.is_editing(&operator_path));
        assert!(session.is_editing(&fragment_path));
        assert!(session.has_switched_node_type());

        session.submit(json!({"fragment": "getCapital"}));
        assert!(!session.has_switched_node_type());
    }

    #[test]
    fn test_last_requested_edit_wins() {
        let mut pending = PendingEdits::new();
        let path = NodePath::root().child("values");

        let first = pending.begin(&path);
        let second = pending.begin(&path);
        assert!(pending.is_superseded(&first));
        assert!(!pending.is_superseded(&second));

        // The stale conversion completes into nothing
        assert!(pending.complete(first, json!("stale")).is_none());

        let replacement = pending.complete(second, json!("fresh")).unwrap();
        assert_eq!(replacement.value, json!("fresh"));
        assert_eq!(replacement.path, path);
    }

    #[test]
    fn test_independent_paths_do_not_supersede() {
        let mut pending = PendingEdits::new();
        let a = pending.begin(&NodePath::root().child("a"));
        let b = pending.begin(&NodePath::root().child("b"));
        assert!(!pending.is_superseded(&a));
        assert!(pending.complete(a, json!(1)).is_some());
        assert!(pending.complete(b, json!(2)).is_some());
    }

    #[test]
    fn test_cancelled_edit_completes_into_nothing() {
        let mut pending = PendingEdits::new();
        let path = NodePath::root().child("a");
        let ticket = pending.begin(&path);
        pending.cancel(&path);
        assert!(pending.complete(ticket, json!(1)).is_none());
    }

    struct FixedEvaluator(std::result::Result<Value, String>);

    impl Evaluator for FixedEvaluator {
        fn evaluate(&self, _: &Value, _: &Value) -> std::result::Result<Value, String> {
            self.0.clone()
        }
    }

    #[test]
    fn test_evaluate_isolated_merges_scope() {
        struct Echo;
        impl Evaluator for Echo {
            fn evaluate(&self, expression: &Value, _: &Value) -> std::result::Result<Value, String> {
                Ok(expression.clone())
            }
        }

        let node = json!({"operator": "+", "values": ["$x", 1]});
        let mut scope = Map::new();
        scope.insert("$x".to_string(), json!(41));

        let seen = evaluate_isolated(&Echo, &node, &scope, &json!({})).unwrap();
        assert_eq!(seen["$x"], json!(41));
    }

    #[test]
    fn test_evaluation_failure_is_surfaced() {
        let evaluator = FixedEvaluator(Err("boom".to_string()));
        let result = evaluate_isolated(&evaluator, &json!({}), &Map::new(), &json!({}));
        assert!(matches!(result, Err(ExprError::Evaluation(msg)) if msg == "boom"));
    }
}
