//! Node Classification
//!
//! Determines which expression-node variant a JSON value represents. This is
//! pure structural pattern matching - no editing decisions happen here. The
//! property resolver and syntax converter consume these classifications.

use serde_json::Value;

use crate::alias::is_alias_key;
use crate::metadata::{CustomFunctionMetadata, FragmentMetadata, OperatorMetadata};
use crate::registry::{Registry, ShorthandTarget};

// =============================================================================
// Node Context
// =============================================================================

/// Structural context of the value being classified: the key it sits under,
/// its parent value, and its position among the parent's entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeContext<'a> {
    /// Key under which the value sits (None at the root or in an array)
    pub key: Option<&'a str>,
    pub parent: Option<&'a Value>,
    /// Position among the parent's entries, in declaration order
    pub index: Option<usize>,
}

impl<'a> NodeContext<'a> {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(key: Option<&'a str>, parent: Option<&'a Value>, index: Option<usize>) -> Self {
        Self { key, parent, index }
    }

    /// Is the classified value the payload of a shorthand wrapper, i.e. the
    /// value sitting under a `$alias` key that resolves in the registry?
    /// This is the parent-keyed view the wrapper UI targets.
    pub fn shorthand_wrapper<'r>(&self, registry: &'r Registry) -> Option<ShorthandTarget<'r>> {
        let key = self.key?;
        if !is_alias_key(key) {
            return None;
        }
        if !matches!(self.parent, Some(Value::Object(_))) {
            return None;
        }
        registry.resolve_shorthand(&key[1..])
    }
}

// =============================================================================
// Node Kind
// =============================================================================

/// Classification result for a single JSON value.
///
/// `Operator(None)` and `Fragment(None)` are the "no metadata" outcomes: the
/// node claims a name absent from the registry. Such nodes are displayed but
/// not editable, and the converter refuses to operate on them.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'r> {
    /// An ordinary JSON value with no expression semantics
    Literal,
    /// Canonical operator node (`{"operator": ...}`)
    Operator(Option<&'r OperatorMetadata>),
    /// Operator node invoking a custom function, either via the reserved
    /// marker operator plus `functionName`, or with the function name used
    /// directly as the operator
    CustomFunction(Option<&'r CustomFunctionMetadata>),
    /// Canonical fragment node (`{"fragment": ...}`)
    Fragment(Option<&'r FragmentMetadata>),
    /// Single-key `$alias` object whose payload is a non-collection value
    ShorthandSimple(ShorthandTarget<'r>),
    /// Single-key `$alias` object whose payload is an object or array of
    /// arguments
    ShorthandCollection(ShorthandTarget<'r>),
}

impl<'r> NodeKind<'r> {
    pub fn is_expression(&self) -> bool {
        !matches!(self, NodeKind::Literal)
    }

    /// Does this classification carry resolved registry metadata?
    pub fn has_metadata(&self) -> bool {
        match self {
            NodeKind::Literal => false,
            NodeKind::Operator(meta) => meta.is_some(),
            NodeKind::CustomFunction(func) => func.is_some(),
            NodeKind::Fragment(frag) => frag.is_some(),
            NodeKind::ShorthandSimple(_) | NodeKind::ShorthandCollection(_) => true,
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Classify a JSON value against the registry.
///
/// Pure function of the value, its immediate structural context and the
/// registry: repeated calls with identical input yield identical output.
pub fn classify<'r>(value: &Value, context: &NodeContext, registry: &'r Registry) -> NodeKind<'r> {
    // The payload sitting under a resolving `$alias` key is the collection
    // form of a shorthand node, whatever shape the payload takes
    if let Some(target) = context.shorthand_wrapper(registry) {
        return NodeKind::ShorthandCollection(target);
    }

    let object = match value {
        Value::Object(map) => map,
        _ => return NodeKind::Literal,
    };

    if let Some(op_value) = object.get("operator") {
        let name = match op_value.as_str() {
            Some(name) => name,
            None => return NodeKind::Operator(None),
        };
        return match registry.resolve_operator(name) {
            Some(meta) if meta.is_custom_function_marker() => {
                let function = object
                    .get("functionName")
                    .and_then(Value::as_str)
                    .and_then(|f| registry.resolve_function(f));
                NodeKind::CustomFunction(function)
            }
            Some(meta) => NodeKind::Operator(Some(meta)),
            // The evaluator also accepts a function name directly in the
            // operator slot
            None => match registry.resolve_function(name) {
                Some(function) => NodeKind::CustomFunction(Some(function)),
                None => NodeKind::Operator(None),
            },
        };
    }

    if let Some(frag_value) = object.get("fragment") {
        let resolved = frag_value
            .as_str()
            .and_then(|name| registry.resolve_fragment(name));
        return NodeKind::Fragment(resolved);
    }

    // Shorthand: exactly one key, $-prefixed, resolving against the combined
    // operator-alias/function/fragment set. A $key that does not resolve is
    // presumed to be a user alias binding or plain data, never an expression.
    if object.len() == 1 {
        if let Some((key, payload)) = object.iter().next() {
            if is_alias_key(key) {
                if let Some(target) = registry.resolve_shorthand(&key[1..]) {
                    return match payload {
                        Value::Object(_) | Value::Array(_) => NodeKind::ShorthandCollection(target),
                        _ => NodeKind::ShorthandSimple(target),
                    };
                }
            }
        }
    }

    NodeKind::Literal
}

/// Collapsed-node caption for expression nodes, shown in place of the
/// property count ("Operator: +", "Fragment: getCapital", "Shorthand: $getData")
pub fn summary_label(value: &Value, registry: &Registry) -> Option<String> {
    let object = value.as_object()?;
    if let Some(op) = object.get("operator").and_then(Value::as_str) {
        return Some(format!("Operator: {op}"));
    }
    if let Some(frag) = object.get("fragment").and_then(Value::as_str) {
        return Some(format!("Fragment: {frag}"));
    }
    if object.len() == 1 {
        let (key, _) = object.iter().next()?;
        if is_alias_key(key) && registry.resolve_shorthand(&key[1..]).is_some() {
            return Some(format!("Shorthand: {key}"));
        }
    }
    None
}
