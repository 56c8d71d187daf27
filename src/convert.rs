//! Syntax Conversion
//!
//! Bidirectional transformation between the canonical (verbose) form, the
//! shorthand (compact) form, and the legacy V1 form of the same semantic
//! expression. Conversions are pure, recursive over whole subtrees, and
//! driven entirely by registry metadata - they never evaluate anything.
//!
//! Callers are expected to classify before converting: invoking a conversion
//! on a root node whose governing name does not resolve returns
//! [`ExprError::UnresolvedName`]; a root with no expression semantics passes
//! through with only its children converted.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::alias::is_alias_key;
use crate::error::{ExprError, Result};
use crate::metadata::{FragmentMetadata, OperatorMetadata, ParameterMetadata, CUSTOM_FUNCTIONS};
use crate::registry::{Registry, ShorthandTarget};

// =============================================================================
// V1 Detection
// =============================================================================

/// V1 expressions carry their arguments in a positional `children` array
/// instead of named properties. This is the structural marker for the
/// one-way upgrade.
pub fn is_v1_node(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key("operator") && matches!(map.get("children"), Some(Value::Array(_)))
        }
        _ => false,
    }
}

// =============================================================================
// Canonical -> Shorthand
// =============================================================================

/// Collapse canonical nodes into shorthand form, recursively.
///
/// A node whose single property is its governing metadata's first argument
/// slot (by canonical name) collapses to `{"$name": value}`; nodes with more
/// properties collapse to the collection form, preserving key order. Nodes
/// with nothing to collapse (no properties, V1 nodes, unresolvable names
/// below the root) pass through with children converted.
pub fn to_shorthand(node: &Value, registry: &Registry) -> Result<Value> {
    debug!("converting to shorthand");
    if let Some(name) = unresolved_governing_name(node, registry) {
        return Err(ExprError::UnresolvedName(name));
    }
    Ok(shorthand_inner(node, registry))
}

fn shorthand_inner(value: &Value, registry: &Registry) -> Value {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => {
            return Value::Array(items.iter().map(|v| shorthand_inner(v, registry)).collect())
        }
        other => return other.clone(),
    };

    // V1 nodes are not shorthand candidates; upgrade them first
    if is_v1_node(value) {
        return recurse_object(object, registry, shorthand_inner);
    }

    if let Some(op_spelling) = object.get("operator").and_then(Value::as_str) {
        return match registry.resolve_operator(op_spelling) {
            Some(meta) if meta.is_custom_function_marker() => {
                collapse_function_node(object, registry)
            }
            Some(meta) => collapse_operator_node(object, op_spelling, meta, registry),
            // Function name used directly in the operator slot
            None if registry.resolve_function(op_spelling).is_some() => {
                collapse_direct_function_node(object, op_spelling, registry)
            }
            None => recurse_object(object, registry, shorthand_inner),
        };
    }

    if let Some(frag_name) = object.get("fragment").and_then(Value::as_str) {
        return match registry.resolve_fragment(frag_name) {
            Some(frag) => collapse_fragment_node(object, frag, registry),
            None => recurse_object(object, registry, shorthand_inner),
        };
    }

    recurse_object(object, registry, shorthand_inner)
}

fn collapse_operator_node(
    object: &Map<String, Value>,
    spelling: &str,
    meta: &OperatorMetadata,
    registry: &Registry,
) -> Value {
    let properties: Vec<(&String, &Value)> =
        object.iter().filter(|(k, _)| *k != "operator").collect();

    if properties.is_empty() {
        // Nothing to collapse into the payload
        return Value::Object(object.clone());
    }

    let first_param = meta.positional_parameters().next();
    let payload = if let ([(key, value)], Some(param)) = (properties.as_slice(), first_param) {
        if param.name == **key {
            shorthand_inner(value, registry)
        } else {
            collection_payload(&properties, registry)
        }
    } else {
        collection_payload(&properties, registry)
    };

    single_key(format!("${spelling}"), payload)
}

fn collapse_fragment_node(
    object: &Map<String, Value>,
    frag: &FragmentMetadata,
    registry: &Registry,
) -> Value {
    let properties: Vec<(&String, &Value)> =
        object.iter().filter(|(k, _)| *k != "fragment").collect();

    if properties.is_empty() {
        return Value::Object(object.clone());
    }

    let first_param = frag.parameters.first();
    let payload = if let ([(key, value)], Some(param)) = (properties.as_slice(), first_param) {
        if param.name == **key {
            shorthand_inner(value, registry)
        } else {
            collection_payload(&properties, registry)
        }
    } else {
        collection_payload(&properties, registry)
    };

    single_key(format!("${}", frag.name), payload)
}

fn collapse_function_node(object: &Map<String, Value>, registry: &Registry) -> Value {
    let function_name = match object.get("functionName").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => return recurse_object(object, registry, shorthand_inner),
    };
    let properties: Vec<(&String, &Value)> = object
        .iter()
        .filter(|(k, _)| *k != "operator" && *k != "functionName")
        .collect();
    collapse_function_properties(function_name, &properties, object, registry)
}

fn collapse_direct_function_node(
    object: &Map<String, Value>,
    spelling: &str,
    registry: &Registry,
) -> Value {
    let properties: Vec<(&String, &Value)> =
        object.iter().filter(|(k, _)| *k != "operator").collect();
    collapse_function_properties(spelling.to_string(), &properties, object, registry)
}

fn collapse_function_properties(
    function_name: String,
    properties: &[(&String, &Value)],
    object: &Map<String, Value>,
    registry: &Registry,
) -> Value {
    if properties.is_empty() {
        return Value::Object(object.clone());
    }
    // `{"$func": [...]}` always reads as positional args, so an `input`
    // collapses to the simple form only when it cannot be mistaken for one
    let payload = match properties {
        [(key, Value::Array(items))] if *key == "args" => Value::Array(
            items.iter().map(|v| shorthand_inner(v, registry)).collect(),
        ),
        [(key, value)] if *key == "input" && !value.is_array() && !value.is_object() => {
            (*value).clone()
        }
        _ => collection_payload(properties, registry),
    };
    single_key(format!("${function_name}"), payload)
}

fn collection_payload(properties: &[(&String, &Value)], registry: &Registry) -> Value {
    let mut payload = Map::new();
    for (key, value) in properties {
        payload.insert((*key).clone(), shorthand_inner(value, registry));
    }
    Value::Object(payload)
}

// =============================================================================
// Shorthand -> Canonical
// =============================================================================

/// Expand shorthand nodes into the full property-bearing form, recursively.
///
/// An object payload spreads onto the re-attached governing key; an array
/// payload distributes positionally into named parameter slots per the
/// governing metadata's declared order; a scalar payload fills the first
/// declared slot.
pub fn from_shorthand(node: &Value, registry: &Registry) -> Result<Value> {
    debug!("converting from shorthand");
    if let Value::Object(map) = node {
        if map.len() == 1 {
            if let Some((key, _)) = map.iter().next() {
                if is_alias_key(key) && registry.resolve_shorthand(&key[1..]).is_none() {
                    return Err(ExprError::UnresolvedName(key[1..].to_string()));
                }
            }
        }
    }
    Ok(expand_inner(node, registry))
}

fn expand_inner(value: &Value, registry: &Registry) -> Value {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => {
            return Value::Array(items.iter().map(|v| expand_inner(v, registry)).collect())
        }
        other => return other.clone(),
    };

    if object.len() == 1 {
        if let Some((key, payload)) = object.iter().next() {
            if is_alias_key(key) {
                if let Some(target) = registry.resolve_shorthand(&key[1..]) {
                    return expand_shorthand(&key[1..], payload, target, registry);
                }
            }
        }
    }

    recurse_object(object, registry, expand_inner)
}

fn expand_shorthand(
    spelling: &str,
    payload: &Value,
    target: ShorthandTarget,
    registry: &Registry,
) -> Value {
    match target {
        ShorthandTarget::Operator(meta) => {
            let mut node = Map::new();
            node.insert("operator".to_string(), Value::String(spelling.to_string()));
            match payload {
                Value::Object(props) => {
                    for (key, value) in props {
                        node.insert(key.clone(), expand_inner(value, registry));
                    }
                }
                Value::Array(items) => {
                    let params: Vec<&ParameterMetadata> = meta.positional_parameters().collect();
                    for (name, value) in distribute_positional(&params, items, false) {
                        node.insert(name, expand_inner(&value, registry));
                    }
                }
                scalar => {
                    match meta.positional_parameters().next() {
                        Some(param) => {
                            node.insert(param.name.clone(), scalar.clone());
                        }
                        // No declared slot to receive the payload
                        None => return single_key(format!("${spelling}"), scalar.clone()),
                    }
                }
            }
            Value::Object(node)
        }

        ShorthandTarget::Function(func) => {
            let mut node = Map::new();
            node.insert(
                "operator".to_string(),
                Value::String(CUSTOM_FUNCTIONS.to_string()),
            );
            node.insert("functionName".to_string(), Value::String(func.name.clone()));
            match payload {
                Value::Array(items) => {
                    node.insert(
                        "args".to_string(),
                        Value::Array(items.iter().map(|v| expand_inner(v, registry)).collect()),
                    );
                }
                Value::Object(props) => {
                    for (key, value) in props {
                        node.insert(key.clone(), expand_inner(value, registry));
                    }
                }
                scalar => {
                    node.insert("input".to_string(), scalar.clone());
                }
            }
            Value::Object(node)
        }

        ShorthandTarget::Fragment(frag) => {
            let mut node = Map::new();
            node.insert("fragment".to_string(), Value::String(frag.name.clone()));
            match payload {
                Value::Object(props) => {
                    for (key, value) in props {
                        node.insert(key.clone(), expand_inner(value, registry));
                    }
                }
                Value::Array(items) => {
                    let params: Vec<&ParameterMetadata> =
                        frag.parameters.iter().filter(|p| !p.is_arbitrary_marker()).collect();
                    for (name, value) in distribute_positional(&params, items, false) {
                        node.insert(name, expand_inner(&value, registry));
                    }
                }
                scalar => {
                    match frag.parameters.first() {
                        Some(param) => {
                            node.insert(param.name.clone(), scalar.clone());
                        }
                        None => return single_key(format!("${spelling}"), scalar.clone()),
                    }
                }
            }
            Value::Object(node)
        }
    }
}

// =============================================================================
// V1 -> V2
// =============================================================================

/// Upgrade legacy V1 nodes (positional `children` arrays) to the canonical
/// named-property form, recursively. One-way: V1 is deprecated input only.
pub fn to_v2(node: &Value, registry: &Registry) -> Result<Value> {
    debug!("converting V1 expression to V2");
    if is_v1_node(node) {
        if let Some(name) = unresolved_governing_name(node, registry) {
            return Err(ExprError::UnresolvedName(name));
        }
    }
    Ok(v2_inner(node, registry))
}

fn v2_inner(value: &Value, registry: &Registry) -> Value {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => {
            return Value::Array(items.iter().map(|v| v2_inner(v, registry)).collect())
        }
        other => return other.clone(),
    };

    if !is_v1_node(value) {
        return recurse_object(object, registry, v2_inner);
    }

    // is_v1_node guarantees both keys; a non-string operator name stays V1
    let (spelling, children) = match (
        object.get("operator").and_then(Value::as_str),
        object.get("children").and_then(Value::as_array),
    ) {
        (Some(op), Some(children)) => (op, children),
        _ => return recurse_object(object, registry, v2_inner),
    };

    let meta = match registry.resolve_operator(spelling) {
        Some(meta) => meta,
        None => return recurse_object(object, registry, v2_inner),
    };

    let upgraded_children: Vec<Value> = children.iter().map(|c| v2_inner(c, registry)).collect();

    let mut node = Map::new();
    node.insert("operator".to_string(), Value::String(spelling.to_string()));
    let params: Vec<&ParameterMetadata> = meta.positional_parameters().collect();
    for (name, value) in distribute_positional(&params, &upgraded_children, true) {
        node.insert(name, value);
    }
    // Non-positional properties (fallback, output type, alias bindings)
    // carry over in declaration order
    for (key, value) in object {
        if key == "operator" || key == "children" {
            continue;
        }
        node.insert(key.clone(), v2_inner(value, registry));
    }

    Value::Object(node)
}

// =============================================================================
// Positional Distribution
// =============================================================================

/// Map positional argument values onto named parameter slots in declared
/// order. Slots fill one value each, except that an array-typed slot absorbs
/// all remaining values when more than one is left - so `{"$plus": [1, 2]}`
/// fills `values` with the whole list, while `{"$conditional": [c, t, f]}`
/// fills its three `any` slots one value apiece.
///
/// With `variadic_tail` (the V1 `children` convention), an array-typed slot
/// always takes the rest as an array, however few values remain:
/// `children: [string, ...substitutions]` upgrades to a one-element
/// `substitutions` array rather than a bare value.
fn distribute_positional(
    params: &[&ParameterMetadata],
    items: &[Value],
    variadic_tail: bool,
) -> Vec<(String, Value)> {
    match params {
        [] => {
            if !items.is_empty() {
                warn!(count = items.len(), "positional arguments with no declared parameters, dropping");
            }
            Vec::new()
        }
        [only] => {
            let value = if items.len() == 1 && !only.parameter_type.accepts_array() {
                items[0].clone()
            } else {
                Value::Array(items.to_vec())
            };
            vec![(only.name.clone(), value)]
        }
        _ => {
            let mut assigned = Vec::new();
            let mut remaining = items;
            for param in params {
                if remaining.is_empty() {
                    break;
                }
                // A purely array-typed slot always takes the rest as an
                // array; a union slot only does so when a single value
                // could not fill it
                let absorb = param.parameter_type.is_array_typed()
                    && (variadic_tail
                        || remaining.len() > 1
                        || matches!(
                            param.parameter_type,
                            crate::metadata::ParameterType::Single(_)
                        ));
                if absorb {
                    assigned.push((param.name.clone(), Value::Array(remaining.to_vec())));
                    remaining = &[];
                } else {
                    assigned.push((param.name.clone(), remaining[0].clone()));
                    remaining = &remaining[1..];
                }
            }
            if !remaining.is_empty() {
                warn!(count = remaining.len(), "surplus positional arguments, dropping");
            }
            assigned
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn recurse_object(
    object: &Map<String, Value>,
    registry: &Registry,
    f: fn(&Value, &Registry) -> Value,
) -> Value {
    let mut out = Map::new();
    for (key, value) in object {
        out.insert(key.clone(), f(value, registry));
    }
    Value::Object(out)
}

fn single_key(key: String, payload: Value) -> Value {
    let mut map = Map::new();
    map.insert(key, payload);
    Value::Object(map)
}

/// The governing name of an operator/fragment root that fails to resolve,
/// if any. Conversion of such a root is refused.
fn unresolved_governing_name(node: &Value, registry: &Registry) -> Option<String> {
    let object = node.as_object()?;
    if let Some(op) = object.get("operator").and_then(Value::as_str) {
        if registry.resolve_operator(op).is_none() && registry.resolve_function(op).is_none() {
            return Some(op.to_string());
        }
        return None;
    }
    if let Some(frag) = object.get("fragment").and_then(Value::as_str) {
        if registry.resolve_fragment(frag).is_none() {
            return Some(frag.to_string());
        }
    }
    None
}
