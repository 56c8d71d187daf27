//! Alias Resolution
//!
//! User-defined alias bindings are `$name` properties whose name is not
//! claimed by the registry. They name sub-expressions referenced elsewhere in
//! the same scope: visible to everything in the declaring object and below,
//! never upward.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Does `key` have the `$name` shape of an alias string?
pub fn is_alias_key(key: &str) -> bool {
    key.len() > 1 && key.starts_with('$')
}

/// Collect the alias bindings declared on `object`: every `$name` property
/// whose name is absent from the reserved/registry name set, keyed by the
/// full `$name` form for spreading into an evaluation scope.
///
/// Returns an empty map for non-object values.
pub fn collect_aliases(object: &Value, reserved: &HashSet<String>) -> Map<String, Value> {
    let mut aliases = Map::new();
    if let Value::Object(map) = object {
        for (key, value) in map {
            if is_alias_key(key) && !reserved.contains(&key[1..]) {
                aliases.insert(key.clone(), value.clone());
            }
        }
    }
    aliases
}

/// Is the property `key` of `parent` a user alias binding?
///
/// Fragment nodes are excluded: their `$`-named properties are fragment
/// parameters, not bindings.
pub fn is_alias_binding(key: &str, parent: Option<&Value>, reserved: &HashSet<String>) -> bool {
    let parent = match parent {
        Some(Value::Object(map)) => map,
        _ => return false,
    };
    is_alias_key(key) && !parent.contains_key("fragment") && !reserved.contains(&key[1..])
}

/// Declaration-order position of the first qualifying alias binding on
/// `object`, if any. Used to group the visual "Alias definitions" header;
/// no evaluation semantics hang off this position.
pub fn first_alias_position(object: &Value, reserved: &HashSet<String>) -> Option<usize> {
    let map = object.as_object()?;
    if map.contains_key("fragment") {
        return None;
    }
    map.keys()
        .position(|key| is_alias_key(key) && !reserved.contains(&key[1..]))
}

/// Merge alias bindings into a node so it can be evaluated in isolation,
/// outside the scope that declared them. Non-object nodes pass through
/// unchanged.
pub fn apply_aliases(node: &Value, aliases: &Map<String, Value>) -> Value {
    match node {
        Value::Object(map) => {
            let mut merged = map.clone();
            for (key, value) in aliases {
                // Bindings declared on the node itself stay authoritative
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
            Value::Object(merged)
        }
        other => other.clone(),
    }
}
