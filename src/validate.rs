//! Expression Validation
//!
//! Walks a whole expression and reports everything that would degrade
//! editing: unresolvable names, conflicting governing keys, missing required
//! parameters, legacy V1 nodes, and cyclic alias definitions. Validation
//! never mutates the expression; `clean_operator_node` produces the cleaned
//! replacement used when a node's operator changes.

use std::collections::HashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::{Map, Value};

use crate::alias::{collect_aliases, is_alias_key};
use crate::metadata::{common_properties, OperatorMetadata, RESERVED_PROPERTIES};
use crate::registry::Registry;

// =============================================================================
// Diagnostics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    /// Dotted path from the expression root ("" for the root itself)
    pub path: String,
}

/// Result of validating an expression
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    fn push(&mut self, code: &'static str, severity: Severity, message: String, path: &str) {
        self.diagnostics.push(Diagnostic {
            code,
            severity,
            message,
            path: path.to_string(),
        });
    }
}

// =============================================================================
// Validation Walk
// =============================================================================

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Validate an expression against the registry
pub fn validate_expression(expression: &Value, registry: &Registry) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_node(expression, registry, "", &mut report);
    check_alias_cycles(expression, registry, &mut report);
    report
}

fn validate_node(value: &Value, registry: &Registry, path: &str, report: &mut ValidationReport) {
    match value {
        Value::Object(map) => {
            validate_object(map, registry, path, report);
            for (key, child) in map {
                validate_node(child, registry, &join(path, key), report);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                validate_node(child, registry, &join(path, &index.to_string()), report);
            }
        }
        _ => {}
    }
}

fn validate_object(
    map: &Map<String, Value>,
    registry: &Registry,
    path: &str,
    report: &mut ValidationReport,
) {
    let has_operator = map.contains_key("operator");
    let has_fragment = map.contains_key("fragment");

    if has_operator && has_fragment {
        report.push(
            "dual-governing-keys",
            Severity::Error,
            "node carries both 'operator' and 'fragment'; exactly one may govern".to_string(),
            path,
        );
    }

    if has_operator {
        validate_operator_node(map, registry, path, report);
    } else if has_fragment {
        validate_fragment_node(map, registry, path, report);
    }
}

fn validate_operator_node(
    map: &Map<String, Value>,
    registry: &Registry,
    path: &str,
    report: &mut ValidationReport,
) {
    let name = match map.get("operator").and_then(Value::as_str) {
        Some(name) => name,
        None => {
            report.push(
                "operator-not-a-string",
                Severity::Error,
                "'operator' must be a name string".to_string(),
                path,
            );
            return;
        }
    };

    let meta = match registry.resolve_operator(name) {
        Some(meta) => meta,
        None => {
            if registry.resolve_function(name).is_none() {
                report.push(
                    "unresolved-operator",
                    Severity::Error,
                    format!("'{name}' is not a registered operator or function"),
                    path,
                );
            }
            return;
        }
    };

    if meta.is_custom_function_marker() {
        match map.get("functionName").and_then(Value::as_str) {
            Some(function) if registry.resolve_function(function).is_none() => {
                report.push(
                    "unresolved-function",
                    Severity::Error,
                    format!("'{function}' is not a registered custom function"),
                    path,
                );
            }
            Some(_) => {}
            None => {
                report.push(
                    "missing-function-name",
                    Severity::Error,
                    "custom-function node is missing 'functionName'".to_string(),
                    path,
                );
            }
        }
    }

    // V1 nodes carry their arguments positionally; the named-parameter
    // checks only apply after upgrade
    if matches!(map.get("children"), Some(Value::Array(_))) {
        report.push(
            "legacy-v1-syntax",
            Severity::Warning,
            format!("'{name}' uses the legacy positional 'children' form"),
            path,
        );
        return;
    }

    for param in meta.positional_parameters() {
        if param.required && !map.keys().any(|key| param.matches_key(key)) {
            report.push(
                "missing-required-parameter",
                Severity::Error,
                format!("required parameter '{}' is missing", param.name),
                path,
            );
        }
    }

    if !meta.accepts_arbitrary_properties() {
        for key in map.keys() {
            if is_unknown_property(key, meta, registry) {
                report.push(
                    "unknown-property",
                    Severity::Warning,
                    format!("'{key}' is not a parameter of {}", meta.name),
                    path,
                );
            }
        }
    }
}

fn validate_fragment_node(
    map: &Map<String, Value>,
    registry: &Registry,
    path: &str,
    report: &mut ValidationReport,
) {
    let name = match map.get("fragment").and_then(Value::as_str) {
        Some(name) => name,
        None => {
            report.push(
                "fragment-not-a-string",
                Severity::Error,
                "'fragment' must be a name string".to_string(),
                path,
            );
            return;
        }
    };

    match registry.resolve_fragment(name) {
        Some(frag) => {
            for param in &frag.parameters {
                if param.required && !map.keys().any(|key| param.matches_key(key)) {
                    report.push(
                        "missing-required-parameter",
                        Severity::Error,
                        format!("required parameter '{}' is missing", param.name),
                        path,
                    );
                }
            }
        }
        // Editing falls back to the first registered fragment, so a stale
        // name degrades rather than blocks
        None => report.push(
            "unresolved-fragment",
            Severity::Warning,
            format!("'{name}' is not a registered fragment"),
            path,
        ),
    }
}

fn is_unknown_property(key: &str, meta: &OperatorMetadata, registry: &Registry) -> bool {
    if RESERVED_PROPERTIES.contains(&key) {
        return false;
    }
    if meta.parameter(key).is_some() {
        return false;
    }
    if common_properties().iter().any(|p| p.matches_key(key)) {
        return false;
    }
    // Custom-function arguments live beside the marker operator
    if meta.is_custom_function_marker() && matches!(key, "functionName" | "args" | "input") {
        return false;
    }
    // Alias bindings are scoped data, not operator parameters
    !(is_alias_key(key) && !registry.reserved_names().contains(&key[1..]))
}

// =============================================================================
// Alias Cycle Detection
// =============================================================================

/// Alias definitions may reference each other; definitions that form a cycle
/// can never finish evaluating. Detected via strongly connected components
/// over the binding-reference graph.
fn check_alias_cycles(expression: &Value, registry: &Registry, report: &mut ValidationReport) {
    let mut bindings: HashMap<String, Value> = HashMap::new();
    collect_all_bindings(expression, registry, &mut bindings);
    if bindings.is_empty() {
        return;
    }

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut indices: HashMap<String, NodeIndex> = HashMap::new();
    for name in bindings.keys() {
        indices.insert(name.clone(), graph.add_node(name.clone()));
    }
    for (name, subtree) in &bindings {
        for other in bindings.keys() {
            if other != name && references_alias(subtree, other) {
                graph.add_edge(indices[name], indices[other], ());
            }
        }
        if references_alias(subtree, name) {
            graph.add_edge(indices[name], indices[name], ());
        }
    }

    for component in kosaraju_scc(&graph) {
        let cyclic = component.len() > 1
            || graph.contains_edge(component[0], component[0]);
        if cyclic {
            let mut members: Vec<&str> =
                component.iter().map(|ix| graph[*ix].as_str()).collect();
            members.sort();
            report.push(
                "cyclic-alias-definitions",
                Severity::Error,
                format!("alias definitions form a cycle: {}", members.join(" -> ")),
                "",
            );
        }
    }
}

fn collect_all_bindings(
    value: &Value,
    registry: &Registry,
    bindings: &mut HashMap<String, Value>,
) {
    match value {
        Value::Object(map) => {
            for (key, subtree) in collect_aliases(value, registry.reserved_names()) {
                bindings.entry(key).or_insert(subtree);
            }
            for child in map.values() {
                collect_all_bindings(child, registry, bindings);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_all_bindings(child, registry, bindings);
            }
        }
        _ => {}
    }
}

/// Does `subtree` reference the alias `name` (a `"$name"` string value)?
fn references_alias(subtree: &Value, name: &str) -> bool {
    match subtree {
        Value::String(s) => s == name,
        Value::Array(items) => items.iter().any(|v| references_alias(v, name)),
        Value::Object(map) => map.values().any(|v| references_alias(v, name)),
        _ => false,
    }
}

// =============================================================================
// Node Cleaning
// =============================================================================

/// Strip the operator-specific parameters from a node, keeping the governing
/// key, common properties and alias bindings. Used when the node's operator
/// changes to one with different parameters; switching between aliases of
/// the same operator keeps the node as is.
pub fn clean_operator_node(node: &Value, registry: &Registry) -> Value {
    let map = match node.as_object() {
        Some(map) => map,
        None => return node.clone(),
    };

    let mut cleaned = Map::new();
    for (key, value) in map {
        let keep = RESERVED_PROPERTIES.contains(&key.as_str())
            || (is_alias_key(key) && !registry.reserved_names().contains(&key[1..]));
        if keep && key != "children" {
            cleaned.insert(key.clone(), value.clone());
        }
    }
    Value::Object(cleaned)
}
