//! Property and Type Resolution
//!
//! Given a node's governing operator or fragment, determines which properties
//! may still be added, what value types a property slot admits, and what
//! placeholder value seeds a newly added property.

use serde_json::{json, Value};

use crate::metadata::{
    common_properties, CustomFunctionMetadata, ExpectedType, ParameterMetadata, ParameterType,
};
use crate::registry::Registry;

// =============================================================================
// Available Properties
// =============================================================================

/// The declared parameters not yet present on `node` (by name or alias),
/// plus the absent common properties. Required parameters are listed
/// whenever absent - a required-but-missing property is never treated as
/// satisfied. Arbitrary-property markers are excluded; free-form keys are
/// added directly, not picked from a list.
pub fn available_properties(parameters: &[ParameterMetadata], node: &Value) -> Vec<ParameterMetadata> {
    let present: Vec<&str> = match node.as_object() {
        Some(map) => map.keys().map(String::as_str).collect(),
        None => Vec::new(),
    };
    let absent = |p: &ParameterMetadata| !present.iter().any(|key| p.matches_key(key));

    let mut available: Vec<ParameterMetadata> = parameters
        .iter()
        .filter(|p| !p.is_arbitrary_marker())
        .filter(|p| absent(p))
        .cloned()
        .collect();
    available.extend(common_properties().into_iter().filter(absent));
    available
}

// =============================================================================
// Type Constraints
// =============================================================================

/// Admissible value types for a property slot.
///
/// A constrained slot always additionally admits an Operator or Fragment
/// node in place of a plain value, since any slot can be replaced by a
/// nested expression - see [`TypeConstraint::selector_options`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypeConstraint {
    /// "any", an unknown slot, or an unresolvable governing name: the editor
    /// must not restrict the value
    Unconstrained,
    /// Only these value types
    Types(Vec<ExpectedType>),
    /// A closed choice between literal strings, never free text
    Literals(Vec<String>),
}

/// One entry in the editor's type selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorOption {
    Type(ExpectedType),
    Literal(String),
    OperatorNode,
    FragmentNode,
}

impl TypeConstraint {
    fn from_parameter_type(parameter_type: &ParameterType) -> Self {
        if parameter_type.is_any() {
            return TypeConstraint::Unconstrained;
        }
        match parameter_type {
            ParameterType::Single(t) => TypeConstraint::Types(vec![*t]),
            ParameterType::OneOf(types) => TypeConstraint::Types(types.clone()),
            ParameterType::Literal { literal } => TypeConstraint::Literals(literal.clone()),
        }
    }

    /// The full selector list: the constraint's own options plus the
    /// universal Operator/Fragment escapes. `None` means unconstrained.
    pub fn selector_options(&self) -> Option<Vec<SelectorOption>> {
        let mut options: Vec<SelectorOption> = match self {
            TypeConstraint::Unconstrained => return None,
            TypeConstraint::Types(types) => {
                types.iter().copied().map(SelectorOption::Type).collect()
            }
            TypeConstraint::Literals(literals) => literals
                .iter()
                .cloned()
                .map(SelectorOption::Literal)
                .collect(),
        };
        options.push(SelectorOption::OperatorNode);
        options.push(SelectorOption::FragmentNode);
        Some(options)
    }
}

/// Resolve the type constraint for the property `key` of `parent`.
///
/// Only meaningful when `parent` is governed by an operator or fragment and
/// `key` is not the governing key itself; everything else is unconstrained,
/// including nodes whose governing name cannot be resolved.
pub fn admissible_types(parent: &Value, key: &str, registry: &Registry) -> TypeConstraint {
    let object = match parent.as_object() {
        Some(map) => map,
        None => return TypeConstraint::Unconstrained,
    };

    if key != "operator" {
        if let Some(op_name) = object.get("operator").and_then(Value::as_str) {
            if let Some(meta) = registry.resolve_operator(op_name) {
                if let Some(param) = meta.parameter(key) {
                    return TypeConstraint::from_parameter_type(&param.parameter_type);
                }
            }
            return TypeConstraint::Unconstrained;
        }
    }

    if key != "fragment" {
        if let Some(frag_name) = object.get("fragment").and_then(Value::as_str) {
            if let Some(frag) = registry.resolve_fragment(frag_name) {
                if let Some(param) = frag.parameter(key) {
                    return TypeConstraint::from_parameter_type(&param.parameter_type);
                }
            }
        }
    }

    TypeConstraint::Unconstrained
}

// =============================================================================
// Default Values
// =============================================================================

/// A type-appropriate placeholder for a newly added property: the declared
/// default when present, otherwise derived from the parameter type.
pub fn default_value_for(param: &ParameterMetadata) -> Value {
    if let Some(default) = &param.default {
        return default.clone();
    }
    match &param.parameter_type {
        ParameterType::Literal { literal } => literal
            .first()
            .map(|choice| Value::String(choice.clone()))
            .unwrap_or(Value::Null),
        ParameterType::Single(t) => default_for_type(*t),
        ParameterType::OneOf(types) => types
            .first()
            .map(|t| default_for_type(*t))
            .unwrap_or(Value::Null),
    }
}

fn default_for_type(t: ExpectedType) -> Value {
    match t {
        ExpectedType::Array => json!([]),
        ExpectedType::String => json!("New Value"),
        ExpectedType::Boolean => json!(true),
        ExpectedType::Number => json!(1),
        ExpectedType::Object => json!({}),
        ExpectedType::Null => Value::Null,
        ExpectedType::Any => json!("DEFAULT"),
    }
}

/// Seed node when switching a value to an Operator node
pub fn default_operator_node() -> Value {
    json!({"operator": "+", "values": [1, 1]})
}

/// Seed node when switching a value to a Fragment node: the first registered
/// fragment, if any
pub fn default_fragment_node(registry: &Registry) -> Option<Value> {
    registry
        .fragments()
        .first()
        .map(|frag| json!({"fragment": frag.name}))
}

/// Seed node when selecting a custom function: the function name in the
/// operator slot plus its default input or args
pub fn default_function_node(function: &CustomFunctionMetadata) -> Value {
    let mut node = serde_json::Map::new();
    node.insert("operator".to_string(), json!(function.name));

    if let Some(input) = &function.input_default {
        node.insert("input".to_string(), input.clone());
    }
    if let Some(args) = &function.args_default {
        node.insert("args".to_string(), json!(args));
    }
    if node.len() == 1 {
        if let Some(count) = function.num_required_args {
            if count > 0 {
                node.insert("args".to_string(), json!(vec![Value::Null; count]));
            }
        }
    }
    Value::Object(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FragmentMetadata;

    fn registry() -> Registry {
        let mut country = ParameterMetadata::new(
            "$country",
            ParameterType::Single(ExpectedType::String),
            true,
        );
        country.default = Some(json!("New Zealand"));
        Registry::with_builtins(
            vec![FragmentMetadata {
                name: "getCapital".to_string(),
                description: None,
                parameters: vec![country],
                text_color: None,
                background_color: None,
            }],
            vec![],
        )
    }

    #[test]
    fn test_available_properties_includes_missing_required() {
        let registry = registry();
        let conditional = registry.resolve_operator("?").unwrap();
        let node = json!({"operator": "?", "condition": true});

        let available = available_properties(&conditional.parameters, &node);
        let names: Vec<&str> = available.iter().map(|p| p.name.as_str()).collect();

        // Missing required parameters are always listed
        assert!(names.contains(&"valueIfTrue"));
        assert!(names.contains(&"valueIfFalse"));
        assert!(!names.contains(&"condition"));
        // Common properties are always available until present
        assert!(names.contains(&"fallback"));
        assert!(names.contains(&"outputType"));
    }

    #[test]
    fn test_available_properties_respects_aliases() {
        let registry = registry();
        let conditional = registry.resolve_operator("?").unwrap();
        // ifTrue is an alias of valueIfTrue; type is an alias of outputType
        let node = json!({"operator": "?", "ifTrue": 1, "type": "string"});

        let available = available_properties(&conditional.parameters, &node);
        let names: Vec<&str> = available.iter().map(|p| p.name.as_str()).collect();

        assert!(!names.contains(&"valueIfTrue"));
        assert!(!names.contains(&"outputType"));
    }

    #[test]
    fn test_available_properties_excludes_markers() {
        let registry = registry();
        let match_op = registry.resolve_operator("match").unwrap();
        let node = json!({"operator": "match"});

        let available = available_properties(&match_op.parameters, &node);
        assert!(available.iter().all(|p| !p.is_arbitrary_marker()));
    }

    #[test]
    fn test_admissible_types_for_operator_parameter() {
        let registry = registry();
        let parent = json!({"operator": "stringSubstitution", "string": "%1"});

        match admissible_types(&parent, "trimWhiteSpace", &registry) {
            TypeConstraint::Types(types) => assert_eq!(types, vec![ExpectedType::Boolean]),
            other => panic!("Expected boolean constraint, got {:?}", other),
        }

        // Parameter alias resolves to the same slot
        match admissible_types(&parent, "replacements", &registry) {
            TypeConstraint::Types(types) => {
                assert_eq!(types, vec![ExpectedType::Array, ExpectedType::Object])
            }
            other => panic!("Expected array/object constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_admissible_types_literal_is_closed_choice() {
        let registry = registry();
        let parent = json!({"operator": "+", "values": []});

        let constraint = admissible_types(&parent, "type", &registry);
        assert_eq!(
            constraint,
            TypeConstraint::Literals(vec!["string".to_string(), "array".to_string()])
        );

        let options = constraint.selector_options().unwrap();
        assert_eq!(
            options,
            vec![
                SelectorOption::Literal("string".to_string()),
                SelectorOption::Literal("array".to_string()),
                SelectorOption::OperatorNode,
                SelectorOption::FragmentNode,
            ]
        );
    }

    #[test]
    fn test_admissible_types_any_is_unconstrained() {
        let registry = registry();
        let parent = json!({"operator": "?", "condition": true});
        assert_eq!(
            admissible_types(&parent, "condition", &registry),
            TypeConstraint::Unconstrained
        );
        assert!(admissible_types(&parent, "condition", &registry)
            .selector_options()
            .is_none());
    }

    #[test]
    fn test_admissible_types_fragment_parameter() {
        let registry = registry();
        let parent = json!({"fragment": "getCapital", "$country": "France"});
        match admissible_types(&parent, "$country", &registry) {
            TypeConstraint::Types(types) => assert_eq!(types, vec![ExpectedType::String]),
            other => panic!("Expected string constraint, got {:?}", other),
        }
    }

    #[test]
    fn test_admissible_types_unresolvable_declines() {
        let registry = registry();
        let parent = json!({"operator": "frobnicate", "arg": 1});
        assert_eq!(
            admissible_types(&parent, "arg", &registry),
            TypeConstraint::Unconstrained
        );
    }

    #[test]
    fn test_default_values() {
        let array = ParameterMetadata::new("a", ParameterType::Single(ExpectedType::Array), false);
        assert_eq!(default_value_for(&array), json!([]));

        let boolean =
            ParameterMetadata::new("b", ParameterType::Single(ExpectedType::Boolean), false);
        assert_eq!(default_value_for(&boolean), json!(true));

        let number = ParameterMetadata::new("n", ParameterType::Single(ExpectedType::Number), false);
        assert_eq!(default_value_for(&number), json!(1));

        let object = ParameterMetadata::new("o", ParameterType::Single(ExpectedType::Object), false);
        assert_eq!(default_value_for(&object), json!({}));

        let literal = ParameterMetadata::new(
            "l",
            ParameterType::Literal {
                literal: vec!["quotient".to_string(), "remainder".to_string()],
            },
            false,
        );
        assert_eq!(default_value_for(&literal), json!("quotient"));

        let mut with_default =
            ParameterMetadata::new("d", ParameterType::Single(ExpectedType::String), false);
        with_default.default = Some(json!("declared"));
        assert_eq!(default_value_for(&with_default), json!("declared"));
    }

    #[test]
    fn test_default_nodes() {
        let registry = registry();
        assert_eq!(
            default_operator_node(),
            json!({"operator": "+", "values": [1, 1]})
        );
        assert_eq!(
            default_fragment_node(&registry).unwrap(),
            json!({"fragment": "getCapital"})
        );
    }

    #[test]
    fn test_default_function_node() {
        let function = CustomFunctionMetadata {
            name: "reverse".to_string(),
            description: None,
            num_required_args: Some(2),
            args_default: None,
            input_default: None,
            text_color: None,
            background_color: None,
        };
        assert_eq!(
            default_function_node(&function),
            json!({"operator": "reverse", "args": [null, null]})
        );

        let with_input = CustomFunctionMetadata {
            name: "changeCase".to_string(),
            description: None,
            num_required_args: None,
            args_default: None,
            input_default: Some(json!({"string": "New string", "toCase": "upper"})),
            text_color: None,
            background_color: None,
        };
        assert_eq!(
            default_function_node(&with_input),
            json!({"operator": "changeCase", "input": {"string": "New string", "toCase": "upper"}})
        );
    }
}
