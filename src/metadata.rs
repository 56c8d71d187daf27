//! Metadata records for operators, fragments and custom functions
//!
//! These are the read-only catalog entries the editor core consumes. Field
//! names serialize in camelCase to match the wire format the hosting
//! evaluator exposes its catalog in.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Canonical name of the reserved custom-function marker operator
pub const CUSTOM_FUNCTIONS: &str = "CUSTOM_FUNCTIONS";

/// Property keys with structural meaning on expression nodes. A key in this
/// set is never a user alias binding.
pub const RESERVED_PROPERTIES: &[&str] = &[
    "operator",
    "fragment",
    "children",
    "fallback",
    "outputType",
    "type",
    "useCache",
];

/// A value type a parameter slot can expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    Any,
}

/// Declared type of a parameter slot: a single type, a union of types, or a
/// closed set of literal strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterType {
    Single(ExpectedType),
    OneOf(Vec<ExpectedType>),
    Literal { literal: Vec<String> },
}

impl ParameterType {
    pub fn is_any(&self) -> bool {
        match self {
            ParameterType::Single(t) => *t == ExpectedType::Any,
            ParameterType::OneOf(types) => types.contains(&ExpectedType::Any),
            ParameterType::Literal { .. } => false,
        }
    }

    /// Whether an array value is admissible for this slot
    pub fn accepts_array(&self) -> bool {
        match self {
            ParameterType::Single(t) => matches!(t, ExpectedType::Array | ExpectedType::Any),
            ParameterType::OneOf(types) => types
                .iter()
                .any(|t| matches!(t, ExpectedType::Array | ExpectedType::Any)),
            ParameterType::Literal { .. } => false,
        }
    }

    /// Whether this slot is declared array-typed. Stricter than
    /// [`accepts_array`](Self::accepts_array): an `any` slot accepts arrays
    /// but is not array-typed, so positional distribution fills it with a
    /// single value.
    pub fn is_array_typed(&self) -> bool {
        match self {
            ParameterType::Single(t) => *t == ExpectedType::Array,
            ParameterType::OneOf(types) => types.contains(&ExpectedType::Array),
            ParameterType::Literal { .. } => false,
        }
    }
}

impl Default for ParameterType {
    fn default() -> Self {
        ParameterType::Single(ExpectedType::Any)
    }
}

/// A single parameter slot declared by an operator or fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterMetadata {
    /// Canonical property name (e.g. "values", "condition")
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Alternative property names accepted for this slot
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub parameter_type: ParameterType,
    /// Declared default, used when the property is added in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterMetadata {
    pub fn new(name: impl Into<String>, parameter_type: ParameterType, required: bool) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            required,
            parameter_type,
            default: None,
        }
    }

    /// Does `key` address this parameter, by name or alias?
    pub fn matches_key(&self, key: &str) -> bool {
        self.name == key || self.aliases.iter().any(|a| a == key)
    }

    /// Arbitrary-property markers are parameter entries named like
    /// `[...branches]`, flagging operators that accept free-form extra keys
    pub fn is_arbitrary_marker(&self) -> bool {
        static MARKER: OnceLock<Regex> = OnceLock::new();
        let re = MARKER.get_or_init(|| {
            Regex::new(r"^\[\s*\.\.\.[A-Za-z]+\s*\]$").expect("valid marker pattern")
        });
        re.is_match(&self.name)
    }
}

/// Catalog entry for an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorMetadata {
    /// Canonical name (e.g. "PLUS")
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accepted aliases (e.g. "+", "plus", "add")
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterMetadata>,
}

impl OperatorMetadata {
    /// Is this the reserved marker under which custom functions are invoked?
    pub fn is_custom_function_marker(&self) -> bool {
        self.name == CUSTOM_FUNCTIONS
    }

    /// Find a declared parameter by property name or alias
    pub fn parameter(&self, key: &str) -> Option<&ParameterMetadata> {
        self.parameters.iter().find(|p| p.matches_key(key))
    }

    /// Does this operator accept arbitrary extra properties (e.g. MATCH
    /// branches, BUILD_OBJECT pairs)?
    pub fn accepts_arbitrary_properties(&self) -> bool {
        self.parameters.iter().any(|p| p.is_arbitrary_marker())
    }

    /// Declared parameters, excluding arbitrary-property markers
    pub fn positional_parameters(&self) -> impl Iterator<Item = &ParameterMetadata> {
        self.parameters.iter().filter(|p| !p.is_arbitrary_marker())
    }
}

/// Catalog entry for a fragment (a named, parameterized expression template)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterMetadata>,
    /// Display hints carried with the catalog record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl FragmentMetadata {
    pub fn parameter(&self, key: &str) -> Option<&ParameterMetadata> {
        self.parameters.iter().find(|p| p.matches_key(key))
    }
}

/// Catalog entry for a registered custom function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFunctionMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_required_args: Option<usize>,
    /// Default positional arguments, used when selecting the function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_default: Option<Vec<Value>>,
    /// Default single input object, alternative to positional args
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// The properties available on every operator and fragment node, independent
/// of the governing metadata
pub fn common_properties() -> Vec<ParameterMetadata> {
    vec![
        ParameterMetadata {
            name: "fallback".to_string(),
            description: Some("Value to return if the evaluation throws an error".to_string()),
            aliases: Vec::new(),
            required: false,
            parameter_type: ParameterType::Single(ExpectedType::Any),
            default: Some(Value::String("Returning fallback...".to_string())),
        },
        ParameterMetadata {
            name: "outputType".to_string(),
            description: Some("Convert the evaluation result to this type".to_string()),
            aliases: vec!["type".to_string()],
            required: false,
            parameter_type: ParameterType::Single(ExpectedType::Any),
            default: Some(Value::String("string".to_string())),
        },
    ]
}
