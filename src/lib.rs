//! FigTree Expression Core
//!
//! The classification and syntax-conversion engine behind a visual editor
//! for JSON-encoded "FigTree" expression trees. Given an arbitrary JSON
//! subtree and a registry of operators, fragments and custom functions, the
//! core decides what kind of expression node it is, which properties and
//! value types apply, which aliases are in scope, and how to convert the
//! node between its canonical, shorthand and legacy (V1) forms.
//!
//! Rendering, widgets and evaluation live in the hosting application; the
//! host injects a [`Registry`], an [`Evaluator`](session::Evaluator) and a
//! [`TreeStore`](session::TreeStore) and receives pure replacement values.
//!
//! ## Node forms
//!
//! ```text
//! canonical:  { "operator": "+", "values": [1, 2], "fallback": 0 }
//! shorthand:  { "$plus": [1, 2] }
//! legacy V1:  { "operator": "+", "children": [1, 2] }   (upgrade only)
//! aliases:    { ..., "$myValue": { "operator": "+", "values": [1, 2] } }
//! ```

pub mod alias;
pub mod builtins;
pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod metadata;
pub mod properties;
pub mod registry;
pub mod session;
pub mod validate;

pub use alias::{apply_aliases, collect_aliases, first_alias_position, is_alias_binding, is_alias_key};
pub use classify::{classify, summary_label, NodeContext, NodeKind};
pub use config::EditorConfig;
pub use convert::{from_shorthand, is_v1_node, to_shorthand, to_v2};
pub use error::{ExprError, Result};
pub use metadata::{
    common_properties, CustomFunctionMetadata, ExpectedType, FragmentMetadata, OperatorMetadata,
    ParameterMetadata, ParameterType, CUSTOM_FUNCTIONS, RESERVED_PROPERTIES,
};
pub use properties::{
    admissible_types, available_properties, default_fragment_node, default_function_node,
    default_operator_node, default_value_for, SelectorOption, TypeConstraint,
};
pub use registry::{standardise_name, Registry, RegistryData, ShorthandTarget};
pub use session::{EditSession, EditState, NodePath, PathSegment, PendingEdits};
pub use validate::{clean_operator_node, validate_expression, Severity, ValidationReport};
