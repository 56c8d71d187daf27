//! End-to-end tests over realistic expressions
//!
//! Exercises classification, alias scoping, property resolution and syntax
//! conversion together, the way the hosting editor drives them.

use serde_json::{json, Value};

use fig_tree_edit::{
    admissible_types, available_properties, classify, collect_aliases, first_alias_position,
    from_shorthand, to_shorthand, to_v2, validate_expression, CustomFunctionMetadata,
    FragmentMetadata, NodeContext, NodeKind, ParameterMetadata, ParameterType, Registry,
    TypeConstraint,
};

fn registry() -> Registry {
    let mut country = ParameterMetadata::new(
        "$country",
        ParameterType::Single(fig_tree_edit::ExpectedType::String),
        true,
    );
    country.default = Some(json!("New Zealand"));

    Registry::with_builtins(
        vec![FragmentMetadata {
            name: "getCapital".to_string(),
            description: Some("Gets a country's capital city".to_string()),
            parameters: vec![country],
            text_color: None,
            background_color: None,
        }],
        vec![
            CustomFunctionMetadata {
                name: "reverse".to_string(),
                description: Some("Reverse a string, or array".to_string()),
                num_required_args: Some(1),
                args_default: Some(vec![json!("Reverse Me")]),
                input_default: None,
                text_color: None,
                background_color: None,
            },
            CustomFunctionMetadata {
                name: "changeCase".to_string(),
                description: None,
                num_required_args: None,
                args_default: None,
                input_default: Some(json!({"string": "New string", "toCase": "upper"})),
                text_color: None,
                background_color: None,
            },
        ],
    )
}

/// A decision expression mixing operators, a fragment, a custom function,
/// shorthand and alias bindings
fn sample_expression() -> Value {
    json!({
        "operator": "?",
        "condition": {
            "operator": "=",
            "values": [{"$getData": "user.country"}, "$home"],
        },
        "valueIfTrue": {"fragment": "getCapital", "$country": "New Zealand"},
        "valueIfFalse": {"$reverse": ["no match"]},
        "$home": "New Zealand",
    })
}

// =============================================================================
// Classification over the tree
// =============================================================================

#[test]
fn test_sample_expression_classifications() {
    let registry = registry();
    let expression = sample_expression();
    let ctx = NodeContext::root();

    assert!(matches!(
        classify(&expression, &ctx, &registry),
        NodeKind::Operator(Some(_))
    ));
    assert!(matches!(
        classify(&expression["condition"], &ctx, &registry),
        NodeKind::Operator(Some(_))
    ));
    assert!(matches!(
        classify(&expression["condition"]["values"][0], &ctx, &registry),
        NodeKind::ShorthandSimple(_)
    ));
    assert!(matches!(
        classify(&expression["valueIfTrue"], &ctx, &registry),
        NodeKind::Fragment(Some(_))
    ));
    assert!(matches!(
        classify(&expression["valueIfFalse"], &ctx, &registry),
        NodeKind::ShorthandCollection(_)
    ));
    // The alias binding's value is a plain string, not an expression
    assert!(matches!(
        classify(&expression["$home"], &ctx, &registry),
        NodeKind::Literal
    ));
}

#[test]
fn test_sample_expression_is_valid() {
    let registry = registry();
    let report = validate_expression(&sample_expression(), &registry);
    assert!(report.is_clean(), "diagnostics: {:?}", report.diagnostics);
}

// =============================================================================
// Alias scoping
// =============================================================================

#[test]
fn test_alias_scope_and_grouping() {
    let registry = registry();
    let expression = sample_expression();

    let aliases = collect_aliases(&expression, registry.reserved_names());
    assert_eq!(aliases.len(), 1);
    assert_eq!(aliases["$home"], json!("New Zealand"));

    // $country on the fragment node is a parameter, not a binding
    let fragment_aliases =
        collect_aliases(&expression["valueIfTrue"], registry.reserved_names());
    assert_eq!(fragment_aliases.len(), 1);
    assert!(fragment_aliases.contains_key("$country"));

    // The binding sits after the four non-alias properties
    assert_eq!(
        first_alias_position(&expression, registry.reserved_names()),
        Some(4)
    );
}

// =============================================================================
// Property resolution in context
// =============================================================================

#[test]
fn test_property_resolution_against_sample() {
    let registry = registry();
    let expression = sample_expression();

    let conditional = registry.resolve_operator("?").unwrap();
    let available = available_properties(&conditional.parameters, &expression);
    let names: Vec<&str> = available.iter().map(|p| p.name.as_str()).collect();
    // All three slots are filled; the common properties remain
    assert_eq!(names, vec!["fallback", "outputType"]);

    match admissible_types(&expression["condition"], "values", &registry) {
        TypeConstraint::Types(types) => {
            assert_eq!(types, vec![fig_tree_edit::ExpectedType::Array])
        }
        other => panic!("Expected array constraint, got {:?}", other),
    }
}

// =============================================================================
// Conversion round trips
// =============================================================================

#[test]
fn test_full_tree_shorthand_round_trip() {
    let registry = registry();
    let expression = sample_expression();

    let shorthand = to_shorthand(&expression, &registry).unwrap();
    // The root collapses to the collection form and nested single-argument
    // nodes collapse to simple forms
    assert_eq!(
        shorthand,
        json!({
            "$?": {
                "condition": {"$=": [{"$getData": "user.country"}, "$home"]},
                "valueIfTrue": {"$getCapital": "New Zealand"},
                "valueIfFalse": {"$reverse": ["no match"]},
                "$home": "New Zealand",
            }
        })
    );

    let back = from_shorthand(&shorthand, &registry).unwrap();
    assert_eq!(
        back,
        json!({
            "operator": "?",
            "condition": {
                "operator": "=",
                "values": [
                    {"operator": "getData", "property": "user.country"},
                    "$home",
                ],
            },
            "valueIfTrue": {"fragment": "getCapital", "$country": "New Zealand"},
            "valueIfFalse": {
                "operator": "CUSTOM_FUNCTIONS",
                "functionName": "reverse",
                "args": ["no match"],
            },
            "$home": "New Zealand",
        })
    );

    // Expansion produced a semantically identical, valid expression
    let report = validate_expression(&back, &registry);
    assert!(report.is_clean(), "diagnostics: {:?}", report.diagnostics);
}

#[test]
fn test_v1_fragment_definition_upgrades() {
    let registry = registry();
    // The V1 shape fragment definitions were written in
    let v1 = json!({
        "operator": "GET",
        "children": [
            {
                "operator": "stringSubstitution",
                "children": ["https://restcountries.com/v3.1/name/%1", "$country"],
            },
            {},
            "flag",
        ],
        "outputType": "string",
    });

    let upgraded = to_v2(&v1, &registry).unwrap();
    assert_eq!(
        upgraded,
        json!({
            "operator": "GET",
            "url": {
                "operator": "stringSubstitution",
                "string": "https://restcountries.com/v3.1/name/%1",
                "substitutions": ["$country"],
            },
            "parameters": {},
            "returnProperty": "flag",
            "outputType": "string",
        })
    );
}

#[test]
fn test_conversion_preserves_evaluation_scope() {
    let registry = registry();
    let expression = sample_expression();

    // Alias bindings survive both directions, so evaluating the converted
    // node against the same data context resolves the same names
    let shorthand = to_shorthand(&expression, &registry).unwrap();
    let aliases_before = collect_aliases(&expression, registry.reserved_names());
    let aliases_after = collect_aliases(&shorthand["$?"], registry.reserved_names());
    assert_eq!(aliases_before, aliases_after);
}
