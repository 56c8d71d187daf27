//! Builtin operator catalog
//!
//! The standard FigTree operator set, available without an injected catalog.
//! Canonical names, aliases and parameter lists match what a hosting
//! evaluator exposes, so expressions written against one resolve against the
//! other.

use serde_json::json;

use crate::metadata::{
    ExpectedType, OperatorMetadata, ParameterMetadata, ParameterType, CUSTOM_FUNCTIONS,
};

fn param(name: &str, parameter_type: ParameterType, required: bool) -> ParameterMetadata {
    ParameterMetadata::new(name, parameter_type, required)
}

fn aliased(
    name: &str,
    aliases: &[&str],
    parameter_type: ParameterType,
    required: bool,
) -> ParameterMetadata {
    let mut p = ParameterMetadata::new(name, parameter_type, required);
    p.aliases = aliases.iter().map(|a| a.to_string()).collect();
    p
}

fn single(t: ExpectedType) -> ParameterType {
    ParameterType::Single(t)
}

fn one_of(types: &[ExpectedType]) -> ParameterType {
    ParameterType::OneOf(types.to_vec())
}

fn literal(values: &[&str]) -> ParameterType {
    ParameterType::Literal {
        literal: values.iter().map(|v| v.to_string()).collect(),
    }
}

fn operator(
    name: &str,
    description: &str,
    aliases: &[&str],
    parameters: Vec<ParameterMetadata>,
) -> OperatorMetadata {
    OperatorMetadata {
        name: name.to_string(),
        description: Some(description.to_string()),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        parameters,
    }
}

/// The standard operator set
pub fn builtin_operators() -> Vec<OperatorMetadata> {
    use ExpectedType::*;

    vec![
        operator(
            "AND",
            "Logical AND",
            &["and", "&", "&&"],
            vec![param("values", single(Array), true)],
        ),
        operator(
            "OR",
            "Logical OR",
            &["or", "|", "||"],
            vec![param("values", single(Array), true)],
        ),
        operator(
            "EQUAL",
            "Test multiple values are equal",
            &["=", "eq", "equal", "equals", "=="],
            vec![
                param("values", single(Array), true),
                param("caseInsensitive", single(Boolean), false),
            ],
        ),
        operator(
            "NOT_EQUAL",
            "Test multiple values are not equal",
            &["!=", "!", "ne", "notEqual"],
            vec![
                param("values", single(Array), true),
                param("nullEqualsUndefined", single(Boolean), false),
            ],
        ),
        operator(
            "PLUS",
            "Add, concatenate or merge multiple values",
            &["+", "add", "plus", "concat", "join", "merge"],
            vec![
                param("values", single(Array), true),
                param("type", literal(&["string", "array"]), false),
            ],
        ),
        operator(
            "SUBTRACT",
            "Subtract one numerical value from another",
            &["-", "subtract", "minus", "takeaway"],
            vec![param("values", single(Array), true)],
        ),
        operator(
            "MULTIPLY",
            "Multiply several numerical values together",
            &["*", "x", "multiply", "times"],
            vec![param("values", single(Array), true)],
        ),
        operator(
            "DIVIDE",
            "Divide one numerical value by another",
            &["/", "divide", "÷"],
            vec![
                param("values", single(Array), true),
                param("output", literal(&["quotient", "remainder"]), false),
            ],
        ),
        operator(
            "GREATER_THAN",
            "Test if a value is greater than another value",
            &[">", "greaterThan", "higher", "larger"],
            vec![
                param("values", single(Array), true),
                param("strict", single(Boolean), false),
            ],
        ),
        operator(
            "LESS_THAN",
            "Test if a value is smaller than another value",
            &["<", "lessThan", "lower", "smaller"],
            vec![
                param("values", single(Array), true),
                param("strict", single(Boolean), false),
            ],
        ),
        operator(
            "CONDITIONAL",
            "Return a value based on a condition",
            &["?", "conditional", "ifThen"],
            vec![
                param("condition", single(Any), true),
                aliased("valueIfTrue", &["ifTrue"], single(Any), true),
                aliased("valueIfFalse", &["ifFalse", "ifNot"], single(Any), true),
            ],
        ),
        operator(
            "REGEX",
            "Test a string against a regular expression",
            &["regex", "patternMatch", "regexp", "matchPattern"],
            vec![
                aliased("testString", &["string", "value"], single(String), true),
                aliased("pattern", &["regex", "regexp", "regExp", "re"], single(String), true),
            ],
        ),
        operator(
            "OBJECT_PROPERTIES",
            "Extract values from data objects",
            &[
                "dataProperties",
                "data",
                "getData",
                "objectProperties",
                "objProps",
                "getProperty",
                "getObjProp",
            ],
            vec![
                aliased("property", &["path", "propertyName"], single(String), true),
                aliased(
                    "additionalData",
                    &["additional", "objects", "data", "additionalObjects"],
                    single(Object),
                    false,
                ),
            ],
        ),
        operator(
            "STRING_SUBSTITUTION",
            "Replace values in a string using simple parameter substitution",
            &["replace", "substitute", "stringSubstitution", "stringSub"],
            vec![
                aliased("string", &["value"], single(String), true),
                aliased(
                    "substitutions",
                    &["replacements", "values"],
                    one_of(&[Array, Object]),
                    true,
                ),
                aliased("trimWhiteSpace", &["trim", "trimWhitespace"], single(Boolean), false),
                aliased(
                    "substitutionCharacter",
                    &["subCharacter", "subChar"],
                    single(String),
                    false,
                ),
                aliased("numberMapping", &["numMap", "numberMap", "pluralisation"], single(Object), false),
            ],
        ),
        operator(
            "SPLIT",
            "Split a string into an array",
            &["split", "arraySplit"],
            vec![
                aliased("value", &["string"], single(String), true),
                aliased("delimiter", &["separator"], single(String), false),
                param("trimWhiteSpace", single(Boolean), false),
                aliased("excludeTrailing", &["removeTrailing", "excludeTrailingDelimiter"], single(Boolean), false),
            ],
        ),
        operator(
            "GET",
            "Fetch data from an HTTP endpoint (GET)",
            &["get", "api"],
            vec![
                aliased("url", &["endpoint"], single(String), true),
                aliased(
                    "parameters",
                    &["queryParams", "queryParameters", "urlQueries"],
                    single(Object),
                    false,
                ),
                aliased("returnProperty", &["outputProperty"], single(String), false),
                param("headers", single(Object), false),
            ],
        ),
        operator(
            "POST",
            "Post data to an HTTP endpoint",
            &["post"],
            vec![
                aliased("url", &["endpoint"], single(String), true),
                aliased(
                    "parameters",
                    &["bodyJson", "data"],
                    single(Object),
                    false,
                ),
                aliased("returnProperty", &["outputProperty"], single(String), false),
                param("headers", single(Object), false),
            ],
        ),
        operator(
            "COUNT",
            "Count elements in an array",
            &["count", "length"],
            vec![param("values", single(Array), true)],
        ),
        operator(
            "PASSTHRU",
            "Pass through a value unchanged (for type conversion)",
            &["_", "passThru", "passthru", "pass", "ignore", "coerce", "convert"],
            vec![aliased("value", &["_", "valueToPass"], single(Any), true)],
        ),
        operator(
            "MATCH",
            "Return different values depending on a matched expression",
            &["match", "switch"],
            vec![
                aliased(
                    "matchExpression",
                    &["match", "variable"],
                    one_of(&[String, Number, Boolean]),
                    true,
                ),
                aliased("branches", &["arms", "cases"], one_of(&[Object, Array]), false),
                param("[...branches]", single(Any), false),
            ],
        ),
        operator(
            "BUILD_OBJECT",
            "Construct an object from keys and values",
            &["buildObject", "build", "object"],
            vec![aliased(
                "properties",
                &["values", "keyValPairs", "keyValuePairs"],
                single(Array),
                true,
            )],
        ),
        {
            let mut op = operator(
                CUSTOM_FUNCTIONS,
                "Call a custom function (must be defined in the registry)",
                &[
                    "customFunctions",
                    "customOperations",
                    "objectFunctions",
                    "function",
                    "functions",
                    "runFunction",
                ],
                vec![
                    aliased(
                        "functionName",
                        &["functionPath", "funcName", "function", "path"],
                        single(String),
                        true,
                    ),
                    aliased("args", &["arguments", "variables"], single(Array), false),
                    param("input", single(Any), false),
                ],
            );
            // Args default keeps a newly selected function invocable
            if let Some(args) = op.parameters.iter_mut().find(|p| p.name == "args") {
                args.default = Some(json!([]));
            }
            op
        },
    ]
}
