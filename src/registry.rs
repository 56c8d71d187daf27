//! Expression Registry
//!
//! Immutable catalog of the operators, fragments and custom functions in
//! scope for an editing session, with normalized name/alias resolution and
//! fuzzy search for the operator selector.

use std::collections::HashSet;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builtins;
use crate::error::Result;
use crate::metadata::{CustomFunctionMetadata, FragmentMetadata, OperatorMetadata};

/// Normalize an operator name or alias for comparison: case, whitespace,
/// and separator insensitive. Symbolic aliases ("+", "!=") pass through.
pub fn standardise_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// What a shorthand `$alias` key resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShorthandTarget<'r> {
    Operator(&'r OperatorMetadata),
    Function(&'r CustomFunctionMetadata),
    Fragment(&'r FragmentMetadata),
}

impl<'r> ShorthandTarget<'r> {
    /// Canonical name of the resolved entry
    pub fn name(&self) -> &'r str {
        match self {
            ShorthandTarget::Operator(op) => &op.name,
            ShorthandTarget::Function(f) => &f.name,
            ShorthandTarget::Fragment(frag) => &frag.name,
        }
    }
}

/// Serialized registry catalog, for loading injected catalogs from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryData {
    #[serde(default)]
    pub operators: Vec<OperatorMetadata>,
    #[serde(default)]
    pub fragments: Vec<FragmentMetadata>,
    #[serde(default)]
    pub functions: Vec<CustomFunctionMetadata>,
}

/// The expression registry, loaded once per editing session
pub struct Registry {
    operators: Vec<OperatorMetadata>,
    fragments: Vec<FragmentMetadata>,
    functions: Vec<CustomFunctionMetadata>,
    /// Every name that is NOT available as a user alias binding: operator
    /// names and aliases, fragment names, function names (without "$")
    reserved_names: HashSet<String>,
    matcher: SkimMatcherV2,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("operators", &self.operators.len())
            .field("fragments", &self.fragments.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}

impl Registry {
    pub fn new(
        operators: Vec<OperatorMetadata>,
        fragments: Vec<FragmentMetadata>,
        functions: Vec<CustomFunctionMetadata>,
    ) -> Self {
        let mut reserved_names = HashSet::new();
        for op in &operators {
            reserved_names.insert(op.name.clone());
            reserved_names.extend(op.aliases.iter().cloned());
        }
        reserved_names.extend(fragments.iter().map(|f| f.name.clone()));
        reserved_names.extend(functions.iter().map(|f| f.name.clone()));

        Self {
            operators,
            fragments,
            functions,
            reserved_names,
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Registry with the standard operator set and the given fragments and
    /// functions
    pub fn with_builtins(
        fragments: Vec<FragmentMetadata>,
        functions: Vec<CustomFunctionMetadata>,
    ) -> Self {
        Self::new(builtins::builtin_operators(), fragments, functions)
    }

    /// Load a registry from a serialized catalog
    pub fn from_json(json: &str) -> Result<Self> {
        let data: RegistryData = serde_json::from_str(json)?;
        Ok(Self::new(data.operators, data.fragments, data.functions))
    }

    pub fn operators(&self) -> &[OperatorMetadata] {
        &self.operators
    }

    pub fn fragments(&self) -> &[FragmentMetadata] {
        &self.fragments
    }

    pub fn functions(&self) -> &[CustomFunctionMetadata] {
        &self.functions
    }

    /// Names unavailable as user alias bindings
    pub fn reserved_names(&self) -> &HashSet<String> {
        &self.reserved_names
    }

    /// Resolve an operator by canonical name or alias. Matching is
    /// normalized: "string_substitution" and "stringSubstitution" both
    /// resolve STRING_SUBSTITUTION.
    pub fn resolve_operator(&self, name_or_alias: &str) -> Option<&OperatorMetadata> {
        let standardised = standardise_name(name_or_alias);
        self.operators.iter().find(|op| {
            standardise_name(&op.name) == standardised
                || op.aliases.iter().any(|a| standardise_name(a) == standardised)
        })
    }

    /// Resolve a fragment by exact name
    pub fn resolve_fragment(&self, name: &str) -> Option<&FragmentMetadata> {
        self.fragments.iter().find(|frag| frag.name == name)
    }

    /// Resolve a fragment, falling back to the first registered fragment so
    /// editing is never blocked by a stale name. The resolved name is
    /// re-displayed by the UI, so the substitution is visible, not silent.
    pub fn fragment_or_first(&self, name: &str) -> Option<&FragmentMetadata> {
        match self.resolve_fragment(name) {
            Some(frag) => Some(frag),
            None => {
                let first = self.fragments.first();
                if let Some(frag) = first {
                    warn!(requested = name, substituted = %frag.name, "unknown fragment, substituting first registered");
                }
                first
            }
        }
    }

    /// Resolve a custom function by exact name
    pub fn resolve_function(&self, name: &str) -> Option<&CustomFunctionMetadata> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Resolve a shorthand alias (the `name` part of a `$name` key) against
    /// the combined catalog. Operators take priority over functions, which
    /// take priority over fragments.
    pub fn resolve_shorthand(&self, alias: &str) -> Option<ShorthandTarget<'_>> {
        if let Some(op) = self.resolve_operator(alias) {
            return Some(ShorthandTarget::Operator(op));
        }
        if let Some(func) = self.resolve_function(alias) {
            return Some(ShorthandTarget::Function(func));
        }
        self.resolve_fragment(alias).map(ShorthandTarget::Fragment)
    }

    /// Is `name` (without "$") a registered operator alias, fragment or
    /// function name? Used by the classifier's shorthand tests.
    pub fn is_registered_name(&self, name: &str) -> bool {
        self.reserved_names.contains(name)
    }

    /// Fuzzy-search operators by name or alias, best matches first.
    /// Backs the operator selector's search box.
    pub fn search_operators(&self, query: &str) -> Vec<&OperatorMetadata> {
        let mut scored: Vec<(i64, &OperatorMetadata)> = self
            .operators
            .iter()
            .filter_map(|op| {
                let best = std::iter::once(op.name.as_str())
                    .chain(op.aliases.iter().map(String::as_str))
                    .filter_map(|candidate| self.matcher.fuzzy_match(candidate, query))
                    .max()?;
                Some((best, op))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, op)| op).collect()
    }
}
