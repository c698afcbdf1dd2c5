//! Composable regular expression fragments.
//!
//! A [`GrammarComponent`] is a regular expression assembled from a template
//! and smaller components. While assembling it records, for every named
//! capture group, which group index holds it. After a match, callers ask for
//! the group by name path (for example `[Number, Decimal, IntegerPart]`)
//! instead of hard coding numeric indices.
//!
//! Templates use `%s` for an embedded component and `(` ... `)` for a named
//! capture group. Every `(` of a template opens a capture group, so templates
//! must not contain literal parenthesis or non-capturing groups. Embedded
//! components are wrapped in a non-capturing group, which keeps alternations
//! local without shifting any index.

mod number;

pub use number::{decompose, GrammarElement, NumberGrammar, NumberParts, GRAMMAR};

use crate::error::GrammarError;
use regex::{Captures, Match, Regex};
use std::fmt::{self, Display, Formatter};

/// Semantic name of a capture group
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentName {
    /// Signed digits before the point
    IntegerPart,
    /// Fraction digits outside of the repeating block
    FractionNonRepeating,
    /// Digits of the `{...}R` block
    FractionRepeating,
    /// Decimal exponent after `E`
    Exponent,
    /// Optional fraction of a scientific mantissa, only used for matching
    NonFunctional,
    Integer,
    Decimal,
    DecimalWithRepeatingFraction,
    Scientific,
    ScientificWithRepeatingFraction,
    /// Any of the number forms
    Number,
    Negation,
    /// Whatever follows the optional negation
    Operand,
    /// Placeholder of a single nested group
    SubExpression,
    FunctionCall,
    FunctionName,
    /// One placeholder per argument group
    FunctionArguments,
    Variable,
    UnaryOperation,
    BinaryOperator,
    BinaryOperation,
}

impl Display for ComponentName {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "{:?}", self)
    }
}

/// A named capture group and the named groups nested inside of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStructure {
    name: ComponentName,
    group_index: usize,
    children: Vec<ComponentStructure>,
}

impl ComponentStructure {
    fn new(name: ComponentName, group_index: usize) -> Self {
        Self {
            name,
            group_index,
            children: Vec::new(),
        }
    }

    /// Semantic name of the group
    pub fn name(&self) -> ComponentName {
        self.name
    }

    /// Capture group index in the composed pattern
    pub fn group_index(&self) -> usize {
        self.group_index
    }

    /// Named groups nested in this one
    pub fn children(&self) -> &[ComponentStructure] {
        &self.children
    }

    /// Number of named groups in this subtree, this one included
    pub fn total_named_nodes(&self) -> usize {
        1 + total_named_nodes(&self.children)
    }

    /// Look `path` up among the children of this group
    pub fn find(&self, path: &[ComponentName]) -> Option<&ComponentStructure> {
        find(&self.children, path)
    }

    /// Text captured by the child group at `path`, if it participated
    pub fn capture<'t>(&self, captures: &Captures<'t>, path: &[ComponentName]) -> Option<Match<'t>> {
        self.find(path)
            .and_then(|node| captures.get(node.group_index))
    }

    fn shifted(&self, offset: usize) -> Self {
        Self {
            name: self.name,
            group_index: self.group_index + offset,
            children: self.children.iter().map(|child| child.shifted(offset)).collect(),
        }
    }
}

/// Depth first lookup of a name path.
///
/// The first element of `path` is searched among `nodes`, every following
/// element among the children of the previous match. The first complete match
/// wins.
pub fn find<'a>(nodes: &'a [ComponentStructure], path: &[ComponentName]) -> Option<&'a ComponentStructure> {
    let (first, rest) = path.split_first()?;
    nodes
        .iter()
        .filter(|node| node.name == *first)
        .find_map(|node| {
            if rest.is_empty() {
                Some(node)
            } else {
                find(&node.children, rest)
            }
        })
}

/// Number of named groups in a forest
pub fn total_named_nodes(nodes: &[ComponentStructure]) -> usize {
    nodes.iter().map(ComponentStructure::total_named_nodes).sum()
}

/// A compiled regular expression with a map from names to capture groups
#[derive(Debug, Clone)]
pub struct GrammarComponent {
    description: String,
    template: String,
    source: String,
    pattern: Regex,
    prefix: Regex,
    whole: Regex,
    structure: Vec<ComponentStructure>,
}

impl GrammarComponent {
    /// A component without any named part
    ///
    /// # Errors
    ///
    /// Fails when `regex` does not compile or contains a capture group.
    pub fn leaf(description: &str, regex: &str) -> Result<Self, GrammarError> {
        let component = Self::build(description, regex, regex.to_string(), Vec::new())?;
        let groups = component.capture_groups();
        if groups != 0 {
            return Err(GrammarError::GroupCountMismatch {
                description: description.to_string(),
                groups,
                names: 0,
            });
        }
        Ok(component)
    }

    /// Assemble a component from a template, one name per `(` and one part
    /// per `%s`.
    ///
    /// The structure is computed by a single scan of the template. Each `(`
    /// takes the next name and the next free group index, each `)` closes the
    /// innermost open group, and each `%s` splices in a copy of the part's
    /// structure shifted by the number of groups allocated so far.
    ///
    /// # Errors
    ///
    /// Fails when the counts of names or parts do not match the template, when
    /// the template is unbalanced or when the result does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cruncher::grammar::{ComponentName, GrammarComponent};
    /// let digit = GrammarComponent::leaf("digit", "[0-9]").unwrap();
    /// let pair = GrammarComponent::compose(
    ///     "pair",
    ///     "(%s)-(%s)",
    ///     &[ComponentName::IntegerPart, ComponentName::Exponent],
    ///     &[&digit, &digit],
    /// )
    /// .unwrap();
    /// let captures = pair.match_whole("4-2").unwrap();
    /// assert_eq!(&captures[pair.group(&[ComponentName::Exponent]).unwrap()], "2");
    /// ```
    pub fn compose(
        description: &str,
        template: &str,
        names: &[ComponentName],
        parts: &[&GrammarComponent],
    ) -> Result<Self, GrammarError> {
        let groups = template.matches('(').count();
        if groups != names.len() {
            return Err(GrammarError::GroupCountMismatch {
                description: description.to_string(),
                groups,
                names: names.len(),
            });
        }
        let placeholders = template.matches("%s").count();
        if placeholders != parts.len() {
            return Err(GrammarError::PlaceholderCountMismatch {
                description: description.to_string(),
                placeholders,
                parts: parts.len(),
            });
        }

        let unbalanced = || GrammarError::UnbalancedTemplate {
            description: description.to_string(),
        };

        let mut source = String::with_capacity(template.len());
        let mut roots: Vec<ComponentStructure> = Vec::new();
        let mut open: Vec<ComponentStructure> = Vec::new();
        let mut allocated = 0;
        let mut next_name = 0;
        let mut next_part = 0;
        let mut rest = template;

        while let Some(c) = rest.chars().next() {
            if rest.starts_with("%s") {
                let part = parts[next_part];
                next_part += 1;
                source.push_str("(?:");
                source.push_str(&part.source);
                source.push(')');
                let spliced = part.structure.iter().map(|node| node.shifted(allocated));
                match open.last_mut() {
                    Some(parent) => parent.children.extend(spliced),
                    None => roots.extend(spliced),
                }
                allocated += part.group_count();
                rest = &rest[2..];
                continue;
            }

            match c {
                '(' => {
                    allocated += 1;
                    open.push(ComponentStructure::new(names[next_name], allocated));
                    next_name += 1;
                }
                ')' => {
                    let node = open.pop().ok_or_else(unbalanced)?;
                    match open.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                }
                _ => {}
            }
            source.push(c);
            rest = &rest[c.len_utf8()..];
        }
        if !open.is_empty() {
            return Err(unbalanced());
        }

        Self::build(description, template, source, roots)
    }

    fn build(
        description: &str,
        template: &str,
        source: String,
        structure: Vec<ComponentStructure>,
    ) -> Result<Self, GrammarError> {
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|err| GrammarError::InvalidPattern {
                description: description.to_string(),
                message: err.to_string(),
            })
        };
        let pattern = compile(source.clone())?;
        let prefix = compile(format!("^(?:{})", source))?;
        let whole = compile(format!("^(?:{})$", source))?;
        Ok(Self {
            description: description.to_string(),
            template: template.to_string(),
            source,
            pattern,
            prefix,
            whole,
            structure,
        })
    }

    /// Human readable name of the component
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The template this component was composed from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The assembled, unanchored regular expression
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top level named groups
    pub fn structure(&self) -> &[ComponentStructure] {
        &self.structure
    }

    /// Number of named groups, nested ones included
    pub fn group_count(&self) -> usize {
        total_named_nodes(&self.structure)
    }

    /// Number of capture groups of the compiled pattern
    pub fn capture_groups(&self) -> usize {
        self.prefix.captures_len() - 1
    }

    /// Look up the named group at `path`
    pub fn find(&self, path: &[ComponentName]) -> Option<&ComponentStructure> {
        find(&self.structure, path)
    }

    /// Group index of the named group at `path`
    pub fn group(&self, path: &[ComponentName]) -> Option<usize> {
        self.find(path).map(ComponentStructure::group_index)
    }

    /// Like [`find`](Self::find) for paths the static grammar always defines
    pub(crate) fn node(&self, path: &[ComponentName]) -> &ComponentStructure {
        self.find(path).unwrap_or_else(|| {
            panic!(
                "Internal bug: '{}' has no group named {:?}",
                self.description, path
            )
        })
    }

    /// Match at the very start of `text`
    pub fn match_prefix<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.prefix.captures(text)
    }

    /// Match the whole of `text`
    pub fn match_whole<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.whole.captures(text)
    }

    /// Every non-overlapping match in `text`, left to right
    pub fn tokens<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = Match<'t>> + 'r
    where
        't: 'r,
    {
        self.pattern.find_iter(text)
    }

    /// Whether the whole of `text` matches
    pub fn is_match(&self, text: &str) -> bool {
        self.whole.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::ComponentName::*;
    use super::*;

    fn digit() -> GrammarComponent {
        GrammarComponent::leaf("digit", "[0-9]").unwrap()
    }

    #[test]
    fn leaf_has_no_structure() {
        let leaf = digit();
        assert!(leaf.structure().is_empty());
        assert_eq!(leaf.capture_groups(), 0);
        assert!(leaf.is_match("7"));
        assert!(!leaf.is_match("77"));
    }

    #[test]
    fn leaf_rejects_groups() {
        assert_eq!(
            GrammarComponent::leaf("grouped", "([0-9])").unwrap_err(),
            GrammarError::GroupCountMismatch {
                description: "grouped".into(),
                groups: 1,
                names: 0
            }
        );
    }

    #[test]
    fn count_mismatches() {
        let digit = digit();
        assert!(matches!(
            GrammarComponent::compose("x", "(%s)(%s)", &[Integer], &[&digit, &digit]),
            Err(GrammarError::GroupCountMismatch { groups: 2, names: 1, .. })
        ));
        assert!(matches!(
            GrammarComponent::compose("x", "(%s)", &[Integer], &[&digit, &digit]),
            Err(GrammarError::PlaceholderCountMismatch { placeholders: 1, parts: 2, .. })
        ));
        assert!(matches!(
            GrammarComponent::compose("x", ")%s(", &[Integer], &[&digit]),
            Err(GrammarError::UnbalancedTemplate { .. })
        ));
    }

    #[test]
    fn nested_parts_are_renumbered() {
        let digit = digit();
        let pair = GrammarComponent::compose(
            "pair",
            "(%s)(%s)",
            &[IntegerPart, Exponent],
            &[&digit, &digit],
        )
        .unwrap();
        let outer = GrammarComponent::compose(
            "outer",
            "(%s)-(%s)",
            &[Integer, Decimal],
            &[&pair, &pair],
        )
        .unwrap();

        assert_eq!(outer.group(&[Integer]), Some(1));
        assert_eq!(outer.group(&[Integer, IntegerPart]), Some(2));
        assert_eq!(outer.group(&[Integer, Exponent]), Some(3));
        assert_eq!(outer.group(&[Decimal]), Some(4));
        assert_eq!(outer.group(&[Decimal, IntegerPart]), Some(5));
        assert_eq!(outer.group(&[Decimal, Exponent]), Some(6));
        assert_eq!(outer.group_count(), outer.capture_groups());

        let captures = outer.match_whole("12-34").unwrap();
        assert_eq!(&captures[outer.group(&[Decimal, Exponent]).unwrap()], "4");
        assert_eq!(&captures[outer.group(&[Integer, IntegerPart]).unwrap()], "1");
    }

    #[test]
    fn splice_at_top_level() {
        let digit = digit();
        let pair = GrammarComponent::compose("pair", "(%s)", &[IntegerPart], &[&digit]).unwrap();
        let spliced =
            GrammarComponent::compose("spliced", "%s(%s)", &[Exponent], &[&pair, &digit]).unwrap();
        assert_eq!(spliced.group(&[IntegerPart]), Some(1));
        assert_eq!(spliced.group(&[Exponent]), Some(2));
        assert_eq!(spliced.template(), "%s(%s)");
    }

    #[test]
    fn alternation_stays_local() {
        let either = GrammarComponent::leaf("either", "a|b").unwrap();
        let framed = GrammarComponent::compose("framed", "x(%s)y", &[Variable], &[&either]).unwrap();
        assert!(framed.is_match("xay"));
        assert!(!framed.is_match("a"));
        assert!(framed.match_prefix("xbyz").is_some());
    }

    #[test]
    fn find_descends_only_through_named_branches() {
        let digit = digit();
        let inner = GrammarComponent::compose("inner", "(%s)", &[IntegerPart], &[&digit]).unwrap();
        let outer =
            GrammarComponent::compose("outer", "(%s)(%s)", &[Integer, IntegerPart], &[&inner, &digit])
                .unwrap();
        // a bare name only matches at the top level
        assert_eq!(outer.group(&[IntegerPart]), Some(3));
        assert_eq!(outer.group(&[Integer, IntegerPart]), Some(2));
        assert_eq!(outer.group(&[Decimal]), None);
        assert_eq!(outer.find(&[]), None);
    }
}
