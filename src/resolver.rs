//! Classification of expression content into evaluation stacks.
//!
//! The content of every expression is read as one unary operation followed by
//! any number of binary operations. Each operand is a placeholder for a nested
//! group, a function call, a variable or a number literal, in that order of
//! preference. Nested groups are consumed left to right as their placeholders
//! are met.

use crate::config::Config;
use crate::error::ResolveError;
use crate::functions::FunctionLookup;
use crate::grammar::{find, ComponentName as Name, ComponentStructure, NumberParts, GRAMMAR};
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::rational::RationalValue;
use crate::stack::{EvaluationStack, StackElement};
use crate::tree::{ExpressionId, ExpressionTree, GroupId};
use regex::{Captures, Match};
use std::collections::{BTreeMap, BTreeSet};
use std::slice::Iter;

/// Builds numeric values from the named parts of a number literal
pub trait NumberFactory {
    /// Build the value described by `parts`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidNumber`] when the parts do not form a value.
    fn from_components(
        &self,
        parts: &BTreeMap<Name, String>,
    ) -> Result<RationalValue, ResolveError>;
}

/// The default [`NumberFactory`], producing exact [`RationalValue`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct RationalFactory;

impl NumberFactory for RationalFactory {
    fn from_components(
        &self,
        parts: &BTreeMap<Name, String>,
    ) -> Result<RationalValue, ResolveError> {
        let part = |name: Name| parts.get(&name).map(String::as_str);
        let integer = part(Name::IntegerPart).ok_or_else(|| ResolveError::InvalidNumber {
            literal: literal_of(parts),
            reason: "missing integer part".into(),
        })?;
        RationalValue::from_components(
            integer,
            part(Name::FractionNonRepeating),
            part(Name::FractionRepeating),
            part(Name::Exponent),
        )
        .map_err(|err| ResolveError::InvalidNumber {
            literal: literal_of(parts),
            reason: err.to_string(),
        })
    }
}

/// Re-assemble a literal from its parts, for error messages
fn literal_of(parts: &BTreeMap<Name, String>) -> String {
    let part = |name: Name| parts.get(&name).map_or("", String::as_str);
    let mut literal = part(Name::IntegerPart).to_string();
    let non_repeating = part(Name::FractionNonRepeating);
    let repeating = part(Name::FractionRepeating);
    if !non_repeating.is_empty() || !repeating.is_empty() {
        literal.push('.');
        literal.push_str(non_repeating);
        if !repeating.is_empty() {
            literal.push('{');
            literal.push_str(repeating);
            literal.push_str("}R");
        }
    }
    if let Some(exponent) = parts.get(&Name::Exponent) {
        literal.push('E');
        literal.push_str(exponent);
    }
    literal
}

/// Resolve a parsed tree, rendering diagnostics with the default [`Config`].
///
/// # Errors
///
/// See [`ComponentResolver::resolve`].
pub fn resolve(
    tree: &ExpressionTree,
    functions: &dyn FunctionLookup,
    numbers: &dyn NumberFactory,
) -> Result<EvaluationStack, ResolveError> {
    resolve_with(tree, functions, numbers, &Config::default())
}

/// Resolve a parsed tree into its evaluation stack.
///
/// # Errors
///
/// See [`ComponentResolver::resolve`].
pub fn resolve_with(
    tree: &ExpressionTree,
    functions: &dyn FunctionLookup,
    numbers: &dyn NumberFactory,
    config: &Config,
) -> Result<EvaluationStack, ResolveError> {
    ComponentResolver::new(tree, functions, numbers, config).resolve()
}

/// Turns the expressions of a tree into evaluation stacks
pub struct ComponentResolver<'a> {
    tree: &'a ExpressionTree,
    functions: &'a dyn FunctionLookup,
    numbers: &'a dyn NumberFactory,
    config: &'a Config,
}

impl<'a> ComponentResolver<'a> {
    /// Prepare the resolution of `tree`
    pub fn new(
        tree: &'a ExpressionTree,
        functions: &'a dyn FunctionLookup,
        numbers: &'a dyn NumberFactory,
        config: &'a Config,
    ) -> Self {
        Self {
            tree,
            functions,
            numbers,
            config,
        }
    }

    /// Resolve the root expression, and through it every nested one.
    ///
    /// # Errors
    ///
    /// Fails when an expression does not start with an operand, holds
    /// content no operation matches, calls an unknown function, uses a
    /// multi-dimensional group as a plain operand or holds a literal the
    /// number factory rejects.
    pub fn resolve(&self) -> Result<EvaluationStack, ResolveError> {
        log::debug!("resolving {}", self.tree);
        self.resolve_expression(self.tree.root_id())
    }

    fn resolve_expression(&self, id: ExpressionId) -> Result<EvaluationStack, ResolveError> {
        let content = self.tree.expression(id).content();
        let mut groups = self.tree.expression(id).sub_expressions().iter();
        let mut stack = EvaluationStack::new();

        let unary = &GRAMMAR.unary_operation;
        let captures = unary.match_prefix(content).ok_or_else(|| {
            let position = self.tree.real_position(id, 0);
            ResolveError::ExpressionDoesNotStartWithUnaryOperation {
                position,
                diagnostic: self.diagnostic(&[position]),
            }
        })?;
        let mut offset = matched_len(&captures);
        log::trace!("unary operation {:?}", &content[..offset]);
        self.push_operation(id, &captures, unary.structure(), 0, &mut groups, &mut stack)?;

        let binary = &GRAMMAR.binary_operation;
        let operator_group = binary.node(&[Name::BinaryOperator]).group_index();
        let operation = binary.node(&[Name::UnaryOperation]).children();
        while offset < content.len() {
            let captures = match binary.match_prefix(&content[offset..]) {
                Some(captures) => captures,
                None => break,
            };
            let operator = captures
                .get(operator_group)
                .and_then(|m| m.as_str().chars().next())
                .and_then(BinaryOperator::from_symbol)
                .unwrap_or_else(|| panic!("Internal bug: binary operation without an operator"));
            log::trace!("binary operation {:?}", &captures[0]);
            stack.push(StackElement::BinaryOp(operator));
            self.push_operation(id, &captures, operation, offset, &mut groups, &mut stack)?;
            offset += matched_len(&captures);
        }

        if offset < content.len() {
            let position = self.tree.real_position(id, char_offset(content, offset));
            return Err(ResolveError::UnexpectedContentInOperation {
                position,
                diagnostic: self.diagnostic(&[position]),
            });
        }
        Ok(stack)
    }

    /// Push the optional negation and the operand of a matched unary
    /// operation. `parts` are its named groups, `base` the byte offset of the
    /// match in the content.
    fn push_operation(
        &self,
        id: ExpressionId,
        captures: &Captures,
        parts: &[ComponentStructure],
        base: usize,
        groups: &mut Iter<GroupId>,
        stack: &mut EvaluationStack,
    ) -> Result<(), ResolveError> {
        let capture = |path: &[Name]| find(parts, path).and_then(|node| captures.get(node.group_index()));

        if capture(&[Name::Negation]).is_some() {
            stack.push(StackElement::UnaryOp(UnaryOperator::Negate));
        }

        let operand = if capture(&[Name::Operand, Name::SubExpression]).is_some() {
            self.sub_expression(groups)?
        } else if let Some(name) = capture(&[Name::Operand, Name::FunctionCall, Name::FunctionName]) {
            let placeholders = capture(&[Name::Operand, Name::FunctionCall, Name::FunctionArguments])
                .map_or(0, |m| m.as_str().chars().count());
            self.function_call(id, name, base, placeholders, groups)?
        } else if let Some(name) = capture(&[Name::Operand, Name::Variable]) {
            StackElement::Variable(name.as_str().to_string())
        } else {
            let number = find(parts, &[Name::Operand, Name::Number])
                .unwrap_or_else(|| panic!("Internal bug: unary operation without a number group"));
            let literal = captures
                .get(number.group_index())
                .map_or("", |m| m.as_str());
            self.number(literal, captures, number.children())?
        };
        stack.push(operand);
        Ok(())
    }

    fn sub_expression(&self, groups: &mut Iter<GroupId>) -> Result<StackElement, ResolveError> {
        let group = self.tree.group(next_group(groups));
        if group.dimension() != 1 {
            let position = group.start_position();
            return Err(ResolveError::AmbiguousSubExpression {
                dimension: group.dimension(),
                position,
                diagnostic: self.diagnostic(&[position]),
            });
        }
        let stack = self.resolve_expression(group.children()[0])?;
        Ok(StackElement::SubExpression(stack))
    }

    /// A call consumes one group per placeholder, its arguments are the
    /// dimensions of all of them.
    fn function_call(
        &self,
        id: ExpressionId,
        name: Match,
        base: usize,
        placeholders: usize,
        groups: &mut Iter<GroupId>,
    ) -> Result<StackElement, ResolveError> {
        let children: Vec<ExpressionId> = (0..placeholders)
            .flat_map(|_| self.tree.group(next_group(groups)).children().iter().copied())
            .collect();

        let alias = name.as_str();
        let handle = self.functions.lookup(alias, children.len()).ok_or_else(|| {
            let content = self.tree.expression(id).content();
            let position = self
                .tree
                .real_position(id, char_offset(content, base + name.start()));
            ResolveError::UnknownMethod {
                alias: alias.to_string(),
                arity: children.len(),
                position,
                diagnostic: self.diagnostic(&[position]),
            }
        })?;
        log::trace!("function {} with {} argument(s)", alias, children.len());

        let arguments = children
            .into_iter()
            .map(|child| self.resolve_expression(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StackElement::FunctionCall { handle, arguments })
    }

    fn number(
        &self,
        literal: &str,
        captures: &Captures,
        forms: &[ComponentStructure],
    ) -> Result<StackElement, ResolveError> {
        let parts =
            NumberParts::from_captures(captures, forms).ok_or_else(|| ResolveError::InvalidNumber {
                literal: literal.to_string(),
                reason: "no number form matched".into(),
            })?;
        let value = self.numbers.from_components(&parts.to_components())?;
        Ok(StackElement::NumberLiteral(value))
    }

    fn diagnostic(&self, positions: &[usize]) -> String {
        let positions: BTreeSet<usize> = positions.iter().copied().collect();
        self.tree
            .text()
            .diagnostic(self.config.caret_mode, self.config.show_caret_index, &positions)
    }
}

fn next_group(groups: &mut Iter<GroupId>) -> GroupId {
    groups
        .next()
        .copied()
        .unwrap_or_else(|| panic!("Internal bug: more placeholders than groups"))
}

fn matched_len(captures: &Captures) -> usize {
    captures.get(0).map_or(0, |m| m.end())
}

fn char_offset(content: &str, byte_offset: usize) -> usize {
    content[..byte_offset].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArithmeticError;
    use crate::functions::{Arity, FunctionTable, FUNCTIONS};
    use crate::tree::parse;
    use test_case::test_case;

    fn first(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
        Ok(arguments[0].clone())
    }

    fn stub_functions() -> FunctionTable {
        FunctionTable::builder()
            .register("sum", Arity::AtLeast(1), first)
            .register("faculty", Arity::Exactly(1), first)
            .register("sin", Arity::Exactly(1), first)
            .build()
    }

    fn resolve_str(raw: &str) -> Result<EvaluationStack, ResolveError> {
        resolve(&parse(raw).unwrap(), &*FUNCTIONS, &RationalFactory)
    }

    #[test]
    fn end_to_end() {
        let tree = parse("2+3*sum(1,2,sum(1,sum{1,1}),4,5,faculty{3})*sin(pi/4)").unwrap();
        let stack = resolve(&tree, &stub_functions(), &RationalFactory).unwrap();
        assert_eq!(
            stack.to_string(),
            "2+3*sum(1,2,sum(1,sum(1,1)),4,5,faculty(3))*sin(pi/4)"
        );
        assert_eq!(stack.len(), 7);
        assert_eq!(stack.variables().into_iter().collect::<Vec<_>>(), vec!["pi"]);

        match &stack.elements()[4] {
            StackElement::FunctionCall { handle, arguments } => {
                assert_eq!(handle.alias(), "sum");
                assert_eq!(handle.arity(), 6);
                assert_eq!(arguments.len(), 6);
            }
            other => panic!("expected a function call, got {:?}", other),
        }
    }

    #[test]
    fn operators_and_operands() {
        let stack = resolve_str("-(2)*-x^0.5").unwrap();
        let mut inner = EvaluationStack::new();
        inner.push(StackElement::NumberLiteral(RationalValue::from(2_i64)));
        let expected = vec![
            StackElement::UnaryOp(UnaryOperator::Negate),
            StackElement::SubExpression(inner),
            StackElement::BinaryOp(BinaryOperator::Multiply),
            StackElement::UnaryOp(UnaryOperator::Negate),
            StackElement::Variable("x".into()),
            StackElement::BinaryOp(BinaryOperator::Power),
            StackElement::NumberLiteral(RationalValue::new(1, 2).unwrap()),
        ];
        assert_eq!(stack.elements(), expected.as_slice());
    }

    #[test_case("-13.567" => "-13.567" ; "decimal after negation")]
    #[test_case("1.2E3" => "1200" ; "scientific")]
    #[test_case("1.25E-1" => "0.125" ; "scientific with fraction")]
    #[test_case("1E-2" => "0.01" ; "negative exponent")]
    #[test_case("0.5/3" => "0.5/3" ; "division keeps literals")]
    #[test_case("--8" => "--8" ; "double negation")]
    fn literals(raw: &str) -> String {
        resolve_str(raw).unwrap().to_string()
    }

    #[test]
    fn braces_always_group() {
        assert!(matches!(
            resolve_str("0.{3}R"),
            Err(ResolveError::UnexpectedContentInOperation { position: 1, .. })
        ));
    }

    #[test]
    fn several_groups_form_one_call() {
        let stack = resolve_str("sum(1)(2,3)").unwrap();
        assert_eq!(stack.to_string(), "sum(1,2,3)");
    }

    #[test]
    fn error_not_starting_with_operand() {
        assert!(matches!(
            resolve_str("*2"),
            Err(ResolveError::ExpressionDoesNotStartWithUnaryOperation { position: 0, .. })
        ));
        assert!(matches!(
            resolve_str("1+(*2)"),
            Err(ResolveError::ExpressionDoesNotStartWithUnaryOperation { position: 3, .. })
        ));
    }

    #[test_case("2+3x" => 3 ; "trailing name")]
    #[test_case("1.50" => 3 ; "trailing zero")]
    #[test_case("10E44" => 2 ; "scientific with two digit mantissa")]
    #[test_case("(1)+(2)x" => 7 ; "after groups")]
    #[test_case("2*(3+4y)" => 6 ; "inside a group")]
    #[test_case("2+" => 1 ; "dangling operator")]
    fn error_unexpected_content(raw: &str) -> usize {
        match resolve_str(raw) {
            Err(ResolveError::UnexpectedContentInOperation { position, .. }) => position,
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn error_unknown_method() {
        match resolve_str("1+foo(2,3)") {
            Err(ResolveError::UnknownMethod {
                alias,
                arity,
                position,
                ..
            }) => {
                assert_eq!(alias, "foo");
                assert_eq!(arity, 2);
                assert_eq!(position, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(matches!(
            resolve_str("faculty(1,2)"),
            Err(ResolveError::UnknownMethod { arity: 2, .. })
        ));
    }

    #[test]
    fn error_ambiguous_sub_expression() {
        assert!(matches!(
            resolve_str("3+(1,2)"),
            Err(ResolveError::AmbiguousSubExpression {
                dimension: 2,
                position: 2,
                ..
            })
        ));
    }

    #[test]
    fn error_invalid_number() {
        assert!(matches!(
            resolve_str("1E100001"),
            Err(ResolveError::InvalidNumber { literal, .. }) if literal == "1E100001"
        ));
    }

    #[test]
    fn custom_number_factory() {
        struct Integers;
        impl NumberFactory for Integers {
            fn from_components(
                &self,
                parts: &BTreeMap<Name, String>,
            ) -> Result<RationalValue, ResolveError> {
                if parts.len() > 1 {
                    return Err(ResolveError::InvalidNumber {
                        literal: literal_of(parts),
                        reason: "integers only".into(),
                    });
                }
                RationalFactory.from_components(parts)
            }
        }

        let tree = parse("1+2").unwrap();
        assert!(resolve(&tree, &*FUNCTIONS, &Integers).is_ok());
        let tree = parse("1+2.5").unwrap();
        assert_eq!(
            resolve(&tree, &*FUNCTIONS, &Integers),
            Err(ResolveError::InvalidNumber {
                literal: "2.5".into(),
                reason: "integers only".into(),
            })
        );
    }

    #[test]
    fn diagnostics_point_at_the_failure() {
        let tree = parse("1 + foo(2)").unwrap();
        let config = Config::default().with_caret_mode(crate::text::CaretMode::Stripped);
        match resolve_with(&tree, &*FUNCTIONS, &RationalFactory, &config) {
            Err(ResolveError::UnknownMethod { diagnostic, .. }) => {
                assert_eq!(diagnostic, "stripped: 1+foo(2)\n            ^ 2");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
