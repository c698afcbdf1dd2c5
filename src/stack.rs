use crate::functions::FunctionHandle;
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::rational::RationalValue;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// One element of an [`EvaluationStack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackElement {
    /// A prefix operator applying to the next operand
    UnaryOp(UnaryOperator),
    /// An infix operator between the operands around it
    BinaryOp(BinaryOperator),
    /// An exact number literal
    NumberLiteral(RationalValue),
    /// A variable, to be resolved during evaluation
    Variable(String),
    /// fn(<arguments>)
    FunctionCall {
        /// The resolved function
        handle: FunctionHandle,
        /// One stack per argument, in order
        arguments: Vec<EvaluationStack>,
    },
    /// A parenthesized expression
    SubExpression(EvaluationStack),
}

impl StackElement {
    /// Whether this element produces a value on its own
    pub fn is_operand(&self) -> bool {
        !matches!(self, Self::UnaryOp(_) | Self::BinaryOp(_))
    }
}

/// The resolved form of an expression: operators and operands in the order
/// they were written, with nested groups kept as nested stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStack {
    elements: Vec<StackElement>,
}

impl EvaluationStack {
    /// An empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `element`
    pub fn push(&mut self, element: StackElement) {
        self.elements.push(element);
    }

    /// The elements, in written order
    pub fn elements(&self) -> &[StackElement] {
        &self.elements
    }

    /// Number of top level elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing was pushed
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Names of every variable used, nested stacks included
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables<'a>(&'a self, variables: &mut BTreeSet<&'a str>) {
        for element in &self.elements {
            match element {
                StackElement::Variable(name) => {
                    variables.insert(name);
                }
                StackElement::FunctionCall { arguments, .. } => {
                    for argument in arguments {
                        argument.collect_variables(variables);
                    }
                }
                StackElement::SubExpression(stack) => stack.collect_variables(variables),
                StackElement::UnaryOp(_)
                | StackElement::BinaryOp(_)
                | StackElement::NumberLiteral(_) => {}
            }
        }
    }
}

impl Extend<StackElement> for EvaluationStack {
    fn extend<I: IntoIterator<Item = StackElement>>(&mut self, iter: I) {
        self.elements.extend(iter);
    }
}

impl Display for StackElement {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnaryOp(op) => write!(fmt, "{}", op.symbol()),
            Self::BinaryOp(op) => write!(fmt, "{}", op.symbol()),
            Self::NumberLiteral(value) => write!(fmt, "{}", value),
            Self::Variable(name) => write!(fmt, "{}", name),
            Self::FunctionCall { handle, arguments } => {
                write!(fmt, "{}(", handle.alias())?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(fmt, ",")?;
                    }
                    write!(fmt, "{}", argument)?;
                }
                write!(fmt, ")")
            }
            Self::SubExpression(stack) => write!(fmt, "({})", stack),
        }
    }
}

impl Display for EvaluationStack {
    /// Infix rendering without whitespace, every group in parentheses
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        for element in &self.elements {
            write!(fmt, "{}", element)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArithmeticError;

    fn identity(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
        Ok(arguments[0].clone())
    }

    fn sample() -> EvaluationStack {
        let mut inner = EvaluationStack::new();
        inner.extend(vec![
            StackElement::Variable("b".into()),
            StackElement::BinaryOp(BinaryOperator::Power),
            StackElement::NumberLiteral(RationalValue::from(2_i64)),
        ]);
        let mut argument = EvaluationStack::new();
        argument.push(StackElement::Variable("a".into()));

        let mut stack = EvaluationStack::new();
        stack.extend(vec![
            StackElement::UnaryOp(UnaryOperator::Negate),
            StackElement::SubExpression(inner),
            StackElement::BinaryOp(BinaryOperator::Multiply),
            StackElement::FunctionCall {
                handle: FunctionHandle::new("id", 1, identity),
                arguments: vec![argument],
            },
            StackElement::BinaryOp(BinaryOperator::Add),
            StackElement::NumberLiteral(RationalValue::new(1, 3).unwrap()),
        ]);
        stack
    }

    #[test]
    fn render() {
        assert_eq!(sample().to_string(), "-(b^2)*id(a)+0.{3}R");
    }

    #[test]
    fn variables() {
        let stack = sample();
        assert_eq!(stack.variables().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(EvaluationStack::new().variables().is_empty());
    }

    #[test]
    fn operands() {
        let stack = sample();
        let operands = stack.elements().iter().filter(|e| e.is_operand()).count();
        assert_eq!(operands, 3);
        assert_eq!(stack.len(), 6);
        assert!(!stack.is_empty());
    }
}
