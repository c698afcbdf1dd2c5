use crate::config::Config;
use crate::error::EvalError;
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::rational::RationalValue;
use crate::stack::{EvaluationStack, StackElement};
use num_traits::ToPrimitive;
use std::collections::HashMap;

/// Evaluate `stack` with the default [`Config`].
///
/// # Errors
///
/// See [`evaluate_with`].
pub fn evaluate(
    stack: &EvaluationStack,
    variables: &HashMap<String, RationalValue>,
) -> Result<RationalValue, EvalError> {
    evaluate_with(stack, variables, &Config::default())
}

/// Evaluate `stack`, looking variables up in `variables`.
///
/// Binary operators follow the usual precedence, `^` associating to the
/// right. A negation applies to the operand right after it, so `-2^2` is 4.
///
/// # Errors
///
/// Fails on unknown variables, on divisions by zero, on failing functions and
/// on `^` with a fractional exponent or one beyond
/// [`Config::max_exponent`].
pub fn evaluate_with(
    stack: &EvaluationStack,
    variables: &HashMap<String, RationalValue>,
    config: &Config,
) -> Result<RationalValue, EvalError> {
    let value = Evaluator { variables, config }.stack(stack)?;
    log::debug!("{} evaluates to {}", stack, value);
    Ok(value)
}

struct Evaluator<'a> {
    variables: &'a HashMap<String, RationalValue>,
    config: &'a Config,
}

impl<'a> Evaluator<'a> {
    fn stack(&self, stack: &EvaluationStack) -> Result<RationalValue, EvalError> {
        let mut values = Vec::new();
        let mut operators: Vec<BinaryOperator> = Vec::new();
        let mut negate = false;

        for element in stack.elements() {
            match element {
                StackElement::UnaryOp(UnaryOperator::Negate) => negate = !negate,
                StackElement::BinaryOp(o1) => {
                    while let Some(&o2) = operators.last() {
                        let pop_me = o1.is_left_associative() && o1.precedence() <= o2.precedence();
                        let pop_me = pop_me
                            || o1.is_right_associative() && o1.precedence() < o2.precedence();
                        if !pop_me {
                            break;
                        }
                        operators.pop();
                        self.apply(o2, &mut values)?;
                    }
                    operators.push(*o1);
                }
                operand => {
                    let value = self.operand(operand)?;
                    values.push(if negate { -value } else { value });
                    negate = false;
                }
            }
        }

        while let Some(operator) = operators.pop() {
            self.apply(operator, &mut values)?;
        }
        match (values.pop(), values.is_empty()) {
            (Some(value), true) => Ok(value.normalized()),
            _ => Err(EvalError::EmptyStack),
        }
    }

    fn operand(&self, element: &StackElement) -> Result<RationalValue, EvalError> {
        match element {
            StackElement::NumberLiteral(value) => Ok(value.clone()),
            StackElement::Variable(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
            StackElement::SubExpression(stack) => self.stack(stack),
            StackElement::FunctionCall { handle, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.stack(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                handle.call(&arguments).map_err(|source| EvalError::Function {
                    alias: handle.alias().to_string(),
                    source,
                })
            }
            other => panic!("Internal bug: {:?} is not an operand", other),
        }
    }

    fn apply(&self, operator: BinaryOperator, values: &mut Vec<RationalValue>) -> Result<(), EvalError> {
        let right = values.pop().ok_or(EvalError::EmptyStack)?;
        let left = values.pop().ok_or(EvalError::EmptyStack)?;
        let result = match operator {
            BinaryOperator::Add => &left + &right,
            BinaryOperator::Subtract => &left - &right,
            BinaryOperator::Multiply => &left * &right,
            BinaryOperator::Divide => left.checked_div(&right)?,
            BinaryOperator::Power => {
                let exponent = self.exponent(&right)?;
                self.check_power_size(&left, exponent)?;
                left.pow(exponent)?
            }
        };
        values.push(result.normalized());
        Ok(())
    }

    /// Reject a power whose size bound exceeds the limit before computing it
    fn check_power_size(&self, base: &RationalValue, exponent: i64) -> Result<(), EvalError> {
        let base = base.normalized();
        let bits = base.numerator().bits().max(base.denominator().bits());
        let limit = self.config.max_result_bits;
        if bits.saturating_mul(exponent.unsigned_abs()) > limit {
            return Err(EvalError::ResultTooLarge { limit });
        }
        Ok(())
    }

    fn exponent(&self, value: &RationalValue) -> Result<i64, EvalError> {
        if !value.is_integer() {
            return Err(EvalError::NonIntegerExponent(value.to_string()));
        }
        let limit = self.config.max_exponent;
        value
            .to_integer()
            .to_i64()
            .filter(|exponent| exponent.unsigned_abs() <= u64::from(limit))
            .ok_or_else(|| EvalError::ExponentTooLarge {
                exponent: value.to_string(),
                limit,
            })
    }
}
