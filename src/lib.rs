#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::needless_return,
    clippy::missing_docs_in_private_items,
    clippy::non_ascii_literal
)]

//! Cruncher, a crate for exact evaluation of mathematical expressions.
//!
//! This crate provide run-time evaluation of mathematical expressions,
//! embedded in strings, over exact rational numbers. The easiest way to use
//! this crate is with the [`eval`](fn.eval.html) function:
//!
//! ```
//! use std::collections::HashMap;
//! use cruncher::RationalValue;
//!
//! assert_eq!(cruncher::eval("3 + 5 * 2", &HashMap::new()), Ok(RationalValue::from(13_i64)));
//! assert_eq!(cruncher::eval("0.1 + 0.2", &HashMap::new()).unwrap().to_string(), "0.3");
//! ```
//!
//! The second argument to `eval` is a [`HashMap`](std::collections::HashMap),
//! that can define variables:
//!
//! ```
//! use std::collections::HashMap;
//! use cruncher::RationalValue;
//!
//! let mut context: HashMap<String, RationalValue> = HashMap::new();
//! context.insert("a".into(), "3.5".parse().unwrap());
//! assert_eq!(cruncher::eval("2 * a", &context), Ok(RationalValue::from(7_i64)));
//! ```
//!
//! It is also possible to separate the parsing from the evaluation of an
//! expression with the [`Expr`](struct.Expr.html) type. This allow to reuse
//! the same expression with different values for variables.
//!
//! ```
//! use std::collections::HashMap;
//! use cruncher::{Expr, RationalValue};
//!
//! let expr = Expr::parse("3 / c + b").unwrap();
//! let mut context: HashMap<String, RationalValue> = HashMap::new();
//! context.insert("c".into(), RationalValue::from(9_i64));
//! context.insert("b".into(), RationalValue::from(5_i64));
//! assert_eq!(expr.eval(&context).unwrap().to_string(), "5.{3}R");
//!
//! context.insert("b".into(), RationalValue::from(10_i64));
//! assert_eq!(expr.eval(&context).unwrap().to_string(), "10.{3}R");
//! ```
//!
//! # Language definition
//!
//! The language implemented by cruncher can contain the following elements:
//!
//! - number literals: `12`, `-13.567`, `1.5E-3`. A fraction never ends with
//!   a `0`, and scientific notation has a single non zero digit before the
//!   point;
//! - groups, opened by `(`, `[` or `{` and closed by the matching token;
//! - mathematical operators: `+` for addition, `-` for subtraction,
//!   `*` for multiplication, `/` for division and `^` for exponentiation
//!   by an integer;
//! - the unary `-`, applying to the operand right after it;
//! - variables. Variables names are ASCII only, start by a letter or `_`,
//!   and can contain letters, digits and `_`;
//! - function call: `sum(1, 2, 3)`, `faculty{4}`. The builtin functions are
//!   listed in [`FUNCTIONS`]. Other functions can be provided through a
//!   [`FunctionTable`].
//!
//! Whitespace is ignored and `$` is reserved. Any other symbol is rejected.
//!
//! Values are printed in the literal notation, where a repeating block of
//! digits is written between braces and followed by `R`: `1/7` is
//! `0.{142857}R`. Such literals are read back by
//! [`RationalValue::from_str`](std::str::FromStr::from_str). Inside an
//! expression braces always form a group.
//!
//! # Technical details
//!
//! The input is first split into a tree of nested groups ([`parse`]). The
//! content of each group is then classified with composed regular grammars
//! ([`grammar`]) into an [`EvaluationStack`], which is evaluated with a
//! Shunting-Yard algorithm.

#[macro_use]
extern crate lazy_static;

mod config;
mod error;
mod eval;
mod expr;
mod functions;
pub mod grammar;
mod operator;
mod rational;
mod resolver;
mod stack;
mod text;
mod tree;

pub use config::Config;
pub use error::{
    ArithmeticError, Error, ErrorKind, EvalError, GrammarError, ParseError, ResolveError,
};
pub use eval::{evaluate, evaluate_with};
pub use expr::{eval, Expr};
pub use functions::{
    Arity, FunctionHandle, FunctionLookup, FunctionTable, FunctionTableBuilder, NumericFunction,
    FUNCTIONS, MAX_FACULTY_ARGUMENT,
};
pub use operator::{BinaryOperator, UnaryOperator};
pub use rational::{RationalValue, MAX_LITERAL_EXPONENT};
pub use resolver::{resolve, resolve_with, ComponentResolver, NumberFactory, RationalFactory};
pub use stack::{EvaluationStack, StackElement};
pub use text::{CaretMode, PositionMappedText};
pub use tree::{
    end_token_for, parse, parse_with, Expression, ExpressionId, ExpressionTree, GroupId,
    MultiDimensionalExpression, NodeState, PLACEHOLDER,
};
