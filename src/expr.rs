use crate::config::Config;
use crate::error::Error;
use crate::eval::evaluate_with;
use crate::functions::{FunctionLookup, FUNCTIONS};
use crate::rational::RationalValue;
use crate::resolver::{resolve_with, NumberFactory, RationalFactory};
use crate::stack::EvaluationStack;
use crate::tree::{parse_with, ExpressionTree};
use std::collections::{HashMap, HashSet};

/// Evaluate a single expression from `input`.
///
/// Returns `Ok(result)` if the evaluation is successful, or `Err(cause)` if
/// parsing, resolving or evaluating the expression failed.
///
/// # Example
///
/// ```
/// # use std::collections::HashMap;
/// # use cruncher::{eval, RationalValue};
///
/// assert_eq!(eval("45 - 2^3", &HashMap::new()), Ok(RationalValue::from(37_i64)));
///
/// let mut context: HashMap<String, RationalValue> = HashMap::new();
/// context.insert("a".into(), RationalValue::from(-5_i64));
/// assert_eq!(eval("a / 3", &context).unwrap().to_string(), "-1.{6}R");
/// ```
pub fn eval<'a, C>(input: &str, context: C) -> Result<RationalValue, Error>
where
    C: Into<&'a HashMap<String, RationalValue>>,
{
    Expr::parse(input).and_then(|expr| expr.eval(context))
}

/// A parsed and resolved mathematical expression.
///
/// # Examples
/// ```
/// # use cruncher::{Expr, RationalValue};
/// # use std::collections::HashMap;
/// let expr = Expr::parse("3 + 5 * 2").unwrap();
/// assert_eq!(expr.eval(&HashMap::new()), Ok(RationalValue::from(13_i64)));
///
/// let mut context: HashMap<String, RationalValue> = HashMap::new();
/// context.insert("a".into(), "0.5".parse().unwrap());
/// let expr = Expr::parse("-2 * a").unwrap();
/// assert_eq!(expr.eval(&context), Ok(RationalValue::from(-1_i64)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    tree: ExpressionTree,
    stack: EvaluationStack,
    config: Config,
}

impl Expr {
    /// Parse the given mathematical `expression` into an `Expr`, resolving
    /// functions against the builtin [`FUNCTIONS`].
    ///
    /// # Examples
    /// ```
    /// # use cruncher::Expr;
    /// // A valid expression
    /// assert!(Expr::parse("3 + 5 * 2").is_ok());
    /// // an invalid expression
    /// assert!(Expr::parse("3eff + 5 * 2").is_err());
    /// ```
    pub fn parse(expression: &str) -> Result<Self, Error> {
        Self::parse_with(expression, &Config::default(), &*FUNCTIONS, &RationalFactory)
    }

    /// Parse `expression` with explicit settings and collaborators.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`](crate::ParseError) or
    /// [`ResolveError`](crate::ResolveError).
    pub fn parse_with(
        expression: &str,
        config: &Config,
        functions: &dyn FunctionLookup,
        numbers: &dyn NumberFactory,
    ) -> Result<Self, Error> {
        let tree = parse_with(expression, config)?;
        let stack = resolve_with(&tree, functions, numbers, config)?;
        Ok(Self {
            tree,
            stack,
            config: config.clone(),
        })
    }

    /// Evaluate the expression in a given `context`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cruncher::{Expr, RationalValue};
    /// # use std::collections::HashMap;
    /// let expr = Expr::parse("3 + a").unwrap();
    ///
    /// let mut context: HashMap<String, RationalValue> = HashMap::new();
    /// context.insert("a".into(), RationalValue::from(-5_i64));
    /// assert_eq!(expr.eval(&context), Ok(RationalValue::from(-2_i64)));
    /// context.insert("a".into(), RationalValue::from(2_i64));
    /// assert_eq!(expr.eval(&context), Ok(RationalValue::from(5_i64)));
    /// ```
    pub fn eval<'a, C>(&self, context: C) -> Result<RationalValue, Error>
    where
        C: Into<&'a HashMap<String, RationalValue>>,
    {
        Ok(evaluate_with(&self.stack, context.into(), &self.config)?)
    }

    /// Names of the variables used in the expression.
    ///
    /// # Examples
    /// ```
    /// # use cruncher::Expr;
    /// # use std::collections::HashSet;
    /// let expr = Expr::parse("3 + 5 * 2").unwrap();
    /// assert_eq!(expr.variables(), HashSet::new());
    ///
    /// let expr = Expr::parse("3 + a").unwrap();
    /// assert_eq!(expr.variables(), HashSet::from(["a"]));
    /// ```
    pub fn variables(&self) -> HashSet<&str> {
        self.stack.variables().into_iter().collect()
    }

    /// The parse tree
    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    /// The resolved stack
    pub fn stack(&self) -> &EvaluationStack {
        &self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::{Expr, HashMap};
    use crate::error::{ErrorKind, EvalError};
    use crate::functions::{Arity, FunctionTable};
    use crate::text::CaretMode;
    use crate::{ArithmeticError, Config, RationalFactory, RationalValue};
    use std::collections::HashSet;

    fn value(literal: &str) -> RationalValue {
        literal.parse().unwrap()
    }

    #[test]
    fn parse() {
        let valid_expressions = [
            "3 + -5E67",
            "(3 + -5)*45",
            "(3.5 + 5)*\t\n45",
            "(3 + 5^6E-6)*45",
            "abs(34) ^ floor(2.5)",
            "abc_ty8789",
            "sum[1, {2}, (3)]",
        ];
        for expr in &valid_expressions {
            assert!(Expr::parse(expr).is_ok(), "{}", expr);
        }
    }

    #[test]
    fn parse_errors() {
        let invalid_expressions = [
            ("", ErrorKind::Input),
            ("1 + $", ErrorKind::Input),
            ("(1 + 2", ErrorKind::Structural),
            ("(1 + 2]", ErrorKind::Structural),
            ("1 + ()", ErrorKind::Structural),
            ("3. + 5", ErrorKind::Resolution),
            ("sqrt(9)", ErrorKind::Resolution),
            ("1E100001", ErrorKind::Resolution),
        ];
        for (expr, kind) in &invalid_expressions {
            let err = Expr::parse(expr).unwrap_err();
            assert_eq!(err.kind(), *kind, "{}", expr);
        }
    }

    #[test]
    fn deep_nesting() {
        let nested = |depth: usize| format!("{}2{}", "(".repeat(depth), ")".repeat(depth));
        let empty_context = &HashMap::new();
        assert_eq!(Expr::parse(&nested(64)).unwrap().eval(empty_context), Ok(value("2")));
        let err = Expr::parse(&nested(5000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn eval() {
        let mut context: HashMap<String, RationalValue> = HashMap::new();
        context.insert("a".into(), value("1"));
        context.insert("b".into(), value("2"));

        let empty_context = &HashMap::new();

        let eval_pairs = [
            ("3 + 5", empty_context, "8"),
            ("2 - 5", empty_context, "-3"),
            ("2 * 5", empty_context, "10"),
            ("10 / 4", empty_context, "2.5"),
            ("2 ^ 3", empty_context, "8"),
            ("-3", empty_context, "-3"),
            ("25 + -3", empty_context, "22"),
            ("25 - -3", empty_context, "28"),
            ("3 + 5 * 2", empty_context, "13"),
            ("1 / 7", empty_context, "0.{142857}R"),
            ("faculty(3) * 3", empty_context, "18"),
            ("2 * a", &context, "2"),
            ("(a + b)^2", &context, "9"),
        ];
        for eval_pair in &eval_pairs {
            let result = super::eval(eval_pair.0, eval_pair.1).unwrap();
            assert_eq!(result.to_exact_string(), eval_pair.2, "{}", eval_pair.0);
        }

        let result = super::eval("2 * z", &context);
        assert_eq!(
            result.err().unwrap().to_string(),
            "NameError: name 'z' is not defined"
        );
        let result = super::eval("2 * a", empty_context);
        assert_eq!(
            result.err().unwrap().to_string(),
            "NameError: name 'a' is not defined"
        );
    }

    #[test]
    fn variables() {
        let expr = Expr::parse("(a + b)^2").unwrap();
        assert_eq!(expr.variables(), HashSet::from(["a", "b"]));

        let expr = Expr::parse("a * abs(b + c)").unwrap();
        assert_eq!(expr.variables(), HashSet::from(["a", "b", "c"]));
    }

    #[test]
    fn custom_functions() {
        fn double(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
            Ok(&arguments[0] + &arguments[0])
        }
        let functions = FunctionTable::builder()
            .register("double", Arity::Exactly(1), double)
            .build();
        let config = Config::default().with_max_exponent(4);
        let expr = Expr::parse_with("double(x) ^ 2", &config, &functions, &RationalFactory).unwrap();
        assert_eq!(expr.stack().to_string(), "double(x)^2");
        assert_eq!(expr.tree().to_string(), "double(x)^2");

        let mut context = HashMap::new();
        context.insert("x".to_string(), value("1.5"));
        assert_eq!(expr.eval(&context).unwrap(), value("9"));

        let expr = Expr::parse_with("x ^ 5", &config, &functions, &RationalFactory).unwrap();
        assert_eq!(
            expr.eval(&context),
            Err(EvalError::ExponentTooLarge {
                exponent: "5".into(),
                limit: 4
            }
            .into())
        );
        assert!(Expr::parse_with("sum(1)", &config, &functions, &RationalFactory).is_err());
    }

    #[test]
    fn diagnostics_follow_config() {
        let config = Config::default()
            .with_caret_mode(CaretMode::Original)
            .with_caret_index(false);
        let err = Expr::parse_with("1 + (2", &config, &*crate::FUNCTIONS, &RationalFactory)
            .unwrap_err();
        assert!(err.to_string().ends_with("original: 1 + (2\n              ^"), "{}", err);
    }
}
