use thiserror::Error;

/// Broad classification of every error produced by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Blank input or use of a reserved character
    Input,
    /// Unbalanced or misplaced grouping tokens
    Structural,
    /// Inconsistent grammar tables (programming error)
    Grammar,
    /// Content that could not be classified into an operation
    Resolution,
    /// Zero denominators and divisions by zero
    Arithmetic,
    /// Failures while walking an evaluation stack
    Evaluation,
}

/// Errors raised while turning raw text into an expression tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input is blank once newlines or whitespace are removed
    #[error("ParseError: the expression is empty")]
    EmptyInput,
    /// The input contains a character the parser uses internally
    #[error("ParseError: reserved character '{character}' used at {positions:?}\n{diagnostic}")]
    IllegalReservedCharacterUsage {
        /// The offending character
        character: char,
        /// Positions in the stripped text
        positions: Vec<usize>,
        /// Caret rendering of the positions
        diagnostic: String,
    },
    /// A closing token without any open group
    #[error("ParseError: unexpected end token '{token}' at {position}\n{diagnostic}")]
    UnexpectedEndToken {
        /// The closing token found
        token: char,
        /// Position in the stripped text
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// A dimension separator outside of any group
    #[error("ParseError: unexpected dimension token ',' at {position}\n{diagnostic}")]
    UnexpectedDimensionToken {
        /// Position in the stripped text
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// A group closed with a token that does not match its opening token
    #[error(
        "ParseError: expression opened at {start_position} expects '{expected}' but was closed by '{found}' at {position}\n{diagnostic}"
    )]
    ExpressionNotProperlyClosed {
        /// The token matching the opening token
        expected: char,
        /// The token actually found
        found: char,
        /// Position of the opening token
        start_position: usize,
        /// Position of the wrong closing token
        position: usize,
        /// Caret rendering of both positions
        diagnostic: String,
    },
    /// A separator or closing token directly follows a token that needs content
    #[error("ParseError: expression expected before position {position}\n{diagnostic}")]
    ExpressionExpected {
        /// Position of the token missing its preceding content
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// The input ended while groups were still open
    #[error("ParseError: unclosed expressions, expecting {}\n{diagnostic}", describe_pending(.pending))]
    UnclosedExpressions {
        /// Expected end token and opening position of every pending group, outermost first
        pending: Vec<(char, usize)>,
        /// Caret rendering of the opening positions
        diagnostic: String,
    },
    /// Groups nested deeper than the configured limit
    #[error("ParseError: groups nested deeper than {limit} at {position}\n{diagnostic}")]
    NestingTooDeep {
        /// Configured maximum depth
        limit: usize,
        /// Position of the opening token past the limit
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// A caret was requested outside of the rendered text
    #[error("ParseError: position {position} is out of range for length {length}")]
    PositionOutOfRange {
        /// The requested position
        position: usize,
        /// Length of the text
        length: usize,
    },
    /// A literal that does not follow the number notation
    #[error("ParseError: '{literal}' is not a valid number")]
    InvalidNumber {
        /// The rejected literal
        literal: String,
    },
    /// An arithmetic failure while building a literal
    #[error("ParseError: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

fn describe_pending(pending: &[(char, usize)]) -> String {
    pending
        .iter()
        .map(|(token, position)| format!("'{}' for {}", token, position))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ParseError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput | Self::IllegalReservedCharacterUsage { .. } => ErrorKind::Input,
            Self::UnexpectedEndToken { .. }
            | Self::UnexpectedDimensionToken { .. }
            | Self::ExpressionNotProperlyClosed { .. }
            | Self::ExpressionExpected { .. }
            | Self::UnclosedExpressions { .. }
            | Self::NestingTooDeep { .. }
            | Self::PositionOutOfRange { .. } => ErrorKind::Structural,
            Self::InvalidNumber { .. } => ErrorKind::Resolution,
            Self::Arithmetic(_) => ErrorKind::Arithmetic,
        }
    }
}

/// Errors raised while classifying an expression tree into an evaluation stack
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The content of an expression does not begin with an operand
    #[error("ResolveError: expression does not start with a unary operation at {position}\n{diagnostic}")]
    ExpressionDoesNotStartWithUnaryOperation {
        /// Position in the stripped text
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// Text left over after the last operation that could be matched
    #[error("ResolveError: unexpected content in operation at {position}\n{diagnostic}")]
    UnexpectedContentInOperation {
        /// Position in the stripped text
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// No function is registered for the alias with this number of arguments
    #[error("ResolveError: unknown method '{alias}' with {arity} argument(s) at {position}\n{diagnostic}")]
    UnknownMethod {
        /// Function alias
        alias: String,
        /// Number of arguments supplied
        arity: usize,
        /// Position of the alias in the stripped text
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// A bare group used as an operand holds more than one dimension
    #[error(
        "ResolveError: sub-expression at {position} has {dimension} dimensions where exactly 1 is required\n{diagnostic}"
    )]
    AmbiguousSubExpression {
        /// Number of comma separated children in the group
        dimension: usize,
        /// Position of the opening token in the stripped text
        position: usize,
        /// Caret rendering of the position
        diagnostic: String,
    },
    /// A literal matched the grammar but could not be turned into a value
    #[error("ResolveError: invalid number '{literal}': {reason}")]
    InvalidNumber {
        /// The literal text
        literal: String,
        /// Why the conversion failed
        reason: String,
    },
}

impl ResolveError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Resolution
    }
}

/// Errors of exact rational arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// A rational was built with a zero denominator
    #[error("ArithmeticError: denominator must not be zero")]
    ZeroDenominator,
    /// Division by zero or reciprocal of zero
    #[error("ArithmeticError: division by zero")]
    DivideByZero,
    /// An argument outside the domain of an operation
    #[error("ArithmeticError: {0}")]
    Domain(String),
}

impl ArithmeticError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Arithmetic
    }
}

/// Errors raised while composing grammar components
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Number of '(' in the template differs from the declared names
    #[error("GrammarError: '{description}' opens {groups} group(s) but names {names}")]
    GroupCountMismatch {
        /// Component description
        description: String,
        /// Groups opened by the template
        groups: usize,
        /// Names supplied
        names: usize,
    },
    /// Number of '%s' in the template differs from the supplied parts
    #[error("GrammarError: '{description}' has {placeholders} placeholder(s) but {parts} part(s)")]
    PlaceholderCountMismatch {
        /// Component description
        description: String,
        /// Placeholders in the template
        placeholders: usize,
        /// Parts supplied
        parts: usize,
    },
    /// A ')' without a matching '(' in the template
    #[error("GrammarError: '{description}' closes a group that was never opened")]
    UnbalancedTemplate {
        /// Component description
        description: String,
    },
    /// The assembled pattern is not a valid regular expression
    #[error("GrammarError: '{description}' does not compile: {message}")]
    InvalidPattern {
        /// Component description
        description: String,
        /// Message of the regex compiler
        message: String,
    },
}

impl GrammarError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Grammar
    }
}

/// Errors raised while evaluating an evaluation stack
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Unknown variable during evaluation
    #[error("NameError: name '{0}' is not defined")]
    UnknownVariable(String),
    /// `^` with a fractional exponent
    #[error("EvalError: exponent {0} is not an integer")]
    NonIntegerExponent(String),
    /// `^` with an exponent above the configured limit
    #[error("EvalError: exponent {exponent} exceeds the limit of {limit}")]
    ExponentTooLarge {
        /// Rendered exponent
        exponent: String,
        /// Configured maximum
        limit: u32,
    },
    /// `^` whose result would exceed the configured size
    #[error("EvalError: power result would exceed {limit} bits")]
    ResultTooLarge {
        /// Configured maximum in bits
        limit: u64,
    },
    /// Arithmetic failure in an operator
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    /// A registered function failed
    #[error("EvalError: function '{alias}' failed: {source}")]
    Function {
        /// Function alias
        alias: String,
        /// Underlying failure
        source: ArithmeticError,
    },
    /// A stack or operand sequence without any value
    #[error("EvalError: nothing to evaluate")]
    EmptyStack,
}

impl EvalError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Arithmetic(_) | Self::Function { .. } => ErrorKind::Arithmetic,
            _ => ErrorKind::Evaluation,
        }
    }
}

/// Error type of the one-shot helpers, wrapping every stage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Evaluation failed
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(err) => err.kind(),
            Self::Resolve(err) => err.kind(),
            Self::Eval(err) => err.kind(),
        }
    }
}
