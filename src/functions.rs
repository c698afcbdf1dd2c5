use crate::error::ArithmeticError;
use crate::rational::RationalValue;
use hashbrown::HashMap;
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};
use std::fmt::{self, Debug, Formatter};

/// Largest argument accepted by the builtin `faculty`
pub const MAX_FACULTY_ARGUMENT: u32 = 1_000;

/// Signature of every callable numeric function
pub type NumericFunction = fn(&[RationalValue]) -> Result<RationalValue, ArithmeticError>;

lazy_static! {
    /// The builtin exact arithmetic functions
    pub static ref FUNCTIONS: FunctionTable = FunctionTable::builder()
        .register("sum", Arity::AtLeast(1), sum)
        .register("product", Arity::AtLeast(1), product)
        .register("min", Arity::AtLeast(1), min)
        .register("max", Arity::AtLeast(1), max)
        .register("abs", Arity::Exactly(1), abs)
        .register("negate", Arity::Exactly(1), negate)
        .register("reciprocal", Arity::Exactly(1), reciprocal)
        .register("floor", Arity::Exactly(1), floor)
        .register("ceil", Arity::Exactly(1), ceil)
        .register("faculty", Arity::Exactly(1), faculty)
        .register("mod", Arity::Exactly(2), modulo)
        .build();
}

/// Numbers of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly this many
    Exactly(usize),
    /// This many or more
    AtLeast(usize),
    /// Between both bounds, inclusive
    Range(usize, usize),
}

impl Arity {
    /// Whether `count` arguments are accepted
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(expected) => count == expected,
            Self::AtLeast(minimum) => count >= minimum,
            Self::Range(minimum, maximum) => (minimum..=maximum).contains(&count),
        }
    }
}

/// A function resolved for a given alias and number of arguments
#[derive(Clone)]
pub struct FunctionHandle {
    alias: String,
    arity: usize,
    function: NumericFunction,
}

impl FunctionHandle {
    /// Wrap `function` as the implementation of `alias` with `arity` arguments
    pub fn new(alias: &str, arity: usize, function: NumericFunction) -> Self {
        Self {
            alias: alias.to_string(),
            arity,
            function,
        }
    }

    /// The alias the function was looked up by
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Number of arguments the handle was resolved for
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the function
    ///
    /// # Errors
    ///
    /// Whatever the function reports.
    pub fn call(&self, arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
        (self.function)(arguments)
    }
}

impl Debug for FunctionHandle {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("FunctionHandle")
            .field("alias", &self.alias)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for FunctionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias && self.arity == other.arity
    }
}

impl Eq for FunctionHandle {}

/// Resolves a function alias and number of arguments to a callable
pub trait FunctionLookup {
    /// The function registered for `alias` accepting `arity` arguments
    fn lookup(&self, alias: &str, arity: usize) -> Option<FunctionHandle>;
}

/// A registry of functions, each alias possibly registered for several arities
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Vec<(Arity, NumericFunction)>>,
}

impl FunctionTable {
    /// Start an empty table
    pub fn builder() -> FunctionTableBuilder {
        FunctionTableBuilder::default()
    }

    /// Every registered alias
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Whether anything is registered under `alias`
    pub fn contains(&self, alias: &str) -> bool {
        self.functions.contains_key(alias)
    }
}

impl FunctionLookup for FunctionTable {
    fn lookup(&self, alias: &str, arity: usize) -> Option<FunctionHandle> {
        self.functions
            .get(alias)?
            .iter()
            .find(|(accepted, _)| accepted.accepts(arity))
            .map(|&(_, function)| FunctionHandle::new(alias, arity, function))
    }
}

impl Debug for FunctionTable {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        let mut aliases: Vec<&str> = self.aliases().collect();
        aliases.sort_unstable();
        fmt.debug_struct("FunctionTable")
            .field("aliases", &aliases)
            .finish()
    }
}

/// Collects registrations for a [`FunctionTable`]
#[derive(Default)]
pub struct FunctionTableBuilder {
    functions: HashMap<String, Vec<(Arity, NumericFunction)>>,
}

impl FunctionTableBuilder {
    /// Register `function` for `alias`. Earlier registrations win when
    /// arities overlap.
    #[must_use]
    pub fn register(mut self, alias: &str, arity: Arity, function: NumericFunction) -> Self {
        self.functions
            .entry(alias.to_string())
            .or_insert_with(Vec::new)
            .push((arity, function));
        self
    }

    /// Freeze the registrations
    pub fn build(mut self) -> FunctionTable {
        self.functions.shrink_to_fit();
        FunctionTable {
            functions: self.functions,
        }
    }
}

fn first(arguments: &[RationalValue]) -> Result<&RationalValue, ArithmeticError> {
    arguments
        .first()
        .ok_or_else(|| ArithmeticError::Domain("missing argument".into()))
}

fn sum(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    Ok(arguments
        .iter()
        .fold(RationalValue::zero(), |total, value| &total + value)
        .normalized())
}

fn product(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    Ok(arguments
        .iter()
        .fold(RationalValue::one(), |total, value| &total * value)
        .normalized())
}

fn min(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    arguments
        .iter()
        .min()
        .cloned()
        .ok_or_else(|| ArithmeticError::Domain("missing argument".into()))
}

fn max(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    arguments
        .iter()
        .max()
        .cloned()
        .ok_or_else(|| ArithmeticError::Domain("missing argument".into()))
}

fn abs(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    Ok(first(arguments)?.abs())
}

fn negate(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    let value = first(arguments)?;
    Ok(-value)
}

fn reciprocal(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    first(arguments)?.reciprocal()
}

fn floor(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    Ok(first(arguments)?.floor())
}

fn ceil(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    Ok(first(arguments)?.ceil())
}

fn faculty(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    let value = first(arguments)?;
    let n = Some(value)
        .filter(|value| value.is_integer())
        .and_then(|value| value.to_integer().to_u32())
        .filter(|&n| n <= MAX_FACULTY_ARGUMENT)
        .ok_or_else(|| {
            ArithmeticError::Domain(format!(
                "faculty needs an integer between 0 and {}, got {}",
                MAX_FACULTY_ARGUMENT, value
            ))
        })?;
    let result = (2..=n).fold(BigInt::one(), |total, factor| total * factor);
    Ok(RationalValue::from(result))
}

/// Remainder of truncating division, with the sign of the dividend
fn modulo(arguments: &[RationalValue]) -> Result<RationalValue, ArithmeticError> {
    match arguments {
        [dividend, divisor] => {
            let quotient = RationalValue::from(dividend.checked_div(divisor)?.to_integer());
            Ok((dividend - &(divisor * &quotient)).normalized())
        }
        _ => Err(ArithmeticError::Domain("mod needs two arguments".into())),
    }
}
