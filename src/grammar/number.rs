use super::ComponentName::{
    BinaryOperator, Decimal, DecimalWithRepeatingFraction, Exponent, FractionNonRepeating,
    FractionRepeating, FunctionArguments, FunctionCall, FunctionName, Integer, IntegerPart,
    Negation, NonFunctional, Number, Operand, Scientific, ScientificWithRepeatingFraction,
    SubExpression, UnaryOperation, Variable,
};
use super::{find, ComponentName, ComponentStructure, GrammarComponent};
use crate::error::GrammarError;
use regex::Captures;
use std::collections::BTreeMap;

lazy_static! {
    /// The grammar tables, built once and shared read-only
    pub static ref GRAMMAR: NumberGrammar = NumberGrammar::build()
        .unwrap_or_else(|err| panic!("Internal bug: invalid built-in grammar: {}", err));
}

/// The grammar elements callers match against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarElement {
    /// `-?(0|[1-9][0-9]*)`
    Integer,
    /// `<integer>.<fraction without trailing zero>`
    Decimal,
    /// `<integer>.<digits>{<repeating digits>}R`
    DecimalWithRepeatingFraction,
    /// `<digit>(.<fraction>)?E<integer>`
    Scientific,
    /// `<digit>.<digits>{<repeating digits>}RE<integer>`
    ScientificWithRepeatingFraction,
    /// Any of the number forms, most specific first
    AnyNumber,
    /// Optional negation followed by an operand
    UnaryOperation,
    /// One of `+ - * / ^`
    BinaryOperator,
    /// A binary operator followed by a unary operation
    BinaryOperation,
    /// Any of the grouping and separator tokens
    AggregationToken,
}

impl GrammarElement {
    /// Every element, in declaration order
    pub const ALL: [GrammarElement; 10] = [
        Self::Integer,
        Self::Decimal,
        Self::DecimalWithRepeatingFraction,
        Self::Scientific,
        Self::ScientificWithRepeatingFraction,
        Self::AnyNumber,
        Self::UnaryOperation,
        Self::BinaryOperator,
        Self::BinaryOperation,
        Self::AggregationToken,
    ];

    /// The compiled component for this element
    pub fn component(self) -> &'static GrammarComponent {
        let grammar: &'static NumberGrammar = &GRAMMAR;
        match self {
            Self::Integer => &grammar.integer_number,
            Self::Decimal => &grammar.decimal,
            Self::DecimalWithRepeatingFraction => &grammar.decimal_repeating,
            Self::Scientific => &grammar.scientific,
            Self::ScientificWithRepeatingFraction => &grammar.scientific_repeating,
            Self::AnyNumber => &grammar.any_number,
            Self::UnaryOperation => &grammar.unary_operation,
            Self::BinaryOperator => &grammar.binary_operator,
            Self::BinaryOperation => &grammar.binary_operation,
            Self::AggregationToken => &grammar.aggregation_token,
        }
    }
}

/// Every component of the number and operation grammar
#[derive(Debug)]
pub struct NumberGrammar {
    pub(crate) integer_number: GrammarComponent,
    pub(crate) decimal: GrammarComponent,
    pub(crate) decimal_repeating: GrammarComponent,
    pub(crate) scientific: GrammarComponent,
    pub(crate) scientific_repeating: GrammarComponent,
    pub(crate) any_number: GrammarComponent,
    pub(crate) unary_operation: GrammarComponent,
    pub(crate) binary_operator: GrammarComponent,
    pub(crate) binary_operation: GrammarComponent,
    pub(crate) aggregation_token: GrammarComponent,
}

impl NumberGrammar {
    /// Assemble every component.
    ///
    /// # Errors
    ///
    /// Fails only when the tables below are inconsistent.
    pub fn build() -> Result<Self, GrammarError> {
        use GrammarComponent as G;

        let cipher = G::leaf("cipher", "[0-9]")?;
        let non_zero_cipher = G::leaf("non zero cipher", "[1-9]")?;
        let negation = G::leaf("negation", "-")?;
        let placeholder = G::leaf("sub expression placeholder", r"\$")?;
        let name = G::leaf("name", "[a-zA-Z_][a-zA-Z_0-9]*")?;
        let binary_operator = G::leaf("binary operator", r"[-+*/^]")?;
        let aggregation_token = G::leaf("aggregation token", r"[{}()\[\],]")?;

        let positive_integer = G::compose("positive integer", "%s%s*", &[], &[&non_zero_cipher, &cipher])?;
        let unsigned_integer = G::compose("unsigned integer", "%s|0", &[], &[&positive_integer])?;
        let integer = G::compose("integer", "%s?%s|0", &[], &[&negation, &positive_integer])?;
        // `-0` only ahead of a fraction
        let integer_part = G::compose("integer part", "%s?%s", &[], &[&negation, &unsigned_integer])?;
        let mantissa = G::compose("mantissa", "%s?%s", &[], &[&negation, &non_zero_cipher])?;

        let fraction_non_repeating =
            G::compose("fraction non repeating", "%s*%s", &[], &[&cipher, &non_zero_cipher])?;
        let fraction_repeating = G::compose(
            "fraction repeating",
            "%s*%s+%s*",
            &[],
            &[&cipher, &non_zero_cipher, &cipher],
        )?;
        let repeating_suffix = G::compose(
            "repeating fraction suffix",
            r"(%s)?\{(%s)\}R",
            &[FractionNonRepeating, FractionRepeating],
            &[&fraction_non_repeating, &fraction_repeating],
        )?;

        let integer_number = G::compose("integer number", "(%s)", &[IntegerPart], &[&integer])?;
        let decimal = G::compose(
            "decimal",
            r"(%s)\.(%s)",
            &[IntegerPart, FractionNonRepeating],
            &[&integer_part, &fraction_non_repeating],
        )?;
        let decimal_repeating = G::compose(
            "decimal with repeating fraction",
            r"(%s)\.%s",
            &[IntegerPart],
            &[&integer_part, &repeating_suffix],
        )?;
        let scientific = G::compose(
            "scientific",
            r"(%s)(\.(%s))?E(%s)",
            &[IntegerPart, NonFunctional, FractionNonRepeating, Exponent],
            &[&mantissa, &fraction_non_repeating, &integer],
        )?;
        let scientific_repeating = G::compose(
            "scientific with repeating fraction",
            r"(%s)\.%sE(%s)",
            &[IntegerPart, Exponent],
            &[&mantissa, &repeating_suffix, &integer],
        )?;
        let any_number = G::compose(
            "any number",
            "(%s)|(%s)|(%s)|(%s)|(%s)",
            &[
                ScientificWithRepeatingFraction,
                Scientific,
                DecimalWithRepeatingFraction,
                Decimal,
                Integer,
            ],
            &[
                &scientific_repeating,
                &scientific,
                &decimal_repeating,
                &decimal,
                &integer_number,
            ],
        )?;

        let function_call = G::compose(
            "function call",
            "(%s)(%s+)",
            &[FunctionName, FunctionArguments],
            &[&name, &placeholder],
        )?;
        let operand = G::compose(
            "any number equivalent",
            "(%s)|(%s)|(%s)|(%s)",
            &[SubExpression, FunctionCall, Variable, Number],
            &[&placeholder, &function_call, &name, &any_number],
        )?;
        let unary_operation = G::compose(
            "unary operation",
            "(%s)?(%s)",
            &[Negation, Operand],
            &[&negation, &operand],
        )?;
        let binary_operation = G::compose(
            "binary operation",
            "(%s)(%s)",
            &[BinaryOperator, UnaryOperation],
            &[&binary_operator, &unary_operation],
        )?;

        Ok(Self {
            integer_number,
            decimal,
            decimal_repeating,
            scientific,
            scientific_repeating,
            any_number,
            unary_operation,
            binary_operator,
            binary_operation,
            aggregation_token,
        })
    }
}

/// The pieces of a number literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberParts {
    /// Which form matched
    pub kind: GrammarElement,
    /// Signed integer part, `-13` for `-13.567`
    pub integer: String,
    /// Fraction digits before the repeating block, if any
    pub non_repeating: Option<String>,
    /// Digits of the repeating block, if any
    pub repeating: Option<String>,
    /// Decimal exponent, if any
    pub exponent: Option<String>,
}

const NUMBER_FORMS: [(ComponentName, GrammarElement); 5] = [
    (
        ScientificWithRepeatingFraction,
        GrammarElement::ScientificWithRepeatingFraction,
    ),
    (Scientific, GrammarElement::Scientific),
    (
        DecimalWithRepeatingFraction,
        GrammarElement::DecimalWithRepeatingFraction,
    ),
    (Decimal, GrammarElement::Decimal),
    (Integer, GrammarElement::Integer),
];

impl NumberParts {
    /// Extract the parts from a match of the any-number grammar.
    ///
    /// `number` holds the any-number alternatives, shifted to wherever the
    /// any-number grammar sits in the matched pattern.
    pub(crate) fn from_captures(captures: &Captures, number: &[ComponentStructure]) -> Option<Self> {
        let (form, kind) = NUMBER_FORMS.iter().copied().find(|(form, _)| {
            find(number, &[*form]).map_or(false, |node| captures.get(node.group_index()).is_some())
        })?;
        let node = find(number, &[form])?;
        let text = |path: &[ComponentName]| {
            node.capture(captures, path)
                .map(|m| m.as_str().to_string())
                .filter(|text| !text.is_empty())
        };

        Some(Self {
            kind,
            integer: text(&[IntegerPart])?,
            non_repeating: text(&[FractionNonRepeating])
                .or_else(|| text(&[NonFunctional, FractionNonRepeating])),
            repeating: text(&[FractionRepeating]),
            exponent: text(&[Exponent]),
        })
    }

    /// The parts keyed by their grammar name, absent parts left out
    pub fn to_components(&self) -> BTreeMap<ComponentName, String> {
        let mut components = BTreeMap::new();
        components.insert(IntegerPart, self.integer.clone());
        let optional = [
            (FractionNonRepeating, &self.non_repeating),
            (FractionRepeating, &self.repeating),
            (Exponent, &self.exponent),
        ];
        for (name, value) in optional.iter() {
            if let Some(value) = value {
                components.insert(*name, value.clone());
            }
        }
        components
    }
}

/// Split a complete number literal into its parts.
///
/// # Examples
///
/// ```
/// # use cruncher::grammar::decompose;
/// let parts = decompose("-14.767{01234}R").unwrap();
/// assert_eq!(parts.integer, "-14");
/// assert_eq!(parts.non_repeating.as_deref(), Some("767"));
/// assert_eq!(parts.repeating.as_deref(), Some("01234"));
/// assert!(decompose("01").is_none());
/// ```
pub fn decompose(literal: &str) -> Option<NumberParts> {
    let any_number = &GRAMMAR.any_number;
    let captures = any_number.match_whole(literal)?;
    NumberParts::from_captures(&captures, any_number.structure())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parts(
        kind: GrammarElement,
        integer: &str,
        non_repeating: Option<&str>,
        repeating: Option<&str>,
        exponent: Option<&str>,
    ) -> Option<NumberParts> {
        Some(NumberParts {
            kind,
            integer: integer.to_string(),
            non_repeating: non_repeating.map(str::to_string),
            repeating: repeating.map(str::to_string),
            exponent: exponent.map(str::to_string),
        })
    }

    #[test_case("" ; "empty")]
    #[test_case("\t" ; "tab")]
    #[test_case("Osama" ; "word")]
    #[test_case("00" ; "double zero")]
    #[test_case("01" ; "leading zero")]
    #[test_case("1.0" ; "trailing fraction zero")]
    #[test_case("+1" ; "explicit plus")]
    #[test_case("--8" ; "double negation")]
    #[test_case("2.12{00}R" ; "repeating zeros")]
    #[test_case("10E44" ; "two digit mantissa")]
    #[test_case("1E+5" ; "explicit plus exponent")]
    #[test_case("1E5.2" ; "fractional exponent")]
    #[test_case("1.0E5" ; "mantissa trailing zero")]
    #[test_case("-0" ; "negative zero")]
    #[test_case("1.10{3}R" ; "prefix ending in zero")]
    fn rejected_literals(literal: &str) {
        assert!(!GRAMMAR.any_number.is_match(literal));
        assert_eq!(decompose(literal), None);
    }

    #[test_case("-12" => parts(GrammarElement::Integer, "-12", None, None, None) ; "integer")]
    #[test_case("0" => parts(GrammarElement::Integer, "0", None, None, None) ; "zero")]
    #[test_case("-13.567" => parts(GrammarElement::Decimal, "-13", Some("567"), None, None) ; "decimal")]
    #[test_case("-14.767{01234}R" => parts(GrammarElement::DecimalWithRepeatingFraction, "-14", Some("767"), Some("01234"), None) ; "repeating")]
    #[test_case("0.{142857}R" => parts(GrammarElement::DecimalWithRepeatingFraction, "0", None, Some("142857"), None) ; "pure repeating")]
    #[test_case("0.103{3}R" => parts(GrammarElement::DecimalWithRepeatingFraction, "0", Some("103"), Some("3"), None) ; "prefix before cycle")]
    #[test_case("-0.{142857}R" => parts(GrammarElement::DecimalWithRepeatingFraction, "-0", None, Some("142857"), None) ; "negative pure repeating")]
    #[test_case("-0.5" => parts(GrammarElement::Decimal, "-0", Some("5"), None, None) ; "negative below one")]
    #[test_case("-9.767{01234}RE23" => parts(GrammarElement::ScientificWithRepeatingFraction, "-9", Some("767"), Some("01234"), Some("23")) ; "scientific repeating")]
    #[test_case("1.5E-3" => parts(GrammarElement::Scientific, "1", Some("5"), None, Some("-3")) ; "scientific")]
    #[test_case("7E0" => parts(GrammarElement::Scientific, "7", None, None, Some("0")) ; "scientific without fraction")]
    fn accepted_literals(literal: &str) -> Option<NumberParts> {
        decompose(literal)
    }

    #[test]
    fn components_by_name() {
        let components = decompose("-13.567").unwrap().to_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[&IntegerPart], "-13");
        assert_eq!(components[&FractionNonRepeating], "567");
    }

    #[test]
    fn structure_matches_compiled_groups() {
        for element in GrammarElement::ALL.iter() {
            let component = element.component();
            assert_eq!(
                component.group_count(),
                component.capture_groups(),
                "{}",
                component.description()
            );
        }
    }

    #[test]
    fn unary_operation_groups() {
        let unary = GrammarElement::UnaryOperation.component();
        let captures = unary.match_prefix("-sum$*2").unwrap();
        assert!(unary.node(&[Negation]).group_index() > 0);
        assert_eq!(&captures[0], "-sum$");
        let name = unary.node(&[Operand, FunctionCall, FunctionName]);
        assert_eq!(&captures[name.group_index()], "sum");
        assert!(captures
            .get(unary.node(&[Operand, Variable]).group_index())
            .is_none());
    }

    #[test]
    fn unary_operation_prefers_most_specific_number() {
        let unary = GrammarElement::UnaryOperation.component();
        let captures = unary.match_prefix("1.5E3+x").unwrap();
        assert_eq!(&captures[0], "1.5E3");
        let number = unary.node(&[Operand, Number]);
        let parts = NumberParts::from_captures(&captures, number.children()).unwrap();
        assert_eq!(parts.kind, GrammarElement::Scientific);

        let captures = unary.match_prefix("12.5+x").unwrap();
        assert_eq!(&captures[0], "12.5");
    }

    #[test]
    fn binary_operation_groups() {
        let binary = GrammarElement::BinaryOperation.component();
        let captures = binary.match_prefix("^-x2+1").unwrap();
        assert_eq!(&captures[binary.node(&[BinaryOperator]).group_index()], "^");
        assert_eq!(&captures[binary.node(&[UnaryOperation, Operand, Variable]).group_index()], "x2");
        assert!(binary.match_prefix("x+1").is_none());
    }

    #[test]
    fn aggregation_tokens() {
        let tokens = GrammarElement::AggregationToken.component();
        for token in ["(", ")", "[", "]", "{", "}", ","].iter() {
            assert!(tokens.is_match(token));
        }
        assert!(!tokens.is_match("$"));
    }
}
