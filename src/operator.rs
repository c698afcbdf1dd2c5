/// Prefix operators allowed in front of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
}

impl UnaryOperator {
    /// The operator as written in an expression
    pub fn symbol(self) -> char {
        match self {
            Self::Negate => '-',
        }
    }

    /// The operator written as `symbol`, if any
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '-' => Some(Self::Negate),
            _ => None,
        }
    }
}

/// Allowed infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    /// The operator as written in an expression
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Power => '^',
        }
    }

    /// The operator written as `symbol`, if any
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            '^' => Some(Self::Power),
            _ => None,
        }
    }

    /// Get the operator precedence. Operators with higher precedence should be
    /// evaluated first.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
            Self::Power => 3,
        }
    }

    /// Check if the operator is left associative
    pub fn is_left_associative(self) -> bool {
        match self {
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => true,
            Self::Power => false,
        }
    }

    /// Check if the operator is right associative
    pub fn is_right_associative(self) -> bool {
        !self.is_left_associative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case('+' => Some(BinaryOperator::Add) ; "plus")]
    #[test_case('-' => Some(BinaryOperator::Subtract) ; "minus")]
    #[test_case('*' => Some(BinaryOperator::Multiply) ; "times")]
    #[test_case('/' => Some(BinaryOperator::Divide) ; "slash")]
    #[test_case('^' => Some(BinaryOperator::Power) ; "caret")]
    #[test_case('%' => None ; "percent")]
    fn binary_symbols(symbol: char) -> Option<BinaryOperator> {
        let operator = BinaryOperator::from_symbol(symbol);
        if let Some(operator) = operator {
            assert_eq!(operator.symbol(), symbol);
        }
        operator
    }

    #[test]
    fn precedence() {
        assert!(BinaryOperator::Multiply.precedence() > BinaryOperator::Subtract.precedence());
        assert!(BinaryOperator::Power.precedence() > BinaryOperator::Divide.precedence());
        assert!(BinaryOperator::Power.is_right_associative());
        assert!(BinaryOperator::Subtract.is_left_associative());
        assert_eq!(UnaryOperator::from_symbol('-'), Some(UnaryOperator::Negate));
        assert_eq!(UnaryOperator::Negate.symbol(), '-');
    }
}
