use crate::text::CaretMode;

/// Settings shared by parsing, resolution and evaluation.
///
/// # Examples
///
/// ```
/// # use cruncher::{CaretMode, Config};
/// let config = Config::default()
///     .with_caret_mode(CaretMode::Stripped)
///     .with_max_exponent(64);
/// assert_eq!(config.max_exponent, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Which views of the input diagnostics point into
    pub caret_mode: CaretMode,
    /// Append the numeric index of the last caret to diagnostics
    pub show_caret_index: bool,
    /// Largest absolute exponent accepted by `^`
    pub max_exponent: u32,
    /// Largest size, in bits, a power may produce
    pub max_result_bits: u64,
    /// Deepest group nesting accepted by the parser
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            caret_mode: CaretMode::Both,
            show_caret_index: true,
            max_exponent: 10_000,
            max_result_bits: 1 << 22,
            max_depth: 256,
        }
    }
}

impl Config {
    /// Set the diagnostic views
    #[must_use]
    pub fn with_caret_mode(mut self, caret_mode: CaretMode) -> Self {
        self.caret_mode = caret_mode;
        self
    }

    /// Enable or disable the caret index suffix
    #[must_use]
    pub fn with_caret_index(mut self, show_caret_index: bool) -> Self {
        self.show_caret_index = show_caret_index;
        self
    }

    /// Set the largest absolute exponent accepted by `^`
    #[must_use]
    pub fn with_max_exponent(mut self, max_exponent: u32) -> Self {
        self.max_exponent = max_exponent;
        self
    }

    /// Set the largest size, in bits, a power may produce
    #[must_use]
    pub fn with_max_result_bits(mut self, max_result_bits: u64) -> Self {
        self.max_result_bits = max_result_bits;
        self
    }

    /// Set the deepest accepted group nesting
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
