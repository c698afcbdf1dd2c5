use crate::error::ParseError;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Characters removed to obtain the single-line form of the input
const LINE_BREAKS: [char; 7] = [
    '\n', '\r', '\u{0B}', '\u{0C}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Which views of the input a caret diagnostic is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaretMode {
    /// The single-line input, whitespace preserved
    Original,
    /// The input with all whitespace removed
    Stripped,
    /// Both views, original first
    Both,
}

/// Raw input with its whitespace stripped, remembering where every surviving
/// character came from.
///
/// All positions are counted in characters. Positions handed to the caret
/// helpers are positions in the stripped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMappedText {
    original: String,
    stripped: String,
    position_map: Vec<usize>,
}

impl PositionMappedText {
    /// Strip newlines, then spaces and tabs, from `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyInput`] when nothing but whitespace remains.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cruncher::PositionMappedText;
    /// let text = PositionMappedText::new("1 +\n 2").unwrap();
    /// assert_eq!(text.original(), "1 + 2");
    /// assert_eq!(text.stripped(), "1+2");
    /// assert_eq!(text.position_map(), &[0, 2, 4]);
    /// ```
    pub fn new(raw: &str) -> Result<Self, ParseError> {
        let original: String = raw.chars().filter(|c| !LINE_BREAKS.contains(c)).collect();
        if original.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let mut stripped = String::with_capacity(original.len());
        let mut position_map = Vec::with_capacity(original.len());
        for (offset, c) in original.chars().enumerate() {
            if c != ' ' && c != '\t' {
                stripped.push(c);
                position_map.push(offset);
            }
        }
        if stripped.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        Ok(Self {
            original,
            stripped,
            position_map,
        })
    }

    /// The input without line breaks
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The input without any whitespace
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    /// Offset in the original text of every stripped character
    pub fn position_map(&self) -> &[usize] {
        &self.position_map
    }

    /// Number of characters in the stripped text
    pub fn len(&self) -> usize {
        self.position_map.len()
    }

    /// Always false, construction rejects blank input
    pub fn is_empty(&self) -> bool {
        self.position_map.is_empty()
    }

    /// Offset in the original text of the stripped character at `position`
    pub fn original_position(&self, position: usize) -> Option<usize> {
        self.position_map.get(position).copied()
    }

    /// Positions in the stripped text holding any of the `reserved` characters
    pub fn reserved_char_positions(&self, reserved: &[char]) -> BTreeSet<usize> {
        self.stripped
            .chars()
            .enumerate()
            .filter(|(_, c)| reserved.contains(c))
            .map(|(position, _)| position)
            .collect()
    }

    /// Render the requested views with a `^` under each of `positions`.
    ///
    /// Every other character of the caret line is blanked, tabs excepted so
    /// that the carets stay aligned. When the original and stripped texts are
    /// identical only the stripped view is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::PositionOutOfRange`] for a position outside of the
    /// stripped text.
    pub fn caret_string(
        &self,
        mode: CaretMode,
        show_index: bool,
        positions: &BTreeSet<usize>,
    ) -> Result<String, ParseError> {
        if let Some(&position) = positions.iter().find(|&&p| p >= self.len()) {
            return Err(ParseError::PositionOutOfRange {
                position,
                length: self.len(),
            });
        }

        let mode = if self.original == self.stripped {
            CaretMode::Stripped
        } else {
            mode
        };

        let mut views = Vec::with_capacity(2);
        if mode != CaretMode::Stripped {
            let mapped: BTreeSet<usize> = positions.iter().map(|&p| self.position_map[p]).collect();
            views.push(render_view("original", &self.original, &mapped, show_index));
        }
        if mode != CaretMode::Original {
            views.push(render_view("stripped", &self.stripped, positions, show_index));
        }
        Ok(views.join("\n"))
    }

    /// Same as [`caret_string`](Self::caret_string), logging a warning and
    /// falling back to an empty diagnostic instead of failing.
    pub(crate) fn diagnostic(
        &self,
        mode: CaretMode,
        show_index: bool,
        positions: &BTreeSet<usize>,
    ) -> String {
        self.caret_string(mode, show_index, positions)
            .unwrap_or_else(|err| {
                log::warn!("no diagnostic for {:?} in {:?}: {}", positions, self.stripped, err);
                String::new()
            })
    }
}

fn render_view(label: &str, text: &str, positions: &BTreeSet<usize>, show_index: bool) -> String {
    let mut carets = String::with_capacity(text.len());
    for (offset, c) in text.chars().enumerate() {
        if positions.contains(&offset) {
            carets.push('^');
        } else if c == '\t' {
            carets.push('\t');
        } else {
            carets.push(' ');
        }
    }
    let mut carets = carets.trim_end().to_string();
    if show_index {
        if let Some(last) = positions.iter().next_back() {
            let _ = write!(carets, " {}", last);
        }
    }

    let padding = " ".repeat(label.len() + 2);
    format!("{}: {}\n{}{}", label, text, padding, carets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn at(positions: &[usize]) -> BTreeSet<usize> {
        positions.iter().copied().collect()
    }

    #[test_case("" ; "empty")]
    #[test_case("\t" ; "tab only")]
    #[test_case(" \n \r\n" ; "whitespace and newlines")]
    #[test_case("\u{0B}\u{0C}" ; "vertical tab and form feed")]
    fn blank_input_is_rejected(raw: &str) {
        assert_eq!(PositionMappedText::new(raw), Err(ParseError::EmptyInput));
    }

    #[test]
    fn strips_and_maps() {
        let text = PositionMappedText::new(" 5 -\t7\n+ x").unwrap();
        assert_eq!(text.original(), " 5 -\t7+ x");
        assert_eq!(text.stripped(), "5-7+x");
        assert_eq!(text.position_map(), &[1, 3, 5, 6, 8]);
        assert_eq!(text.original_position(4), Some(8));
        assert_eq!(text.original_position(5), None);
    }

    #[test]
    fn reserved_positions() {
        let text = PositionMappedText::new("a $ b$").unwrap();
        assert_eq!(text.reserved_char_positions(&['$']), at(&[1, 3]));
        assert!(text.reserved_char_positions(&['#']).is_empty());
    }

    #[test]
    fn caret_both_views() {
        let text = PositionMappedText::new("1 + (2").unwrap();
        let rendered = text.caret_string(CaretMode::Both, true, &at(&[2])).unwrap();
        let expected = [
            "original: 1 + (2",
            "              ^ 4",
            "stripped: 1+(2",
            "            ^ 2",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn caret_several_positions_without_index() {
        let text = PositionMappedText::new("1 + (2").unwrap();
        let rendered = text
            .caret_string(CaretMode::Stripped, false, &at(&[0, 3]))
            .unwrap();
        assert_eq!(rendered, "stripped: 1+(2\n          ^  ^");
    }

    #[test]
    fn caret_keeps_tabs_aligned() {
        let text = PositionMappedText::new("\t1+2").unwrap();
        let rendered = text.caret_string(CaretMode::Original, false, &at(&[1])).unwrap();
        assert_eq!(rendered, "original: \t1+2\n          \t ^");
    }

    #[test]
    fn caret_downgrades_to_stripped() {
        let text = PositionMappedText::new("1+2").unwrap();
        let rendered = text.caret_string(CaretMode::Original, true, &at(&[1])).unwrap();
        assert_eq!(rendered, "stripped: 1+2\n           ^ 1");
    }

    #[test]
    fn caret_out_of_range() {
        let text = PositionMappedText::new("1+2").unwrap();
        assert_eq!(
            text.caret_string(CaretMode::Both, false, &at(&[3])),
            Err(ParseError::PositionOutOfRange {
                position: 3,
                length: 3
            })
        );
    }

    #[test]
    fn diagnostic_falls_back_to_empty() {
        let text = PositionMappedText::new("1 + 2").unwrap();
        assert_eq!(text.diagnostic(CaretMode::Stripped, false, &at(&[1])), "stripped: 1+2\n           ^");
        assert_eq!(text.diagnostic(CaretMode::Both, false, &at(&[7])), "");
    }

    proptest! {
        #[test]
        fn position_map_points_at_same_character(raw in "[ \\t\\na-z0-9+*()]{0,40}") {
            if let Ok(text) = PositionMappedText::new(&raw) {
                let original: Vec<char> = text.original().chars().collect();
                let stripped: Vec<char> = text.stripped().chars().collect();
                prop_assert_eq!(stripped.len(), text.position_map().len());
                for (i, &c) in stripped.iter().enumerate() {
                    prop_assert_eq!(original[text.position_map()[i]], c);
                }
                prop_assert!(text.position_map().windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
