//! Decomposition of the input into nested, comma separated groups.
//!
//! The stripped input is scanned once for the aggregation tokens
//! `( ) [ ] { } ,`. Text between tokens is appended to the innermost open
//! [`Expression`]. Every group `(...)` becomes a [`MultiDimensionalExpression`]
//! whose children are the comma separated expressions inside of it, and the
//! enclosing expression gets a [`PLACEHOLDER`] character where the group was.
//!
//! Nodes live in the arenas of an [`ExpressionTree`] and refer to each other
//! through [`ExpressionId`] and [`GroupId`] handles.

use crate::config::Config;
use crate::error::ParseError;
use crate::grammar::GrammarElement;
use crate::text::PositionMappedText;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Marks, inside an expression's content, where a nested group was
pub const PLACEHOLDER: char = '$';

/// Handle of an [`Expression`] in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(usize);

/// Handle of a [`MultiDimensionalExpression`] in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

/// Build state of a node, finalized nodes never change again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Still receiving content or children
    Building,
    /// Closed
    Finalized,
}

/// Flat text with a placeholder for each nested group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    content: String,
    sub_expressions: Vec<GroupId>,
    start_position: usize,
    append_position: usize,
    state: NodeState,
}

impl Expression {
    fn new(start_position: usize) -> Self {
        Self {
            content: String::new(),
            sub_expressions: Vec::new(),
            start_position,
            append_position: start_position,
            state: NodeState::Building,
        }
    }

    /// The text, one [`PLACEHOLDER`] per nested group
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Nested groups in the order their placeholders appear
    pub fn sub_expressions(&self) -> &[GroupId] {
        &self.sub_expressions
    }

    /// Position of the first character in the stripped text
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// Position in the stripped text right after the last character
    pub fn append_position(&self) -> usize {
        self.append_position
    }

    /// Build state
    pub fn state(&self) -> NodeState {
        self.state
    }

    fn append(&mut self, position: usize, text: &str) {
        self.assert_appendable(position);
        self.content.push_str(text);
        self.append_position += text.chars().count();
    }

    fn append_group(&mut self, group: GroupId, start: usize, end: usize) {
        self.assert_appendable(start);
        self.content.push(PLACEHOLDER);
        self.sub_expressions.push(group);
        self.append_position = end + 1;
    }

    fn assert_appendable(&self, position: usize) {
        if self.state == NodeState::Finalized || position != self.append_position {
            panic!(
                "Internal bug: cannot append at {} to expression expecting {} ({:?})",
                position, self.append_position, self.state
            );
        }
    }
}

/// A group of one or more comma separated expressions between matching tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDimensionalExpression {
    start_token: char,
    expected_end_token: char,
    actual_end_token: Option<char>,
    start_position: usize,
    end_position: Option<usize>,
    children: Vec<ExpressionId>,
    state: NodeState,
}

impl MultiDimensionalExpression {
    fn new(start_token: char, expected_end_token: char, start_position: usize) -> Self {
        Self {
            start_token,
            expected_end_token,
            actual_end_token: None,
            start_position,
            end_position: None,
            children: Vec::new(),
            state: NodeState::Building,
        }
    }

    /// The opening token
    pub fn start_token(&self) -> char {
        self.start_token
    }

    /// The token that must close this group
    pub fn expected_end_token(&self) -> char {
        self.expected_end_token
    }

    /// The token that closed this group, once finalized
    pub fn actual_end_token(&self) -> Option<char> {
        self.actual_end_token
    }

    /// Position of the opening token in the stripped text
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// Position of the closing token in the stripped text, once finalized
    pub fn end_position(&self) -> Option<usize> {
        self.end_position
    }

    /// The comma separated expressions
    pub fn children(&self) -> &[ExpressionId] {
        &self.children
    }

    /// Number of comma separated expressions
    pub fn dimension(&self) -> usize {
        self.children.len()
    }

    /// Build state
    pub fn state(&self) -> NodeState {
        self.state
    }

    fn finalize(&mut self, token: char, position: usize) {
        assert!(
            !self.children.is_empty(),
            "Internal bug: finalizing a group without dimensions"
        );
        self.actual_end_token = Some(token);
        self.end_position = Some(position);
        self.state = NodeState::Finalized;
    }
}

/// The end token matching an opening token
pub fn end_token_for(start_token: char) -> Option<char> {
    match start_token {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

/// A parsed expression: the input text and the arenas of its nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionTree {
    text: PositionMappedText,
    expressions: Vec<Expression>,
    groups: Vec<MultiDimensionalExpression>,
    root: ExpressionId,
}

impl ExpressionTree {
    /// The input the tree was built from
    pub fn text(&self) -> &PositionMappedText {
        &self.text
    }

    /// Handle of the top level expression
    pub fn root_id(&self) -> ExpressionId {
        self.root
    }

    /// The top level expression
    pub fn root(&self) -> &Expression {
        self.expression(self.root)
    }

    /// The expression behind `id`
    pub fn expression(&self, id: ExpressionId) -> &Expression {
        &self.expressions[id.0]
    }

    /// The group behind `id`
    pub fn group(&self, id: GroupId) -> &MultiDimensionalExpression {
        &self.groups[id.0]
    }

    /// Number of expressions in the tree
    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    /// Number of groups in the tree
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Map an offset in the content of expression `id` to a position in the
    /// stripped text.
    ///
    /// Offsets count characters, a placeholder counting as one. Every
    /// placeholder before `offset` is replaced by the real length of its group.
    pub fn real_position(&self, id: ExpressionId, offset: usize) -> usize {
        let expression = self.expression(id);
        let mut groups = expression.sub_expressions.iter();
        let mut position = expression.start_position;
        for c in expression.content.chars().take(offset) {
            if c == PLACEHOLDER {
                let group = groups
                    .next()
                    .map(|&group| self.group(group))
                    .unwrap_or_else(|| panic!("Internal bug: placeholder without a group"));
                position = group.end_position.map_or(position + 1, |end| end + 1);
            } else {
                position += 1;
            }
        }
        position
    }

    fn render_expression(&self, id: ExpressionId, fmt: &mut Formatter) -> fmt::Result {
        let expression = self.expression(id);
        let mut groups = expression.sub_expressions.iter();
        for c in expression.content.chars() {
            match (c, groups.clone().next()) {
                (PLACEHOLDER, Some(&group)) => {
                    groups.next();
                    self.render_group(group, fmt)?;
                }
                _ => write!(fmt, "{}", c)?,
            }
        }
        Ok(())
    }

    fn render_group(&self, id: GroupId, fmt: &mut Formatter) -> fmt::Result {
        let group = self.group(id);
        write!(fmt, "{}", group.start_token)?;
        for (index, &child) in group.children.iter().enumerate() {
            if index > 0 {
                write!(fmt, ",")?;
            }
            self.render_expression(child, fmt)?;
        }
        write!(
            fmt,
            "{}",
            group.actual_end_token.unwrap_or(group.expected_end_token)
        )
    }
}

impl Display for ExpressionTree {
    /// Renders the stripped input back from the tree
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        self.render_expression(self.root, fmt)
    }
}

/// Parse `raw` into an expression tree, rendering diagnostics with the default
/// [`Config`].
///
/// # Errors
///
/// See [`parse_with`].
///
/// # Examples
///
/// ```
/// # use cruncher::parse;
/// let tree = parse("(2 + 3)").unwrap();
/// let group = tree.group(tree.root().sub_expressions()[0]);
/// assert_eq!(group.dimension(), 1);
/// assert_eq!(tree.expression(group.children()[0]).content(), "2+3");
/// ```
pub fn parse(raw: &str) -> Result<ExpressionTree, ParseError> {
    parse_with(raw, &Config::default())
}

/// Parse `raw` into an expression tree.
///
/// # Errors
///
/// Fails on blank input, on the reserved [`PLACEHOLDER`] character and on
/// any unbalanced, mismatched or empty group.
pub fn parse_with(raw: &str, config: &Config) -> Result<ExpressionTree, ParseError> {
    log::debug!("parsing expression {:?}", raw);
    let text = PositionMappedText::new(raw)?;

    let reserved = text.reserved_char_positions(&[PLACEHOLDER]);
    if !reserved.is_empty() {
        return Err(ParseError::IllegalReservedCharacterUsage {
            character: PLACEHOLDER,
            diagnostic: text.diagnostic(config.caret_mode, config.show_caret_index, &reserved),
            positions: reserved.into_iter().collect(),
        });
    }

    let mut builder = TreeBuilder::new(&text, config);
    let stripped = text.stripped();
    let mut byte_offset = 0;
    let mut position = 0;
    for token in GrammarElement::AggregationToken
        .component()
        .tokens(stripped)
    {
        let content = &stripped[byte_offset..token.start()];
        if !content.is_empty() {
            builder.content(position, content);
            position += content.chars().count();
        }

        let c = token.as_str().chars().next().unwrap_or_default();
        log::trace!("aggregation token '{}' at {}", c, position);
        match c {
            ',' => builder.separate(position)?,
            '(' | '[' | '{' => builder.open(c, position)?,
            _ => builder.close(c, position)?,
        }
        byte_offset = token.end();
        position += 1;
    }
    let content = &stripped[byte_offset..];
    if !content.is_empty() {
        builder.content(position, content);
    }

    let tree = builder.finish()?;
    log::debug!(
        "parsed {} expression(s) and {} group(s)",
        tree.expression_count(),
        tree.group_count()
    );
    Ok(tree)
}

/// Mutable state of a single scan
struct TreeBuilder<'a> {
    text: &'a PositionMappedText,
    config: &'a Config,
    expressions: Vec<Expression>,
    groups: Vec<MultiDimensionalExpression>,
    /// The open expression of every level, the top level first
    expression_stack: Vec<Option<ExpressionId>>,
    /// The open groups, outermost first
    group_stack: Vec<GroupId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a PositionMappedText, config: &'a Config) -> Self {
        Self {
            text,
            config,
            expressions: Vec::new(),
            groups: Vec::new(),
            expression_stack: vec![None],
            group_stack: Vec::new(),
        }
    }

    fn diagnostic(&self, positions: &[usize]) -> String {
        let positions: BTreeSet<usize> = positions.iter().copied().collect();
        self.text
            .diagnostic(self.config.caret_mode, self.config.show_caret_index, &positions)
    }

    /// The open expression of the innermost level, created if needed
    fn current_expression(&mut self, position: usize) -> ExpressionId {
        let level = self.expression_stack.len() - 1;
        if let Some(id) = self.expression_stack[level] {
            return id;
        }
        let id = ExpressionId(self.expressions.len());
        self.expressions.push(Expression::new(position));
        self.expression_stack[level] = Some(id);
        id
    }

    fn content(&mut self, position: usize, content: &str) {
        log::trace!("content {:?} at {}", content, position);
        let id = self.current_expression(position);
        self.expressions[id.0].append(position, content);
    }

    fn open(&mut self, token: char, position: usize) -> Result<(), ParseError> {
        if self.group_stack.len() >= self.config.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.config.max_depth,
                position,
                diagnostic: self.diagnostic(&[position]),
            });
        }
        // the enclosing expression receives the placeholder once closed
        self.current_expression(position);
        let expected = end_token_for(token)
            .unwrap_or_else(|| panic!("Internal bug: '{}' is not an opening token", token));
        let id = GroupId(self.groups.len());
        self.groups
            .push(MultiDimensionalExpression::new(token, expected, position));
        self.group_stack.push(id);
        self.expression_stack.push(None);
        Ok(())
    }

    /// Finalize the open expression as the next dimension of the innermost group
    fn end_dimension(&mut self, token: char, position: usize) -> Result<GroupId, ParseError> {
        let expression = match self.expression_stack.last().copied().flatten() {
            Some(expression) => expression,
            None => {
                return Err(ParseError::ExpressionExpected {
                    position,
                    diagnostic: self.diagnostic(&[position]),
                })
            }
        };
        let group = match self.group_stack.last() {
            Some(&group) => group,
            None if token == ',' => {
                return Err(ParseError::UnexpectedDimensionToken {
                    position,
                    diagnostic: self.diagnostic(&[position]),
                })
            }
            None => {
                return Err(ParseError::UnexpectedEndToken {
                    token,
                    position,
                    diagnostic: self.diagnostic(&[position]),
                })
            }
        };

        self.expressions[expression.0].state = NodeState::Finalized;
        self.groups[group.0].children.push(expression);
        if let Some(level) = self.expression_stack.last_mut() {
            *level = None;
        }
        Ok(group)
    }

    fn separate(&mut self, position: usize) -> Result<(), ParseError> {
        self.end_dimension(',', position).map(|_| ())
    }

    fn close(&mut self, token: char, position: usize) -> Result<(), ParseError> {
        let id = self.end_dimension(token, position)?;
        let group = &mut self.groups[id.0];
        if group.expected_end_token != token {
            let start_position = group.start_position;
            return Err(ParseError::ExpressionNotProperlyClosed {
                expected: group.expected_end_token,
                found: token,
                start_position,
                position,
                diagnostic: self.diagnostic(&[start_position, position]),
            });
        }
        group.finalize(token, position);
        let start_position = group.start_position;

        self.group_stack.pop();
        self.expression_stack.pop();
        let parent = self.current_expression(start_position);
        self.expressions[parent.0].append_group(id, start_position, position);
        Ok(())
    }

    fn finish(mut self) -> Result<ExpressionTree, ParseError> {
        if !self.group_stack.is_empty() {
            let pending: Vec<(char, usize)> = self
                .group_stack
                .iter()
                .map(|&id| {
                    let group = &self.groups[id.0];
                    (group.expected_end_token, group.start_position)
                })
                .collect();
            let positions: Vec<usize> = pending.iter().map(|&(_, position)| position).collect();
            return Err(ParseError::UnclosedExpressions {
                diagnostic: self.diagnostic(&positions),
                pending,
            });
        }

        let root = match self.expression_stack[0] {
            Some(root) => root,
            None => {
                let position = self.text.len().saturating_sub(1);
                return Err(ParseError::ExpressionExpected {
                    position,
                    diagnostic: self.diagnostic(&[position]),
                });
            }
        };
        self.expressions[root.0].state = NodeState::Finalized;

        Ok(ExpressionTree {
            text: self.text.clone(),
            expressions: self.expressions,
            groups: self.groups,
            root,
        })
    }
}
