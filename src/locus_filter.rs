/*!
# Locus filter
Removes loci from each group's count table that fail a predicate over the count columns.
Each group is filtered on its own, so groups can end up holding different loci.

Predicates are written as small expressions over `n_called`, `n_missing`, `n_0`, `n_1`, `n_2`, and `n_3`:
* arithmetic: `+`, `-`, `*`, unary `-`
* comparisons: `==`, `!=`, `<`, `<=`, `>`, `>=`
* logic: `&&` (or `&`), `||` (or `|`), `!`
* parentheses and numeric literals

The default predicate is `n_called > n_missing`.
*/
use indexmap::IndexMap;
use log::debug;
use std::str::FromStr;

use crate::data_types::allele_counts::{CountColumn, CountTable, LocusAlleleCounts};

/// The predicate applied when the caller does not provide one
pub const DEFAULT_PREDICATE: &str = "n_called > n_missing";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PredicateError {
    #[error("predicate is empty")]
    Empty,
    #[error("unknown count column {column:?}; expected one of n_called, n_missing, n_0, n_1, n_2, n_3")]
    UnknownColumn { column: String },
    #[error("invalid character {character:?} at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },
    #[error("invalid number {text:?}")]
    InvalidNumber { text: String },
    #[error("unexpected {token} in predicate")]
    UnexpectedToken { token: String },
    #[error("predicate ended unexpectedly")]
    UnexpectedEnd
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Column(CountColumn),
    Number(f64),
    Op(BinaryOp),
    Not,
    LeftParen,
    RightParen
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Column(c) => write!(f, "column {}", c.as_ref()),
            Token::Number(v) => write!(f, "number {v}"),
            Token::Op(op) => write!(f, "operator {op:?}"),
            Token::Not => write!(f, "operator !"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'")
        }
    }
}

/// Parsed expression tree; everything evaluates to a number and booleans are 0/1
#[derive(Clone, Debug, PartialEq)]
enum Node {
    Column(CountColumn),
    Literal(f64),
    Negate(Box<Node>),
    Not(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>)
}

impl Node {
    fn evaluate(&self, row: &LocusAlleleCounts) -> f64 {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Node::Column(c) => row.column(*c) as f64,
            Node::Literal(v) => *v,
            Node::Negate(n) => -n.evaluate(row),
            Node::Not(n) => truth(n.evaluate(row) == 0.0),
            Node::Binary(op, lhs, rhs) => {
                let l = lhs.evaluate(row);
                // short-circuit the logical operators
                match op {
                    BinaryOp::And if l == 0.0 => return 0.0,
                    BinaryOp::Or if l != 0.0 => return 1.0,
                    _ => {}
                }
                let r = rhs.evaluate(row);
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Eq => truth(l == r),
                    BinaryOp::Ne => truth(l != r),
                    BinaryOp::Lt => truth(l < r),
                    BinaryOp::Le => truth(l <= r),
                    BinaryOp::Gt => truth(l > r),
                    BinaryOp::Ge => truth(l >= r),
                    BinaryOp::And | BinaryOp::Or => truth(r != 0.0)
                }
            }
        }
    }
}

/// A filtering predicate over the count columns of a single locus
#[derive(Clone, Debug, PartialEq)]
pub struct LocusPredicate {
    /// Original text, kept for logging
    source: String,
    /// Parsed expression
    root: Node
}

impl Default for LocusPredicate {
    fn default() -> Self {
        let root = Node::Binary(
            BinaryOp::Gt,
            Box::new(Node::Column(CountColumn::Called)),
            Box::new(Node::Column(CountColumn::Missing))
        );
        Self {
            source: DEFAULT_PREDICATE.to_string(),
            root
        }
    }
}

impl LocusPredicate {
    /// Returns true if the locus should be kept
    pub fn evaluate(&self, row: &LocusAlleleCounts) -> bool {
        self.root.evaluate(row) != 0.0
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for LocusPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl FromStr for LocusPredicate {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s)?;
        if tokens.is_empty() {
            return Err(PredicateError::Empty);
        }

        let mut parser = Parser { tokens, index: 0 };
        let root = parser.parse_or()?;
        if let Some(extra) = parser.peek() {
            return Err(PredicateError::UnexpectedToken { token: extra.to_string() });
        }
        Ok(Self {
            source: s.trim().to_string(),
            root
        })
    }
}

/// Splits predicate text into tokens
fn tokenize(s: &str) -> Result<Vec<Token>, PredicateError> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens = vec![];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            _ if c.is_whitespace() => {
                i += 1;
            },
            '(' => { tokens.push(Token::LeftParen); i += 1; },
            ')' => { tokens.push(Token::RightParen); i += 1; },
            '+' => { tokens.push(Token::Op(BinaryOp::Add)); i += 1; },
            '-' => { tokens.push(Token::Op(BinaryOp::Sub)); i += 1; },
            '*' => { tokens.push(Token::Op(BinaryOp::Mul)); i += 1; },
            '=' if next == Some('=') => { tokens.push(Token::Op(BinaryOp::Eq)); i += 2; },
            '!' if next == Some('=') => { tokens.push(Token::Op(BinaryOp::Ne)); i += 2; },
            '!' => { tokens.push(Token::Not); i += 1; },
            '<' if next == Some('=') => { tokens.push(Token::Op(BinaryOp::Le)); i += 2; },
            '<' => { tokens.push(Token::Op(BinaryOp::Lt)); i += 1; },
            '>' if next == Some('=') => { tokens.push(Token::Op(BinaryOp::Ge)); i += 2; },
            '>' => { tokens.push(Token::Op(BinaryOp::Gt)); i += 1; },
            '&' => {
                tokens.push(Token::Op(BinaryOp::And));
                i += if next == Some('&') { 2 } else { 1 };
            },
            '|' => {
                tokens.push(Token::Op(BinaryOp::Or));
                i += if next == Some('|') { 2 } else { 1 };
            },
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| PredicateError::InvalidNumber { text })?;
                tokens.push(Token::Number(value));
            },
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let column = CountColumn::from_str(&name)
                    .map_err(|_| PredicateError::UnknownColumn { column: name })?;
                tokens.push(Token::Column(column));
            },
            _ => return Err(PredicateError::InvalidCharacter { character: c, offset: i })
        }
    }
    Ok(tokens)
}

/// Recursive descent over the token list, lowest precedence first
struct Parser {
    tokens: Vec<Token>,
    index: usize
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Result<Token, PredicateError> {
        let token = self.tokens.get(self.index).cloned().ok_or(PredicateError::UnexpectedEnd)?;
        self.index += 1;
        Ok(token)
    }

    /// Consumes the next token if it is one of the given operators
    fn take_op(&mut self, ops: &[BinaryOp]) -> Option<BinaryOp> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.index += 1;
                Some(op)
            },
            _ => None
        }
    }

    fn parse_or(&mut self) -> Result<Node, PredicateError> {
        let mut node = self.parse_and()?;
        while let Some(op) = self.take_op(&[BinaryOp::Or]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.parse_and()?));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, PredicateError> {
        let mut node = self.parse_not()?;
        while let Some(op) = self.take_op(&[BinaryOp::And]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.parse_not()?));
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Node, PredicateError> {
        if self.peek() == Some(&Token::Not) {
            self.index += 1;
            return Ok(Node::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, PredicateError> {
        let lhs = self.parse_sum()?;
        let comparisons = [BinaryOp::Eq, BinaryOp::Ne, BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge];
        match self.take_op(&comparisons) {
            Some(op) => Ok(Node::Binary(op, Box::new(lhs), Box::new(self.parse_sum()?))),
            None => Ok(lhs)
        }
    }

    fn parse_sum(&mut self) -> Result<Node, PredicateError> {
        let mut node = self.parse_product()?;
        while let Some(op) = self.take_op(&[BinaryOp::Add, BinaryOp::Sub]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.parse_product()?));
        }
        Ok(node)
    }

    fn parse_product(&mut self) -> Result<Node, PredicateError> {
        let mut node = self.parse_unary()?;
        while let Some(op) = self.take_op(&[BinaryOp::Mul]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.parse_unary()?));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, PredicateError> {
        if self.take_op(&[BinaryOp::Sub]).is_some() {
            return Ok(Node::Negate(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, PredicateError> {
        match self.next()? {
            Token::Column(c) => Ok(Node::Column(c)),
            Token::Number(v) => Ok(Node::Literal(v)),
            Token::LeftParen => {
                let inner = self.parse_or()?;
                match self.next()? {
                    Token::RightParen => Ok(inner),
                    other => Err(PredicateError::UnexpectedToken { token: other.to_string() })
                }
            },
            other => Err(PredicateError::UnexpectedToken { token: other.to_string() })
        }
    }
}

/// Applies the predicate to every group's table on its own.
/// Only rows are removed; an empty table is a valid result.
/// # Arguments
/// * `tables` - per-group count tables
/// * `predicate` - loci failing this predicate are removed
pub fn filter_loci(tables: &IndexMap<String, CountTable>, predicate: &LocusPredicate) -> IndexMap<String, CountTable> {
    tables.iter()
        .map(|(group, table)| {
            let filtered = table.retain_rows(|row| predicate.evaluate(row));
            debug!(
                "Filter \"{predicate}\" kept {} of {} loci for group {group}",
                filtered.len(), table.len()
            );
            (group.clone(), filtered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::locus::GenomicLocus;

    fn row(n_called: u64, n_missing: u64, n_alleles: [u64; 4]) -> LocusAlleleCounts {
        LocusAlleleCounts::new(GenomicLocus::new("chr1", 1), n_called, n_missing, n_alleles)
    }

    #[test]
    fn test_default_predicate() {
        let predicate = LocusPredicate::default();
        assert_eq!(predicate, DEFAULT_PREDICATE.parse::<LocusPredicate>().unwrap());
        assert!(predicate.evaluate(&row(2, 1, [4, 0, 0, 0])));
        assert!(!predicate.evaluate(&row(1, 1, [1, 1, 0, 0])));
        assert!(!predicate.evaluate(&row(0, 3, [0, 0, 0, 0])));
    }

    #[test]
    fn test_expressions() {
        let r = row(3, 1, [4, 1, 1, 0]);
        let check = |text: &str| text.parse::<LocusPredicate>().unwrap().evaluate(&r);

        assert!(check("n_missing == 1"));
        assert!(!check("n_missing == 0"));
        assert!(check("n_0 >= 4 && n_1 > 0"));
        assert!(check("n_3 > 0 || n_2 == 1"));
        assert!(check("!(n_3 > 0)"));
        assert!(check("n_1 + n_2 == 2 * n_2 * 1"));
        assert!(check("n_called - n_missing >= 2"));
        assert!(check("-n_0 < 0"));
        assert!(check("n_called >= 0.75 * (n_called + n_missing)"));
        assert!(check("n_0 > 1 & n_missing != 0"));
        assert!(!check("n_0 > 1 & n_missing < 1 | n_3"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<LocusPredicate>().unwrap_err(), PredicateError::Empty);
        assert_eq!(
            "n_called > n_4".parse::<LocusPredicate>().unwrap_err(),
            PredicateError::UnknownColumn { column: "n_4".to_string() }
        );
        assert_eq!(
            "depth > 3".parse::<LocusPredicate>().unwrap_err(),
            PredicateError::UnknownColumn { column: "depth".to_string() }
        );
        assert_eq!("n_called >".parse::<LocusPredicate>().unwrap_err(), PredicateError::UnexpectedEnd);
        assert!(matches!("n_called > 1 2".parse::<LocusPredicate>(), Err(PredicateError::UnexpectedToken { .. })));
        assert!(matches!("(n_called > 1".parse::<LocusPredicate>(), Err(PredicateError::UnexpectedEnd)));
        assert!(matches!("n_called = 1".parse::<LocusPredicate>(), Err(PredicateError::InvalidCharacter { character: '=', .. })));
        assert!(matches!("n_called > 1.2.3".parse::<LocusPredicate>(), Err(PredicateError::InvalidNumber { .. })));
    }

    #[test]
    fn test_filter_per_group() {
        let locus_a = GenomicLocus::new("chr1", 100);
        let locus_b = GenomicLocus::new("chr1", 200);
        let mut tables: IndexMap<String, CountTable> = Default::default();
        tables.insert("g1".to_string(), CountTable::new("g1".to_string(), 3, vec![
            LocusAlleleCounts::new(locus_a.clone(), 2, 1, [2, 2, 0, 0]),
            LocusAlleleCounts::new(locus_b.clone(), 3, 0, [6, 0, 0, 0]),
        ]));
        tables.insert("g2".to_string(), CountTable::new("g2".to_string(), 3, vec![
            LocusAlleleCounts::new(locus_a.clone(), 3, 0, [3, 3, 0, 0]),
            LocusAlleleCounts::new(locus_b.clone(), 3, 0, [0, 6, 0, 0]),
        ]));

        let predicate: LocusPredicate = "n_missing == 0".parse().unwrap();
        let filtered = filter_loci(&tables, &predicate);
        assert_eq!(filtered["g1"].len(), 1);
        assert_eq!(filtered["g1"].rows()[0].locus(), &locus_b);
        assert_eq!(filtered["g2"], tables["g2"]);

        // everything removed is still a valid (empty) table
        let predicate: LocusPredicate = "n_called > 5".parse().unwrap();
        let filtered = filter_loci(&tables, &predicate);
        assert!(filtered.values().all(|t| t.is_empty()));
        assert_eq!(filtered.len(), 2);
    }
}
