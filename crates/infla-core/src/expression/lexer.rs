use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::error::InflaError;
use crate::InflaResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(Decimal),
    /// A ticker symbol as written, e.g. `GGAL.BA`.
    Ticker(String),
    Op(Operator),
    LParen,
    RParen,
}

/// A token and its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Split `text` into tokens.
///
/// Words are maximal runs of ASCII letters, digits, `.` and `_`. A word made
/// only of digits and at most one `.` is a number; anything else is a
/// ticker. Characters outside the expression alphabet are rejected here, so
/// no later stage ever sees them.
pub fn tokenize(text: &str) -> InflaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == ' ' {
            continue;
        }
        if c == '(' || c == ')' {
            let kind = if c == '(' {
                TokenKind::LParen
            } else {
                TokenKind::RParen
            };
            tokens.push(Token {
                kind,
                start,
                end: start + 1,
            });
            continue;
        }
        if let Some(op) = Operator::from_char(c) {
            tokens.push(Token {
                kind: TokenKind::Op(op),
                start,
                end: start + 1,
            });
            continue;
        }
        if !is_word_char(c) {
            return Err(InflaError::InvalidExpression(format!(
                "unexpected character '{c}' at position {start}"
            )));
        }

        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if !is_word_char(next) {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        let word = &text[start..end];
        tokens.push(Token {
            kind: classify_word(word, start)?,
            start,
            end,
        });
    }

    Ok(tokens)
}

fn classify_word(word: &str, at: usize) -> InflaResult<TokenKind> {
    let numeric = word.chars().all(|c| c.is_ascii_digit() || c == '.');
    if !numeric {
        return Ok(TokenKind::Ticker(word.to_string()));
    }
    Decimal::from_str(word)
        .map(TokenKind::Number)
        .map_err(|_| InflaError::InvalidExpression(format!("malformed number '{word}' at position {at}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tickers_and_numbers() {
        assert_eq!(
            kinds("GGAL.BA*0.5"),
            vec![
                TokenKind::Ticker("GGAL.BA".into()),
                TokenKind::Op(Operator::Mul),
                TokenKind::Number(dec!(0.5)),
            ]
        );
    }

    #[test]
    fn test_spans_cover_words() {
        let toks = tokenize("YPF + YPFD").unwrap();
        assert_eq!((toks[0].start, toks[0].end), (0, 3));
        assert_eq!((toks[2].start, toks[2].end), (6, 10));
    }

    #[test]
    fn test_rejects_foreign_characters() {
        for bad in ["GGAL.BA; drop", "a % b", "x\ty", "__import__('os')", "a,b"] {
            assert!(tokenize(bad).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_malformed_number() {
        assert!(tokenize("1.2.3 + A").is_err());
    }
}
