mod token;

pub use self::token::*;

use std::{collections::HashMap, error::Error, fmt::Display, iter::Peekable, str::Chars};

use once_cell::sync::Lazy;

#[macro_export]
macro_rules! punctuation {
    ($map:ident, $kind:ident, $value:expr) => {
        $map.insert($value, $crate::lexer::TokenKind::$kind);
    };
}

static PUNCTUATION: Lazy<HashMap<char, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();

    punctuation!(m, Equals, '=');
    punctuation!(m, Period, '.');
    punctuation!(m, Comma, ',');
    punctuation!(m, LParen, '(');
    punctuation!(m, RParen, ')');
    punctuation!(m, Plus, '+');
    punctuation!(m, Minus, '-');
    punctuation!(m, Asterisk, '*');
    punctuation!(m, Slash, '/');
    punctuation!(m, Carat, '^');
    punctuation!(m, Dollar, '$');
    punctuation!(m, Percent, '%');
    punctuation!(m, Tick, '\'');
    punctuation!(m, LessThan, '<');
    punctuation!(m, GreaterThan, '>');
    punctuation!(m, Question, '?');
    punctuation!(m, Colon, ':');
    punctuation!(m, Underscore, '_');
    punctuation!(m, Ampersand, '&');
    punctuation!(m, Pipe, '|');
    punctuation!(m, Bang, '!');

    m
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub position: usize,
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at position {})", self.message, self.position)
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// Turns a formula string into tokens.
///
/// Spaces between tokens are skipped; every other byte must start a
/// punctuation mark, a `\x` escape, a digit run, a letter run or a quoted
/// string.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    tokens: Vec<Token>,
    iterator: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: vec![],
            iterator: input.chars().peekable(),
            position: 0,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.iterator.peek()
    }

    fn next(&mut self) -> Option<char> {
        let item = self.iterator.next();
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    fn next_if(&mut self, func: impl Fn(&char) -> bool) -> Option<char> {
        let item = self.iterator.next_if(func);
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    fn eat_whitespace(&mut self) {
        while self.next_if(|item| *item == ' ').is_some() {}
    }

    fn error(&self, message: impl Into<String>, position: usize) -> LexError {
        LexError {
            message: message.into(),
            position,
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        loop {
            self.eat_whitespace();

            let position = self.position;
            let Some(next) = self.peek() else {
                return Ok(self.tokens);
            };

            match *next {
                '0'..='9' => self.lex_numeric(),
                'a'..='z' | 'A'..='Z' => self.lex_alpha(),
                '"' => self.lex_quote()?,
                '\\' => self.lex_literal()?,
                c if PUNCTUATION.contains_key(&c) => {
                    self.next();
                    self.tokens.push(Token {
                        kind: PUNCTUATION[&c],
                        value: c.to_string(),
                        position,
                    });
                }
                c => return Err(self.error(format!("can't lex '{c}'"), position)),
            }
        }
    }

    fn lex_numeric(&mut self) {
        let position = self.position;
        let mut stack = vec![];

        while let Some(next) = self.next_if(char::is_ascii_digit) {
            stack.push(next);
        }

        self.tokens.push(Token {
            kind: TokenKind::Numeric,
            value: stack.iter().collect(),
            position,
        });
    }

    fn lex_alpha(&mut self) {
        let position = self.position;
        let mut stack = vec![];

        while let Some(next) = self.next_if(char::is_ascii_alphabetic) {
            stack.push(next);
        }

        self.tokens.push(Token {
            kind: TokenKind::Alpha,
            value: stack.iter().collect(),
            position,
        });
    }

    /// A `"`-delimited string; the delimiters are consumed and dropped.
    fn lex_quote(&mut self) -> LexResult<()> {
        let position = self.position;
        self.next();

        let mut stack = vec![];
        loop {
            match self.next() {
                Some('"') => break,
                Some(next) => stack.push(next),
                None => return Err(self.error("unterminated quote", position)),
            }
        }

        self.tokens.push(Token {
            kind: TokenKind::Quote,
            value: stack.iter().collect(),
            position,
        });
        Ok(())
    }

    /// A backslash escapes exactly one following character.
    fn lex_literal(&mut self) -> LexResult<()> {
        let position = self.position;
        self.next();

        let Some(escaped) = self.next() else {
            return Err(self.error("'\\' at end of input", position));
        };

        self.tokens.push(Token {
            kind: TokenKind::Literal,
            value: escaped.to_string(),
            position,
        });
        Ok(())
    }
}

/// Convenience entry point.
pub fn lex(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).lex()
}
