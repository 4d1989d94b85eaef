/// Every kind of token the formula language knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character punctuation.
    Equals,      // =
    Period,      // .
    Comma,       // ,
    LParen,      // (
    RParen,      // )
    Plus,        // +
    Minus,       // -
    Asterisk,    // *
    Slash,       // /
    Carat,       // ^
    Dollar,      // $
    Percent,     // %
    Tick,        // '
    LessThan,    // <
    GreaterThan, // >
    Question,    // ?
    Colon,       // :
    Underscore,  // _
    Ampersand,   // &
    Pipe,        // |
    Bang,        // !

    /// `\x`, escaping a single character.
    Literal,
    /// One or more of 0-9.
    Numeric,
    /// One or more of a-z, A-Z.
    Alpha,
    /// `"` ... `"`.
    Quote,
}

#[derive(Debug, Clone, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Character offset into the original input.
    pub position: usize,
}

// Positions are bookkeeping, not identity: two lexes of the same formula with
// different spacing produce equal token vectors.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_equality_ignores_position() {
        let a = Token {
            kind: TokenKind::Numeric,
            value: "42".into(),
            position: 0,
        };
        let b = Token {
            kind: TokenKind::Numeric,
            value: "42".into(),
            position: 17,
        };
        assert_eq!(a, b);

        let c = Token {
            kind: TokenKind::Numeric,
            value: "43".into(),
            position: 0,
        };
        assert_ne!(a, c);
    }
}
