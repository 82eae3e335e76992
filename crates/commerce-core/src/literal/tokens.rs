use std::fmt;
use std::hash::{Hash, Hasher};

/// Numeric literal compared by bit pattern so tokens can be hashed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Number(pub f64);

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Bang,
    Minus,
    Plus,
    Ellipsis,
    Str(String),
    Num(Number),
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Bang => write!(f, "!"),
            Token::Minus => write!(f, "-"),
            Token::Plus => write!(f, "+"),
            Token::Ellipsis => write!(f, "..."),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Num(n) => write!(f, "{}", n.0),
            Token::Ident(id) => write!(f, "{id}"),
        }
    }
}
