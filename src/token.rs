//! The Token model (spec §3): a tagged variant for a single lexical unit.

/// A single lexical unit produced by the lexer.
///
/// `Word` owns its text; the metacharacter variants are nullary, so there
/// is no nullability coupling between a token's tag and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    RedirIn,
    RedirOut,
    Pipe,
    Background,
}

impl Token {
    /// `true` for [`Token::Word`].
    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_))
    }

    /// The word text, if this is a [`Token::Word`].
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// A short tag for debug/trace logging, mirroring the original corpus's
    /// `token_type_to_string`.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Token::Word(_) => "WORD",
            Token::RedirIn => "REDIRECTION_IN(<)",
            Token::RedirOut => "REDIRECTION_OUT(>)",
            Token::Pipe => "PIPE(|)",
            Token::Background => "BACKGROUND(&)",
        }
    }
}

/// Ordered sequence of [`Token`]s produced by one line. Insertion order is
/// semantic: it encodes command structure and is immutable between
/// validation and execution.
pub type TokenSequence = Vec<Token>;
