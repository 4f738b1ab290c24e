//! The syntax validator (spec §4.2): accepts or rejects a [`TokenSequence`]
//! against the grammar, classifying errors into a fixed set of kinds.

use crate::token::{Token, TokenSequence};

/// The six syntactic error kinds (spec §4.2). The exact wording is not
/// pinned by spec.md; these messages follow the original "ish" corpus's
/// `errorPrint` call sites verbatim.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Missing command name")]
    MissingCommand,
    #[error("Multiple redirection of standard input")]
    MultipleRedirIn,
    #[error("Multiple redirection of standard out")]
    MultipleRedirOut,
    #[error("Standard input redirection without file name")]
    RedirInWithoutTarget,
    #[error("Standard output redirection without file name")]
    RedirOutWithoutTarget,
    #[error("Invalid use of background")]
    InvalidBackground,
}

/// Validate a token sequence. Does not modify `tokens`.
pub fn validate(tokens: &TokenSequence) -> Result<(), SyntaxError> {
    validate_background(tokens)?;

    let segments: Vec<&[Token]> = split_on_pipe(tokens);
    let segment_count = segments.len();

    for (idx, segment) in segments.iter().enumerate() {
        let is_first = idx == 0;
        let is_last = idx + 1 == segment_count;
        validate_segment(segment, is_first, is_last)?;
    }

    Ok(())
}

fn validate_background(tokens: &TokenSequence) -> Result<(), SyntaxError> {
    for (idx, token) in tokens.iter().enumerate() {
        if matches!(token, Token::Background) && idx + 1 != tokens.len() {
            return Err(SyntaxError::InvalidBackground);
        }
    }
    Ok(())
}

fn split_on_pipe(tokens: &TokenSequence) -> Vec<&[Token]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        if matches!(token, Token::Pipe) {
            segments.push(&tokens[start..idx]);
            start = idx + 1;
        }
    }
    segments.push(&tokens[start..]);
    segments
}

fn validate_segment(segment: &[Token], is_first: bool, is_last: bool) -> Result<(), SyntaxError> {
    match segment.first() {
        Some(Token::Word(_)) => {}
        _ => return Err(SyntaxError::MissingCommand),
    }

    let mut redir_in_count = 0usize;
    let mut redir_out_count = 0usize;

    for (idx, token) in segment.iter().enumerate() {
        match token {
            Token::RedirIn => {
                redir_in_count += 1;
                if redir_in_count > 1 {
                    return Err(SyntaxError::MultipleRedirIn);
                }
                if !matches!(segment.get(idx + 1), Some(Token::Word(_))) {
                    return Err(SyntaxError::RedirInWithoutTarget);
                }
                if !is_first {
                    return Err(SyntaxError::MultipleRedirIn);
                }
            }
            Token::RedirOut => {
                redir_out_count += 1;
                if redir_out_count > 1 {
                    return Err(SyntaxError::MultipleRedirOut);
                }
                if !matches!(segment.get(idx + 1), Some(Token::Word(_))) {
                    return Err(SyntaxError::RedirOutWithoutTarget);
                }
                if !is_last {
                    return Err(SyntaxError::MultipleRedirOut);
                }
            }
            _ => {}
        }
    }

    Ok(())
}
