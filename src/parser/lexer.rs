use itertools::{Itertools, PeekingNext};

use super::{CompileErrorType, Result};

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Arrow,
    Or,
    Equals,
    OpenBrace,
    CloseBrace,
    Comma,
    Epsilon,
    Word(String),
}

const EPSILON_TOKENS: [&str; 2] = ["&", "ε"];

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '|' | '=' | '{' | '}' | ',' | '"')
}

// `-` only ends a word when it starts an arrow
fn at_arrow<I: Iterator<Item = char> + Clone>(line: &std::iter::Peekable<I>) -> bool {
    let mut ahead = line.clone();
    ahead.next() == Some('-') && ahead.next() == Some('>')
}

pub fn lex_quoted(line: &mut impl PeekingNext<Item = char>) -> Result<Token> {
    line.next(); // Consume open quote
    let token_text: String = line.peeking_take_while(|&c| c != '\"').collect();

    // Check if there is a close quote and consume it if there is
    if line.next() != Some('\"') {
        return Err(CompileErrorType::UnmatchedQuote);
    }

    Ok(Token::Word(token_text))
}

pub fn lex_word<I: Iterator<Item = char> + Clone>(line: &mut std::iter::Peekable<I>) -> Token {
    let mut text = String::new();
    while let Some(&c) = line.peek() {
        if is_delimiter(c) || at_arrow(line) {
            break;
        }
        text.push(c);
        line.next();
    }

    if EPSILON_TOKENS.contains(&text.as_str()) {
        Token::Epsilon
    } else {
        Token::Word(text)
    }
}

pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    let mut line_chars = line.chars().peekable();

    while let Some(&c) = line_chars.peek() {
        if at_arrow(&line_chars) {
            line_chars.next();
            line_chars.next();
            tokens.push(Token::Arrow);
        } else if c == '|' {
            line_chars.next();
            tokens.push(Token::Or);
        } else if c == '=' {
            line_chars.next();
            tokens.push(Token::Equals);
        } else if c == '{' {
            line_chars.next();
            tokens.push(Token::OpenBrace);
        } else if c == '}' {
            line_chars.next();
            tokens.push(Token::CloseBrace);
        } else if c == ',' {
            line_chars.next();
            tokens.push(Token::Comma);
        } else if c == '\"' {
            tokens.push(lex_quoted(&mut line_chars)?);
        } else if !c.is_whitespace() {
            tokens.push(lex_word(&mut line_chars));
        } else {
            line_chars.next();
        }
    }

    Ok(tokens)
}
