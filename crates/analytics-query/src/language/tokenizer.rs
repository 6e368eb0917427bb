use logos::{Lexer, Logos};

use super::token::{Token, TokenType};

/// Turns query text into typed tokens covering the whole input.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Default tokenizer. Whitespace is kept as its own token and anything
/// unrecognised becomes `Unknown`, so every byte of the input is covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryTokenizer;

impl Tokenizer for QueryTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();
        for (raw, span) in RawToken::lexer(text).spanned() {
            let token_type = raw.map_or(TokenType::Unknown, RawToken::token_type);
            // merge runs of unknown characters
            if token_type == TokenType::Unknown {
                if let Some(last) = tokens.last_mut() {
                    if last.token_type == TokenType::Unknown && last.span.end == span.start {
                        last.span.end = span.end;
                        continue;
                    }
                }
            }
            tokens.push(Token::new(token_type, span));
        }
        tokens
    }
}

fn block_comment(lex: &mut Lexer<RawToken>) {
    let remainder = lex.remainder();
    let len = remainder.find("*/").map_or(remainder.len(), |end| end + 2);
    lex.bump(len);
}

fn quoted(lex: &mut Lexer<RawToken>, quote: char) {
    let remainder = lex.remainder();
    let mut escaped = false;
    for (index, c) in remainder.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            lex.bump(index + c.len_utf8());
            return;
        }
    }
    lex.bump(remainder.len());
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    Comment,
    #[token("/*", block_comment)]
    BlockComment,
    #[token("\"", |lex| quoted(lex, '"'))]
    DoubleQuoted,
    #[token("'", |lex| quoted(lex, '\''))]
    SingleQuoted,
    #[regex(r"\$\{[^}\n]*\}")]
    Param,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*")]
    Word,

    #[token("(")]
    OpenBracket,
    #[token(")")]
    CloseBracket,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,

    #[token("=")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanOrEqualTo,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanOrEqualTo,
    #[token("=~")]
    MatchesRegex,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,
    #[token("%")]
    Modulus,
    #[token("^")]
    Order,

    #[token("and", ignore(case))]
    And,
    #[token("or", ignore(case))]
    Or,
    #[token("not", ignore(case))]
    Not,

    #[token("from", ignore(case))]
    From,
    #[token("where", ignore(case))]
    Where,
    #[token("filter", ignore(case))]
    Filter,
    #[token("eval", ignore(case))]
    Eval,
    #[token("window", ignore(case))]
    Window,
    #[token("group", ignore(case))]
    Group,
    #[token("sort", ignore(case))]
    Sort,
    #[token("by", ignore(case))]
    By,
    #[token("having", ignore(case))]
    Having,
    #[token("limit", ignore(case))]
    Limit,
    #[token("select", ignore(case))]
    Select,
    #[token("show", ignore(case))]
    Show,
    #[token("as", ignore(case))]
    As,
    #[token("in", ignore(case))]
    In,
    #[token("dictionary", ignore(case))]
    Dictionary,
    #[token("between", ignore(case))]
    Between,
}

impl RawToken {
    fn token_type(self) -> TokenType {
        match self {
            Self::Whitespace => TokenType::Whitespace,
            Self::Comment => TokenType::Comment,
            Self::BlockComment => TokenType::BlockComment,
            Self::DoubleQuoted => TokenType::DoubleQuotedString,
            Self::SingleQuoted => TokenType::SingleQuotedString,
            Self::Param => TokenType::Param,
            Self::Number => TokenType::Number,
            Self::Word => TokenType::String,
            Self::OpenBracket => TokenType::OpenBracket,
            Self::CloseBracket => TokenType::CloseBracket,
            Self::Comma => TokenType::Comma,
            Self::Pipe => TokenType::Pipe,
            Self::Equals => TokenType::Equals,
            Self::NotEquals => TokenType::NotEquals,
            Self::LessThan => TokenType::LessThan,
            Self::LessThanOrEqualTo => TokenType::LessThanOrEqualTo,
            Self::GreaterThan => TokenType::GreaterThan,
            Self::GreaterThanOrEqualTo => TokenType::GreaterThanOrEqualTo,
            Self::MatchesRegex => TokenType::MatchesRegex,
            Self::Plus => TokenType::Plus,
            Self::Minus => TokenType::Minus,
            Self::Multiply => TokenType::Multiply,
            Self::Divide => TokenType::Divide,
            Self::Modulus => TokenType::Modulus,
            Self::Order => TokenType::Order,
            Self::And => TokenType::And,
            Self::Or => TokenType::Or,
            Self::Not => TokenType::Not,
            Self::From => TokenType::From,
            Self::Where => TokenType::Where,
            Self::Filter => TokenType::Filter,
            Self::Eval => TokenType::Eval,
            Self::Window => TokenType::Window,
            Self::Group => TokenType::Group,
            Self::Sort => TokenType::Sort,
            Self::By => TokenType::By,
            Self::Having => TokenType::Having,
            Self::Limit => TokenType::Limit,
            Self::Select => TokenType::Select,
            Self::Show => TokenType::Show,
            Self::As => TokenType::As,
            Self::In => TokenType::In,
            Self::Dictionary => TokenType::Dictionary,
            Self::Between => TokenType::Between,
        }
    }
}
