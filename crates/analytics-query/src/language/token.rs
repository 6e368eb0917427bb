//! Token types and the keyword follow table.

use std::ops::Range;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Whitespace,
    Comment,
    BlockComment,
    /// Bare word: field names, data source names, function names.
    String,
    DoubleQuotedString,
    SingleQuotedString,
    Number,
    Param,
    OpenBracket,
    CloseBracket,
    Comma,
    Pipe,

    // Comparison
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    MatchesRegex,

    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Order,

    // Logical
    And,
    Or,
    Not,

    // Keywords
    From,
    Where,
    Filter,
    Eval,
    Window,
    Group,
    Sort,
    By,
    Having,
    Limit,
    Select,
    Show,
    As,
    In,
    Dictionary,
    Between,

    Unknown,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

const CONDITIONS: &[TokenType] = &[
    TokenType::Equals,
    TokenType::NotEquals,
    TokenType::LessThan,
    TokenType::LessThanOrEqualTo,
    TokenType::GreaterThan,
    TokenType::GreaterThanOrEqualTo,
    TokenType::MatchesRegex,
];

const ARITHMETIC: &[TokenType] = &[
    TokenType::Plus,
    TokenType::Minus,
    TokenType::Multiply,
    TokenType::Divide,
    TokenType::Modulus,
    TokenType::Order,
];

impl TokenType {
    /// Clause keywords. Seeing one starts a new keyword sequence.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::From
                | Self::Where
                | Self::Filter
                | Self::Eval
                | Self::Window
                | Self::Group
                | Self::Sort
                | Self::Having
                | Self::Limit
                | Self::Select
                | Self::Show
        )
    }

    pub fn is_condition(self) -> bool {
        CONDITIONS.contains(&self)
    }

    pub fn is_arithmetic(self) -> bool {
        ARITHMETIC.contains(&self)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::BlockComment)
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            Self::String | Self::DoubleQuotedString | Self::SingleQuotedString
        )
    }

    /// Keywords that may follow `keyword` in a query.
    pub fn keywords_valid_after(keyword: TokenType) -> &'static [TokenType] {
        use TokenType::*;

        match keyword {
            From => &[Where, Filter, Eval, Window, Group, Sort, Limit, Select],
            Where | Filter => &[
                In, And, Or, Not, Filter, Eval, Window, Group, Sort, Limit, Select,
            ],
            Eval => &[Eval, Filter, Window, Group, Sort, Limit, Select],
            Window => &[Filter, Eval, Group, Sort, Limit, Select],
            Group | Sort => &[By, Group, Sort, Having, Limit, Select],
            Having => &[And, Or, Not, Sort, Group, Limit, Select],
            Limit => &[Select, Show],
            Select => &[Show],
            _ => &[],
        }
    }

    /// Label offered as a structure suggestion, if this token has one.
    pub fn structure_label(self) -> Option<&'static str> {
        let label = match self {
            Self::From => "from",
            Self::Where => "where",
            Self::Filter => "filter",
            Self::Eval => "eval",
            Self::Window => "window",
            Self::Group => "group by",
            Self::Sort => "sort by",
            Self::Having => "having",
            Self::Limit => "limit",
            Self::Select => "select",
            Self::Show => "show",
            Self::In => "in dictionary",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            _ => return None,
        };
        Some(label)
    }
}

/// A typed slice of query text. `span` is a half-open byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(token_type: TokenType, span: Range<usize>) -> Self {
        Self { token_type, span }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.clone()).unwrap_or_default()
    }
}
