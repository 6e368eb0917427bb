//! The closed set of term conditions.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Equals,
    EqualsCaseSensitive,
    NotEquals,
    NotEqualsCaseSensitive,
    Contains,
    ContainsCaseSensitive,
    StartsWith,
    StartsWithCaseSensitive,
    EndsWith,
    EndsWithCaseSensitive,
    MatchesRegex,
    MatchesRegexCaseSensitive,
    WordBoundary,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Between,
    In,
    InDictionary,
    InFolder,
    IsDocRef,
    IsUserRef,
    OfDocRef,
    UsesDocRef,
    BelongsTo,
    IsNull,
    IsNotNull,
}

impl Condition {
    pub const ALL: [Condition; 28] = [
        Self::Equals,
        Self::EqualsCaseSensitive,
        Self::NotEquals,
        Self::NotEqualsCaseSensitive,
        Self::Contains,
        Self::ContainsCaseSensitive,
        Self::StartsWith,
        Self::StartsWithCaseSensitive,
        Self::EndsWith,
        Self::EndsWithCaseSensitive,
        Self::MatchesRegex,
        Self::MatchesRegexCaseSensitive,
        Self::WordBoundary,
        Self::GreaterThan,
        Self::GreaterThanOrEqualTo,
        Self::LessThan,
        Self::LessThanOrEqualTo,
        Self::Between,
        Self::In,
        Self::InDictionary,
        Self::InFolder,
        Self::IsDocRef,
        Self::IsUserRef,
        Self::OfDocRef,
        Self::UsesDocRef,
        Self::BelongsTo,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// Operator symbol as written in query text.
    pub fn operator(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::EqualsCaseSensitive => "==",
            Self::NotEquals => "!=",
            Self::NotEqualsCaseSensitive => "!==",
            Self::Contains => "contains",
            Self::ContainsCaseSensitive => "contains_cs",
            Self::StartsWith => "startswith",
            Self::StartsWithCaseSensitive => "startswith_cs",
            Self::EndsWith => "endswith",
            Self::EndsWithCaseSensitive => "endswith_cs",
            Self::MatchesRegex => "=~",
            Self::MatchesRegexCaseSensitive => "==~",
            Self::WordBoundary => "?",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqualTo => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqualTo => "<=",
            Self::Between => "between",
            Self::In => "in",
            Self::InDictionary => "in dictionary",
            Self::InFolder => "in folder",
            Self::IsDocRef => "is",
            Self::IsUserRef => "is user",
            Self::OfDocRef => "of",
            Self::UsesDocRef => "uses",
            Self::BelongsTo => "belongs to",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
        }
    }

    /// Human readable name.
    pub fn display_value(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::EqualsCaseSensitive => "equals (case sensitive)",
            Self::NotEquals => "not equals",
            Self::NotEqualsCaseSensitive => "not equals (case sensitive)",
            Self::Contains => "contains",
            Self::ContainsCaseSensitive => "contains (case sensitive)",
            Self::StartsWith => "starts with",
            Self::StartsWithCaseSensitive => "starts with (case sensitive)",
            Self::EndsWith => "ends with",
            Self::EndsWithCaseSensitive => "ends with (case sensitive)",
            Self::MatchesRegex => "matches regex",
            Self::MatchesRegexCaseSensitive => "matches regex (case sensitive)",
            Self::WordBoundary => "word boundary",
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqualTo => "greater than or equal to",
            Self::LessThan => "less than",
            Self::LessThanOrEqualTo => "less than or equal to",
            Self::Between => "between",
            Self::In => "in",
            Self::InDictionary => "in dictionary",
            Self::InFolder => "in folder",
            Self::IsDocRef => "is",
            Self::IsUserRef => "is user",
            Self::OfDocRef => "of",
            Self::UsesDocRef => "uses",
            Self::BelongsTo => "belongs to",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Equals => "Matches values equal to the term, ignoring case",
            Self::EqualsCaseSensitive => "Matches values exactly equal to the term",
            Self::NotEquals => "Matches values not equal to the term, ignoring case",
            Self::NotEqualsCaseSensitive => "Matches values not exactly equal to the term",
            Self::Contains => "Matches values containing the term, ignoring case",
            Self::ContainsCaseSensitive => "Matches values containing the exact term",
            Self::StartsWith => "Matches values starting with the term, ignoring case",
            Self::StartsWithCaseSensitive => "Matches values starting with the exact term",
            Self::EndsWith => "Matches values ending with the term, ignoring case",
            Self::EndsWithCaseSensitive => "Matches values ending with the exact term",
            Self::MatchesRegex => "Matches values against a regular expression, ignoring case",
            Self::MatchesRegexCaseSensitive => "Matches values against a regular expression",
            Self::WordBoundary => "Matches word boundaries using the characters of the term",
            Self::GreaterThan => "Matches values greater than the term",
            Self::GreaterThanOrEqualTo => "Matches values greater than or equal to the term",
            Self::LessThan => "Matches values less than the term",
            Self::LessThanOrEqualTo => "Matches values less than or equal to the term",
            Self::Between => "Matches values between two comma separated bounds",
            Self::In => "Matches any of a comma separated list of values",
            Self::InDictionary => "Matches any of the words held in a dictionary",
            Self::InFolder => "Matches documents held in a folder",
            Self::IsDocRef => "Matches a specific document",
            Self::IsUserRef => "Matches a specific user or group",
            Self::OfDocRef => "Matches items belonging to a document",
            Self::UsesDocRef => "Matches documents that use another document",
            Self::BelongsTo => "Matches users that are members of a group",
            Self::IsNull => "Matches missing values",
            Self::IsNotNull => "Matches present values",
        }
    }

    pub fn is_case_sensitive(self) -> bool {
        matches!(
            self,
            Self::EqualsCaseSensitive
                | Self::NotEqualsCaseSensitive
                | Self::ContainsCaseSensitive
                | Self::StartsWithCaseSensitive
                | Self::EndsWithCaseSensitive
                | Self::MatchesRegexCaseSensitive
        )
    }

    /// The case sensitive counterpart, or `self` when there is none.
    pub fn case_sensitive_variant(self) -> Self {
        match self {
            Self::Equals => Self::EqualsCaseSensitive,
            Self::NotEquals => Self::NotEqualsCaseSensitive,
            Self::Contains => Self::ContainsCaseSensitive,
            Self::StartsWith => Self::StartsWithCaseSensitive,
            Self::EndsWith => Self::EndsWithCaseSensitive,
            Self::MatchesRegex => Self::MatchesRegexCaseSensitive,
            other => other,
        }
    }

    /// The case insensitive counterpart, or `self` when there is none.
    pub fn case_insensitive_variant(self) -> Self {
        match self {
            Self::EqualsCaseSensitive => Self::Equals,
            Self::NotEqualsCaseSensitive => Self::NotEquals,
            Self::ContainsCaseSensitive => Self::Contains,
            Self::StartsWithCaseSensitive => Self::StartsWith,
            Self::EndsWithCaseSensitive => Self::EndsWith,
            Self::MatchesRegexCaseSensitive => Self::MatchesRegex,
            other => other,
        }
    }

    /// Conditions whose right hand side is a document reference.
    pub fn uses_doc_ref(self) -> bool {
        matches!(
            self,
            Self::InDictionary
                | Self::InFolder
                | Self::IsDocRef
                | Self::IsUserRef
                | Self::OfDocRef
                | Self::UsesDocRef
        )
    }

    /// Conditions that take no value at all.
    pub fn is_unary(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// Looks up a condition by its operator symbol. Word operators ignore case.
    pub fn from_operator(operator: &str) -> Option<Self> {
        let operator = operator.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|condition| condition.operator().eq_ignore_ascii_case(operator))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator())
    }
}
