//! Works out which kinds of help apply at a cursor position in query text.
//!
//! The analyzer walks the tokens before the cursor and tracks the most
//! recent clause keyword together with the token types seen since it. The
//! keyword and the length of that sequence decide the help categories.

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalogue::{HelpCatalogue, HelpRow};
use super::token::{Token, TokenType};
use super::tokenizer::{QueryTokenizer, Tokenizer};

/// Categories of completion the editor may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryHelpType {
    Structure,
    Field,
    QueryableField,
    Function,
    DataSource,
    Dictionary,
    Visualisation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualQueryHelp {
    pub help_types: BTreeSet<QueryHelpType>,
    pub applicable_structure_items: BTreeSet<String>,
}

impl ContextualQueryHelp {
    /// Context for an empty editor: only `from` makes sense.
    pub fn empty_query() -> Self {
        Self {
            help_types: BTreeSet::from([QueryHelpType::Structure]),
            applicable_structure_items: BTreeSet::from(["from".to_string()]),
        }
    }

    pub fn contains(&self, help_type: QueryHelpType) -> bool {
        self.help_types.contains(&help_type)
    }
}

pub struct ContextAnalyzer<'a, T: Tokenizer = QueryTokenizer> {
    catalogue: &'a HelpCatalogue,
    tokenizer: T,
}

impl<'a> ContextAnalyzer<'a, QueryTokenizer> {
    pub fn new(catalogue: &'a HelpCatalogue) -> Self {
        Self::with_tokenizer(catalogue, QueryTokenizer)
    }
}

impl<'a, T: Tokenizer> ContextAnalyzer<'a, T> {
    pub fn with_tokenizer(catalogue: &'a HelpCatalogue, tokenizer: T) -> Self {
        Self {
            catalogue,
            tokenizer,
        }
    }

    /// Help context for a cursor at 1-based `row`/`col` in `text`.
    ///
    /// A blank query, or a cursor at `(0, 0)`, gives the empty-query context.
    pub fn analyze(&self, text: &str, row: usize, col: usize) -> ContextualQueryHelp {
        if text.trim().is_empty() || (row == 0 && col == 0) {
            return ContextualQueryHelp::empty_query();
        }
        let offset = row_col_to_index(text, row, col);
        let end = text
            .char_indices()
            .nth(offset)
            .map_or(text.len(), |(index, _)| index);
        self.analyze_partial(&text[..end])
    }

    /// Help context for a cursor at the end of `partial`.
    pub fn analyze_partial(&self, partial: &str) -> ContextualQueryHelp {
        if partial.trim().is_empty() {
            return ContextualQueryHelp::empty_query();
        }
        let tokens = self.tokenizer.tokenize(partial);
        let types: Vec<TokenType> = tokens.iter().map(|token| token.token_type).collect();
        let state = KeywordState::scan(&tokens, partial.len());

        if seen_in_dictionary(&types) {
            return ContextualQueryHelp {
                help_types: BTreeSet::from([QueryHelpType::Dictionary]),
                applicable_structure_items: BTreeSet::new(),
            };
        }

        let valid_after = state.keywords_valid_after();
        let mut help_types = BTreeSet::new();

        if state.sequence.len() <= 3
            && state.sequence.first() == Some(&TokenType::From)
            && state.sequence.get(1) == Some(&TokenType::Whitespace)
        {
            help_types.insert(QueryHelpType::DataSource);
        }

        let applicable_structure_items: BTreeSet<String> = valid_after
            .iter()
            .filter(|keyword| **keyword != TokenType::By)
            .filter_map(|keyword| keyword.structure_label())
            .filter(|label| self.catalogue.structure(label).is_some())
            .map(str::to_string)
            .collect();
        let include_structure = !valid_after.is_empty();

        if let Some(keyword) = state.last_keyword {
            if state.keywords_seen.contains(&TokenType::From) && types.len() >= 4 {
                help_types.extend(help_types_for(keyword, &state.sequence));
                if !include_structure || suppresses_structure(&state.sequence) {
                    help_types.remove(&QueryHelpType::Structure);
                }
            }
        }

        log::trace!(
            "query help: keyword={:?} sequence={} help={:?}",
            state.last_keyword,
            state.sequence.len(),
            help_types
        );

        ContextualQueryHelp {
            help_types,
            applicable_structure_items,
        }
    }

    /// Catalogue rows for the context at the cursor, filtered by `prefix`.
    pub fn suggest(&self, text: &str, row: usize, col: usize, prefix: &str) -> Vec<HelpRow> {
        let context = self.analyze(text, row, col);
        self.catalogue.suggest(&context, prefix)
    }
}

struct KeywordState {
    last_keyword: Option<TokenType>,
    sequence: Vec<TokenType>,
    keywords_seen: BTreeSet<TokenType>,
}

impl KeywordState {
    fn scan(tokens: &[Token], cursor: usize) -> Self {
        let mut state = Self {
            last_keyword: None,
            sequence: Vec::new(),
            keywords_seen: BTreeSet::new(),
        };
        for token in tokens {
            if token.span.start >= cursor {
                break;
            }
            let token_type = token.token_type;
            if token_type.is_keyword() {
                state.keywords_seen.insert(token_type);
                state.last_keyword = Some(token_type);
                state.sequence.clear();
            }
            state.sequence.push(token_type);
            if token.span.end >= cursor {
                break;
            }
        }
        state
    }

    fn keywords_valid_after(&self) -> &'static [TokenType] {
        match self.last_keyword {
            None => &[TokenType::From],
            Some(TokenType::Group | TokenType::Sort) if !self.sequence.contains(&TokenType::By) => {
                &[TokenType::By]
            }
            Some(keyword) => TokenType::keywords_valid_after(keyword),
        }
    }
}

/// `in dictionary ` optionally followed by a name being typed.
fn seen_in_dictionary(types: &[TokenType]) -> bool {
    const PATTERN: [TokenType; 4] = [
        TokenType::In,
        TokenType::Whitespace,
        TokenType::Dictionary,
        TokenType::Whitespace,
    ];
    if types.ends_with(&PATTERN) {
        return true;
    }
    match types.split_last() {
        Some((last, rest)) => last.is_string() && rest.ends_with(&PATTERN),
        None => false,
    }
}

fn help_types_for(keyword: TokenType, sequence: &[TokenType]) -> BTreeSet<QueryHelpType> {
    use QueryHelpType::*;

    let count = sequence.len();
    if count == 1 {
        return BTreeSet::from([Structure]);
    }

    let types: &[QueryHelpType] = match keyword {
        TokenType::From if count >= 4 => &[Structure],
        TokenType::From => &[],
        TokenType::Where if count > 2 => &[QueryableField, Function, Structure],
        TokenType::Where => &[QueryableField],
        TokenType::Limit if count > 3 => &[Structure],
        TokenType::Limit => &[],
        TokenType::Eval if !contains_run(sequence, &[TokenType::Equals, TokenType::Whitespace]) => {
            &[]
        }
        TokenType::Eval if count > 7 => &[Field, Function, Structure],
        TokenType::Eval => &[Field, Function],
        TokenType::Group | TokenType::Sort if count > 4 => &[Field, Structure],
        TokenType::Group | TokenType::Sort => &[Structure],
        TokenType::Show if count > 3 => &[Field],
        TokenType::Show => &[Visualisation],
        _ if count >= 4 => &[Field, Function, Structure],
        _ if count >= 2 => &[Field, Function],
        _ => &[],
    };
    types.iter().copied().collect()
}

/// Structure keywords make no sense in the middle of an expression.
fn suppresses_structure(sequence: &[TokenType]) -> bool {
    let Some(&last) = sequence.last() else {
        return false;
    };
    last.is_comment()
        || last == TokenType::Comma
        || sequence.ends_with(&[TokenType::Comma, TokenType::Whitespace])
        || last.is_condition()
        || last.is_arithmetic()
        || last == TokenType::OpenBracket
}

fn contains_run(sequence: &[TokenType], run: &[TokenType]) -> bool {
    sequence.windows(run.len()).any(|window| window == run)
}

/// Converts a 1-based row and column into a 0-based character offset.
///
/// Rows past the end land on the end of the text and columns past the end
/// of a line are clamped to that line's end.
pub fn row_col_to_index(text: &str, row: usize, col: usize) -> usize {
    let row = row.max(1);
    let col = col.max(1);
    let mut offset = 0;

    for (index, line) in text.split('\n').enumerate() {
        let line_chars = line.chars().count();
        if index + 1 == row {
            return offset + (col - 1).min(line_chars);
        }
        offset += line_chars + 1;
    }
    text.chars().count()
}
