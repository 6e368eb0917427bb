//! Query-language help: tokens, the context analyzer and the help catalogue.

mod analyzer;
mod catalogue;
mod token;
mod tokenizer;

pub use analyzer::{row_col_to_index, ContextAnalyzer, ContextualQueryHelp, QueryHelpType};
pub use catalogue::{FunctionDoc, HelpCatalogue, HelpRow, StructureDoc};
pub use token::{Token, TokenType};
pub use tokenizer::{QueryTokenizer, Tokenizer};
