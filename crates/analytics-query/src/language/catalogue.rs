//! Built-in help documentation for structure keywords and functions.

use std::sync::OnceLock;

use serde::Serialize;

use super::analyzer::{ContextualQueryHelp, QueryHelpType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDoc {
    pub name: &'static str,
    pub snippet: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDoc {
    pub name: &'static str,
    pub signature: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

/// One completion offered to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRow {
    pub help_type: QueryHelpType,
    pub name: String,
    pub detail: String,
    pub description: String,
}

/// Immutable lookup of keyword and function documentation.
#[derive(Debug, Clone, Default)]
pub struct HelpCatalogue {
    structures: Vec<StructureDoc>,
    functions: Vec<FunctionDoc>,
}

impl HelpCatalogue {
    pub fn new(mut structures: Vec<StructureDoc>, mut functions: Vec<FunctionDoc>) -> Self {
        structures.sort_by(|a, b| a.name.cmp(b.name));
        functions.sort_by(|a, b| a.name.cmp(b.name));
        Self {
            structures,
            functions,
        }
    }

    /// The built-in catalogue, built on first use.
    pub fn standard() -> &'static HelpCatalogue {
        static STANDARD: OnceLock<HelpCatalogue> = OnceLock::new();
        STANDARD.get_or_init(|| HelpCatalogue::new(standard_structures(), standard_functions()))
    }

    pub fn structures(&self) -> &[StructureDoc] {
        &self.structures
    }

    pub fn functions(&self) -> &[FunctionDoc] {
        &self.functions
    }

    pub fn structure(&self, name: &str) -> Option<&StructureDoc> {
        self.structures.iter().find(|doc| doc.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDoc> {
        self.functions
            .iter()
            .find(|doc| doc.name.eq_ignore_ascii_case(name))
    }

    /// Structure and function rows valid in `context` whose names start with
    /// `prefix`, ignoring case. Other help types come from elsewhere.
    pub fn suggest(&self, context: &ContextualQueryHelp, prefix: &str) -> Vec<HelpRow> {
        let prefix = prefix.trim().to_ascii_lowercase();
        let matches = |name: &str| name.to_ascii_lowercase().starts_with(&prefix);
        let mut rows = Vec::new();

        if context.help_types.contains(&QueryHelpType::Structure) {
            rows.extend(
                self.structures
                    .iter()
                    .filter(|doc| context.applicable_structure_items.contains(doc.name))
                    .filter(|doc| matches(doc.name))
                    .map(|doc| HelpRow {
                        help_type: QueryHelpType::Structure,
                        name: doc.name.to_string(),
                        detail: doc.snippet.to_string(),
                        description: doc.description.to_string(),
                    }),
            );
        }
        if context.help_types.contains(&QueryHelpType::Function) {
            rows.extend(
                self.functions
                    .iter()
                    .filter(|doc| matches(doc.name))
                    .map(|doc| HelpRow {
                        help_type: QueryHelpType::Function,
                        name: doc.name.to_string(),
                        detail: doc.signature.to_string(),
                        description: doc.description.to_string(),
                    }),
            );
        }
        rows
    }
}

fn structure(name: &'static str, snippet: &'static str, description: &'static str) -> StructureDoc {
    StructureDoc {
        name,
        snippet,
        description,
    }
}

fn function(
    name: &'static str,
    signature: &'static str,
    category: &'static str,
    description: &'static str,
) -> FunctionDoc {
    FunctionDoc {
        name,
        signature,
        category,
        description,
    }
}

fn standard_structures() -> Vec<StructureDoc> {
    vec![
        structure("from", "from ${1:data_source}", "Selects the data source to query."),
        structure("where", "where ${1:field} = ${2:value}", "Filters indexed fields before values are extracted."),
        structure("filter", "filter ${1:field} = ${2:value}", "Filters rows after values are extracted."),
        structure("eval", "eval ${1:name} = ${2:expression}", "Assigns the result of an expression to a new field."),
        structure("window", "window ${1:field} by ${2:period}", "Groups rows into time windows."),
        structure("group by", "group by ${1:field}", "Groups rows by one or more fields."),
        structure("sort by", "sort by ${1:field} ${2:asc}", "Orders rows by one or more fields."),
        structure("having", "having ${1:field} > ${2:value}", "Filters grouped rows."),
        structure("limit", "limit ${1:count}", "Caps the number of rows returned."),
        structure("select", "select ${1:field}", "Chooses the fields to show in the table."),
        structure("show", "show ${1:visualisation}", "Displays the table as a visualisation."),
        structure("in dictionary", "in dictionary ${1:name}", "Matches any term held in a dictionary."),
        structure("and", "and ${1:field} = ${2:value}", "Both conditions must match."),
        structure("or", "or ${1:field} = ${2:value}", "Either condition may match."),
        structure("not", "not ${1:field} = ${2:value}", "Negates the following condition."),
    ]
}

fn standard_functions() -> Vec<FunctionDoc> {
    vec![
        function("count", "count()", "Aggregate", "Number of rows in the group."),
        function("countUnique", "countUnique(field)", "Aggregate", "Number of distinct values in the group."),
        function("sum", "sum(field)", "Aggregate", "Sum of the values in the group."),
        function("average", "average(field)", "Aggregate", "Mean of the values in the group."),
        function("min", "min(field)", "Aggregate", "Smallest value in the group."),
        function("max", "max(field)", "Aggregate", "Largest value in the group."),
        function("stDev", "stDev(field)", "Aggregate", "Standard deviation of the values in the group."),
        function("concat", "concat(a, b, ...)", "String", "Joins values into one string."),
        function("lowerCase", "lowerCase(text)", "String", "Converts text to lower case."),
        function("upperCase", "upperCase(text)", "String", "Converts text to upper case."),
        function("substring", "substring(text, start, end)", "String", "Part of a string by position."),
        function("replace", "replace(text, pattern, replacement)", "String", "Replaces regex matches."),
        function("stringLength", "stringLength(text)", "String", "Number of characters in text."),
        function("if", "if(condition, then, else)", "Logic", "Chooses a value by condition."),
        function("not", "not(value)", "Logic", "Inverts a boolean."),
        function("isNull", "isNull(value)", "Type checking", "True when the value is missing."),
        function("round", "round(value, places)", "Mathematics", "Rounds to the given decimal places."),
        function("ceiling", "ceiling(value)", "Mathematics", "Rounds up."),
        function("floor", "floor(value)", "Mathematics", "Rounds down."),
        function("parseDate", "parseDate(text, pattern)", "Date", "Parses a date string to a timestamp."),
        function("formatDate", "formatDate(time, pattern)", "Date", "Formats a timestamp as text."),
        function("roundHour", "roundHour(time)", "Date", "Rounds a timestamp to the nearest hour."),
        function("roundDay", "roundDay(time)", "Date", "Rounds a timestamp to the nearest day."),
        function("param", "param(key)", "Parameters", "Value of a query parameter."),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn context(types: &[QueryHelpType], items: &[&str]) -> ContextualQueryHelp {
        ContextualQueryHelp {
            help_types: types.iter().copied().collect(),
            applicable_structure_items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn standard_catalogue_documents_every_structure_label() {
        let catalogue = HelpCatalogue::standard();
        for label in ["from", "where", "group by", "sort by", "in dictionary", "show"] {
            assert!(catalogue.structure(label).is_some(), "missing {label}");
        }
        assert!(catalogue.function("COUNT").is_some());
    }

    #[test]
    fn suggest_filters_by_context_and_prefix() {
        let catalogue = HelpCatalogue::standard();
        let ctx = context(
            &[QueryHelpType::Structure, QueryHelpType::Function],
            &["sort by", "select", "show"],
        );

        let names: BTreeSet<_> = catalogue
            .suggest(&ctx, "s")
            .into_iter()
            .map(|row| (row.help_type, row.name))
            .collect();
        assert!(names.contains(&(QueryHelpType::Structure, "sort by".to_string())));
        assert!(names.contains(&(QueryHelpType::Structure, "select".to_string())));
        assert!(names.contains(&(QueryHelpType::Function, "sum".to_string())));
        assert!(names.contains(&(QueryHelpType::Function, "substring".to_string())));
        assert!(!names.iter().any(|(_, name)| name == "count"));
    }

    #[test]
    fn suggest_ignores_types_it_does_not_own() {
        let catalogue = HelpCatalogue::standard();
        let ctx = context(&[QueryHelpType::Field, QueryHelpType::DataSource], &["where"]);
        assert!(catalogue.suggest(&ctx, "").is_empty());
    }
}
