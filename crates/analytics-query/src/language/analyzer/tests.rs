use std::collections::BTreeSet;

use super::*;

fn analyze_end(text: &str) -> ContextualQueryHelp {
    let analyzer = ContextAnalyzer::new(HelpCatalogue::standard());
    let rows: Vec<&str> = text.split('\n').collect();
    let row = rows.len();
    let col = rows.last().map_or(0, |line| line.chars().count()) + 1;
    analyzer.analyze(text, row, col)
}

fn help(types: &[QueryHelpType]) -> BTreeSet<QueryHelpType> {
    types.iter().copied().collect()
}

fn labels(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn empty_query_offers_from() {
    let analyzer = ContextAnalyzer::new(HelpCatalogue::standard());
    assert_eq!(analyzer.analyze("   ", 1, 3), ContextualQueryHelp::empty_query());
    assert_eq!(analyzer.analyze("from x", 0, 0), ContextualQueryHelp::empty_query());
    assert_eq!(analyzer.analyze("from x", 1, 1), ContextualQueryHelp::empty_query());

    let context = ContextualQueryHelp::empty_query();
    assert_eq!(context.help_types, help(&[QueryHelpType::Structure]));
    assert_eq!(context.applicable_structure_items, labels(&["from"]));
}

#[test]
fn after_from_only_data_sources() {
    let context = analyze_end("from ");
    assert_eq!(context.help_types, help(&[QueryHelpType::DataSource]));
    assert!(!context.contains(QueryHelpType::Structure));
}

#[test]
fn typing_a_data_source_name() {
    let context = analyze_end("from Ind");
    assert_eq!(context.help_types, help(&[QueryHelpType::DataSource]));
}

#[test]
fn after_data_source_offers_next_clause() {
    let context = analyze_end("from Index ");
    assert_eq!(context.help_types, help(&[QueryHelpType::Structure]));
    assert!(context.applicable_structure_items.contains("where"));
    assert!(context.applicable_structure_items.contains("group by"));
    assert!(!context.applicable_structure_items.contains("from"));
}

#[test]
fn fresh_where_clause_offers_queryable_fields() {
    let context = analyze_end("from x | where ");
    assert_eq!(context.help_types, help(&[QueryHelpType::QueryableField]));
    assert!(!context.contains(QueryHelpType::Structure));
}

#[test]
fn inside_where_clause() {
    let context = analyze_end("from x where a = 1 ");
    assert_eq!(
        context.help_types,
        help(&[
            QueryHelpType::QueryableField,
            QueryHelpType::Function,
            QueryHelpType::Structure,
        ])
    );
    assert!(context.applicable_structure_items.contains("and"));
    assert!(context.applicable_structure_items.contains("in dictionary"));
}

#[test]
fn structure_suppressed_after_operators() {
    for text in [
        "from x where a >",
        "from x filter b +",
        "from x select a, ",
        "from x select a,",
        "from x filter count(",
        "from x where a = 1 // note",
        "from x where a = 1 /* note */",
    ] {
        let context = analyze_end(text);
        assert!(!context.contains(QueryHelpType::Structure), "{text}");
    }
}

#[test]
fn in_dictionary_offers_only_dictionaries() {
    let expected = help(&[QueryHelpType::Dictionary]);
    assert_eq!(analyze_end("from x where feed in dictionary ").help_types, expected);
    assert_eq!(analyze_end("from x where feed in dictionary bad").help_types, expected);
    assert!(analyze_end("from x where feed in dictionary ")
        .applicable_structure_items
        .is_empty());
}

#[test]
fn group_requires_by() {
    let context = analyze_end("from x group ");
    assert!(context.applicable_structure_items.is_empty());
    assert_eq!(context.help_types, help(&[QueryHelpType::Structure]));

    let context = analyze_end("from x group by host ");
    assert_eq!(
        context.help_types,
        help(&[QueryHelpType::Field, QueryHelpType::Structure])
    );
    assert!(context.applicable_structure_items.contains("having"));
}

#[test]
fn eval_waits_for_assignment() {
    assert!(analyze_end("from x eval total ").help_types.is_empty());
    assert_eq!(
        analyze_end("from x eval total = ").help_types,
        help(&[QueryHelpType::Field, QueryHelpType::Function])
    );
    assert_eq!(
        analyze_end("from x eval total = a ").help_types,
        help(&[
            QueryHelpType::Field,
            QueryHelpType::Function,
            QueryHelpType::Structure,
        ])
    );
}

#[test]
fn show_offers_visualisations_then_fields() {
    assert_eq!(
        analyze_end("from x select a show ").help_types,
        help(&[QueryHelpType::Visualisation])
    );
    let context = analyze_end("from x select a show Bar ");
    assert_eq!(context.help_types, help(&[QueryHelpType::Field]));
}

#[test]
fn just_typed_keyword_offers_structure() {
    let context = analyze_end("from x where");
    assert_eq!(context.help_types, help(&[QueryHelpType::Structure]));
}

#[test]
fn multi_line_cursor() {
    let text = "from x\nwhere a = 1\nlimit 10";
    let analyzer = ContextAnalyzer::new(HelpCatalogue::standard());
    // cursor just after "where "
    let context = analyzer.analyze(text, 2, 7);
    assert_eq!(context.help_types, help(&[QueryHelpType::QueryableField]));
}

#[test]
fn row_col_conversion() {
    let text = "ab\ncde\nf";
    assert_eq!(row_col_to_index(text, 1, 1), 0);
    assert_eq!(row_col_to_index(text, 1, 3), 2);
    assert_eq!(row_col_to_index(text, 2, 1), 3);
    assert_eq!(row_col_to_index(text, 2, 99), 6);
    assert_eq!(row_col_to_index(text, 3, 2), 8);
    assert_eq!(row_col_to_index(text, 9, 1), 8);
}

#[test]
fn total_and_deterministic_over_prefixes() {
    let text = "from Index where feed in dictionary \"d\" and not (a >= 1, 'b') \
                eval x = concat(a, ${p}) /* c */ group by x sort by y limit 10 \
                select x show Bar // end @#";
    let analyzer = ContextAnalyzer::new(HelpCatalogue::standard());
    for (end, _) in text.char_indices() {
        let first = analyzer.analyze_partial(&text[..end]);
        let second = analyzer.analyze_partial(&text[..end]);
        assert_eq!(first, second);
    }
}

#[test]
fn suggest_uses_context() {
    let analyzer = ContextAnalyzer::new(HelpCatalogue::standard());
    let text = "from x eval total = a ";
    let rows = analyzer.suggest(text, 1, text.len() + 1, "co");
    assert!(rows.iter().any(|row| row.name == "count"));
    assert!(rows.iter().any(|row| row.name == "concat"));
    assert!(rows.iter().all(|row| row.help_type == QueryHelpType::Function));
}
