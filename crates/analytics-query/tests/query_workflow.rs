use std::collections::{BTreeSet, HashMap};

use analytics_query::expression::{self, replace_expression_parameters};
use analytics_query::params::parse_param_string;
use analytics_query::{
    Condition, ContextAnalyzer, ExpressionItem, ExpressionOperator, HelpCatalogue, Query,
    QueryHelpType,
};

#[test]
fn expression_json_survives_simplify_and_substitution() {
    let json = r#"{
        "type": "operator",
        "op": "AND",
        "children": [
            {"type": "term", "field": "user", "condition": "EQUALS", "value": "${user:-anon}"},
            {"type": "operator", "op": "OR", "children": [
                {"type": "term", "field": "feed", "condition": "CONTAINS", "value": "X"}
            ]},
            {"type": "term", "enabled": false, "field": "host", "condition": "EQUALS", "value": "h"},
            {"type": "operator", "op": "NOT", "children": [
                {"type": "operator", "op": "NOT", "children": [
                    {"type": "term", "field": "level", "condition": "EQUALS", "value": "ERROR"}
                ]}
            ]}
        ]
    }"#;
    let item: ExpressionItem = serde_json::from_str(json).expect("expression");
    let root = item.as_operator().expect("operator").clone();

    let simplified = expression::simplify(&root);
    assert_eq!(
        simplified.to_string(),
        "AND {user = ${user:-anon}, feed contains X, level = ERROR}"
    );
    assert_eq!(expression::simplify(&simplified), simplified);

    let params: HashMap<String, String> = parse_param_string("user=\"bob smith\"")
        .into_iter()
        .map(|param| (param.key, param.value))
        .collect();
    let resolved = replace_expression_parameters(&simplified, &params, false);
    let users: Vec<_> = expression::terms(&resolved, Some(&["user"]))
        .into_iter()
        .map(|term| term.value_str().to_string())
        .collect();
    assert_eq!(users, vec!["\"bob smith\"".to_string()]);

    let defaulted = replace_expression_parameters(&simplified, &HashMap::new(), false);
    assert_eq!(
        expression::values(&defaulted),
        vec!["anon".to_string(), "X".to_string(), "ERROR".to_string()]
    );

    let json = serde_json::to_string(&ExpressionItem::Operator(simplified.clone())).expect("json");
    assert!(!json.contains("enabled"));
    let back: ExpressionItem = serde_json::from_str(&json).expect("parse");
    assert_eq!(back, ExpressionItem::Operator(simplified));
}

#[test]
fn disabled_feed_term_is_excluded_until_re_enabled() {
    let json = r#"{"op":"AND","children":[
        {"type":"term","field":"feed","condition":"EQUALS","value":"X","enabled":false}
    ]}"#;
    let mut root: ExpressionOperator = serde_json::from_str(json).expect("operator");
    assert!(expression::terms(&root, Some(&["feed"])).is_empty());

    root.children[0] = root.children[0]
        .clone()
        .with_enabled(analytics_query::Enablement::Enabled);
    assert_eq!(expression::terms(&root, Some(&["feed"])).len(), 1);
}

#[test]
fn condition_symbols_drive_term_construction() {
    let condition = Condition::from_operator(">=").expect("condition");
    assert_eq!(condition, Condition::GreaterThanOrEqualTo);
    let query = Query::default();
    assert!(expression::is_empty(&query.expression));
}

#[test]
fn help_follows_the_cursor_through_a_query() {
    let analyzer = ContextAnalyzer::new(HelpCatalogue::standard());
    let text = "from Events\nwhere user in dictionary ";

    let start = analyzer.analyze(text, 1, 6);
    assert_eq!(start.help_types, BTreeSet::from([QueryHelpType::DataSource]));

    let end = analyzer.analyze(text, 2, 26);
    assert_eq!(end.help_types, BTreeSet::from([QueryHelpType::Dictionary]));

    let rows = analyzer.suggest("from Events ", 1, 13, "gr");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "group by");
}
