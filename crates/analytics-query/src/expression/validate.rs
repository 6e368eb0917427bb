use super::item::{ExpressionItem, ExpressionOperator, ExpressionTerm, Op};
use crate::error::{QueryError, Result};

/// Checks an expression tree for structurally invalid items.
///
/// Disabled items are not checked. Reports the first problem in tree order.
pub fn validate(operator: &ExpressionOperator) -> Result<()> {
    validate_operator(operator)
}

fn validate_operator(operator: &ExpressionOperator) -> Result<()> {
    if !operator.enabled() {
        return Ok(());
    }
    if operator.op == Op::Not && operator.enabled_children().count() > 1 {
        log::debug!(
            "validation failed: NOT with {} children",
            operator.children.len()
        );
        return Err(QueryError::validation(
            "NOT operator must have a single child",
            ExpressionItem::Operator(operator.clone()),
        ));
    }
    for child in operator.enabled_children() {
        match child {
            ExpressionItem::Operator(inner) => validate_operator(inner)?,
            ExpressionItem::Term(term) => validate_term(term)?,
        }
    }
    Ok(())
}

fn validate_term(term: &ExpressionTerm) -> Result<()> {
    let reject = |message: String| -> Result<()> {
        Err(QueryError::validation(message, ExpressionItem::Term(term.clone())))
    };

    if term.field.trim().is_empty() {
        return reject("term has no field".to_string());
    }
    if term.condition.is_unary() {
        return Ok(());
    }
    if term.condition.uses_doc_ref() {
        let has_doc_ref = term
            .doc_ref
            .as_ref()
            .is_some_and(|doc_ref| !doc_ref.uuid.trim().is_empty());
        if !has_doc_ref && term.value_str().trim().is_empty() {
            return reject(format!(
                "'{}' {} requires a document reference",
                term.field,
                term.condition.display_value()
            ));
        }
        return Ok(());
    }
    if term.value_str().trim().is_empty() {
        return reject(format!("'{}' has no value", term.field));
    }
    if term.condition == super::Condition::Between && term.value_str().split(',').count() != 2 {
        return reject(format!(
            "'{}' between requires two comma separated values",
            term.field
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Condition, DocRef, Enablement};

    fn term(field: &str, condition: Condition, value: &str) -> ExpressionItem {
        ExpressionTerm::new(field, condition, value).into()
    }

    #[test]
    fn accepts_well_formed_tree() {
        let root = ExpressionOperator::and(vec![
            term("feed", Condition::Equals, "X"),
            term("size", Condition::Between, "1,10"),
            ExpressionOperator::not(vec![term("user", Condition::Contains, "bob")]).into(),
            ExpressionTerm::with_doc_ref("words", Condition::InDictionary, DocRef::new("Dictionary", "d1"))
                .into(),
            ExpressionTerm {
                value: None,
                ..ExpressionTerm::new("host", Condition::IsNull, "")
            }
            .into(),
        ]);
        assert!(validate(&root).is_ok());
    }

    #[test]
    fn rejects_missing_value() {
        let root = ExpressionOperator::and(vec![term("feed", Condition::Equals, "")]);
        let err = validate(&root).expect_err("blank value");
        match err {
            QueryError::ExpressionValidation { message, item } => {
                assert!(message.contains("feed"));
                assert_eq!(item.as_term().map(|t| t.field.as_str()), Some("feed"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_multi_child_not() {
        let root = ExpressionOperator::and(vec![ExpressionOperator::not(vec![
            term("a", Condition::Equals, "1"),
            term("b", Condition::Equals, "2"),
        ])
        .into()]);
        assert!(matches!(
            validate(&root),
            Err(QueryError::ExpressionValidation { .. })
        ));
    }

    #[test]
    fn ignores_disabled_items() {
        let root = ExpressionOperator::and(vec![
            term("feed", Condition::Equals, "").with_enabled(Enablement::Disabled),
            term("size", Condition::Between, "1"),
        ]);
        assert!(validate(&root).is_err());

        let root = ExpressionOperator::and(vec![
            term("feed", Condition::Equals, "").with_enabled(Enablement::Disabled),
        ]);
        assert!(validate(&root).is_ok());
    }
}
