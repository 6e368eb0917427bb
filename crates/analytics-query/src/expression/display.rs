use std::fmt::{self, Write};

use super::item::{ExpressionItem, ExpressionOperator, ExpressionTerm};

impl fmt::Display for ExpressionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_item(f, self)
    }
}

impl fmt::Display for ExpressionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_operator(f, self)
    }
}

impl fmt::Display for ExpressionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self)
    }
}

fn write_item<W: Write>(out: &mut W, item: &ExpressionItem) -> fmt::Result {
    match item {
        ExpressionItem::Operator(operator) => write_operator(out, operator),
        ExpressionItem::Term(term) => write_term(out, term),
    }
}

fn write_operator<W: Write>(out: &mut W, operator: &ExpressionOperator) -> fmt::Result {
    if !operator.enabled() {
        out.write_char('!')?;
    }
    write!(out, "{} {{", operator.op.as_str())?;
    for (index, child) in operator.children.iter().enumerate() {
        if index > 0 {
            out.write_str(", ")?;
        }
        write_item(out, child)?;
    }
    out.write_char('}')
}

fn write_term<W: Write>(out: &mut W, term: &ExpressionTerm) -> fmt::Result {
    if !term.enabled() {
        out.write_char('!')?;
    }
    write!(out, "{} {}", term.field, term.condition.operator())?;
    if term.condition.is_unary() {
        return Ok(());
    }
    match &term.doc_ref {
        Some(doc_ref) if term.condition.uses_doc_ref() => {
            write!(out, " {}", doc_ref.display_name())
        }
        _ => write!(out, " {}", term.value_str()),
    }
}
