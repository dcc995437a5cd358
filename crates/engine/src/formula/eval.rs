// Formula evaluator - evaluates row-scoped expressions against a row context

use super::parser::{Expr, Op};

/// Source of column values for the row a formula is evaluated in.
pub trait RowLookup {
    /// Value of the named column in the current row; `None` if no such column.
    fn column_value(&self, name: &str) -> Option<Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Error(String),
}

impl Value {
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Error(_) => None,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Number(n) => crate::cell::format_number(*n),
            Value::Error(e) => e.clone(),
        }
    }
}

pub fn evaluate<L: RowLookup + ?Sized>(expr: &Expr, lookup: &L) -> Value {
    match expr {
        Expr::Number(n) => Value::Number(*n),
        Expr::ThisRow(name) => lookup
            .column_value(name)
            .unwrap_or_else(|| Value::Error("#REF!".to_string())),
        Expr::Neg(inner) => match evaluate(inner, lookup) {
            Value::Number(n) => Value::Number(-n),
            err => err,
        },
        Expr::BinaryOp { op, left, right } => {
            let l = match evaluate(left, lookup) {
                Value::Number(n) => n,
                err => return err,
            };
            let r = match evaluate(right, lookup) {
                Value::Number(n) => n,
                err => return err,
            };
            match op {
                Op::Add => Value::Number(l + r),
                Op::Sub => Value::Number(l - r),
                Op::Mul => Value::Number(l * r),
                Op::Div => {
                    if r == 0.0 {
                        Value::Error("#DIV/0!".to_string())
                    } else {
                        Value::Number(l / r)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser::parse;
    use std::collections::HashMap;

    struct Row(HashMap<&'static str, f64>);

    impl RowLookup for Row {
        fn column_value(&self, name: &str) -> Option<Value> {
            self.0.get(name).map(|n| Value::Number(*n))
        }
    }

    fn row() -> Row {
        Row(HashMap::from([("Stock", 5.0), ("CantidadPedida", 10.0)]))
    }

    fn eval(src: &str) -> Value {
        evaluate(&parse(src).unwrap(), &row())
    }

    #[test]
    fn sums_row_fields() {
        assert_eq!(eval("=[@Stock]+[@CantidadPedida]"), Value::Number(15.0));
        assert_eq!(eval("=([@Stock]-1)*2/4"), Value::Number(2.0));
        assert_eq!(eval("=-[@Stock]"), Value::Number(-5.0));
    }

    #[test]
    fn unknown_column_is_ref_error() {
        assert_eq!(eval("=[@Missing]+1"), Value::Error("#REF!".into()));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval("=[@Stock]/0"), Value::Error("#DIV/0!".into()));
    }

    #[test]
    fn nan_propagates() {
        let lookup = Row(HashMap::from([("Stock", 5.0), ("CantidadPedida", f64::NAN)]));
        let value = evaluate(&parse("=[@Stock]+[@CantidadPedida]").unwrap(), &lookup);
        assert!(value.to_number().unwrap().is_nan());
    }
}
