use std::fmt;

use super::Expr;

/// An expression bound to an output name (`expr AS name`).
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub expr: Expr,
    pub result: String,
}

impl Binding {
    pub fn new(expr: Expr, result: impl Into<String>) -> Binding {
        Binding {
            expr,
            result: result.into(),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expr, self.result)
    }
}

/// An ordered projection list.
pub type Selection = Vec<Binding>;
