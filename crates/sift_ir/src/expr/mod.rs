pub mod aggregate;
pub mod binding;
pub mod typeset;

use std::fmt;

use self::aggregate::AggregateExpr;

/// A dotted access path rooted at an identifier, e.g. `t.items.sku`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub base: String,
    pub rest: Vec<String>,
}

impl Path {
    pub fn new(base: impl Into<String>) -> Path {
        Path {
            base: base.into(),
            rest: Vec::new(),
        }
    }

    /// Extend the path with one more field access.
    pub fn child(mut self, field: impl Into<String>) -> Path {
        self.rest.push(field.into());
        self
    }

    /// Final component of the path.
    pub fn field(&self) -> &str {
        self.rest.last().map(String::as_str).unwrap_or(&self.base)
    }

    /// True when the path is a single identifier with no field accesses.
    pub fn is_bare(&self) -> bool {
        self.rest.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for part in &self.rest {
            write!(f, ".{part}")?;
        }
        Ok(())
    }
}

/// A base-table reference, comparable for structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableExpr(pub Path);

impl TableExpr {
    pub fn new(name: impl Into<String>) -> TableExpr {
        TableExpr(Path::new(name))
    }
}

impl fmt::Display for TableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    Rational { numer: i64, denom: i64 },
    Float(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Rational { numer, denom } => write!(f, "{numer}/{denom}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::String(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Literal {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Literal {
        Literal::Integer(i)
    }
}

impl From<f64> for Literal {
    fn from(x: f64) -> Literal {
        Literal::Float(x)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Literal {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Literal {
        Literal::String(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "NOT"),
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }

    pub fn is_logic(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::Eq => write!(f, "="),
            BinaryOperator::NotEq => write!(f, "!="),
            BinaryOperator::Lt => write!(f, "<"),
            BinaryOperator::LtEq => write!(f, "<="),
            BinaryOperator::Gt => write!(f, ">"),
            BinaryOperator::GtEq => write!(f, ">="),
            BinaryOperator::Plus => write!(f, "+"),
            BinaryOperator::Minus => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Modulo => write!(f, "%"),
            BinaryOperator::And => write!(f, "AND"),
            BinaryOperator::Or => write!(f, "OR"),
        }
    }
}

/// An UNPIVOT form appearing as a cross-join target.
///
/// Recognized by the planner only so it can be rejected with a precise
/// message.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpivot {
    pub value: Box<Expr>,
    pub as_name: Option<String>,
    pub at_name: Option<String>,
}

/// A scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Bare column identifier.
    Ident(String),
    Path(Path),
    /// `*`
    Star,
    Literal(Literal),
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Aggregate(Box<AggregateExpr>),
    Unpivot(Unpivot),
}

impl Expr {
    /// True when the expression is exactly a reference to the column `name`,
    /// spelled either as a bare identifier or as a single-segment path.
    pub fn is_identifier(&self, name: &str) -> bool {
        match self {
            Expr::Ident(s) => s == name,
            Expr::Path(p) => p.is_bare() && p.base == name,
            _ => false,
        }
    }

    /// The column this expression references, when it is a plain reference.
    fn as_column(&self) -> Option<&str> {
        match self {
            Expr::Ident(s) => Some(s),
            Expr::Path(p) if p.is_bare() => Some(&p.base),
            _ => None,
        }
    }

    /// Structural equivalence, normalizing the identifier/path spelling of a
    /// bare column reference.
    pub fn equivalent(&self, other: &Expr) -> bool {
        if let (Some(a), Some(b)) = (self.as_column(), other.as_column()) {
            return a == b;
        }
        match (self, other) {
            (
                Expr::Unary { op: a, expr: x },
                Expr::Unary { op: b, expr: y },
            ) => a == b && x.equivalent(y),
            (
                Expr::Binary {
                    op: a,
                    left: al,
                    right: ar,
                },
                Expr::Binary {
                    op: b,
                    left: bl,
                    right: br,
                },
            ) => a == b && al.equivalent(bl) && ar.equivalent(br),
            _ => self == other,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(s) => write!(f, "{s}"),
            Expr::Path(p) => write!(f, "{p}"),
            Expr::Star => write!(f, "*"),
            Expr::Literal(l) => write!(f, "{l}"),
            Expr::Unary { op, expr } => write!(f, "{op} {expr}"),
            Expr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Aggregate(agg) => write!(f, "{agg}"),
            Expr::Unpivot(u) => write!(f, "UNPIVOT {}", u.value),
        }
    }
}

/// Shorthand for a bare column reference.
pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Ident(name.into())
}

/// Shorthand for a dotted path expression.
pub fn path(base: impl Into<String>, rest: &[&str]) -> Expr {
    let mut p = Path::new(base);
    for part in rest {
        p = p.child(*part);
    }
    Expr::Path(p)
}

/// Shorthand for a literal expression.
pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

/// Shorthand for a binary expression.
pub fn binop(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_and_bare_path_are_equivalent() {
        let a = ident("x");
        let b = path("x", &[]);
        assert!(a.equivalent(&b));
        assert!(b.equivalent(&a));
        assert!(a.is_identifier("x"));
        assert!(b.is_identifier("x"));
    }

    #[test]
    fn dotted_path_is_not_a_bare_identifier() {
        let p = path("t", &["x"]);
        assert!(!p.is_identifier("x"));
        assert!(!p.is_identifier("t"));
        assert!(!p.equivalent(&ident("t")));
    }

    #[test]
    fn binary_equivalence_normalizes_children() {
        let a = binop(BinaryOperator::Gt, ident("y"), lit(5));
        let b = binop(BinaryOperator::Gt, path("y", &[]), lit(5));
        assert!(a.equivalent(&b));

        let c = binop(BinaryOperator::Gt, ident("y"), lit(6));
        assert!(!a.equivalent(&c));
    }

    #[test]
    fn display_renders_sqlish_text() {
        let e = binop(BinaryOperator::Gt, ident("y"), lit(5));
        assert_eq!(e.to_string(), "(y > 5)");
        assert_eq!(path("t", &["items", "sku"]).to_string(), "t.items.sku");
        assert_eq!(lit("a").to_string(), "'a'");
    }
}
