use sift_ir::expr::Expr;
use sift_ir::trace::IterValue;

use crate::errors::{unsupported, Result};
use crate::operator::{PhysicalOperator, Unnest};

/// Cross-joins are honored only against a path expression, which lowers to
/// an unnest of that path per outer row.
pub(crate) fn plan_iter_value(iv: &IterValue, from: PhysicalOperator) -> Result<PhysicalOperator> {
    if iv.wildcard {
        return Err(unsupported!("cannot project '*' from a cross-join"));
    }
    match &iv.value {
        Expr::Path(pivot) => Ok(PhysicalOperator::Unnest(Unnest {
            from: Box::new(from),
            pivot: pivot.clone(),
            inner_project: iv.inner_bind.clone(),
            outer_project: iv.outer_bind.clone(),
            inner_match: iv.filter.clone(),
        })),
        Expr::Unpivot(_) => Err(unsupported!("UNPIVOT is not supported yet")),
        _ => Err(unsupported!("cross-join on non-path nor UNPIVOT expression")),
    }
}
