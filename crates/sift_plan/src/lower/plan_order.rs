use sift_ir::expr::Expr;
use sift_ir::trace::OrderColumn;

use crate::errors::{unsupported, PlanError, Result};
use crate::operator::{HashOrder, OrderBy, OrderByColumn, PhysicalOperator};

/// ORDER BY fuses into an upstream hash aggregate by output position.
/// Otherwise an `OrderBy` operator is materialized after dropping constant
/// columns and rejecting duplicates.
pub(crate) fn plan_order(columns: &[OrderColumn], from: PhysicalOperator) -> Result<PhysicalOperator> {
    let mut from = from;
    if let PhysicalOperator::HashAggregate(agg) = &mut from {
        // Aggregate output columns come first, then group columns.
        'outer: for oc in columns {
            for (i, a) in agg.agg.iter().enumerate() {
                if oc.column.is_identifier(&a.result) {
                    agg.order_by.push(HashOrder {
                        column: i,
                        desc: oc.desc,
                        nulls_last: oc.nulls_last,
                    });
                    continue 'outer;
                }
            }
            for (i, b) in agg.by.iter().enumerate() {
                if oc.column.is_identifier(&b.result) {
                    agg.order_by.push(HashOrder {
                        column: agg.agg.len() + i,
                        desc: oc.desc,
                        nulls_last: oc.nulls_last,
                    });
                    continue 'outer;
                }
            }
            return Err(unsupported!(
                "cannot ORDER BY expression {:?}",
                oc.column.to_string()
            ));
        }
        return Ok(from);
    }

    let mut survived: Vec<OrderByColumn> = Vec::with_capacity(columns.len());
    for oc in columns {
        // constants do not meaningfully apply a sort
        if matches!(oc.column, Expr::Literal(_)) {
            continue;
        }
        survived.push(OrderByColumn {
            expr: oc.column.clone(),
            desc: oc.desc,
            nulls_last: oc.nulls_last,
        });
    }
    if survived.is_empty() {
        return Ok(from);
    }

    for i in 0..survived.len() {
        for j in i + 1..survived.len() {
            if survived[i].expr.equivalent(&survived[j].expr) {
                return Err(PlanError::DuplicateOrder(survived[j].expr.to_string()));
            }
        }
    }

    Ok(PhysicalOperator::OrderBy(OrderBy {
        from: Box::new(from),
        columns: survived,
        limit: None,
        offset: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::HashAggregate;
    use sift_ir::expr::aggregate::{AggBinding, AggregateExpr, AggregateOp};
    use sift_ir::expr::binding::Binding;
    use sift_ir::expr::{ident, lit, path};

    fn order(column: Expr) -> OrderColumn {
        OrderColumn::new(column)
    }

    fn hash_aggregate() -> PhysicalOperator {
        PhysicalOperator::HashAggregate(HashAggregate {
            from: Box::new(PhysicalOperator::DummyOutput),
            agg: vec![AggBinding::new(
                AggregateExpr::new(AggregateOp::Count, Expr::Star),
                "n",
            )],
            by: vec![Binding::new(ident("k"), "k")],
            order_by: Vec::new(),
            limit: None,
        })
    }

    #[test]
    fn order_fuses_into_hash_aggregate_by_position() {
        let op = plan_order(
            &[order(ident("n")).descending(), order(ident("k"))],
            hash_aggregate(),
        )
        .unwrap();
        let PhysicalOperator::HashAggregate(agg) = &op else {
            panic!("expected fused hash aggregate, got {op:?}");
        };
        assert_eq!(
            agg.order_by,
            vec![
                HashOrder {
                    column: 0,
                    desc: true,
                    nulls_last: false
                },
                HashOrder {
                    column: 1,
                    desc: false,
                    nulls_last: false
                },
            ]
        );
    }

    #[test]
    fn unresolvable_hash_order_is_rejected() {
        let err = plan_order(&[order(ident("missing"))], hash_aggregate()).unwrap_err();
        assert!(matches!(err, PlanError::Unsupported(_)));
        assert!(err.to_string().contains("cannot ORDER BY"));
    }

    #[test]
    fn constants_are_pruned_before_duplicate_detection() {
        // ORDER BY 1, x: the literal is dropped, leaving a single column.
        let op = plan_order(
            &[order(lit(1)), order(ident("x"))],
            PhysicalOperator::DummyOutput,
        )
        .unwrap();
        let PhysicalOperator::OrderBy(order_by) = &op else {
            panic!("expected an order-by, got {op:?}");
        };
        assert_eq!(order_by.columns.len(), 1);
        assert!(order_by.columns[0].expr.is_identifier("x"));
    }

    #[test]
    fn all_constant_ordering_leaves_the_tree_unchanged() {
        let op = plan_order(
            &[order(lit(1)), order(lit("a"))],
            PhysicalOperator::DummyOutput,
        )
        .unwrap();
        assert!(matches!(op, PhysicalOperator::DummyOutput));
    }

    #[test]
    fn equivalent_columns_are_rejected() {
        let err = plan_order(
            &[order(ident("x")), order(path("x", &[]))],
            PhysicalOperator::DummyOutput,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::DuplicateOrder(_)));
    }
}
