use sift_ir::expr::aggregate::Aggregation;
use sift_ir::expr::binding::Binding;

use crate::errors::Result;
use crate::operator::{CountStar, HashAggregate, PhysicalOperator, SimpleAggregate};

/// A bare `COUNT(*)` and ungrouped aggregates get dedicated operators;
/// anything grouped becomes a hash aggregate. Ordering and limits on the
/// hash aggregate are set only by later fusion.
pub(crate) fn plan_aggregate(
    agg: &Aggregation,
    group_by: Option<&[Binding]>,
    from: PhysicalOperator,
) -> Result<PhysicalOperator> {
    let from = Box::new(from);
    match group_by {
        None => {
            if agg.len() == 1 && agg[0].agg.is_count_star() {
                return Ok(PhysicalOperator::CountStar(CountStar {
                    from,
                    result: agg[0].result.clone(),
                }));
            }
            Ok(PhysicalOperator::SimpleAggregate(SimpleAggregate {
                from,
                outputs: agg.clone(),
            }))
        }
        Some(by) => Ok(PhysicalOperator::HashAggregate(HashAggregate {
            from,
            agg: agg.clone(),
            by: by.to_vec(),
            order_by: Vec::new(),
            limit: None,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_ir::expr::aggregate::{AggBinding, AggregateExpr, AggregateOp};
    use sift_ir::expr::{ident, Expr};

    fn count_star(result: &str) -> AggBinding {
        AggBinding::new(AggregateExpr::new(AggregateOp::Count, Expr::Star), result)
    }

    fn sum(inner: &str, result: &str) -> AggBinding {
        AggBinding::new(AggregateExpr::new(AggregateOp::Sum, ident(inner)), result)
    }

    #[test]
    fn lone_count_star_gets_its_own_operator() {
        let op = plan_aggregate(&vec![count_star("n")], None, PhysicalOperator::DummyOutput)
            .unwrap();
        let PhysicalOperator::CountStar(cs) = &op else {
            panic!("expected count-star, got {op:?}");
        };
        assert_eq!(cs.result, "n");
    }

    #[test]
    fn ungrouped_aggregates_stay_simple() {
        let op = plan_aggregate(
            &vec![count_star("n"), sum("v", "s")],
            None,
            PhysicalOperator::DummyOutput,
        )
        .unwrap();
        let PhysicalOperator::SimpleAggregate(simple) = &op else {
            panic!("expected simple aggregate, got {op:?}");
        };
        assert_eq!(simple.outputs.len(), 2);
    }

    #[test]
    fn grouping_forces_a_hash_aggregate() {
        let by = vec![Binding::new(ident("k"), "k")];
        let op = plan_aggregate(
            &vec![count_star("n")],
            Some(&by),
            PhysicalOperator::DummyOutput,
        )
        .unwrap();
        let PhysicalOperator::HashAggregate(agg) = &op else {
            panic!("expected hash aggregate, got {op:?}");
        };
        assert!(agg.order_by.is_empty());
        assert!(agg.limit.is_none());
        assert_eq!(agg.by.len(), 1);
    }
}
