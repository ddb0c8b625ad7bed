use crate::errors::{Result, TraceError};
use crate::expr::aggregate::{AggBinding, AggregateExpr, Aggregation};
use crate::expr::binding::Binding;
use crate::expr::ident;

use super::{IterTable, Step, Trace};

/// Rewrite a single-machine trace into a map/reduce pair.
///
/// Steps between the table scan and the reduction boundary move into a
/// map-side child trace; the rewritten trace terminates in a `UnionMap`
/// over that child and keeps the remaining steps as the reduce side. The
/// boundary is the first aggregation, ordering, limit, dedup, or output
/// step above the scan.
pub fn split(trace: &Trace) -> Result<Trace> {
    if !trace.replacements().is_empty() {
        return Err(TraceError::Unsplittable(
            "query has correlated subqueries".to_string(),
        ));
    }

    // Collect the pipeline, outermost step first, down to the scan.
    let mut above: Vec<&Step> = Vec::new();
    let mut cur = trace.final_step();
    let scan: IterTable = loop {
        match cur {
            Step::IterTable(it) => break it.clone(),
            Step::NoOutput | Step::DummyOutput => return Ok(trace.clone()),
            Step::UnionMap { .. } => {
                return Err(TraceError::Unsplittable(
                    "query is already split".to_string(),
                ))
            }
            other => {
                above.push(other);
                cur = match other.input() {
                    Some(input) => input,
                    None => {
                        return Err(TraceError::Unsplittable(
                            "pipeline does not terminate in a table scan".to_string(),
                        ))
                    }
                };
            }
        }
    };
    above.reverse(); // innermost first

    let mut map_step = Step::IterTable(scan.clone());
    let mut reduce_agg: Option<(Aggregation, Option<Vec<Binding>>)> = None;
    let mut i = 0;
    while i < above.len() {
        match above[i] {
            Step::Filter { .. } | Step::Bind { .. } | Step::IterValue(_) => {
                map_step = reattach(above[i], map_step);
                i += 1;
            }
            Step::Aggregate { agg, group_by, .. } => {
                reduce_agg = Some((
                    combine_aggregates(agg)?,
                    group_by.as_ref().map(|by| {
                        by.iter()
                            .map(|b| Binding::new(ident(b.result.clone()), b.result.clone()))
                            .collect()
                    }),
                ));
                map_step = reattach(above[i], map_step);
                i += 1;
                break;
            }
            Step::Distinct { .. } => {
                // Dedup on the map side, then dedup the concatenation again
                // on the reduce side; the step is left in `above` so the
                // reduce side picks it up below.
                map_step = reattach(above[i], map_step);
                break;
            }
            _ => break, // ordering, limits, and outputs reduce centrally
        }
    }

    let mut reduce_step = Step::UnionMap {
        inner: scan,
        child: Box::new(Trace::new(map_step)),
    };
    if let Some((agg, group_by)) = reduce_agg {
        reduce_step = Step::Aggregate {
            input: Box::new(reduce_step),
            agg,
            group_by,
        };
    }
    for step in &above[i..] {
        reduce_step = reattach(step, reduce_step);
    }
    Ok(Trace::new(reduce_step))
}

/// The reduce-side aggregation: each partial result is recombined by name.
fn combine_aggregates(agg: &Aggregation) -> Result<Aggregation> {
    let mut out = Aggregation::with_capacity(agg.len());
    for a in agg {
        if a.agg.filter.is_some() {
            return Err(TraceError::Unsplittable(format!(
                "aggregate {} has a per-row filter",
                a.agg
            )));
        }
        let combiner = a.agg.op.combiner().ok_or_else(|| {
            TraceError::Unsplittable(format!("aggregate {} cannot be recombined", a.agg))
        })?;
        out.push(AggBinding::new(
            AggregateExpr::new(combiner, ident(a.result.clone())),
            a.result.clone(),
        ));
    }
    Ok(out)
}

/// Clone `step` with its upstream replaced by `input`.
fn reattach(step: &Step, input: Step) -> Step {
    let mut out = step.clone();
    match &mut out {
        Step::IterValue(iv) => iv.input = Box::new(input),
        Step::Filter { input: up, .. }
        | Step::Distinct { input: up, .. }
        | Step::Bind { input: up, .. }
        | Step::Aggregate { input: up, .. }
        | Step::Limit { input: up, .. }
        | Step::Order { input: up, .. }
        | Step::OutputPart { input: up, .. }
        | Step::OutputIndex { input: up, .. } => *up = Box::new(input),
        Step::IterTable(_) | Step::UnionMap { .. } | Step::NoOutput | Step::DummyOutput => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::aggregate::AggregateOp;
    use crate::expr::{binop, lit, BinaryOperator, Expr, TableExpr};
    use crate::trace::{OrderColumn, TraceBuilder};

    fn scan(name: &str) -> IterTable {
        IterTable::new(TableExpr::new(name)).wildcard()
    }

    fn sum_by_key() -> (Aggregation, Option<Vec<Binding>>) {
        (
            vec![AggBinding::new(
                AggregateExpr::new(AggregateOp::Sum, ident("v")),
                "s",
            )],
            Some(vec![Binding::new(ident("k"), "k")]),
        )
    }

    #[test]
    fn group_by_splits_into_partial_and_reducer() {
        let (agg, by) = sum_by_key();
        let trace = TraceBuilder::scan(scan("t")).aggregate(agg, by).build();
        let out = split(&trace).unwrap();

        let Step::Aggregate { input, agg, group_by } = out.final_step() else {
            panic!("expected reduce aggregate, got {:?}", out.final_step());
        };
        assert_eq!(agg.len(), 1);
        assert_eq!(agg[0].agg.op, AggregateOp::Sum);
        assert!(agg[0].agg.inner.is_identifier("s"));
        assert_eq!(agg[0].result, "s");
        let by = group_by.as_ref().unwrap();
        assert!(by[0].expr.is_identifier("k"));

        let Step::UnionMap { inner, child } = input.as_ref() else {
            panic!("expected union map below the reducer");
        };
        assert_eq!(inner.table, TableExpr::new("t"));
        let Step::Aggregate { input: map_input, agg: map_agg, .. } = child.final_step() else {
            panic!("expected the partial aggregate on the map side");
        };
        assert_eq!(map_agg[0].agg.op, AggregateOp::Sum);
        assert!(map_agg[0].agg.inner.is_identifier("v"));
        assert!(matches!(map_input.as_ref(), Step::IterTable(_)));
    }

    #[test]
    fn count_recombines_as_sum() {
        let trace = TraceBuilder::scan(scan("t"))
            .aggregate(
                vec![AggBinding::new(
                    AggregateExpr::new(AggregateOp::Count, Expr::Star),
                    "n",
                )],
                None,
            )
            .build();
        let out = split(&trace).unwrap();
        let Step::Aggregate { agg, .. } = out.final_step() else {
            panic!("expected reduce aggregate");
        };
        assert_eq!(agg[0].agg.op, AggregateOp::Sum);
        assert!(agg[0].agg.inner.is_identifier("n"));
    }

    #[test]
    fn filters_and_projections_run_on_the_map_side() {
        let trace = TraceBuilder::scan(scan("t"))
            .filter(binop(BinaryOperator::Gt, ident("y"), lit(5)))
            .bind(vec![Binding::new(ident("x"), "x")])
            .order(vec![OrderColumn::new(ident("x"))])
            .build();
        let out = split(&trace).unwrap();

        let Step::Order { input, .. } = out.final_step() else {
            panic!("ordering must stay on the reduce side");
        };
        let Step::UnionMap { child, .. } = input.as_ref() else {
            panic!("expected union map below the ordering");
        };
        let Step::Bind { input: bind_input, .. } = child.final_step() else {
            panic!("projection must move to the map side");
        };
        assert!(matches!(bind_input.as_ref(), Step::Filter { .. }));
    }

    #[test]
    fn distinct_runs_on_both_sides() {
        let trace = TraceBuilder::scan(scan("t"))
            .distinct(vec![ident("x")])
            .build();
        let out = split(&trace).unwrap();
        let Step::Distinct { input, .. } = out.final_step() else {
            panic!("expected reduce-side distinct");
        };
        let Step::UnionMap { child, .. } = input.as_ref() else {
            panic!("expected union map below the reduce-side distinct");
        };
        assert!(matches!(child.final_step(), Step::Distinct { .. }));
    }

    #[test]
    fn bare_pipeline_reduces_with_a_plain_union() {
        let trace = TraceBuilder::scan(scan("t")).build();
        let out = split(&trace).unwrap();
        assert!(matches!(out.final_step(), Step::UnionMap { .. }));
    }

    #[test]
    fn avg_does_not_split() {
        let trace = TraceBuilder::scan(scan("t"))
            .aggregate(
                vec![AggBinding::new(
                    AggregateExpr::new(AggregateOp::Avg, ident("v")),
                    "a",
                )],
                None,
            )
            .build();
        assert!(matches!(split(&trace), Err(TraceError::Unsplittable(_))));
    }

    #[test]
    fn filtered_aggregate_does_not_split() {
        let trace = TraceBuilder::scan(scan("t"))
            .aggregate(
                vec![AggBinding::new(
                    AggregateExpr::new(AggregateOp::Sum, ident("v")).with_filter(lit(true)),
                    "s",
                )],
                None,
            )
            .build();
        assert!(matches!(split(&trace), Err(TraceError::Unsplittable(_))));
    }

    #[test]
    fn correlated_queries_do_not_split() {
        let sub = TraceBuilder::scan(scan("u")).build();
        let trace = TraceBuilder::scan(scan("t")).build_with_replacements(vec![sub]);
        assert!(matches!(split(&trace), Err(TraceError::Unsplittable(_))));
    }

    #[test]
    fn already_split_traces_are_rejected() {
        let child = TraceBuilder::scan(scan("t")).build();
        let trace = Trace::new(Step::UnionMap {
            inner: scan("t"),
            child: Box::new(child),
        });
        assert!(matches!(split(&trace), Err(TraceError::Unsplittable(_))));
    }
}
