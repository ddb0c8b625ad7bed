use crate::errors::{unsupported, Result};
use crate::operator::{Limit, PhysicalOperator};

/// Limits fuse into operators that bound their output natively; a
/// standalone `Limit` is emitted otherwise. Non-zero offsets are honored
/// only where the upstream materially orders its output.
pub(crate) fn plan_limit(count: u64, offset: u64, from: PhysicalOperator) -> Result<PhysicalOperator> {
    if count == 0 {
        return Ok(PhysicalOperator::NoOutput);
    }

    let mut from = from;
    match &mut from {
        PhysicalOperator::HashAggregate(agg) => {
            agg.limit = Some(count);
            if offset != 0 {
                return Err(unsupported!("non-zero OFFSET of hash aggregate result"));
            }
            return Ok(from);
        }
        PhysicalOperator::OrderBy(order) => {
            order.limit = Some(count);
            order.offset = (offset != 0).then_some(offset);
            return Ok(from);
        }
        PhysicalOperator::Distinct(distinct) => {
            if offset != 0 {
                return Err(unsupported!("non-zero OFFSET of distinct result"));
            }
            distinct.limit = Some(count);
            return Ok(from);
        }
        _ => {}
    }

    if offset != 0 {
        return Err(unsupported!("OFFSET without GROUP BY/ORDER BY not implemented"));
    }
    Ok(PhysicalOperator::Limit(Limit {
        from: Box::new(from),
        count,
    }))
}
