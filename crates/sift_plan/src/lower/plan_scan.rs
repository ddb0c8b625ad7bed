use sift_ir::trace::IterTable;

use super::PlanState;
use crate::errors::Result;
use crate::operator::{Filter, Leaf, PhysicalOperator};

impl PlanState<'_> {
    /// Terminal table scans become `Leaf` operators referencing an interned
    /// input, so equal scans within the scope share one stat. A filter the
    /// optimizer pushed into the scan is applied directly above the leaf.
    pub(crate) fn plan_iter_table(&mut self, it: &IterTable) -> Result<PhysicalOperator> {
        let mut out = PhysicalOperator::Leaf(Leaf {
            input: self.put(it),
        });
        if let Some(filter) = &it.filter {
            out = PhysicalOperator::Filter(Filter {
                from: Box::new(out),
                expr: filter.clone(),
            });
        }
        Ok(out)
    }
}
