use sift_ir::expr::Path;

use crate::env::Env;
use crate::errors::{PlanError, Result};
use crate::operator::{OutputIndex, OutputPart, PhysicalOperator};

const NO_UPLOADER: &str = "SELECT INTO requires an environment that supports uploads";
const NO_KEY: &str = "SELECT INTO requires a signing key from the environment";

/// Writing a result part requires an uploader from the environment.
pub(crate) fn plan_output_part(
    env: &dyn Env,
    basename: &str,
    from: PhysicalOperator,
) -> Result<PhysicalOperator> {
    let store = env
        .upload_env()
        .and_then(|e| e.uploader())
        .ok_or(PlanError::MissingCapability(NO_UPLOADER))?;
    Ok(PhysicalOperator::OutputPart(OutputPart {
        from: Box::new(from),
        basename: basename.to_string(),
        store,
    }))
}

/// Writing an index additionally requires the environment's signing key.
pub(crate) fn plan_output_index(
    env: &dyn Env,
    table: &Path,
    basename: &str,
    from: PhysicalOperator,
) -> Result<PhysicalOperator> {
    let upload = env
        .upload_env()
        .ok_or(PlanError::MissingCapability(NO_UPLOADER))?;
    let store = upload
        .uploader()
        .ok_or(PlanError::MissingCapability(NO_UPLOADER))?;
    let key = upload.key().ok_or(PlanError::MissingCapability(NO_KEY))?;
    Ok(PhysicalOperator::OutputIndex(OutputIndex {
        from: Box::new(from),
        table: table.clone(),
        basename: basename.to_string(),
        store,
        key,
    }))
}
