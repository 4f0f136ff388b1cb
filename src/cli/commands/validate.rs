//! validate command - Check the project without writing anything

use anyhow::{Context as _, Result};

use super::{load_assembly, Context};
use crate::synth::synthesize;
use crate::ui::output;

/// Load, assemble and synthesize the project in memory.
///
/// Any error in the configuration, the stack graph or the documents
/// surfaces here exactly as it would during `synth`.
pub fn validate(ctx: &Context) -> Result<()> {
    let assembly = load_assembly(ctx)?;
    synthesize(&assembly).context("Failed to synthesize documents")?;

    let managed = assembly.stacks().count();
    let generic = assembly.generic_stacks().count();
    output::success(
        format!(
            "OK: {} managed stack(s), {} other stack(s), {} secret(s)",
            managed,
            generic,
            assembly.base().variables().count()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
