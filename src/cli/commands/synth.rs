//! synth command - Write every stack document and the manifest

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{load_assembly, Context};
use crate::synth::{synthesize, write_synthesis};
use crate::ui::output;

/// Synthesize the project into `out`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `out` - Output directory, relative to the project directory
pub fn synth(ctx: &Context, out: &Path) -> Result<()> {
    let assembly = load_assembly(ctx)?;
    let synthesis = synthesize(&assembly).context("Failed to synthesize documents")?;

    let out = ctx.resolve(out)?;
    let manifest = write_synthesis(&synthesis, &out)
        .with_context(|| format!("Failed to write output to '{}'", out.display()))?;

    let documents = manifest.stacks.iter().filter(|s| s.path.is_some()).count();
    output::success(
        format!(
            "Synthesized {} document(s) for {} stack(s) into {}",
            documents,
            manifest.stacks.len(),
            out.display()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
