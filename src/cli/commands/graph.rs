//! graph command - Show stacks in deploy order with their dependencies

use anyhow::{Context as _, Result};

use super::{load_assembly, Context};
use crate::stack::{Assembly, Role};
use crate::ui::output;

/// Print the deploy order.
///
/// With `json`, prints one object per stack instead of the tree; quiet
/// mode does not suppress JSON output.
pub fn graph(ctx: &Context, json: bool) -> Result<()> {
    let assembly = load_assembly(ctx)?;

    if json {
        let entries = entries(&assembly);
        let rendered =
            serde_json::to_string_pretty(&entries).context("Failed to render graph as JSON")?;
        println!("{}", rendered);
        return Ok(());
    }

    output::print(render(&assembly), ctx.verbosity());
    Ok(())
}

fn entries(assembly: &Assembly) -> Vec<serde_json::Value> {
    let base = assembly.base();
    let mut entries = vec![serde_json::json!({
        "name": crate::stack::BASE_ID,
        "role": Role::Base.as_str(),
        "dependencies": [],
    })];

    for name in assembly.deploy_order() {
        let role = assembly.role_of(name).unwrap_or(Role::Other);
        let dependencies: Vec<String> = assembly
            .graph()
            .dependencies(name)
            .map(|deps| deps.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        let workspace = base.workspace(name).map(|ws| ws.name().to_string());

        entries.push(serde_json::json!({
            "name": name.as_str(),
            "role": role.as_str(),
            "workspace": workspace,
            "dependencies": dependencies,
        }));
    }
    entries
}

fn render(assembly: &Assembly) -> String {
    let base = assembly.base();
    let mut lines = vec![output::format_stack(crate::stack::BASE_ID, Role::Base)];

    for name in assembly.deploy_order() {
        let role = assembly.role_of(name).unwrap_or(Role::Other);
        let mut line = format!("  {}", output::format_stack(name.as_str(), role));
        if let Some(ws) = base.workspace(name) {
            line.push_str(&format!(" -> {}", ws.name()));
        }
        lines.push(line);

        let dependencies: Vec<String> = assembly
            .graph()
            .dependencies(name)
            .map(|deps| deps.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        if !dependencies.is_empty() {
            lines.push(output::format_list(&dependencies, "      after "));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{App, BaseOptions, BaseUnit};

    fn assembly() -> Assembly {
        let mut app = App::new();
        app.install_base(BaseUnit::new("acme", "p", BaseOptions::default()).unwrap())
            .unwrap();
        let vpc = app.add_stack("vpc", None).unwrap();
        let dns = app.add_generic_stack("dns").unwrap();
        app.add_dependency(&dns, &vpc).unwrap();
        app.assemble().unwrap()
    }

    #[test]
    fn render_lists_order_and_dependencies() {
        let text = render(&assembly());
        assert_eq!(
            text,
            "base (base)\n  vpc -> p-vpc\n  dns (unmanaged)\n      after vpc"
        );
    }

    #[test]
    fn entries_carry_roles_and_workspaces() {
        let entries = entries(&assembly());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1]["role"], "managed");
        assert_eq!(entries[1]["workspace"], "p-vpc");
        assert_eq!(entries[2]["role"], "other");
        assert!(entries[2]["workspace"].is_null());
        assert_eq!(entries[2]["dependencies"], serde_json::json!(["vpc"]));
    }
}
