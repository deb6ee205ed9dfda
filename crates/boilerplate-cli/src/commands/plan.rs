//! Implementation of the `boilerplate plan` command.

use std::fmt::Write as _;

use indexmap::IndexMap;

use boilerplate_core::domain::{ConfigTree, DomainValidator, Scaffold, Target};

use crate::{
    cli::{PlanArgs, PlanFormat},
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: PlanArgs, output: OutputManager) -> CliResult<()> {
    let tree = super::expand_definition(&args.file)?;

    match args.format {
        PlanFormat::Tree => {
            // Bypass quiet mode: the tree is the command's result.
            print!("{}", render_tree(&tree));
        }
        PlanFormat::Json => output.json(&tree)?,
    }

    Ok(())
}

/// Render scaffolds and targets as an indented tree, in execution order.
pub fn render_tree(tree: &ConfigTree) -> String {
    let mut out = format!("{}\n", tree.name());
    render_children(&mut out, tree.scaffolds(), tree.targets(), "");
    out
}

fn render_children(
    out: &mut String,
    scaffolds: &IndexMap<String, Scaffold>,
    targets: &IndexMap<String, Target>,
    prefix: &str,
) {
    let total = scaffolds.len() + targets.len();
    let mut index = 0;

    for scaffold in scaffolds.values() {
        index += 1;
        let last = index == total;
        let _ = writeln!(out, "{prefix}{}{}/", branch(last), scaffold.name());
        let nested = format!("{prefix}{}", if last { "    " } else { "\u{2502}   " });
        render_children(out, scaffold.scaffolds(), scaffold.targets(), &nested);
    }

    for target in targets.values() {
        index += 1;
        let _ = writeln!(out, "{prefix}{}{}", branch(index == total), describe(target));
    }
}

fn branch(last: bool) -> &'static str {
    if last { "\u{2514}\u{2500}\u{2500} " } else { "\u{251c}\u{2500}\u{2500} " }
}

fn describe(target: &Target) -> String {
    let sets: Vec<String> = target
        .files()
        .iter()
        .map(|set| {
            let dest = set
                .dest_with(target.options())
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "?".into());
            format!("[{}] -> {dest}", set.src.join(", "))
        })
        .collect();

    let mut line = format!("{} {}", target.name(), sets.join("; "));
    match DomainValidator::pipeline_names(target.options(), target.path()) {
        Ok(steps) if !steps.is_empty() => {
            let _ = write!(line, " | {}", steps.join(" > "));
        }
        _ => {}
    }
    line
}
