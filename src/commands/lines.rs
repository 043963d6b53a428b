//! `gemsync lines`: show how each manifest line is classified.

use super::{load_manifest, manifest_label};
use crate::Context;
use crate::cli::LinesArgs;
use crate::ui;
use anyhow::{Context as _, Result};
use colored::Colorize;
use gemkit::{ClassifiedLine, DeclarationLine};
use serde::Serialize;

#[derive(Serialize)]
struct LinesOutput {
    manifest: String,
    lines: Vec<ClassifiedLine>,
}

pub fn run(ctx: &Context, args: &LinesArgs) -> Result<()> {
    let manifest = load_manifest(&args.manifest.file)?;
    let lines: Vec<ClassifiedLine> = manifest.classify().collect();

    if args.json {
        let output = LinesOutput {
            manifest: manifest_label(&manifest),
            lines,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize lines")?;
        println!("{json}");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Gemfile Lines");
        ui::kv("Manifest", &manifest_label(&manifest));
        println!();
    }

    for (classified, raw) in lines.iter().zip(manifest.lines()) {
        println!(
            "{} {:<10} {}",
            format!("{:>4}", classified.line).dimmed(),
            colored_kind(&classified.declaration),
            raw
        );
    }

    if !ctx.quiet {
        let gems = lines
            .iter()
            .filter(|l| l.declaration.package_name().is_some())
            .count();
        let malformed = lines
            .iter()
            .filter(|l| matches!(l.declaration, DeclarationLine::Malformed { .. }))
            .count();
        println!();
        println!(
            "  {}, {}",
            ui::plural(gems, "declaration").green(),
            ui::plural(malformed, "malformed line").yellow()
        );
    }

    Ok(())
}

fn colored_kind(declaration: &DeclarationLine) -> colored::ColoredString {
    let kind = declaration.kind();
    match declaration {
        DeclarationLine::PackageDeclaration { .. } => kind.green(),
        DeclarationLine::Malformed { .. } => kind.yellow(),
        DeclarationLine::SourceDirective => kind.blue(),
        DeclarationLine::Comment | DeclarationLine::Blank => kind.dimmed(),
    }
}
