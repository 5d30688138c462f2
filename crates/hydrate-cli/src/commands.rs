//! Command implementations

use std::path::Path;

use console::style;
use miette::{Context, IntoDiagnostic, Result};
use tracing::debug;

use hydrate_core::Document;
use hydrate_engine::has_template;
use hydrate_kube::Resolver;

/// Resolve a document file against the cluster and print the result
pub fn resolve(file: &Path, lenient: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;

    // Untemplated documents pass through without touching the cluster
    if !has_template(&text) {
        debug!(file = %file.display(), "no template directives found");
        print!("{}", text);
        return Ok(());
    }

    let document = Document::from_yaml(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to parse {}", file.display()))?;

    let resolver = Resolver::builder().strict(!lenient).build()?;
    let resolved = resolver.resolve(&document)?;

    println!("{}", resolved.to_yaml().into_diagnostic()?);
    eprintln!(
        "{} resolved {}",
        style("✓").green().bold(),
        file.display()
    );
    Ok(())
}

/// Report whether a document contains template directives
pub fn check(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;

    if has_template(&text) {
        println!(
            "{}: contains template directives",
            style(file.display()).cyan()
        );
        Ok(())
    } else {
        println!("{}: no template directives", style(file.display()).dim());
        // Exit code mirrors grep: nothing found is a non-zero exit
        std::process::exit(1)
    }
}
