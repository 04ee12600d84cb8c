//! Show what a layer configuration would render, without rendering it.

use std::path::PathBuf;

use mockup_common::config::AppConfig;
use mockup_document::SvgDocument;
use mockup_export::driver::plan_checkpoints;
use mockup_export::job::read_config_lines;
use mockup_export::{CheckpointPlan, CollectingSink};

pub fn run(document: PathBuf, config_file: Option<PathBuf>, config: &AppConfig) -> anyhow::Result<()> {
    let config_path = config_file.unwrap_or_else(|| config.export.config_file.clone());
    println!("Validating {} against {}", config_path.display(), document.display());

    let lines = read_config_lines(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read configuration: {e}"))?;
    let svg = SvgDocument::open(&document)
        .map_err(|e| anyhow::anyhow!("Failed to load document: {e}"))?;

    let sink = CollectingSink::new();
    let plans = plan_checkpoints(&svg, &lines, &sink);

    let images = renderable(&plans);
    println!("\nImages ({}):", images.len());
    for (filename, plan) in &images {
        let region = plan
            .region
            .as_deref()
            .map(|id| format!(" (region #{id})"))
            .unwrap_or_default();
        println!("  {filename}.png: [{}]{region}", plan.layers.join(", "));
    }

    let problems = sink.problems();
    if problems.is_empty() {
        println!("\nConfiguration is valid.");
    } else {
        println!("\nValidation issues:");
        for problem in &problems {
            println!("  - {problem}");
        }
        println!("\n{} issue(s) found.", problems.len());
    }

    Ok(())
}

/// Plans that name an output file, paired with that name.
fn renderable(plans: &[CheckpointPlan]) -> Vec<(&str, &CheckpointPlan)> {
    plans
        .iter()
        .filter_map(|plan| plan.filename.as_deref().map(|filename| (filename, plan)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockup_export::CheckpointTrigger;

    fn plan(filename: Option<&str>) -> CheckpointPlan {
        CheckpointPlan {
            line: 1,
            trigger: CheckpointTrigger::BlankLine,
            filename: filename.map(str::to_string),
            layers: Vec::new(),
            region: None,
        }
    }

    #[test]
    fn test_plans_without_filename_are_not_counted() {
        let plans = vec![plan(None), plan(Some("home")), plan(Some("login"))];
        let images = renderable(&plans);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].0, "home");
        assert_eq!(images[1].0, "login");
    }
}
