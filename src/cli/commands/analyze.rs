//! Analyze command.

use std::sync::Arc;

use console::style;

use crate::analyzer::{
    AnalysisInput, AnalysisResult, AnalysisSelector, AnalyzeOptions, Provider,
};
use crate::cli::helpers::{load_catalog, resolve_image, truncate};
use crate::config::Settings;

/// Arguments of `fixo analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub image: Option<String>,
    pub description: Option<String>,
    pub json: bool,
    pub options: AnalyzeOptions,
}

/// Diagnose a photo and/or description.
pub async fn cmd_analyze(settings: &Settings, args: AnalyzeArgs) -> anyhow::Result<()> {
    let input = AnalysisInput {
        image: match args.image.as_deref() {
            Some(image) => Some(resolve_image(image).await?),
            None => None,
        },
        description: args.description,
    };

    if input.is_empty() {
        anyhow::bail!("Provide --image or --description");
    }

    let catalog = Arc::new(load_catalog(&settings.catalog_path()).await?);
    let config = settings.analyzer_config();
    let provider = Provider::detect(&config.credentials);
    let selector = AnalysisSelector::new(provider, catalog, config)?;

    if !args.json {
        println!(
            "{} Analyzing with {} provider...",
            style("→").cyan(),
            style(selector.provider()).bold()
        );
    }

    let result = selector.analyze(&input, &args.options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &AnalysisResult) {
    let object = &result.detection.object;
    let issue = &result.detection.issue;
    let recs = &result.recommendations;

    println!("\n{}", style("Diagnosis").bold());
    println!("{}", "-".repeat(60));
    println!(
        "{:<12} {} ({}, {:.0}%)",
        "Object:",
        style(&object.name).bold(),
        object.category,
        object.confidence * 100.0
    );
    println!(
        "{:<12} {} ({:.0}%)",
        "Issue:",
        style(&issue.name).bold(),
        issue.confidence * 100.0
    );
    if !issue.description.is_empty() {
        println!("{:<12} {}", "", truncate(&issue.description, 60));
    }

    let risk = match issue.risk_score {
        8.. => style(issue.risk_score).red().bold(),
        5..=7 => style(issue.risk_score).yellow(),
        _ => style(issue.risk_score).green(),
    };
    println!("{:<12} {}/10", "Risk:", risk);

    if !recs.difficulty.is_empty() || !recs.time_estimate.is_empty() {
        println!(
            "{:<12} {}  {}",
            "Effort:",
            recs.difficulty,
            style(&recs.time_estimate).dim()
        );
    }
    if !recs.required_tools.is_empty() {
        println!("{:<12} {}", "Tools:", recs.required_tools.join(", "));
    }

    if !recs.steps.is_empty() {
        println!("\n{}", style("Steps").bold());
        for step in &recs.steps {
            println!(
                "  {:>2}. {} {} {}",
                step.step,
                step.icon,
                step.action,
                style(format!("({})", step.time)).dim()
            );
        }
    }

    if !recs.safety_warnings.is_empty() {
        println!("\n{}", style("Safety").bold());
        for warning in &recs.safety_warnings {
            println!("  {} {}", style("!").yellow(), warning);
        }
    }

    println!(
        "\n{}",
        style(format!(
            "{} · {} · {}",
            result.analysis_id,
            result.provider,
            result.timestamp.format("%Y-%m-%d %H:%M:%S")
        ))
        .dim()
    );
}
