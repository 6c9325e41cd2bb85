//! Check command implementation.

use anyhow::{Context, Result};
use route_lint_core::{Analyzer, Config, RuleBox};
use route_lint_rules::{all_rules, rule_by_name};
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command.
///
/// An explicit `path` overrides `[analyzer] root` from the config.
/// Returns `false` when violations at or above the configured `fail_on`
/// severity were found.
pub fn run(
    path: Option<&Path>,
    format: OutputFormat,
    rules_filter: Option<&str>,
    exclude: Vec<String>,
    source: &ConfigSource,
) -> Result<bool> {
    let config = source.load()?;
    let threshold = config.fail_threshold();

    let rules = match rules_filter {
        Some(filter) => select_rules(filter, &config),
        None => all_rules(&config),
    };

    let mut builder = Analyzer::builder().config(config);
    if let Some(path) = path {
        builder = builder.root(path);
    }
    for pattern in exclude {
        builder = builder.exclude(pattern);
    }
    for rule in rules {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} rule(s)",
        analyzer.root().display(),
        analyzer.rule_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, format, analyzer.root())?;

    Ok(!result.has_violations_at(threshold))
}

fn select_rules(filter: &str, config: &Config) -> Vec<RuleBox> {
    filter
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let rule = rule_by_name(name, config);
            if rule.is_none() {
                tracing::warn!("Unknown rule: {}", name);
            }
            rule
        })
        .collect()
}
