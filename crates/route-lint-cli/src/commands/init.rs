//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_FILE: &str = "route-lint.toml";

const DEFAULT_CONFIG: &str = r#"# route-lint configuration

# Exit with status 1 when violations at or above this severity are found
# fail_on = "error"

[analyzer]
# Directory analyzed when `route-lint check` gets no PATH argument,
# relative to the current directory (default: ".")
# root = "./routes"

# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
    "**/node_modules/**",
    "**/storage/**",
]

# Only analyze files matching these patterns
# include = ["routes/**"]

extensions = ["php"]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (default: one per CPU)
# parallelism = 4

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.no-closure-route-handler]
enabled = true
# severity = "warning"
allow_in_tests = true
include_arrow_functions = false
receivers = ["Route"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_default(Path::new(CONFIG_FILE), force)?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to configure rules");
    println!("  2. Run: route-lint check");

    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}
