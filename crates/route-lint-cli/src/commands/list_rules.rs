//! List rules command implementation.

use route_lint_core::Config;
use route_lint_rules::all_rules;

/// Runs the list-rules command.
pub fn run(config: &Config) {
    println!("Available rules:\n");
    println!("{:<8} {:<28} {:<9} Description", "Code", "Name", "Severity");
    println!("{}", "-".repeat(80));

    for rule in all_rules(config) {
        let state = if config.is_rule_enabled(rule.name()) {
            ""
        } else {
            " (disabled)"
        };
        println!(
            "{:<8} {:<28} {:<9} {}{}",
            rule.code(),
            rule.name(),
            rule.default_severity(),
            rule.description(),
            state
        );
    }

    println!("\nUse --rules to run specific rules, e.g.:");
    println!("  route-lint check --rules no-closure-route-handler");
    println!("  route-lint check --rules RL001");
}
