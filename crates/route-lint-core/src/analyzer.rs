//! Core analyzer for orchestrating lint execution.

use crate::config::Config;
use crate::context::FileContext;
use crate::rule::{check_stream, Rule, RuleBox};
use crate::tokens::TokenStream;
use crate::types::{LintResult, Violation};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file could not be read as text.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Directory walk error.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    config: Option<Config>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds an include glob pattern.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether to fail on unreadable source files (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be resolved or a
    /// glob pattern is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();

        let root = self.root.unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        if exclude_patterns.is_empty() {
            exclude_patterns.extend(["**/vendor/**".to_string(), "**/node_modules/**".to_string()]);
        }

        let mut include_patterns = self.include_patterns;
        include_patterns.extend(config.analyzer.include.iter().cloned());

        Ok(Analyzer {
            root,
            rules: self.rules,
            exclude: compile_patterns(&exclude_patterns)?,
            include: compile_patterns(&include_patterns)?,
            config,
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>, AnalyzerError> {
    patterns
        .iter()
        .map(|p| glob::Pattern::new(p).map_err(AnalyzerError::from))
        .collect()
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    rules: Vec<RuleBox>,
    exclude: Vec<glob::Pattern>,
    include: Vec<glob::Pattern>,
    config: Config,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyzes all files and returns the results.
    ///
    /// Files are analyzed in parallel; each file's token stream is built
    /// once and shared read-only by every rule.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails, or if a file cannot be
    /// read and `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let outcomes: Vec<Result<Vec<Violation>, AnalyzerError>> =
            match self.config.analyzer.parallelism {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?
                    .install(|| self.analyze_files(&files)),
                None => self.analyze_files(&files),
            };

        let mut result = LintResult::new();
        for outcome in outcomes {
            match outcome {
                Ok(violations) => {
                    result.violations.extend(violations);
                    result.files_checked += 1;
                }
                Err(AnalyzerError::Parse { path, message }) => {
                    warn!("Failed to read {}: {}", path.display(), message);
                    if self.fail_on_parse_error {
                        return Err(AnalyzerError::Parse { path, message });
                    }
                }
                Err(e) => return Err(e),
            }
        }

        result.normalize();

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    fn analyze_files(&self, files: &[PathBuf]) -> Vec<Result<Vec<Violation>, AnalyzerError>> {
        files
            .par_iter()
            .map(|path| self.analyze_file(path))
            .collect()
    }

    /// Analyzes a single file and returns violations.
    fn analyze_file(&self, path: &Path) -> Result<Vec<Violation>, AnalyzerError> {
        debug!("Analyzing: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => AnalyzerError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            _ => AnalyzerError::Io(e),
        })?;

        Ok(self.analyze_source(path, &content))
    }

    /// Runs every enabled rule over in-memory source.
    ///
    /// `path` is used for locations and test-file detection only.
    #[must_use]
    pub fn analyze_source(&self, path: &Path, content: &str) -> Vec<Violation> {
        let stream = TokenStream::from_source(content);
        let ctx = FileContext::new(path, content, &self.root);
        let mut violations = Vec::new();

        for rule in &self.rules {
            if !self.config.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            let rule_violations = check_stream(rule.as_ref(), &ctx, &stream);
            let rule_violations = self.apply_severity_override(rule.name(), rule_violations);
            violations.extend(rule_violations);
        }

        violations
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut violations: Vec<Violation>,
    ) -> Vec<Violation> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for v in &mut violations {
                v.severity = severity;
            }
        }
        violations
    }

    /// Discovers all source files to analyze.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut files = Vec::new();
        let walker = ignore::WalkBuilder::new(&self.root)
            .git_ignore(self.config.analyzer.respect_gitignore)
            .git_exclude(self.config.analyzer.respect_gitignore)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) || !self.has_source_extension(path) {
                continue;
            }

            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.config.analyzer.extensions.iter().any(|e| e == ext))
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let matches = |pattern: &glob::Pattern| {
            pattern.matches_path(path) || pattern.matches_path(relative)
        };

        if self.exclude.iter().any(matches) {
            return true;
        }

        !self.include.is_empty() && !self.include.iter().any(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKind;
    use crate::types::{Location, Severity};
    use std::fs;
    use tempfile::TempDir;

    struct FlagSemicolons;

    impl Rule for FlagSemicolons {
        fn name(&self) -> &'static str {
            "flag-semicolons"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn triggers(&self) -> &'static [TokenKind] {
            &[TokenKind::Semicolon]
        }
        fn check(&self, ctx: &FileContext, stream: &TokenStream, index: usize) -> Option<Violation> {
            Some(Violation::new(
                self.code(),
                self.name(),
                Severity::Error,
                Location::of_token(ctx.relative_path.clone(), &stream[index]),
                "semicolon",
            ))
        }
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("routes")).unwrap();
        fs::create_dir_all(tmp.path().join("vendor/pkg")).unwrap();
        fs::write(tmp.path().join("routes/web.php"), "<?php a(); b();").unwrap();
        fs::write(tmp.path().join("routes/api.php"), "<?php c();").unwrap();
        fs::write(tmp.path().join("routes/notes.txt"), "x;").unwrap();
        fs::write(tmp.path().join("vendor/pkg/lib.php"), "<?php d();").unwrap();
        tmp
    }

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .exclude("**/vendor/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().is_absolute());
        assert_eq!(analyzer.rule_count(), 0);
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let result = Analyzer::builder().root(".").exclude("[").build();
        assert!(matches!(result, Err(AnalyzerError::Glob(_))));
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/foo")
            .exclude("**/vendor/**")
            .exclude("storage/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/foo/vendor/laravel/x.php")));
        assert!(analyzer.should_exclude(Path::new("/foo/storage/cache.php")));
        assert!(!analyzer.should_exclude(Path::new("/foo/routes/web.php")));
    }

    #[test]
    fn test_include_patterns() {
        let analyzer = Analyzer::builder()
            .root("/foo")
            .include("routes/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/foo/app/Http/Kernel.php")));
        assert!(!analyzer.should_exclude(Path::new("/foo/routes/web.php")));
    }

    #[test]
    fn test_analyze_project() {
        let tmp = project();
        let analyzer = Analyzer::builder()
            .root(tmp.path())
            .rule(FlagSemicolons)
            .build()
            .unwrap();

        let result = analyzer.analyze().unwrap();
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.violations.len(), 3);
        assert_eq!(result.violations[0].location.file, PathBuf::from("routes/api.php"));
        assert_eq!(result.violations[1].location.file, PathBuf::from("routes/web.php"));
        assert!(result.violations[1].location.column < result.violations[2].location.column);
    }

    #[test]
    fn test_analyze_with_bounded_parallelism() {
        let tmp = project();
        let mut config = Config::default();
        config.analyzer.parallelism = Some(1);
        let analyzer = Analyzer::builder()
            .root(tmp.path())
            .config(config)
            .rule(FlagSemicolons)
            .build()
            .unwrap();

        assert_eq!(analyzer.analyze().unwrap().violations.len(), 3);
    }

    #[test]
    fn test_disabled_rule_and_severity_override() {
        let analyzer = Analyzer::builder()
            .root("/foo")
            .config(Config::parse("[rules.flag-semicolons]\nseverity = \"info\"\n").unwrap())
            .rule(FlagSemicolons)
            .build()
            .unwrap();
        let violations = analyzer.analyze_source(Path::new("/foo/a.php"), "<?php a();");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Info);

        let analyzer = Analyzer::builder()
            .root("/foo")
            .config(Config::parse("[rules.flag-semicolons]\nenabled = false\n").unwrap())
            .rule(FlagSemicolons)
            .build()
            .unwrap();
        assert!(analyzer
            .analyze_source(Path::new("/foo/a.php"), "<?php a();")
            .is_empty());
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let tmp = project();
        fs::write(tmp.path().join("routes/bad.php"), [0xff, 0xfe, b';']).unwrap();

        let analyzer = Analyzer::builder()
            .root(tmp.path())
            .rule(FlagSemicolons)
            .build()
            .unwrap();
        assert_eq!(analyzer.analyze().unwrap().files_checked, 2);

        let strict = Analyzer::builder()
            .root(tmp.path())
            .rule(FlagSemicolons)
            .fail_on_parse_error(true)
            .build()
            .unwrap();
        assert!(matches!(
            strict.analyze(),
            Err(AnalyzerError::Parse { .. })
        ));
    }
}
