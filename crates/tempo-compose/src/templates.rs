//! Built-in message templates and word lists.
//!
//! Users can override the message templates with a file of their own; these
//! defaults keep the producer useful out of the box.

/// Commit message templates. Placeholders are filled from the word lists.
pub(crate) const MESSAGE_TEMPLATES: &[&str] = &[
    "Fix bug in {module}",
    "Add {feature} functionality",
    "Refactor {component} for better performance",
    "Update documentation for {file}",
    "Improve error handling in {module}",
    "Optimize {component} memory usage",
    "Add unit tests for {module}",
    "Fix typo in {file}",
    "Update dependencies",
    "Clean up unused imports",
    "Improve code readability",
    "Add comments for clarity",
    "Fix formatting issues",
    "Update configuration",
    "Add validation for {component}",
    "Improve logging",
    "Add new feature: {feature}",
    "Update README",
];

pub(crate) const MODULES: &[&str] = &[
    "parser", "config", "auth", "storage", "scheduler", "exporter", "importer", "cache",
];

pub(crate) const COMPONENTS: &[&str] = &[
    "data pipeline",
    "request handler",
    "session manager",
    "query builder",
    "report generator",
];

pub(crate) const FEATURES: &[&str] = &[
    "search", "pagination", "filtering", "sorting", "export", "validation", "retry",
];

pub(crate) const FILES: &[&str] = &[
    "README.md",
    "setup guide",
    "api notes",
    "usage examples",
    "configuration reference",
];

/// Topics for generated documentation stubs.
pub(crate) const DOC_TOPICS: &[&str] = &[
    "overview", "setup", "usage", "troubleshooting", "architecture", "roadmap",
];

/// Activities for worklog and changelog entries.
pub(crate) const ACTIVITIES: &[&str] = &[
    "reviewed open issues",
    "cleaned up module structure",
    "sketched a refactoring plan",
    "tuned the test fixtures",
    "updated project notes",
    "reworked a draft implementation",
    "profiled the slow path",
];

/// Body template for generated code sketches.
pub(crate) const SNIPPET_BODY: &str = r#"def process_{module}(items):
    """Process a batch of {module} entries."""
    results = []
    for item in items:
        if item is None:
            continue
        results.append(item)
    return results
"#;
