//! Unit-of-work synthesis.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use tempo_scheduler::{ChangeProducer, FileChange, PortError, WorkUnit};

use crate::templates::{
    ACTIVITIES, COMPONENTS, DOC_TOPICS, FEATURES, FILES, MESSAGE_TEMPLATES, MODULES, SNIPPET_BODY,
};

/// Settings for the composer.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Upper bound on file changes per unit. Zero disables production
    /// entirely (every job is skipped).
    pub max_changes_per_commit: usize,
    /// Optional file with one commit-message template per line, overriding
    /// the built-in set.
    pub messages_file: Option<PathBuf>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_changes_per_commit: 3,
            messages_file: None,
        }
    }
}

/// The kinds of file change the composer can produce.
#[derive(Debug, Clone, Copy)]
enum ChangeKind {
    Worklog,
    Doc,
    Changelog,
    Snippet,
}

const CHANGE_KINDS: &[ChangeKind] = &[
    ChangeKind::Worklog,
    ChangeKind::Doc,
    ChangeKind::Changelog,
    ChangeKind::Snippet,
];

/// Synthesizes units of work from templates and word lists.
pub struct ChangeComposer {
    max_changes: usize,
    messages: Vec<String>,
}

impl ChangeComposer {
    /// Build a composer, loading custom message templates when configured.
    ///
    /// A missing or unreadable templates file falls back to the built-in set
    /// with a warning.
    pub fn new(config: ComposerConfig) -> Self {
        let messages = match &config.messages_file {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(content) => {
                    let lines: Vec<String> = content
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from)
                        .collect();
                    if lines.is_empty() {
                        warn!(path = %path.display(), "messages file is empty, using built-in templates");
                        default_messages()
                    } else {
                        debug!(count = lines.len(), "loaded custom message templates");
                        lines
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load messages file, using built-in templates");
                    default_messages()
                }
            },
            None => default_messages(),
        };

        Self {
            max_changes: config.max_changes_per_commit,
            messages,
        }
    }

    /// Compose the next unit of work. `None` when production is disabled.
    ///
    /// Exposed with an explicit clock and random source so tests are
    /// deterministic; [`ChangeProducer::produce`] supplies the real ones.
    pub fn compose(&self, now: DateTime<Utc>, rng: &mut impl Rng) -> Option<WorkUnit> {
        if self.max_changes == 0 {
            return None;
        }

        let count = rng.random_range(1..=self.max_changes);
        let mut changes = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = *CHANGE_KINDS.choose(rng)?;
            changes.push(self.change_for(kind, now, rng));
        }

        let template = self.messages.choose(rng)?;
        let message = fill_placeholders(template, rng);

        Some(WorkUnit { message, changes })
    }

    fn change_for(&self, kind: ChangeKind, now: DateTime<Utc>, rng: &mut impl Rng) -> FileChange {
        let date = now.format("%Y-%m-%d");
        match kind {
            ChangeKind::Worklog => {
                let activity = pick(ACTIVITIES, rng);
                FileChange {
                    path: "notes/worklog.md".to_string(),
                    content: format!("- {date}: {activity}\n"),
                    append: true,
                }
            }
            ChangeKind::Doc => {
                let topic = pick(DOC_TOPICS, rng);
                FileChange {
                    path: format!("docs/{topic}.md"),
                    content: format!(
                        "# {topic}\n\nNotes on {topic}, last touched {date}.\n",
                    ),
                    append: false,
                }
            }
            ChangeKind::Changelog => {
                let activity = pick(ACTIVITIES, rng);
                FileChange {
                    path: "CHANGELOG.md".to_string(),
                    content: format!("- {date}: {activity}\n"),
                    append: true,
                }
            }
            ChangeKind::Snippet => {
                let module = pick(MODULES, rng);
                FileChange {
                    path: format!("snippets/{module}.py"),
                    content: SNIPPET_BODY.replace("{module}", module),
                    append: false,
                }
            }
        }
    }
}

#[async_trait]
impl ChangeProducer for ChangeComposer {
    async fn produce(&self) -> Result<Option<WorkUnit>, PortError> {
        let mut rng = rand::rng();
        Ok(self.compose(Utc::now(), &mut rng))
    }
}

fn default_messages() -> Vec<String> {
    MESSAGE_TEMPLATES.iter().map(|s| s.to_string()).collect()
}

/// Replace every known placeholder in a template with a drawn word.
fn fill_placeholders(template: &str, rng: &mut impl Rng) -> String {
    let mut message = template.to_string();
    for (placeholder, words) in [
        ("{module}", MODULES),
        ("{component}", COMPONENTS),
        ("{feature}", FEATURES),
        ("{file}", FILES),
    ] {
        if message.contains(placeholder) {
            message = message.replace(placeholder, pick(words, rng));
        }
    }
    message
}

fn pick<'a>(words: &[&'a str], rng: &mut impl Rng) -> &'a str {
    words.choose(rng).copied().unwrap_or("misc")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn composer(max_changes: usize) -> ChangeComposer {
        ChangeComposer::new(ComposerConfig {
            max_changes_per_commit: max_changes,
            messages_file: None,
        })
    }

    #[test]
    fn test_compose_respects_change_bound() {
        let composer = composer(3);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let unit = composer.compose(Utc::now(), &mut rng).unwrap();
            assert!((1..=3).contains(&unit.changes.len()));
            assert!(!unit.message.is_empty());
        }
    }

    #[test]
    fn test_zero_bound_disables_production() {
        let composer = composer(0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(composer.compose(Utc::now(), &mut rng).is_none());
    }

    #[test]
    fn test_no_unfilled_placeholders_in_messages() {
        let composer = composer(2);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let unit = composer.compose(Utc::now(), &mut rng).unwrap();
            assert!(
                !unit.message.contains('{') && !unit.message.contains('}'),
                "unfilled placeholder in: {}",
                unit.message
            );
        }
    }

    #[test]
    fn test_paths_are_work_tree_relative() {
        let composer = composer(3);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let unit = composer.compose(Utc::now(), &mut rng).unwrap();
            for change in &unit.changes {
                assert!(!change.path.starts_with('/'));
                assert!(!change.path.contains(".."));
                assert!(!change.content.is_empty());
            }
        }
    }

    #[test]
    fn test_custom_messages_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.txt");
        std::fs::write(&path, "Polish the {module} docs\n\n").unwrap();

        let composer = ChangeComposer::new(ComposerConfig {
            max_changes_per_commit: 1,
            messages_file: Some(path),
        });

        let mut rng = StdRng::seed_from_u64(3);
        let unit = composer.compose(Utc::now(), &mut rng).unwrap();
        assert!(unit.message.starts_with("Polish the "));
        assert!(unit.message.ends_with(" docs"));
    }

    #[test]
    fn test_missing_messages_file_falls_back() {
        let composer = ChangeComposer::new(ComposerConfig {
            max_changes_per_commit: 1,
            messages_file: Some(PathBuf::from("/does/not/exist.txt")),
        });

        let mut rng = StdRng::seed_from_u64(3);
        assert!(composer.compose(Utc::now(), &mut rng).is_some());
    }
}
