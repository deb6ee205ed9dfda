//! Source pattern matching shared by the file access adapters.

use std::path::{Component, Path};

use boilerplate_core::error::{BoilerplateError, BoilerplateResult};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled list of source patterns.
///
/// Patterns are matched against paths relative to the source `cwd`, with `/`
/// separators. `*` stops at separators, `**` crosses them. A leading `!`
/// turns a pattern into an exclusion. Paths with a hidden component only
/// match when `dot` is set or a pattern spells the dot out itself.
#[derive(Debug, Clone)]
pub struct PatternSet {
    include: GlobSet,
    include_hidden: GlobSet,
    exclude: GlobSet,
    dot: bool,
}

impl PatternSet {
    pub fn new(patterns: &[String], dot: bool) -> BoilerplateResult<Self> {
        let mut include = GlobSetBuilder::new();
        let mut include_hidden = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();

        for raw in patterns {
            let (negated, pattern) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            let pattern = pattern.trim_start_matches("./");
            let glob = compile(pattern)?;

            if negated {
                exclude.add(glob);
            } else {
                if names_hidden(pattern) {
                    include_hidden.add(glob.clone());
                }
                include.add(glob);
            }
        }

        Ok(Self {
            include: build(include)?,
            include_hidden: build(include_hidden)?,
            exclude: build(exclude)?,
            dot,
        })
    }

    pub fn is_match(&self, relative: &Path) -> bool {
        let candidate = slash_path(relative);
        if self.exclude.is_match(&candidate) {
            return false;
        }
        if !self.dot && is_hidden(relative) {
            return self.include_hidden.is_match(&candidate);
        }
        self.include.is_match(&candidate)
    }
}

fn compile(pattern: &str) -> BoilerplateResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| BoilerplateError::configuration(format!("invalid source pattern '{pattern}': {e}")))
}

fn build(builder: GlobSetBuilder) -> BoilerplateResult<GlobSet> {
    builder
        .build()
        .map_err(|e| BoilerplateError::configuration(format!("invalid source patterns: {e}")))
}

fn names_hidden(pattern: &str) -> bool {
    pattern
        .split('/')
        .any(|segment| segment.starts_with('.') && segment != "." && segment != "..")
        || pattern.contains("{.")
        || pattern.contains(",.")
}

fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

pub(crate) fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
