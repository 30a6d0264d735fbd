// src/watch/filter.rs

use std::path::Path;

use regex::Regex;
use tracing::warn;

use crate::config::Config;

/// Decides whether a changed path should feed the restart trigger.
///
/// Built once per session from the config: ignore patterns are compiled here
/// and never again, so matching per event is cheap. The filter is pure and
/// holds no mutable state, so it is safe to call from any task.
pub struct PathFilter {
    ignores: Vec<Regex>,
    /// Extension allow-list, normalized without a leading dot. Empty = allow all.
    exts: Vec<String>,
}

impl PathFilter {
    /// Compile the filter from config.
    ///
    /// A malformed ignore pattern is logged once and skipped, so it never
    /// matches anything; the session keeps running with the remaining
    /// patterns. The context's `.git` directory is always ignored, on top of
    /// whatever the user configured.
    pub fn new(config: &Config) -> Self {
        let context = config
            .context
            .canonicalize()
            .unwrap_or_else(|_| config.context.clone());

        let mut patterns = config.ignores.clone();
        // Anchored so `.gitignore` and friends in the context root still pass.
        patterns.push(format!(
            "{}([/\\\\]|$)",
            regex::escape(&context.join(".git").to_string_lossy())
        ));

        let mut ignores = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            match Regex::new(pattern) {
                Ok(re) => ignores.push(re),
                Err(err) => {
                    warn!(
                        pattern = %pattern,
                        error = %err,
                        "malformed ignore pattern; it will never match"
                    );
                }
            }
        }

        let exts = config
            .exts
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();

        Self { ignores, exts }
    }

    /// Returns true if a change to `path` should count towards a restart.
    ///
    /// False iff the full path string matches any ignore pattern, or an
    /// extension allow-list is configured and the path's extension is not in
    /// it (a path with no extension never passes a non-empty allow-list).
    pub fn is_relevant(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.ignores.iter().any(|re| re.is_match(&path_str)) {
            return false;
        }

        if !self.exts.is_empty() {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                return false;
            };
            if !self.exts.iter().any(|allowed| allowed == ext) {
                return false;
            }
        }

        true
    }
}
