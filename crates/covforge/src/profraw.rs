//! Raw profile discovery
//!
//! Instrumented test processes write their counters to files named after the
//! `LLVM_PROFILE_FILE` template. Because cargo runs each test binary from its
//! package directory, the files can end up anywhere under the working tree,
//! so discovery walks the whole tree and matches file names against a glob
//! derived from the template.

use crate::result::{CovError, CovResult};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// Directories never searched for raw profiles
const PRUNED_DIRS: &[&str] = &[".git", "target"];

/// An `LLVM_PROFILE_FILE` template such as `coverage-%p-%m.profraw`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTemplate {
    template: String,
}

impl ProfileTemplate {
    /// Wrap a template string
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The template as given to `LLVM_PROFILE_FILE`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// File-name component of the template
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.template
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.template)
    }

    /// Glob matching every file name the template can expand to.
    ///
    /// `%p`, `%h`, `%m`, `%Nm`, `%t` and `%c` each become `*`; `%%` is a
    /// literal percent sign. Literal glob metacharacters are escaped.
    #[must_use]
    pub fn glob_pattern(&self) -> String {
        let mut pattern = String::new();
        let mut literal = String::new();
        let mut chars = self.file_name().chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }
            while chars.peek().is_some_and(char::is_ascii_digit) {
                chars.next();
            }
            // specifier letter; a trailing lone '%' is dropped
            chars.next();
            pattern.push_str(&Pattern::escape(&literal));
            literal.clear();
            if !pattern.ends_with('*') {
                pattern.push('*');
            }
        }
        pattern.push_str(&Pattern::escape(&literal));
        pattern
    }

    /// Compiled form of [`Self::glob_pattern`]
    pub fn compile(&self) -> CovResult<Pattern> {
        let pattern = self.glob_pattern();
        Pattern::new(&pattern).map_err(|e| {
            CovError::invalid_config(format!(
                "profile template `{}` yields unusable pattern `{pattern}`: {e}",
                self.template
            ))
        })
    }
}

/// Find every file under `root` whose name matches `pattern`, sorted.
///
/// Hidden directories other than the root itself, `.git` and `target`
/// are not descended into.
pub fn find_raw_profiles(root: &Path, pattern: &Pattern) -> CovResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    scan_recursive(root, pattern, &mut found)?;
    found.sort();
    Ok(found)
}

fn scan_recursive(dir: &Path, pattern: &Pattern, found: &mut Vec<PathBuf>) -> CovResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CovError::path_io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CovError::path_io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| CovError::path_io(&path, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if !name.starts_with('.') && !PRUNED_DIRS.contains(&name.as_ref()) {
                scan_recursive(&path, pattern, found)?;
            }
        } else if file_type.is_file() && pattern.matches(&name) {
            found.push(path);
        }
    }
    Ok(())
}

/// Delete the given files, ignoring ones already gone. Returns what was removed.
pub fn remove_files(paths: &[PathBuf]) -> CovResult<Vec<PathBuf>> {
    let mut removed = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => removed.push(path.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CovError::path_io(path, e)),
        }
    }
    Ok(removed)
}
