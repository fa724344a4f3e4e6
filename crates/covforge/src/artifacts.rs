//! Test binary discovery from cargo's JSON build messages
//!
//! `cargo test --no-run --message-format=json` prints one JSON object per
//! line. Only `compiler-artifact` messages built with the test profile name
//! coverage subjects; their `filenames` are the binaries to hand to
//! `llvm-cov`. Debug-symbol bundles (`*.dSYM`) are listed there on macOS but
//! are not loadable objects, so they are dropped.

use crate::result::{CovError, CovResult};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Profile section of a compiler artifact message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactProfile {
    /// Built with the test harness
    #[serde(default)]
    pub test: bool,
}

/// Target section of a compiler artifact message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactTarget {
    /// Target name
    #[serde(default)]
    pub name: String,
    /// Target kinds (`lib`, `bin`, `test`, ...)
    #[serde(default)]
    pub kind: Vec<String>,
}

/// One message from cargo's JSON output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CargoArtifact {
    /// Message kind, e.g. `compiler-artifact` or `build-finished`
    #[serde(default)]
    pub reason: String,
    /// Build profile flags
    #[serde(default)]
    pub profile: ArtifactProfile,
    /// Target that was built
    #[serde(default)]
    pub target: ArtifactTarget,
    /// Output files
    #[serde(default)]
    pub filenames: Vec<PathBuf>,
    /// Runnable executable, if any
    #[serde(default)]
    pub executable: Option<PathBuf>,
}

impl CargoArtifact {
    /// Whether this message describes a test-profile build output
    #[must_use]
    pub fn is_test_artifact(&self) -> bool {
        self.reason == "compiler-artifact" && self.profile.test
    }
}

/// Whether `path` lies inside a `.dSYM` debug-symbol bundle
#[must_use]
pub fn is_debug_symbol_bundle(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(part) => Path::new(part)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dSYM")),
        _ => false,
    })
}

/// Parse cargo's JSON message stream
///
/// Blank lines and non-JSON lines (anything not starting with `{`) are
/// skipped; a line that starts like JSON but does not parse is an error.
pub fn parse_messages(stdout: &str) -> CovResult<Vec<CargoArtifact>> {
    let mut messages = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        let message = serde_json::from_str::<CargoArtifact>(line)
            .map_err(|source| CovError::ArtifactParse {
                line: idx + 1,
                source,
            })?;
        messages.push(message);
    }
    Ok(messages)
}

/// Extract test binary paths, in build order, without duplicates or
/// debug-symbol bundles
pub fn test_binaries(stdout: &str) -> CovResult<Vec<PathBuf>> {
    let mut binaries: Vec<PathBuf> = Vec::new();
    for message in parse_messages(stdout)? {
        if !message.is_test_artifact() {
            continue;
        }
        for file in message.filenames {
            if is_debug_symbol_bundle(&file) {
                tracing::debug!(path = %file.display(), "skipping debug symbol bundle");
                continue;
            }
            if !binaries.contains(&file) {
                tracing::debug!(name = %message.target.name, path = %file.display(), "test binary");
                binaries.push(file);
            }
        }
    }
    Ok(binaries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const LIB_TEST: &str = r#"{"reason":"compiler-artifact","package_id":"core 0.1.0","target":{"kind":["lib"],"name":"core"},"profile":{"opt_level":"0","debuginfo":2,"test":true},"filenames":["/w/target/debug/deps/core-1a2b"],"executable":"/w/target/debug/deps/core-1a2b","fresh":false}"#;
    const LIB_BUILD: &str = r#"{"reason":"compiler-artifact","target":{"kind":["lib"],"name":"core"},"profile":{"test":false},"filenames":["/w/target/debug/deps/libcore-9f.rlib","/w/target/debug/deps/libcore-9f.rmeta"],"executable":null}"#;
    const MAC_TEST: &str = r#"{"reason":"compiler-artifact","target":{"kind":["test"],"name":"smoke"},"profile":{"test":true},"filenames":["/w/target/debug/deps/smoke-77","/w/target/debug/deps/smoke-77.dSYM"],"executable":"/w/target/debug/deps/smoke-77"}"#;
    const BUILD_SCRIPT: &str = r#"{"reason":"build-script-executed","package_id":"ring 0.17.0","linked_libs":[],"out_dir":"/w/target/debug/build/ring/out"}"#;
    const FINISHED: &str = r#"{"reason":"build-finished","success":true}"#;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_mixed_stream() {
            let stdout = [BUILD_SCRIPT, LIB_BUILD, LIB_TEST, FINISHED].join("\n");
            let messages = parse_messages(&stdout).unwrap();
            assert_eq!(messages.len(), 4);
            assert_eq!(messages[0].reason, "build-script-executed");
            assert!(messages[2].is_test_artifact());
            assert!(!messages[1].is_test_artifact());
            assert_eq!(messages[2].target.kind, vec!["lib".to_string()]);
        }

        #[test]
        fn test_non_json_lines_skipped() {
            let stdout = format!("\n   Compiling core v0.1.0\n{LIB_TEST}\n");
            assert_eq!(parse_messages(&stdout).unwrap().len(), 1);
        }

        #[test]
        fn test_malformed_json_reports_line() {
            let stdout = format!("{LIB_TEST}\n{{\"reason\": ");
            let err = parse_messages(&stdout).unwrap_err();
            assert!(matches!(err, CovError::ArtifactParse { line: 2, .. }));
        }

        #[test]
        fn test_executable_null() {
            let messages = parse_messages(LIB_BUILD).unwrap();
            assert!(messages[0].executable.is_none());
        }
    }

    mod binaries_tests {
        use super::*;

        #[test]
        fn test_only_test_profile_binaries() {
            let stdout = [LIB_BUILD, LIB_TEST, FINISHED].join("\n");
            let binaries = test_binaries(&stdout).unwrap();
            assert_eq!(binaries, vec![PathBuf::from("/w/target/debug/deps/core-1a2b")]);
        }

        #[test]
        fn test_dsym_bundles_excluded() {
            let binaries = test_binaries(MAC_TEST).unwrap();
            assert_eq!(binaries, vec![PathBuf::from("/w/target/debug/deps/smoke-77")]);
        }

        #[test]
        fn test_duplicates_removed() {
            let stdout = [LIB_TEST, LIB_TEST].join("\n");
            assert_eq!(test_binaries(&stdout).unwrap().len(), 1);
        }

        #[test]
        fn test_no_test_artifacts() {
            let stdout = [LIB_BUILD, FINISHED].join("\n");
            assert!(test_binaries(&stdout).unwrap().is_empty());
        }

        #[test]
        fn test_is_debug_symbol_bundle() {
            assert!(is_debug_symbol_bundle(Path::new("/t/deps/x-1.dSYM")));
            assert!(is_debug_symbol_bundle(Path::new(
                "/t/deps/x-1.dSYM/Contents/Resources/DWARF/x-1"
            )));
            assert!(is_debug_symbol_bundle(Path::new("/t/deps/x-1.dsym")));
            assert!(!is_debug_symbol_bundle(Path::new("/t/deps/x-1")));
            assert!(!is_debug_symbol_bundle(Path::new("/t/dSYM-tools/x-1")));
        }
    }
}
