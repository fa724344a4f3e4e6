//! Resolution of the cargo and LLVM coverage tool invocations

use crate::command::{run_checked, Capture, CommandRunner, ToolCommand};
use crate::config::{LlvmTools, PipelineConfig};
use crate::pipeline::Stage;
use crate::result::{CovError, CovResult};
use std::path::{Path, PathBuf};

/// `cargo`, optionally pinned to a rustup toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cargo {
    toolchain: Option<String>,
}

impl Cargo {
    /// Create a cargo invoker
    #[must_use]
    pub const fn new(toolchain: Option<String>) -> Self {
        Self { toolchain }
    }

    /// `cargo [+toolchain] <subcommand>`
    #[must_use]
    pub fn command(&self, subcommand: &str) -> ToolCommand {
        let cmd = ToolCommand::new("cargo");
        let cmd = match &self.toolchain {
            Some(tc) => cmd.arg(format!("+{tc}")),
            None => cmd,
        };
        cmd.arg(subcommand)
    }
}

/// How `llvm-profdata` and `llvm-cov` are reached once resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTools {
    /// Through cargo-binutils subcommands
    CargoBinutils(Cargo),
    /// Direct paths
    Paths {
        /// `llvm-profdata`
        profdata: PathBuf,
        /// `llvm-cov`
        cov: PathBuf,
    },
}

impl ResolvedTools {
    /// Resolve the configured tools. Only `Sysroot` runs anything.
    pub fn resolve<R: CommandRunner + ?Sized>(
        config: &PipelineConfig,
        runner: &mut R,
    ) -> CovResult<Self> {
        let resolved = match &config.llvm_tools {
            LlvmTools::CargoBinutils => Self::CargoBinutils(Cargo::new(config.toolchain.clone())),
            LlvmTools::Explicit { profdata, cov } => Self::Paths {
                profdata: profdata.clone(),
                cov: cov.clone(),
            },
            LlvmTools::Sysroot => {
                let bin = sysroot_tool_dir(config, runner)?;
                let profdata = bin.join(format!("llvm-profdata{}", std::env::consts::EXE_SUFFIX));
                let cov = bin.join(format!("llvm-cov{}", std::env::consts::EXE_SUFFIX));
                for (tool, path) in [("llvm-profdata", &profdata), ("llvm-cov", &cov)] {
                    if !path.is_file() {
                        return Err(CovError::LlvmToolMissing {
                            tool,
                            path: path.clone(),
                        });
                    }
                }
                Self::Paths { profdata, cov }
            }
        };
        tracing::debug!(tools = ?resolved, "resolved llvm tools");
        Ok(resolved)
    }

    /// `llvm-profdata <args>`
    #[must_use]
    pub fn profdata(&self) -> ToolCommand {
        match self {
            Self::CargoBinutils(cargo) => cargo.command("profdata").arg("--"),
            Self::Paths { profdata, .. } => ToolCommand::new(profdata),
        }
    }

    /// `llvm-cov <args>`
    #[must_use]
    pub fn cov(&self) -> ToolCommand {
        match self {
            Self::CargoBinutils(cargo) => cargo.command("cov").arg("--"),
            Self::Paths { cov, .. } => ToolCommand::new(cov),
        }
    }
}

fn rustc(toolchain: Option<&str>) -> ToolCommand {
    let cmd = ToolCommand::new("rustc");
    match toolchain {
        Some(tc) => cmd.arg(format!("+{tc}")),
        None => cmd,
    }
}

/// `<sysroot>/lib/rustlib/<host>/bin`
fn sysroot_tool_dir<R: CommandRunner + ?Sized>(
    config: &PipelineConfig,
    runner: &mut R,
) -> CovResult<PathBuf> {
    let tc = config.toolchain.as_deref();

    let sysroot = rustc(tc)
        .args(["--print", "sysroot"])
        .current_dir(&config.root)
        .capture(Capture::All);
    let sysroot = run_checked(runner, Stage::Merge, &sysroot)?.stdout_text();
    let sysroot = sysroot.trim();
    if sysroot.is_empty() {
        return Err(CovError::invalid_config("rustc printed an empty sysroot"));
    }

    let version = rustc(tc).arg("-vV").current_dir(&config.root).capture(Capture::All);
    let version = run_checked(runner, Stage::Merge, &version)?.stdout_text();
    let host = parse_host(&version)
        .ok_or_else(|| CovError::invalid_config("no `host:` line in `rustc -vV` output"))?;

    Ok(Path::new(sysroot)
        .join("lib")
        .join("rustlib")
        .join(host)
        .join("bin"))
}

/// Host triple from `rustc -vV`
#[must_use]
pub fn parse_host(version_output: &str) -> Option<&str> {
    version_output
        .lines()
        .find_map(|l| l.strip_prefix("host:"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use tempfile::TempDir;

    struct RustcStub {
        sysroot: String,
        version: String,
    }

    impl CommandRunner for RustcStub {
        fn run(&mut self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
            if command.has_arg("sysroot") {
                Ok(CommandOutput::success(self.sysroot.clone()))
            } else {
                Ok(CommandOutput::success(self.version.clone()))
            }
        }
    }

    const VERSION: &str = "rustc 1.80.0 (051478957 2024-07-21)\nbinary: rustc\nhost: x86_64-unknown-linux-gnu\nrelease: 1.80.0\n";

    #[test]
    fn test_cargo_plain_and_pinned() {
        assert_eq!(Cargo::new(None).command("test").to_string(), "cargo test");
        assert_eq!(
            Cargo::new(Some("nightly".to_string())).command("test").to_string(),
            "cargo +nightly test"
        );
    }

    #[test]
    fn test_cargo_binutils_commands() {
        let config = PipelineConfig::new().with_toolchain(Some("nightly".to_string()));
        let mut stub = RustcStub {
            sysroot: String::new(),
            version: String::new(),
        };
        let tools = ResolvedTools::resolve(&config, &mut stub).unwrap();
        assert_eq!(tools.profdata().to_string(), "cargo +nightly profdata --");
        assert_eq!(tools.cov().to_string(), "cargo +nightly cov --");
    }

    #[test]
    fn test_explicit_paths_used_verbatim() {
        let config = PipelineConfig::new().with_llvm_tools(LlvmTools::Explicit {
            profdata: PathBuf::from("/opt/llvm/bin/llvm-profdata"),
            cov: PathBuf::from("/opt/llvm/bin/llvm-cov"),
        });
        let mut stub = RustcStub {
            sysroot: String::new(),
            version: String::new(),
        };
        let tools = ResolvedTools::resolve(&config, &mut stub).unwrap();
        assert_eq!(tools.profdata().program(), "/opt/llvm/bin/llvm-profdata");
        assert_eq!(tools.cov().program(), "/opt/llvm/bin/llvm-cov");
    }

    #[test]
    fn test_sysroot_resolution() {
        let temp = TempDir::new().unwrap();
        let bin = temp
            .path()
            .join("lib/rustlib/x86_64-unknown-linux-gnu/bin");
        std::fs::create_dir_all(&bin).unwrap();
        let suffix = std::env::consts::EXE_SUFFIX;
        std::fs::write(bin.join(format!("llvm-profdata{suffix}")), b"").unwrap();
        std::fs::write(bin.join(format!("llvm-cov{suffix}")), b"").unwrap();

        let config = PipelineConfig::new().with_llvm_tools(LlvmTools::Sysroot);
        let mut stub = RustcStub {
            sysroot: format!("{}\n", temp.path().display()),
            version: VERSION.to_string(),
        };
        let tools = ResolvedTools::resolve(&config, &mut stub).unwrap();
        match tools {
            ResolvedTools::Paths { profdata, cov } => {
                assert_eq!(profdata, bin.join(format!("llvm-profdata{suffix}")));
                assert_eq!(cov, bin.join(format!("llvm-cov{suffix}")));
            }
            ResolvedTools::CargoBinutils(_) => panic!("expected paths"),
        }
    }

    #[test]
    fn test_sysroot_missing_component() {
        let temp = TempDir::new().unwrap();
        let config = PipelineConfig::new().with_llvm_tools(LlvmTools::Sysroot);
        let mut stub = RustcStub {
            sysroot: temp.path().display().to_string(),
            version: VERSION.to_string(),
        };
        let err = ResolvedTools::resolve(&config, &mut stub).unwrap_err();
        assert!(matches!(err, CovError::LlvmToolMissing { tool: "llvm-profdata", .. }));
    }

    #[test]
    fn test_parse_host() {
        assert_eq!(parse_host(VERSION), Some("x86_64-unknown-linux-gnu"));
        assert_eq!(parse_host("rustc 1.80.0\n"), None);
        assert_eq!(parse_host("host:   \n"), None);
    }
}
