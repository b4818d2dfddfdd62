//! Running `vale` over a piece of text.

use crate::command::vale_command;
use crate::configurator::ValeConfig;
use crate::output::interpret_exit;
use std::future::Future;
use std::io;
use std::process::Stdio;
use stylecheck_core::{Issue, LintError, Linter};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A [`Linter`] backed by the `vale` executable.
///
/// Every call spawns a fresh process:
///
/// ```text
/// vale --config <config_path> --ext .md --output JSON
/// ```
///
/// The text goes to stdin, which is closed once written; the report comes back on stdout.
#[derive(Debug, Clone)]
pub struct ValeRunner {
    config: ValeConfig,
}

impl ValeRunner {
    /// Create a runner for `config`.
    pub fn new(config: ValeConfig) -> Self {
        Self { config }
    }

    /// Executable and config paths in use.
    pub fn config(&self) -> &ValeConfig {
        &self.config
    }

    async fn run(&self, text: &str) -> Result<Vec<Issue>, LintError> {
        let mut cmd = vale_command(&self.config.vale_path, ["--config"]);
        cmd.arg(&self.config.config_path)
            .args(["--ext", ".md", "--output", "JSON"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| LintError::Spawn {
            program: self.config.vale_path.display().to_string(),
            source,
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("failed to open vale stdin"))?;

        // Feed stdin while collecting output so a large report cannot stall the writer.
        let write = async move {
            let written = stdin.write_all(text.as_bytes()).await;
            drop(stdin);
            match written {
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        written?;

        let code = output.status.code();
        debug!(?code, stdout_len = output.stdout.len(), "vale finished");
        interpret_exit(code, &output.stdout, &output.stderr)
    }
}

impl Linter for ValeRunner {
    fn lint(&self, text: &str) -> impl Future<Output = Result<Vec<Issue>, LintError>> + Send {
        self.run(text)
    }
}
