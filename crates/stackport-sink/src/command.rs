//! External command handlers
//!
//! Runs `<program> <function>` from the service directory and feeds it a JSON
//! document on stdin:
//!
//! ```json
//! { "outputs": { "ServiceEndpoint": "https://..." }, "context": { "identity": {...}, "options": {...} } }
//! ```

use crate::error::HandlerError;
use crate::handler::{HandlerContext, OutputHandler, Result};
use async_trait::async_trait;
use serde::Serialize;
use stackport_core::NormalizedOutputMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Serialize)]
struct HandlerInput<'a> {
    outputs: &'a NormalizedOutputMap,
    context: &'a HandlerContext,
}

pub struct CommandHandler {
    program: PathBuf,
    function: String,
}

impl CommandHandler {
    pub fn new(program: impl Into<PathBuf>, function: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            function: function.into(),
        }
    }

    fn reference(&self) -> String {
        format!("{}.{}", self.program.display(), self.function)
    }
}

#[async_trait]
impl OutputHandler for CommandHandler {
    async fn handle(&self, outputs: &NormalizedOutputMap, context: &HandlerContext) -> Result<()> {
        let input = serde_json::to_vec(&HandlerInput { outputs, context })?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.function);
        if context.identity.service_path.is_dir() {
            cmd.current_dir(&context.identity.service_path);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program.display(), self.function);

        let mut child = cmd.spawn().map_err(|e| HandlerError::Resolution {
            reference: self.reference(),
            reason: e.to_string(),
        })?;

        // stdout/stderr are drained while stdin is written; the handler may
        // produce output before reading its input, or never read it at all.
        let stdin = child.stdin.take();
        let write_input = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&input).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };

        let (written, output) = tokio::join!(write_input, child.wait_with_output());
        let output = output?;
        written?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!(handler = %self.reference(), "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HandlerError::Failed {
                reference: self.reference(),
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        Ok(())
    }
}
