//! Invocation of the external `meshtastic` command line tool.
//!
//! The monitor only ever needs three commands: `--version` to confirm the tool
//! is installed, `--info` for the topology dump and `--traceroute <id>` for
//! newly seen nodes. [`MeshCli`] abstracts them so the poll cycle can be driven
//! by a scripted implementation in tests.

use log::{debug, error, info};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::errors::CliError;
use crate::config::MeshtasticConfig;
use crate::logutil::escape_log;

/// Source of raw CLI output. Each call returns captured stdout.
#[allow(async_fn_in_trait)]
pub trait MeshCli {
    async fn version(&self) -> Result<String, CliError>;
    async fn info(&self) -> Result<String, CliError>;
    async fn traceroute(&self, node_id: &str) -> Result<String, CliError>;
}

/// Runs the real `meshtastic` program as a child process (no shell).
#[derive(Debug, Clone)]
pub struct MeshtasticCli {
    program: String,
    port: Option<String>,
    host: Option<String>,
    traceroute_timeout_secs: u64,
    command_timeout_secs: u64,
}

impl MeshtasticCli {
    pub fn new(cfg: &MeshtasticConfig) -> Self {
        Self {
            program: cfg.cli_path.clone(),
            port: cfg.port.clone().filter(|p| !p.trim().is_empty()),
            host: cfg.host.clone().filter(|h| !h.trim().is_empty()),
            traceroute_timeout_secs: cfg.traceroute_timeout_secs,
            command_timeout_secs: cfg.command_timeout_secs,
        }
    }

    /// `--port` / `--host` selection; the CLI autodetects a serial radio otherwise.
    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(port) = &self.port {
            args.push("--port".to_string());
            args.push(port.clone());
        }
        if let Some(host) = &self.host {
            args.push("--host".to_string());
            args.push(host.clone());
        }
        args
    }

    pub fn traceroute_args(&self, node_id: &str) -> Vec<String> {
        let mut args = self.connection_args();
        args.extend([
            "--traceroute".to_string(),
            node_id.to_string(),
            "--timeout".to_string(),
            self.traceroute_timeout_secs.to_string(),
        ]);
        args
    }

    pub fn info_args(&self) -> Vec<String> {
        let mut args = self.connection_args();
        args.push("--info".to_string());
        args
    }

    async fn run(&self, args: &[String]) -> Result<String, CliError> {
        debug!("Running {} {}", self.program, args.join(" "));
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = if self.command_timeout_secs > 0 {
            let bound = Duration::from_secs(self.command_timeout_secs);
            match timeout(bound, cmd.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(CliError::Timeout {
                        seconds: self.command_timeout_secs,
                    })
                }
            }
        } else {
            cmd.output().await
        };
        let output = result.map_err(|source| CliError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(CliError::Exit {
                code: output.status.code(),
                stderr,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }
        if !stderr.is_empty() {
            debug!("{} stderr: {}", self.program, escape_log(&stderr));
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

impl MeshCli for MeshtasticCli {
    async fn version(&self) -> Result<String, CliError> {
        self.run(&["--version".to_string()]).await
    }

    async fn info(&self) -> Result<String, CliError> {
        self.run(&self.info_args()).await
    }

    async fn traceroute(&self, node_id: &str) -> Result<String, CliError> {
        self.run(&self.traceroute_args(node_id)).await
    }
}

/// Confirm the CLI is installed and answering. Logs the detected version.
pub async fn check_cli<C: MeshCli>(cli: &C) -> bool {
    info!("Looking for Meshtastic CLI...");
    match cli.version().await {
        Ok(version) => {
            info!("Detected Meshtastic CLI v{}", version.trim());
            true
        }
        Err(e) => {
            error!("Meshtastic CLI unavailable: {}", e);
            false
        }
    }
}
