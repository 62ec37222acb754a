//! Engine backend that drives an external bridge process.
//!
//! The vendor engine only runs inside its own host interpreter, so the batch tooling talks to a
//! small bridge program that owns the engine and speaks the [`protocol`](crate::protocol) on
//! stdin/stdout. The bridge's stderr is inherited so host tracebacks stay visible.

use serde::{Deserialize, Serialize};
use stabsim_core::ChannelDump;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

use crate::capture::DiagnosticBuffer;
use crate::error::EngineFault;
use crate::protocol::{BridgeRequest, BridgeResponse, PROTOCOL_VERSION};
use crate::session::{EngineCommand, EngineResult, EngineSession};

/// How to launch the bridge process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["psse_bridge.py".to_string()],
            working_dir: None,
        }
    }
}

impl BridgeConfig {
    /// Resolves the program on `PATH` unless it already names a path.
    fn resolve_program(&self) -> Result<PathBuf, EngineFault> {
        if self.program.contains(std::path::MAIN_SEPARATOR) || self.program.contains('/') {
            return Ok(PathBuf::from(&self.program));
        }
        which::which(&self.program).map_err(|err| EngineFault::Spawn {
            program: self.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, err.to_string()),
        })
    }
}

struct BridgeProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

pub struct BridgeEngine {
    config: BridgeConfig,
    process: Option<BridgeProcess>,
    diagnostics: DiagnosticBuffer,
}

impl BridgeEngine {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            process: None,
            diagnostics: DiagnosticBuffer::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn spawn(&self) -> Result<BridgeProcess, EngineFault> {
        let program = self.config.resolve_program()?;
        let mut command = Command::new(&program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| EngineFault::Spawn {
            program: program.display().to_string(),
            source,
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineFault::Protocol("bridge stdin was not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineFault::Protocol("bridge stdout was not piped".to_string()))?;

        debug!(program = %program.display(), pid = child.id(), "Engine bridge started");
        Ok(BridgeProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Sends one request and waits for its response line.
    ///
    /// The response's output text is forwarded to the diagnostic buffer before any fault is
    /// reported, so a capture sees what the engine printed on the way down. A broken pipe, an
    /// exited bridge or an unreadable reply ends the session: the request/response stream can no
    /// longer be trusted to line up.
    fn exchange(&mut self, request: &BridgeRequest) -> Result<BridgeResponse, EngineFault> {
        let line = request.to_line()?;
        let response = match self.round_trip(&line).and_then(|reply| BridgeResponse::parse(&reply))
        {
            Ok(response) => response,
            Err(EngineFault::NotOpen) => return Err(EngineFault::NotOpen),
            Err(fault) => {
                warn!(op = request.op(), error = %fault, "Engine bridge session lost");
                self.terminate();
                return Err(fault);
            }
        };

        self.diagnostics.emit(&response.output);
        if let Some(message) = &response.fault {
            return Err(EngineFault::Host {
                command: request.op().to_string(),
                message: message.clone(),
            });
        }
        Ok(response)
    }

    fn round_trip(&mut self, line: &str) -> Result<String, EngineFault> {
        let process = self.process.as_mut().ok_or(EngineFault::NotOpen)?;

        writeln!(process.stdin, "{line}")?;
        process.stdin.flush()?;

        let mut reply = String::new();
        if process.stdout.read_line(&mut reply)? == 0 {
            let status = match process.child.try_wait() {
                Ok(Some(status)) => status.to_string(),
                Ok(None) => "stdout closed".to_string(),
                Err(err) => err.to_string(),
            };
            return Err(EngineFault::BridgeExited { status });
        }
        Ok(reply)
    }

    /// Kills and reaps the bridge without a shutdown request.
    fn terminate(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.child.kill();
            match process.child.wait() {
                Ok(status) => debug!(%status, "Engine bridge terminated"),
                Err(err) => warn!(error = %err, "Engine bridge could not be reaped"),
            }
        }
    }

    fn handshake(&mut self) -> Result<(), EngineFault> {
        let response = self.exchange(&BridgeRequest::Hello {
            protocol: PROTOCOL_VERSION,
        })?;
        if !response.status().is_ok() {
            return Err(EngineFault::Protocol(format!(
                "bridge rejected protocol version {PROTOCOL_VERSION} (status {})",
                response.status()
            )));
        }
        Ok(())
    }
}

impl EngineSession for BridgeEngine {
    fn name(&self) -> &str {
        "bridge"
    }

    fn open(&mut self) -> Result<(), EngineFault> {
        if self.process.is_some() {
            return Ok(());
        }
        self.process = Some(self.spawn()?);

        if let Err(fault) = self.handshake() {
            self.terminate();
            return Err(fault);
        }
        info!(program = %self.config.program, "Engine session opened");
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineFault> {
        let Some(process) = self.process.take() else {
            return Ok(());
        };
        let BridgeProcess {
            mut child,
            mut stdin,
            stdout,
        } = process;

        if let Ok(line) = BridgeRequest::Shutdown.to_line() {
            if let Err(err) = writeln!(stdin, "{line}").and_then(|_| stdin.flush()) {
                warn!(error = %err, "Engine bridge did not accept shutdown");
            }
        }
        drop(stdin);
        drop(stdout);

        let status = child.wait()?;
        debug!(%status, "Engine bridge exited");
        Ok(())
    }

    fn diagnostics_mut(&mut self) -> &mut DiagnosticBuffer {
        &mut self.diagnostics
    }

    fn execute(&mut self, command: &EngineCommand) -> EngineResult {
        let response = self.exchange(&BridgeRequest::Command(command.clone()))?;
        Ok(response.status())
    }

    fn read_channels(&mut self, output: &Path) -> Result<ChannelDump, EngineFault> {
        let response = self.exchange(&BridgeRequest::ReadChannels {
            output: output.to_path_buf(),
        })?;
        let dump = response
            .channels
            .ok_or_else(|| EngineFault::MissingOutput(output.to_path_buf()))?;
        dump.validate()
            .map_err(|err| EngineFault::Protocol(err.to_string()))?;
        Ok(dump)
    }
}

impl Drop for BridgeEngine {
    fn drop(&mut self) {
        self.terminate();
    }
}
