//! UCI engine opponent.
//!
//! Every request spawns a fresh engine process, plays one `go movetime`
//! search and shuts the engine down again.

use std::process::Stdio;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::{MoveRequest, MoveSelector, RequestForm};
use crate::domain::STANDARD_FEN;
use crate::domain::uci::{UciCommand, UciInfo, UciOutputKind, parse_bestmove};

/// How to launch and drive the engine
#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Executable name or path
    pub path: String,
    /// Search time per move
    pub movetime_ms: u64,
    /// Value for the "Skill Level" option, if any
    pub skill: Option<u32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            movetime_ms: 500,
            skill: None,
        }
    }
}

/// Asks an external UCI engine for the best move
pub struct UciEngineSelector {
    settings: EngineSettings,
}

impl UciEngineSelector {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    async fn search(
        &self,
        session: &mut EngineSession,
        request: &MoveRequest,
    ) -> anyhow::Result<Option<String>> {
        session.send(UciCommand::Uci).await?;
        session.wait_for(UciOutputKind::UciOk).await?;

        if let Some(skill) = self.settings.skill {
            session
                .send(UciCommand::SetOption {
                    name: "Skill Level".to_string(),
                    value: skill.to_string(),
                })
                .await?;
        }
        session.send(UciCommand::UciNewGame).await?;
        session.send(UciCommand::IsReady).await?;
        session.wait_for(UciOutputKind::ReadyOk).await?;

        session.send(position_command(request)).await?;
        session
            .send(UciCommand::GoMovetime(self.settings.movetime_ms))
            .await?;

        let mut last_info: Option<UciInfo> = None;
        loop {
            match session.next_output().await? {
                UciOutputKind::Info(info_str) => {
                    let info = UciInfo::parse(&info_str);
                    if info.has_analysis() {
                        last_info = Some(info);
                    }
                }
                UciOutputKind::BestMove(payload) => {
                    if let Some(info) = &last_info {
                        tracing::debug!(
                            "Engine finished at depth {} with score {} ({} nodes in {} ms)",
                            info.depth.unwrap_or(0),
                            info.score.map(|s| s.display()).unwrap_or_default(),
                            info.nodes.unwrap_or(0),
                            info.time.unwrap_or(0)
                        );
                    }
                    return Ok(parse_bestmove(&payload));
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl MoveSelector for UciEngineSelector {
    async fn select_move(&self, request: &MoveRequest) -> anyhow::Result<Option<String>> {
        let mut session = EngineSession::spawn(&self.settings.path).await?;
        let result = self.search(&mut session, request).await;
        session.shutdown().await;
        result
    }
}

/// The `position` command for a request
fn position_command(request: &MoveRequest) -> UciCommand {
    match request.form {
        RequestForm::Position if request.start_fen == STANDARD_FEN => UciCommand::Position {
            fen: None,
            moves: request.moves.clone(),
        },
        RequestForm::Position => UciCommand::Position {
            fen: Some(request.start_fen.clone()),
            moves: request.moves.clone(),
        },
        RequestForm::Notation => UciCommand::Position {
            fen: Some(request.fen.clone()),
            moves: vec![],
        },
    }
}

/// A running engine process and its pipes
struct EngineSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl EngineSession {
    async fn spawn(path: &str) -> anyhow::Result<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start engine: {}", path))?;

        let stdin = child.stdin.take().context("Failed to open engine stdin")?;
        let stdout = child.stdout.take().context("Failed to open engine stdout")?;
        tracing::debug!("Engine started: {}", path);

        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    async fn send(&mut self, cmd: UciCommand) -> anyhow::Result<()> {
        let line = cmd.to_uci_string();
        tracing::trace!(">> {}", line);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_output(&mut self) -> anyhow::Result<UciOutputKind> {
        let Some(line) = self.lines.next_line().await? else {
            bail!("engine exited before answering");
        };
        tracing::trace!("<< {}", line);
        Ok(UciOutputKind::parse(&line))
    }

    /// Skip output until `expected` arrives
    async fn wait_for(&mut self, expected: UciOutputKind) -> anyhow::Result<()> {
        while self.next_output().await? != expected {}
        Ok(())
    }

    async fn shutdown(mut self) {
        let _ = self.send(UciCommand::Quit).await;
        let _ = self.child.kill().await;
        tracing::debug!("Engine stopped");
    }
}
