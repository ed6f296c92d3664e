//! UCI (Universal Chess Interface) protocol types.
//!
//! Commands we send to an engine and the lines it sends back. Process
//! spawning lives in the opponent layer; this module is pure text.

/// UCI commands that can be sent to an engine
#[derive(Debug, Clone)]
pub enum UciCommand {
    /// Initialize UCI mode
    Uci,
    /// Check if engine is ready
    IsReady,
    /// Reset engine state for a fresh game
    UciNewGame,
    /// Set an engine option
    SetOption { name: String, value: String },
    /// Set position (startpos or FEN, with optional moves)
    Position { fen: Option<String>, moves: Vec<String> },
    /// Search for a fixed time in milliseconds
    GoMovetime(u64),
    /// Quit the engine
    Quit,
}

impl UciCommand {
    /// Convert command to UCI protocol string
    pub fn to_uci_string(&self) -> String {
        match self {
            UciCommand::Uci => "uci".to_string(),
            UciCommand::IsReady => "isready".to_string(),
            UciCommand::UciNewGame => "ucinewgame".to_string(),
            UciCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            UciCommand::Position { fen, moves } => {
                let mut cmd = match fen {
                    Some(f) => format!("position fen {}", f),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    cmd.push_str(" moves ");
                    cmd.push_str(&moves.join(" "));
                }
                cmd
            }
            UciCommand::GoMovetime(ms) => format!("go movetime {}", ms),
            UciCommand::Quit => "quit".to_string(),
        }
    }
}

/// Categorized engine output line
#[derive(Debug, Clone, PartialEq)]
pub enum UciOutputKind {
    /// "uciok" - engine is ready for UCI
    UciOk,
    /// "readyok" - engine is ready
    ReadyOk,
    /// "info ..." - analysis information
    Info(String),
    /// "bestmove ..." - search finished
    BestMove(String),
    /// Anything else (id lines, options, copyright banners, ...)
    Other(String),
}

impl UciOutputKind {
    /// Parse a raw UCI output line into a categorized type
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line == "uciok" {
            UciOutputKind::UciOk
        } else if line == "readyok" {
            UciOutputKind::ReadyOk
        } else if let Some(rest) = line.strip_prefix("info ") {
            UciOutputKind::Info(rest.to_string())
        } else if let Some(rest) = line.strip_prefix("bestmove") {
            UciOutputKind::BestMove(rest.trim().to_string())
        } else {
            UciOutputKind::Other(line.to_string())
        }
    }
}

/// Extract the move from the payload of a `bestmove` line.
///
/// Returns `None` when the engine reports that it has no move
/// (`(none)` or the null move `0000`).
pub fn parse_bestmove(payload: &str) -> Option<String> {
    let mv = payload.split_whitespace().next()?;
    match mv {
        "(none)" | "0000" => None,
        other => Some(other.to_string()),
    }
}

/// Engine evaluation score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Centipawn score from the side to move's point of view
    Centipawns(i32),
    /// Mate in N moves (negative when the side to move gets mated)
    Mate(i32),
}

impl Score {
    /// Format score for logs (e.g., "+0.35" or "M3" or "-M2")
    pub fn display(&self) -> String {
        match self {
            Score::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Score::Mate(moves) if *moves > 0 => format!("M{}", moves),
            Score::Mate(moves) => format!("-M{}", moves.abs()),
        }
    }
}

/// The fields of a UCI info line we care about
#[derive(Debug, Clone, Default)]
pub struct UciInfo {
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    /// Search time in milliseconds
    pub time: Option<u64>,
    /// Principal variation as UCI moves
    pub pv: Vec<String>,
}

const INFO_KEYWORDS: &[&str] = &[
    "depth",
    "seldepth",
    "multipv",
    "score",
    "nodes",
    "nps",
    "time",
    "hashfull",
    "tbhits",
    "currmove",
    "currmovenumber",
    "string",
    "refutation",
    "currline",
    "pv",
];

impl UciInfo {
    /// Parse a UCI info string (the part after "info ")
    pub fn parse(info_str: &str) -> Self {
        let mut info = UciInfo::default();
        let mut tokens = info_str.split_whitespace().peekable();

        while let Some(token) = tokens.next() {
            match token {
                "depth" => info.depth = tokens.next().and_then(|t| t.parse().ok()),
                "nodes" => info.nodes = tokens.next().and_then(|t| t.parse().ok()),
                "time" => info.time = tokens.next().and_then(|t| t.parse().ok()),
                "score" => {
                    let kind = tokens.next();
                    let value = tokens.next().and_then(|t| t.parse::<i32>().ok());
                    info.score = match (kind, value) {
                        (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                        (Some("mate"), Some(m)) => Some(Score::Mate(m)),
                        _ => info.score,
                    };
                }
                "pv" => {
                    while let Some(mv) = tokens.next_if(|t| !INFO_KEYWORDS.contains(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                // "string" swallows the rest of the line
                "string" => break,
                _ => {}
            }
        }

        info
    }

    /// Check if this info line has meaningful analysis data (depth + score + pv)
    pub fn has_analysis(&self) -> bool {
        self.depth.is_some() && self.score.is_some() && !self.pv.is_empty()
    }
}
