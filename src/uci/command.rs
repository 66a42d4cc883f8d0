//! Parsing of incoming UCI commands. Parsing is forgiving about unknown
//! tokens (per protocol) but strict about the ones it understands.

use crate::engine::time::GoLimits;

/// A parsed command from the GUI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoLimitsSpec),
    Stop,
    PonderHit,
    SetOption {
        name: String,
        value: String,
    },
    /// Debug helper: print the board.
    Display,
    /// Debug helper: run perft to the given depth.
    Perft(usize),
    Quit,
}

/// `GoLimits` mirror that derives `Eq` for command comparison in tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GoLimitsSpec {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub infinite: bool,
    pub ponder: bool,
}

impl From<GoLimitsSpec> for GoLimits {
    fn from(spec: GoLimitsSpec) -> Self {
        GoLimits {
            depth: spec.depth,
            nodes: spec.nodes,
            movetime: spec.movetime,
            wtime: spec.wtime,
            btime: spec.btime,
            winc: spec.winc,
            binc: spec.binc,
            movestogo: spec.movestogo,
            infinite: spec.infinite,
            ponder: spec.ponder,
        }
    }
}

/// Parse one line from the GUI. Returns `None` for blank or unrecognized
/// input.
#[must_use]
pub fn parse(line: &str) -> Option<UciCommand> {
    let mut tokens = line.split_whitespace();
    let command = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();

    match command {
        "uci" => Some(UciCommand::Uci),
        "isready" => Some(UciCommand::IsReady),
        "ucinewgame" => Some(UciCommand::NewGame),
        "position" => parse_position(&rest),
        "go" => Some(UciCommand::Go(parse_go(&rest))),
        "stop" => Some(UciCommand::Stop),
        "ponderhit" => Some(UciCommand::PonderHit),
        "setoption" => parse_setoption(&rest),
        "d" | "display" => Some(UciCommand::Display),
        "perft" => rest
            .first()
            .and_then(|d| d.parse().ok())
            .map(UciCommand::Perft),
        "quit" => Some(UciCommand::Quit),
        _ => None,
    }
}

fn parse_position(rest: &[&str]) -> Option<UciCommand> {
    let mut idx = 0;
    let fen = match rest.first()? {
        &"startpos" => {
            idx = 1;
            None
        }
        &"fen" => {
            // A FEN is six whitespace-separated fields.
            if rest.len() < 7 {
                return None;
            }
            idx = 7;
            Some(rest[1..7].join(" "))
        }
        _ => return None,
    };

    let mut moves = Vec::new();
    if rest.get(idx) == Some(&"moves") {
        moves = rest[idx + 1..].iter().map(|s| (*s).to_string()).collect();
    }

    Some(UciCommand::Position { fen, moves })
}

fn parse_go(rest: &[&str]) -> GoLimitsSpec {
    type Tokens<'a, 'b> = std::iter::Peekable<std::slice::Iter<'a, &'b str>>;

    fn next_u64(iter: &mut Tokens<'_, '_>) -> Option<u64> {
        let value = iter.peek().and_then(|v| v.parse().ok());
        if value.is_some() {
            iter.next();
        }
        value
    }

    let mut limits = GoLimitsSpec::default();
    let mut iter = rest.iter().peekable();
    while let Some(&token) = iter.next() {
        match token {
            "depth" => limits.depth = next_u64(&mut iter).map(|v| v as i32).or(limits.depth),
            "nodes" => limits.nodes = next_u64(&mut iter).or(limits.nodes),
            "movetime" => limits.movetime = next_u64(&mut iter).or(limits.movetime),
            "wtime" => limits.wtime = next_u64(&mut iter).or(limits.wtime),
            "btime" => limits.btime = next_u64(&mut iter).or(limits.btime),
            "winc" => limits.winc = next_u64(&mut iter).or(limits.winc),
            "binc" => limits.binc = next_u64(&mut iter).or(limits.binc),
            "movestogo" => limits.movestogo = next_u64(&mut iter).or(limits.movestogo),
            "infinite" => limits.infinite = true,
            "ponder" => limits.ponder = true,
            _ => {}
        }
    }
    limits
}

fn parse_setoption(rest: &[&str]) -> Option<UciCommand> {
    // setoption name <name tokens> [value <value tokens>]
    if rest.first() != Some(&"name") {
        return None;
    }
    let value_pos = rest.iter().position(|&t| t == "value");
    let (name_slice, value_slice) = match value_pos {
        Some(pos) => (&rest[1..pos], &rest[pos + 1..]),
        None => (&rest[1..], &rest[rest.len()..]),
    };
    if name_slice.is_empty() {
        return None;
    }
    Some(UciCommand::SetOption {
        name: name_slice.join(" "),
        value: value_slice.join(" "),
    })
}
