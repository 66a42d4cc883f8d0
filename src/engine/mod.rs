//! The engine facade consumed by the UCI front-end: position setup,
//! search lifecycle (`go` / `stop` / `ponderhit`) and option handling.

pub mod time;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::board::{Board, FenError, MoveParseError};
use crate::eval::{Classic, Evaluator};
use crate::search::smp::{self, SearchReport, SmpConfig};
use crate::search::{IterationInfo, SearchClock};
use crate::tt::TranspositionTable;

use time::{compute_deadlines, GoLimits, TimeConfig};

/// Callback invoked with each iteration's info record.
pub type InfoSink = Arc<dyn Fn(&IterationInfo) + Send + Sync>;

/// Callback invoked once with the final report when a search finishes.
pub type ReportSink = Box<dyn FnOnce(&SearchReport) + Send>;

/// Error from `set_position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The FEN was rejected; the board is unchanged.
    InvalidFen(FenError),
    /// A move in the list was illegal; earlier moves remain applied.
    IllegalMove {
        mv: String,
        source: MoveParseError,
    },
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::InvalidFen(e) => write!(f, "invalid position: {e}"),
            PositionError::IllegalMove { mv, source } => {
                write!(f, "invalid move '{mv}': {source}")
            }
        }
    }
}

impl std::error::Error for PositionError {}

impl From<FenError> for PositionError {
    fn from(e: FenError) -> Self {
        PositionError::InvalidFen(e)
    }
}

/// Error from `set_option`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    UnknownOption { name: String },
    InvalidValue { name: &'static str, value: String },
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionError::UnknownOption { name } => write!(f, "unknown option '{name}'"),
            OptionError::InvalidValue { name, value } => {
                write!(f, "invalid value '{value}' for option '{name}'")
            }
        }
    }
}

impl std::error::Error for OptionError {}

/// UCI-visible options with their validated ranges.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Transposition table size in MB (1..=1024).
    pub hash_mb: usize,
    /// Search worker threads (1..=256).
    pub threads: usize,
    /// Principal variations to report (1..=10).
    pub multipv: usize,
    /// Whether the GUI may send `go ponder`.
    pub ponder: bool,
    /// Latency reserve subtracted from the clock, in ms.
    pub move_overhead_ms: u64,
    /// Draw aversion in centipawns.
    pub contempt: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_mb: 64,
            threads: 1,
            multipv: 1,
            ponder: false,
            move_overhead_ms: 30,
            contempt: 0,
        }
    }
}

struct ActiveSearch {
    handle: JoinHandle<SearchReport>,
    /// Deadlines to arm when `ponderhit` converts the search to real time.
    pending_deadlines: Option<(u64, u64)>,
}

/// The engine: one board, one shared transposition table, at most one
/// running search.
pub struct Engine {
    board: Board,
    evaluator: Arc<dyn Evaluator>,
    tt: Arc<TranspositionTable>,
    options: EngineOptions,
    stop: Arc<AtomicBool>,
    clock: Arc<SearchClock>,
    active: Option<ActiveSearch>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        let options = EngineOptions::default();
        Engine {
            board: Board::new(),
            evaluator: Arc::new(Classic),
            tt: Arc::new(TranspositionTable::new(options.hash_mb)),
            options,
            stop: Arc::new(AtomicBool::new(false)),
            clock: Arc::new(SearchClock::new()),
            active: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Reset for a fresh game: clear the table and its age counter.
    pub fn new_game(&mut self) {
        self.halt();
        self.tt.clear();
        self.board = Board::new();
        debug!("new game");
    }

    /// Set the board from a FEN (or the start position) and apply a list
    /// of UCI moves. A bad FEN leaves the board untouched; a bad move
    /// leaves every earlier move applied.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[&str]) -> Result<(), PositionError> {
        self.halt();
        self.board = match fen {
            Some(fen) => Board::from_fen(fen)?,
            None => Board::new(),
        };
        for mv in moves {
            self.board
                .make_move_uci(mv)
                .map_err(|source| PositionError::IllegalMove {
                    mv: (*mv).to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Start a search under `limits`. Returns immediately; `on_done`
    /// fires from the driver thread with the final report.
    pub fn go(&mut self, limits: GoLimits, info: Option<InfoSink>, on_done: ReportSink) {
        self.halt();

        let time_config = TimeConfig {
            move_overhead_ms: self.options.move_overhead_ms,
        };
        let deadlines = compute_deadlines(&limits, self.board.side_to_move(), &time_config);

        // While pondering the clock stays disarmed; the deadlines it
        // would have had are armed by `ponder_hit`.
        let pending_deadlines = if limits.ponder {
            let real = GoLimits {
                ponder: false,
                ..limits
            };
            compute_deadlines(&real, self.board.side_to_move(), &time_config)
        } else {
            None
        };

        let now = Instant::now();
        let to_instant = |ms: u64| now + Duration::from_millis(ms);
        self.clock.restart(
            deadlines.map(|(soft, _)| to_instant(soft)),
            deadlines.map(|(_, hard)| to_instant(hard)),
        );
        self.stop.store(false, Ordering::Relaxed);

        let config = SmpConfig {
            threads: self.options.threads,
            max_depth: limits
                .depth
                .unwrap_or(crate::search::MAX_PLY as i32 - 1)
                .max(1),
            node_limit: limits.nodes.unwrap_or(0),
            multipv: self.options.multipv,
            contempt: self.options.contempt,
            params: crate::search::SearchParams::default(),
            info,
        };

        let board = self.board.clone();
        let evaluator = Arc::clone(&self.evaluator);
        let tt = Arc::clone(&self.tt);
        let stop = Arc::clone(&self.stop);
        let clock = Arc::clone(&self.clock);

        let handle = std::thread::Builder::new()
            .name("search-driver".to_string())
            .spawn(move || {
                let report = smp::search(&board, evaluator, tt, stop, clock, config);
                on_done(&report);
                report
            })
            .expect("failed to spawn search driver");

        self.active = Some(ActiveSearch {
            handle,
            pending_deadlines,
        });
    }

    /// Signal the running search to stop and wait for its report.
    pub fn stop(&mut self) -> Option<SearchReport> {
        self.stop.store(true, Ordering::Relaxed);
        self.wait()
    }

    /// Wait for the running search without forcing it to stop.
    pub fn wait(&mut self) -> Option<SearchReport> {
        let active = self.active.take()?;
        match active.handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                warn!("search driver thread panicked");
                None
            }
        }
    }

    /// The ponder move was played: arm the real deadlines and let the
    /// search continue as a normal timed search.
    pub fn ponder_hit(&mut self) {
        if let Some(active) = &self.active {
            if let Some((soft, hard)) = active.pending_deadlines {
                let now = Instant::now();
                self.clock.arm(
                    Some(now + Duration::from_millis(soft)),
                    Some(now + Duration::from_millis(hard)),
                );
                debug!("ponderhit: armed {soft}/{hard} ms");
            }
        }
    }

    /// Stop any running search, ignoring its result.
    fn halt(&mut self) {
        if self.active.is_some() {
            let _ = self.stop();
        }
    }

    /// Apply a UCI `setoption`, validating name and range.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        fn parse<T: std::str::FromStr>(
            name: &'static str,
            value: &str,
        ) -> Result<T, OptionError> {
            value.parse().map_err(|_| OptionError::InvalidValue {
                name,
                value: value.to_string(),
            })
        }

        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let mb: usize = parse("Hash", value)?;
                if !(1..=1024).contains(&mb) {
                    return Err(OptionError::InvalidValue {
                        name: "Hash",
                        value: value.to_string(),
                    });
                }
                self.halt();
                self.options.hash_mb = mb;
                self.tt = Arc::new(TranspositionTable::new(mb));
            }
            "threads" => {
                let threads: usize = parse("Threads", value)?;
                if !(1..=256).contains(&threads) {
                    return Err(OptionError::InvalidValue {
                        name: "Threads",
                        value: value.to_string(),
                    });
                }
                self.options.threads = threads;
            }
            "multipv" => {
                let multipv: usize = parse("MultiPV", value)?;
                if !(1..=10).contains(&multipv) {
                    return Err(OptionError::InvalidValue {
                        name: "MultiPV",
                        value: value.to_string(),
                    });
                }
                self.options.multipv = multipv;
            }
            "ponder" => {
                self.options.ponder = match value.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(OptionError::InvalidValue {
                            name: "Ponder",
                            value: value.to_string(),
                        })
                    }
                };
            }
            "move overhead" => {
                self.options.move_overhead_ms = parse("Move Overhead", value)?;
            }
            "contempt" => {
                let contempt: i32 = parse("Contempt", value)?;
                if !(-500..=500).contains(&contempt) {
                    return Err(OptionError::InvalidValue {
                        name: "Contempt",
                        value: value.to_string(),
                    });
                }
                self.options.contempt = contempt;
            }
            _ => {
                return Err(OptionError::UnknownOption {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Run a search to completion on the calling thread. Convenience for
    /// tests and tools; the UCI loop uses the asynchronous `go`.
    pub fn search_blocking(&mut self, limits: GoLimits) -> SearchReport {
        self.go(limits, None, Box::new(|_| {}));
        self.wait().expect("search was just started")
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Drop for Engine {
    /// No search worker may outlive the engine that spawned it.
    fn drop(&mut self) {
        self.halt();
    }
}
