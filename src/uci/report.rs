//! Formatting of outgoing UCI messages: `info` records and `bestmove`.

use crate::board::Move;
use crate::search::smp::SearchReport;
use crate::search::IterationInfo;

/// One `info` line for a completed iteration.
#[must_use]
pub fn format_info(info: &IterationInfo) -> String {
    let mut line = format!(
        "info depth {} seldepth {} multipv {}",
        info.depth, info.seldepth, info.multipv
    );
    match info.mate_in {
        Some(mate) => line.push_str(&format!(" score mate {mate}")),
        None => line.push_str(&format!(" score cp {}", info.score)),
    }
    line.push_str(&format!(
        " nodes {} nps {} hashfull {} time {}",
        info.nodes, info.nps, info.hashfull, info.time_ms
    ));
    if !info.pv.is_empty() {
        line.push_str(" pv");
        for mv in &info.pv {
            line.push_str(&format!(" {mv}"));
        }
    }
    line
}

/// The final `bestmove` line. A position with no legal moves reports the
/// null move `0000`.
#[must_use]
pub fn format_bestmove(report: &SearchReport) -> String {
    match report.best_move {
        Some(best) => match report.ponder_move {
            Some(ponder) => format!("bestmove {best} ponder {ponder}"),
            None => format!("bestmove {best}"),
        },
        None => format!("bestmove {}", Move::NULL),
    }
}
