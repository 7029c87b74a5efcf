//! Loading the design-search log.
//!
//! The log is a CSV file with a header row. `rule_seq` holds a bracketed list of
//! rule indices (`"[0, 3, 4]"`) and `result` the score of that design. The
//! iteration number comes from an `iteration` column, or an unnamed leading
//! index column, and falls back to the row position. An empty `result` is a
//! missing score and reads as NaN.
//!
//! Rule indices are kept as written, negative ones included. Whether an index
//! names a rule is decided per entry when the robot is built.

use crate::error::LoadError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One row of the search log.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub iteration: usize,
    pub rule_seq: Vec<i64>,
    pub result: f64,
}

/// Loads the whole log, in file order.
pub fn load_log(path: impl AsRef<Path>) -> Result<Vec<LogEntry>, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| LoadError::io(path, e))?;
    let entries = read_log(file)?;
    debug!(path = %path.display(), entries = entries.len(), "loaded search log");
    Ok(entries)
}

/// Parses a log from any reader.
pub fn read_log(reader: impl Read) -> Result<Vec<LogEntry>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::log(0, e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let rule_seq_col =
        column("rule_seq").ok_or_else(|| LoadError::log(0, "missing 'rule_seq' column"))?;
    let result_col =
        column("result").ok_or_else(|| LoadError::log(0, "missing 'result' column"))?;
    let iteration_col = column("iteration").or_else(|| {
        headers
            .get(0)
            .filter(|h| h.is_empty())
            .map(|_| 0)
    });

    let mut entries = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let line = row + 1;
        let record = record.map_err(|e| LoadError::log(line, e.to_string()))?;
        let field = |col: usize| {
            record
                .get(col)
                .ok_or_else(|| LoadError::log(line, format!("missing column {col}")))
        };

        let rule_seq = parse_rule_seq(field(rule_seq_col)?)
            .map_err(|message| LoadError::log(line, message))?;
        let result = parse_result(field(result_col)?)
            .map_err(|e| LoadError::log(line, format!("bad result: {e}")))?;
        let iteration = match iteration_col {
            Some(col) => field(col)?
                .parse::<usize>()
                .map_err(|e| LoadError::log(line, format!("bad iteration: {e}")))?,
            None => row,
        };

        entries.push(LogEntry {
            iteration,
            rule_seq,
            result,
        });
    }
    Ok(entries)
}

fn parse_result(text: &str) -> Result<f64, std::num::ParseFloatError> {
    if text.is_empty() {
        Ok(f64::NAN)
    } else {
        text.parse()
    }
}

/// Parses `"[1, 2, 3]"` (or the tuple form `"(1, 2, 3)"`) into rule indices.
pub fn parse_rule_seq(text: &str) -> Result<Vec<i64>, String> {
    let text = text.trim();
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .or_else(|| text.strip_prefix('(').and_then(|t| t.strip_suffix(')')))
        .ok_or_else(|| format!("rule_seq '{text}' is not a bracketed list"))?;
    let json = format!("[{}]", inner.trim().trim_end_matches(','));
    serde_json::from_str(&json).map_err(|e| format!("bad rule_seq '{text}': {e}"))
}
