//! Reading a written corpus back for inspection

use crate::error::{PathgenError, Result};
use crate::model::StateId;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Decode the backslash escapes the model checker writes inside labels.
/// Unknown escapes are kept verbatim.
pub fn unescape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut chars = label.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// The `<prefix>.node` table: state id to raw (escaped) label.
#[derive(Debug, Default, Clone)]
pub struct NodeTable {
    labels: HashMap<StateId, String>,
}

impl NodeTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PathgenError::io(path, e))?;
        let mut labels = HashMap::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| PathgenError::io(path, e))?;
            if line.is_empty() {
                continue;
            }
            let (id, label) = line.split_once(' ').unwrap_or((line.as_str(), ""));
            let id = id.parse::<i64>().map_err(|e| PathgenError::Format {
                line: i + 1,
                message: format!("bad state id '{id}' in {}: {e}", path.display()),
            })?;
            labels.insert(StateId(id), label.to_string());
        }
        Ok(NodeTable { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, id: StateId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }
}

/// Line `line_no` (1-based) of a corpus file, without its newline.
pub fn read_path_line(path: &Path, line_no: usize) -> Result<Option<String>> {
    if line_no == 0 {
        return Ok(None);
    }
    let file = File::open(path).map_err(|e| PathgenError::io(path, e))?;
    match BufReader::new(file).lines().nth(line_no - 1) {
        Some(line) => Ok(Some(line.map_err(|e| PathgenError::io(path, e))?)),
        None => Ok(None),
    }
}

/// Render one edge-file line with every state expanded to its label.
///
/// Tokens alternate `state action state action ... state`.
pub fn render_path(line_no: usize, line: &str, table: &NodeTable) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "========================= {line_no} =========================");
    for (i, token) in line.split_whitespace().enumerate() {
        if i % 2 == 1 {
            let _ = writeln!(out, "{token}");
            continue;
        }
        let id = token
            .parse::<i64>()
            .map(StateId)
            .map_err(|e| PathgenError::Format {
                line: line_no,
                message: format!("expected a state id, found '{token}': {e}"),
            })?;
        let label = table
            .label(id)
            .ok_or_else(|| PathgenError::state_not_found(id))?;
        let _ = writeln!(out, "{id}");
        for label_line in unescape_label(label).split('\n') {
            let _ = writeln!(out, "\t{label_line}");
        }
    }
    Ok(out)
}
