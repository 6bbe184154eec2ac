//! Raft extractor
//!
//! Network traffic lives in a bag variable (`messages`), so a transition's
//! diff is the change in per-message counts. `ClientRequest` only touches the
//! `log` variable and is reported as a synthetic `ClientRequest` message.

use super::TransitionDiff;
use crate::state::{tuple_items, variable};
use pathgen_core::{DiffExtractor, DiffRecord, ParseError};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[term\|->(\d+),value\|->(\d+)\]").expect("entry pattern compiles")
});

static APPEND_ENTRIES_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\[mtype\|->AppendEntriesRequest,mterm\|->(\d+),msource\|->(\d+),mdest\|->(\d+),",
        r"mprevLogIndex\|->(\d+),mprevLogTerm\|->(\d+),mentries\|-><<(.*)>>,mlog\|-><<.*>>,",
        r"mcommitIndex\|->(\d+)\]"
    ))
    .expect("AppendEntriesRequest pattern compiles")
});

static REQUEST_VOTE_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\[mtype\|->RequestVoteRequest,mterm\|->(\d+),mlastLogTerm\|->(\d+),",
        r"mlastLogIndex\|->(\d+),msource\|->(\d+),mdest\|->(\d+)\]"
    ))
    .expect("RequestVoteRequest pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaftEntry {
    pub term: u64,
    pub value: u64,
}

impl RaftEntry {
    /// Parse `[term|->T,value|->V]`. Empty input means no entry.
    pub fn parse(entry: &str) -> Result<Option<RaftEntry>, ParseError> {
        if entry.is_empty() {
            return Ok(None);
        }
        let caps = ENTRY
            .captures(entry)
            .ok_or_else(|| ParseError::new(format!("bad log entry '{entry}'")))?;
        Ok(Some(RaftEntry {
            term: number(&caps[1])?,
            value: number(&caps[2])?,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaftMessage {
    pub mtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mterm: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindex: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindex_term: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentries: Option<RaftEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcommit_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msource: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdest: Option<u64>,
    /// +n sent, -n consumed.
    pub count: i64,
}

impl RaftMessage {
    fn empty(mtype: &str, count: i64) -> Self {
        RaftMessage {
            mtype: mtype.to_string(),
            mterm: None,
            mindex: None,
            mindex_term: None,
            mentries: None,
            mcommit_index: None,
            msource: None,
            mdest: None,
            count,
        }
    }

    /// Parse one compacted message record.
    pub fn parse(message: &str, count: i64) -> Result<Self, ParseError> {
        if let Some(caps) = APPEND_ENTRIES_REQUEST.captures(message) {
            let mut res = Self::empty("AppendEntriesRequest", count);
            res.mterm = Some(number(&caps[1])?);
            res.msource = Some(number(&caps[2])?);
            res.mdest = Some(number(&caps[3])?);
            res.mindex = Some(number(&caps[4])?);
            res.mindex_term = Some(number(&caps[5])?);
            res.mentries = RaftEntry::parse(&caps[6])?;
            res.mcommit_index = Some(number(&caps[7])?);
            return Ok(res);
        }
        if let Some(caps) = REQUEST_VOTE_REQUEST.captures(message) {
            let mut res = Self::empty("RequestVoteRequest", count);
            res.mterm = Some(number(&caps[1])?);
            res.mindex_term = Some(number(&caps[2])?);
            res.mindex = Some(number(&caps[3])?);
            res.msource = Some(number(&caps[4])?);
            res.mdest = Some(number(&caps[5])?);
            return Ok(res);
        }
        Err(ParseError::new(format!("unsupported Raft message '{message}'")))
    }
}

fn number(text: &str) -> Result<u64, ParseError> {
    text.parse()
        .map_err(|e| ParseError::new(format!("bad number '{text}': {e}")))
}

/// A message bag as `(message, count)` pairs in the order written.
pub type MessageBag = Vec<(String, i64)>;

/// Parse a compacted bag value: `<<>>` or `(m1:>c1@@m2:>c2)`.
pub fn parse_bag(value: &str) -> Result<MessageBag, ParseError> {
    if value == "<<>>" {
        return Ok(Vec::new());
    }
    let inner = value
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| ParseError::new(format!("bad message bag '{value}'")))?;
    inner
        .split("@@")
        .map(|pair| {
            let (message, count) = pair
                .rsplit_once(":>")
                .ok_or_else(|| ParseError::new(format!("bad bag element '{pair}'")))?;
            let count = count
                .parse::<i64>()
                .map_err(|e| ParseError::new(format!("bad bag count '{count}': {e}")))?;
            Ok((message.to_string(), count))
        })
        .collect()
}

/// Count changes from `prev` to `cur`. Entries of `cur` come first, in order,
/// followed by messages that disappeared.
pub fn bag_diff(prev: &MessageBag, cur: &MessageBag) -> Result<MessageBag, ParseError> {
    let mut diff = cur.clone();
    for (message, prev_count) in prev {
        match diff.iter().position(|(m, _)| m == message) {
            Some(pos) => {
                diff[pos].1 -= prev_count;
                if diff[pos].1 == 0 {
                    diff.remove(pos);
                }
            }
            None if *prev_count == 1 => diff.push((message.clone(), -1)),
            None => {
                return Err(ParseError::new(format!(
                    "message {message} vanished with count {prev_count}; a message is consumed at most once"
                )));
            }
        }
    }
    Ok(diff)
}

pub struct RaftExtractor {
    messages_var: String,
}

impl RaftExtractor {
    pub fn new() -> Self {
        Self::with_messages_var("messages")
    }

    /// Use a different name for the network bag variable.
    pub fn with_messages_var(name: impl Into<String>) -> Self {
        RaftExtractor {
            messages_var: name.into(),
        }
    }

    fn client_request(&self, prev_state: &str, cur_state: &str) -> Result<RaftMessage, ParseError> {
        let prev_log = variable(prev_state, "log")?;
        let cur_log = variable(cur_state, "log")?;
        let prev_logs = tuple_items(&prev_log)?;
        let cur_logs = tuple_items(&cur_log)?;

        let changed: Vec<(usize, &str, &str)> = prev_logs
            .iter()
            .zip(&cur_logs)
            .enumerate()
            .filter(|(_, (p, c))| p != c)
            .map(|(i, (p, c))| (i, *p, *c))
            .collect();
        let [(node, prev, cur)] = changed.as_slice() else {
            return Err(ParseError::new(format!(
                "expected exactly one changed log, found {}: {prev_log} -> {cur_log}",
                changed.len()
            )));
        };

        let prev = prev.trim_matches(['<', '>']);
        let cur = cur.trim_matches(['<', '>']);
        let appended = cur
            .strip_prefix(prev)
            .ok_or_else(|| ParseError::new(format!("log {cur} does not extend {prev}")))?
            .trim_matches(',');
        if !appended.starts_with('[') || !appended.ends_with(']') {
            return Err(ParseError::new(format!("bad appended entry '{appended}'")));
        }

        let mut message = RaftMessage::empty("ClientRequest", 1);
        message.mentries = RaftEntry::parse(appended)?;
        // Position in the log tuple, counted from zero.
        message.mdest = Some(*node as u64);
        Ok(message)
    }
}

impl Default for RaftExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffExtractor for RaftExtractor {
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        let diff = if action == "ClientRequest" {
            vec![self.client_request(prev_state, cur_state)?]
        } else {
            let prev = parse_bag(&variable(prev_state, &self.messages_var)?)?;
            let cur = parse_bag(&variable(cur_state, &self.messages_var)?)?;
            bag_diff(&prev, &cur)?
                .iter()
                .map(|(message, count)| RaftMessage::parse(message, *count))
                .collect::<Result<Vec<_>, _>>()?
        };
        tracing::trace!("{}: {} message changes", action, diff.len());
        TransitionDiff::new(action, diff).into_records()
    }
}
