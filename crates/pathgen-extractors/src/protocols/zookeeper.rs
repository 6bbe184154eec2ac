//! ZooKeeper (Zab) extractor
//!
//! `msgs` is an n x n matrix of FIFO channels, `msgs[i][j]` carrying messages
//! from server `i + 1` to server `j + 1`. Client traffic is not modelled in
//! `msgs`; it is recovered from `history` (requests) and `lastCommitted`
//! (responses).

use super::TransitionDiff;
use crate::state::{record_body, record_lists, tuple_items, variable};
use pathgen_core::{DiffExtractor, DiffRecord, ParseError};
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// Message kinds whose only payload is a zxid, with the field that carries it.
const ZXID_KINDS: &[(&str, &str)] = &[
    ("FI", "mzxid"),
    ("LI", "mzxid"),
    ("DF", "mzxid"),
    ("TC", "mtruncZxid"),
    ("CT", "mzxid"),
    ("NL", "mzxid"),
    ("AL", "mzxid"),
    ("AK", "mzxid"),
];

static ZXID_MESSAGES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    ZXID_KINDS
        .iter()
        .map(|(kind, field)| {
            let pattern = format!(r"^mtype\|->{kind},{field}\|-><<(\d+),(\d+)>>");
            (*kind, Regex::new(&pattern).expect("zxid message pattern compiles"))
        })
        .collect()
});

static ACK_EPOCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mtype\|->AE,mzxid\|-><<(\d+),(\d+)>>,mepoch\|->([-\d]+)")
        .expect("ACKEPOCH pattern compiles")
});

static PROPOSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mtype\|->PP,mzxid\|-><<(\d+),(\d+)>>,mdata\|->(\d+)")
        .expect("PROPOSAL pattern compiles")
});

static HISTORY_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^zxid\|-><<\d+,\d+>>,value\|->(\d+),ackSid\|->\{.*\},epoch\|->\d+")
        .expect("history entry pattern compiles")
});

static COMMITTED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^zxid\|-><<\d+,\d+>>,index\|->(\d+)").expect("lastCommitted pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZkMessage {
    pub mtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msource: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdest: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mzxid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mepoch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mreq_id: Option<u64>,
    pub count: i64,
}

impl ZkMessage {
    fn empty(mtype: &str, count: i64) -> Self {
        ZkMessage {
            mtype: mtype.to_string(),
            msource: None,
            mdest: None,
            mzxid: None,
            mepoch: None,
            mreq_id: None,
            count,
        }
    }

    pub fn tcp(src: u64, dst: u64, count: i64) -> Self {
        ZkMessage {
            msource: Some(src),
            mdest: Some(dst),
            ..Self::empty("TCP", count)
        }
    }

    pub fn client_request(req_id: u64, dst: u64, count: i64) -> Self {
        ZkMessage {
            mdest: Some(dst),
            mreq_id: Some(req_id),
            ..Self::empty("CREQ", count)
        }
    }

    pub fn client_response(req_id: u64, src: u64, count: i64) -> Self {
        ZkMessage {
            msource: Some(src),
            mreq_id: Some(req_id),
            ..Self::empty("CRESP", count)
        }
    }

    /// Parse a channel message body (the record without brackets).
    pub fn parse(message: &str, src: u64, dst: u64, count: i64) -> Result<Self, ParseError> {
        let mut res = ZkMessage {
            msource: Some(src),
            mdest: Some(dst),
            ..Self::empty("", count)
        };
        if let Some(caps) = ACK_EPOCH.captures(message) {
            res.mtype = "AE".to_string();
            res.mzxid = Some(zxid(&caps)?);
            res.mepoch = Some(
                caps[3]
                    .parse()
                    .map_err(|e| ParseError::new(format!("bad epoch '{}': {e}", &caps[3])))?,
            );
            return Ok(res);
        }
        if let Some(caps) = PROPOSAL.captures(message) {
            res.mtype = "PP".to_string();
            res.mzxid = Some(zxid(&caps)?);
            res.mreq_id = Some(number(&caps[3])?);
            return Ok(res);
        }
        for (kind, pattern) in ZXID_MESSAGES.iter() {
            if let Some(caps) = pattern.captures(message) {
                res.mtype = kind.to_string();
                res.mzxid = Some(zxid(&caps)?);
                return Ok(res);
            }
        }
        Err(ParseError::new(format!("unknown ZooKeeper message '{message}'")))
    }
}

fn number(text: &str) -> Result<u64, ParseError> {
    text.parse()
        .map_err(|e| ParseError::new(format!("bad number '{text}': {e}")))
}

/// `<<epoch, counter>>` packed as `epoch << 32 | counter`.
fn zxid(caps: &Captures<'_>) -> Result<u64, ParseError> {
    Ok((number(&caps[1])? << 32) | number(&caps[2])?)
}

/// Channel matrix: `channels[i][j]` holds message bodies from `i + 1` to `j + 1`.
pub type Channels = Vec<Vec<Vec<String>>>;

pub fn parse_channels(value: &str) -> Result<Channels, ParseError> {
    tuple_items(value)?
        .into_iter()
        .map(|row| -> Result<Vec<Vec<String>>, ParseError> {
            tuple_items(row)?
                .into_iter()
                .map(|channel| -> Result<Vec<String>, ParseError> {
                    tuple_items(channel)?
                        .into_iter()
                        .map(|m| record_body(m).map(str::to_string))
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Messages received (count -1) then sent (count +1) between two channel
/// matrices. A channel either grows at its tail or shrinks at its head.
pub fn channel_diff(prev: &Channels, cur: &Channels) -> Result<Vec<ZkMessage>, ParseError> {
    let mut received = Vec::new();
    let mut sent = Vec::new();
    for (i, (prev_row, row)) in prev.iter().zip(cur).enumerate() {
        for (j, (prev_chan, chan)) in prev_row.iter().zip(row).enumerate() {
            let (src, dst) = (i as u64 + 1, j as u64 + 1);
            if prev_chan.len() < chan.len() {
                let common = prev_chan
                    .iter()
                    .zip(chan)
                    .take_while(|(a, b)| a == b)
                    .count();
                for message in &chan[common..] {
                    sent.push(ZkMessage::parse(message, src, dst, 1)?);
                }
            } else if prev_chan.len() > chan.len() {
                let common = prev_chan
                    .iter()
                    .rev()
                    .zip(chan.iter().rev())
                    .take_while(|(a, b)| a == b)
                    .count();
                for message in &prev_chan[..prev_chan.len() - common] {
                    received.push(ZkMessage::parse(message, src, dst, -1)?);
                }
            } else if prev_chan != chan {
                return Err(ParseError::new(format!(
                    "channel {src}->{dst} changed without growing or shrinking: {prev_chan:?} -> {chan:?}"
                )));
            }
        }
    }
    received.extend(sent);
    Ok(received)
}

fn history_value(entry: &str) -> Result<u64, ParseError> {
    let caps = HISTORY_ENTRY
        .captures(entry)
        .ok_or_else(|| ParseError::new(format!("bad history entry '{entry}'")))?;
    number(&caps[1])
}

fn committed_indices(state: &str) -> Result<Vec<u64>, ParseError> {
    let value = variable(state, "lastCommitted")?;
    tuple_items(&value)?
        .into_iter()
        .map(|entry| {
            let body = record_body(entry)?;
            let caps = COMMITTED_ENTRY
                .captures(body)
                .ok_or_else(|| ParseError::new(format!("bad lastCommitted entry '{body}'")))?;
            number(&caps[1])
        })
        .collect()
}

pub struct ZkExtractor;

impl ZkExtractor {
    pub fn new() -> Self {
        ZkExtractor
    }

    /// The leader appended one proposal to its history.
    fn leader_process_request(
        &self,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<ZkMessage, ParseError> {
        let prev = record_lists(&variable(prev_state, "history")?)?;
        let cur = record_lists(&variable(cur_state, "history")?)?;
        let mut request = None;
        for (i, (prev_node, node)) in prev.iter().zip(&cur).enumerate() {
            if prev_node == node {
                continue;
            }
            if request.is_some() {
                return Err(ParseError::new("history changed on more than one server"));
            }
            if node.len() != prev_node.len() + 1 || !node.starts_with(prev_node) {
                return Err(ParseError::new(format!(
                    "history of server {} did not grow by one entry",
                    i + 1
                )));
            }
            let last = &node[node.len() - 1];
            request = Some(ZkMessage::client_request(history_value(last)?, i as u64 + 1, 1));
        }
        request.ok_or_else(|| ParseError::new("LeaderProcessRequest left history unchanged"))
    }

    /// A commit index moved by one, answering the client for that entry.
    fn leader_process_ack(
        &self,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Option<ZkMessage>, ParseError> {
        let prev = committed_indices(prev_state)?;
        let cur = committed_indices(cur_state)?;
        let mut committed = None;
        for (i, (prev_index, index)) in prev.iter().zip(&cur).enumerate() {
            if prev_index == index {
                continue;
            }
            if committed.is_some() {
                return Err(ParseError::new("lastCommitted moved on more than one server"));
            }
            if *index != prev_index + 1 {
                return Err(ParseError::new(format!(
                    "lastCommitted of server {} jumped from {prev_index} to {index}",
                    i + 1
                )));
            }
            committed = Some((i, *index));
        }
        let Some((node, index)) = committed else {
            return Ok(None);
        };

        let history = record_lists(&variable(cur_state, "history")?)?;
        let entry = history
            .get(node)
            .and_then(|h| (index as usize).checked_sub(1).and_then(|k| h.get(k)))
            .ok_or_else(|| {
                ParseError::new(format!(
                    "no history entry {index} on server {}",
                    node + 1
                ))
            })?;
        Ok(Some(ZkMessage::client_response(
            history_value(entry)?,
            node as u64 + 1,
            -1,
        )))
    }
}

impl Default for ZkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffExtractor for ZkExtractor {
    fn extract(
        &self,
        action: &str,
        prev_state: &str,
        cur_state: &str,
    ) -> Result<Vec<DiffRecord>, ParseError> {
        let diff = match action {
            "LeaderProcessRequest" => vec![self.leader_process_request(prev_state, cur_state)?],
            "LeaderProcessACK" => self
                .leader_process_ack(prev_state, cur_state)?
                .into_iter()
                .collect(),
            _ => {
                let prev = parse_channels(&variable(prev_state, "msgs")?)?;
                let cur = parse_channels(&variable(cur_state, "msgs")?)?;
                let diff = channel_diff(&prev, &cur)?;
                if action == "ConnectAndFollowerSendFOLLOWERINFO" {
                    follower_connect(diff)?
                } else {
                    diff
                }
            }
        };
        tracing::trace!("{}: {} message changes", action, diff.len());
        TransitionDiff::new(action, diff).into_records()
    }
}

/// The connection handshake precedes the FOLLOWERINFO it carries.
fn follower_connect(diff: Vec<ZkMessage>) -> Result<Vec<ZkMessage>, ParseError> {
    let [info] = diff.as_slice() else {
        return Err(ParseError::new(format!(
            "expected a single FOLLOWERINFO, found {} messages",
            diff.len()
        )));
    };
    if info.mtype != "FI" || info.count != 1 {
        return Err(ParseError::new(format!(
            "expected a sent FOLLOWERINFO, found {} with count {}",
            info.mtype, info.count
        )));
    }
    let (Some(src), Some(dst)) = (info.msource, info.mdest) else {
        return Err(ParseError::new("FOLLOWERINFO without endpoints"));
    };
    let mut res = vec![
        ZkMessage::tcp(src, dst, 1),
        ZkMessage::tcp(src, dst, -1),
        ZkMessage::tcp(dst, src, 1),
        ZkMessage::tcp(dst, src, -1),
    ];
    res.extend(diff);
    Ok(res)
}
