//! Unit tests for pathgen-extractors module

use crate::protocols::raft::{RaftExtractor, bag_diff, parse_bag};
use crate::protocols::zookeeper::{ZkExtractor, channel_diff, parse_channels};
use crate::{available, get_extractor};
use pathgen_core::{DiffExtractor, DiffRecord};
use serde_json::{Value, json};

/// Build a label the way the dot dump escapes it: `/\\ name = value\n...`.
fn state(vars: &[(&str, &str)]) -> String {
    vars.iter()
        .map(|(name, value)| format!("/\\\\ {name} = {value}"))
        .collect::<Vec<_>>()
        .join("\\n")
}

fn single(records: Vec<DiffRecord>) -> Value {
    assert_eq!(records.len(), 1, "one record per transition");
    records[0].as_value().clone()
}

const AE_REQUEST: &str = "[mtype |-> AppendEntriesRequest, mterm |-> 1, msource |-> 1, mdest |-> 2, \
     mprevLogIndex |-> 0, mprevLogTerm |-> 0, mentries |-> <<[term |-> 1, value |-> 1]>>, \
     mlog |-> <<>>, mcommitIndex |-> 0]";

const RV_REQUEST: &str = "[mtype |-> RequestVoteRequest, mterm |-> 2, mlastLogTerm |-> 1, \
     mlastLogIndex |-> 1, msource |-> 1, mdest |-> 3]";

#[test]
fn test_registry() {
    for name in available() {
        assert!(get_extractor(name).is_some(), "no extractor for {}", name);
    }
    assert!(get_extractor("zk").is_some());
    assert!(get_extractor("paxos").is_none());
}

#[test]
fn test_action_extractor_ignores_states() {
    let extractor = get_extractor("action").unwrap();
    let records = extractor.extract("Next", "not a state", "").unwrap();
    let json = serde_json::to_string(&records).unwrap();
    insta::assert_snapshot!(json, @r#"[{"action":"Next","diff":[]}]"#);
}

#[test]
fn test_raft_message_sent() {
    let prev = state(&[("messages", "<<>>"), ("term", "1")]);
    let cur = state(&[("messages", &format!("({AE_REQUEST} :> 1)")), ("term", "1")]);

    let record = single(RaftExtractor::new().extract("AppendEntries", &prev, &cur).unwrap());
    assert_eq!(
        record,
        json!({
            "action": "AppendEntries",
            "diff": [{
                "mtype": "AppendEntriesRequest",
                "mterm": 1,
                "mindex": 0,
                "mindex_term": 0,
                "mentries": {"term": 1, "value": 1},
                "mcommit_index": 0,
                "msource": 1,
                "mdest": 2,
                "count": 1
            }]
        })
    );
}

#[test]
fn test_raft_message_consumed() {
    let prev = state(&[("messages", &format!("({RV_REQUEST} :> 1)"))]);
    let cur = state(&[("messages", "<<>>")]);

    let record = single(RaftExtractor::new().extract("HandleRequestVoteRequest", &prev, &cur).unwrap());
    assert_eq!(
        record["diff"],
        json!([{
            "mtype": "RequestVoteRequest",
            "mterm": 2,
            "mindex": 1,
            "mindex_term": 1,
            "msource": 1,
            "mdest": 3,
            "count": -1
        }])
    );
}

#[test]
fn test_raft_custom_bag_variable() {
    let prev = state(&[("net", "<<>>")]);
    let cur = state(&[("net", &format!("({RV_REQUEST} :> 2)"))]);

    let record = single(
        RaftExtractor::with_messages_var("net")
            .extract("RequestVote", &prev, &cur)
            .unwrap(),
    );
    assert_eq!(record["diff"][0]["count"], json!(2));
    assert!(RaftExtractor::new().extract("RequestVote", &prev, &cur).is_err());
}

#[test]
fn test_raft_bag_diff() {
    let prev = parse_bag("(m1:>1@@m2:>2)").unwrap();
    let cur = parse_bag("(m2:>1@@m3:>1)").unwrap();
    let diff = bag_diff(&prev, &cur).unwrap();
    assert_eq!(
        diff,
        vec![
            ("m2".to_string(), -1),
            ("m3".to_string(), 1),
            ("m1".to_string(), -1),
        ]
    );

    // Two copies cannot vanish in one step
    let prev = parse_bag("(m1:>2)").unwrap();
    assert!(bag_diff(&prev, &Vec::new()).is_err());

    assert!(parse_bag("m1:>1").is_err());
    assert!(parse_bag("(m1:>x)").is_err());
}

#[test]
fn test_raft_unknown_message() {
    let prev = state(&[("messages", "<<>>")]);
    let cur = state(&[("messages", "([mtype |-> Heartbeat, msource |-> 1] :> 1)")]);
    let err = RaftExtractor::new().extract("Tick", &prev, &cur).unwrap_err();
    assert!(err.message().contains("Heartbeat"));
}

#[test]
fn test_raft_client_request() {
    let prev = state(&[
        ("messages", "<<>>"),
        ("log", "<<<<[term |-> 1, value |-> 1]>>, <<>>, <<>>>>"),
    ]);
    let cur = state(&[
        ("messages", "<<>>"),
        ("log", "<<<<[term |-> 1, value |-> 1], [term |-> 2, value |-> 5]>>, <<>>, <<>>>>"),
    ]);

    let record = single(RaftExtractor::new().extract("ClientRequest", &prev, &cur).unwrap());
    assert_eq!(
        record["diff"],
        json!([{
            "mtype": "ClientRequest",
            "mentries": {"term": 2, "value": 5},
            "mdest": 0,
            "count": 1
        }])
    );
}

#[test]
fn test_raft_client_request_rejects_ambiguous_logs() {
    let prev = state(&[("log", "<<<<>>, <<>>>>")]);
    let both = state(&[(
        "log",
        "<<<<[term |-> 1, value |-> 1]>>, <<[term |-> 1, value |-> 1]>>>>",
    )]);
    assert!(RaftExtractor::new().extract("ClientRequest", &prev, &both).is_err());
    assert!(RaftExtractor::new().extract("ClientRequest", &prev, &prev).is_err());
}

const FI: &str = "[mtype |-> FI, mzxid |-> <<0, 0>>]";
const AE: &str = "[mtype |-> AE, mzxid |-> <<1, 2>>, mepoch |-> 3]";
const PP: &str = "[mtype |-> PP, mzxid |-> <<1, 1>>, mdata |-> 9]";

fn msgs(c12: &str, c21: &str) -> String {
    format!("<< << <<>>, <<{c12}>> >>, << <<{c21}>>, <<>> >> >>")
}

#[test]
fn test_zk_follower_connect_prepends_handshake() {
    let prev = state(&[("msgs", &msgs("", ""))]);
    let cur = state(&[("msgs", &msgs("", FI))]);

    let record = single(
        ZkExtractor::new()
            .extract("ConnectAndFollowerSendFOLLOWERINFO", &prev, &cur)
            .unwrap(),
    );
    assert_eq!(
        record["diff"],
        json!([
            {"mtype": "TCP", "msource": 2, "mdest": 1, "count": 1},
            {"mtype": "TCP", "msource": 2, "mdest": 1, "count": -1},
            {"mtype": "TCP", "msource": 1, "mdest": 2, "count": 1},
            {"mtype": "TCP", "msource": 1, "mdest": 2, "count": -1},
            {"mtype": "FI", "msource": 2, "mdest": 1, "mzxid": 0, "count": 1}
        ])
    );

    // Anything but a lone FOLLOWERINFO is rejected
    let two = state(&[("msgs", &msgs(FI, FI))]);
    assert!(
        ZkExtractor::new()
            .extract("ConnectAndFollowerSendFOLLOWERINFO", &prev, &two)
            .is_err()
    );
}

#[test]
fn test_zk_receive_before_send() {
    let prev = state(&[("msgs", &msgs("", &format!("{AE}, {FI}")))]);
    let cur = state(&[("msgs", &msgs(PP, FI))]);

    let record = single(ZkExtractor::new().extract("FollowerProcessNEWEPOCH", &prev, &cur).unwrap());
    assert_eq!(
        record["diff"],
        json!([
            {"mtype": "AE", "msource": 2, "mdest": 1, "mzxid": 4294967298u64, "mepoch": 3, "count": -1},
            {"mtype": "PP", "msource": 1, "mdest": 2, "mzxid": 4294967297u64, "mreq_id": 9, "count": 1}
        ])
    );
}

#[test]
fn test_zk_channel_diff_common_prefix_and_suffix() {
    let prev = parse_channels("<<<<<<[mtype|->CT,mzxid|-><<1,1>>]>>>>>>").unwrap();
    let cur = parse_channels(
        "<<<<<<[mtype|->CT,mzxid|-><<1,1>>],[mtype|->CT,mzxid|-><<1,2>>],[mtype|->AK,mzxid|-><<1,2>>]>>>>>>",
    )
    .unwrap();

    let sent = channel_diff(&prev, &cur).unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].mtype, "CT");
    assert_eq!(sent[0].mzxid, Some((1 << 32) | 2));
    assert_eq!(sent[1].mtype, "AK");

    // Receiving drains the head of the channel
    let drained = parse_channels("<<<<<<[mtype|->AK,mzxid|-><<1,2>>]>>>>>>").unwrap();
    let received = channel_diff(&cur, &drained).unwrap();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|m| m.count == -1));
    assert_eq!(received[0].mzxid, Some((1 << 32) | 1));

    // Same length but different contents cannot be explained
    let other = parse_channels("<<<<<<[mtype|->NL,mzxid|-><<1,1>>]>>>>>>").unwrap();
    assert!(channel_diff(&prev, &other).is_err());
}

const ENTRY_7: &str = "[zxid |-> <<1, 1>>, value |-> 7, ackSid |-> {1}, epoch |-> 1]";

fn committed(first: u64, second: u64) -> String {
    format!(
        "<<[zxid |-> <<0, 0>>, index |-> {first}], [zxid |-> <<0, 0>>, index |-> {second}]>>"
    )
}

#[test]
fn test_zk_leader_process_request() {
    let prev = state(&[("history", "<< <<>>, <<>> >>"), ("msgs", &msgs("", ""))]);
    let cur = state(&[
        ("history", &format!("<< <<{ENTRY_7}>>, <<>> >>")),
        ("msgs", &msgs("", "")),
    ]);

    let record = single(ZkExtractor::new().extract("LeaderProcessRequest", &prev, &cur).unwrap());
    assert_eq!(
        record["diff"],
        json!([{"mtype": "CREQ", "mdest": 1, "mreq_id": 7, "count": 1}])
    );

    assert!(ZkExtractor::new().extract("LeaderProcessRequest", &prev, &prev).is_err());
}

#[test]
fn test_zk_leader_process_ack() {
    let history = format!("<< <<{ENTRY_7}>>, <<>> >>");
    let prev = state(&[("history", &history), ("lastCommitted", &committed(0, 0))]);
    let cur = state(&[("history", &history), ("lastCommitted", &committed(1, 0))]);

    let record = single(ZkExtractor::new().extract("LeaderProcessACK", &prev, &cur).unwrap());
    assert_eq!(
        record["diff"],
        json!([{"mtype": "CRESP", "msource": 1, "mreq_id": 7, "count": -1}])
    );

    // No commit moved: still one record, empty diff
    let record = single(ZkExtractor::new().extract("LeaderProcessACK", &prev, &prev).unwrap());
    assert_eq!(record["diff"], json!([]));

    let jumped = state(&[("history", &history), ("lastCommitted", &committed(2, 0))]);
    assert!(ZkExtractor::new().extract("LeaderProcessACK", &prev, &jumped).is_err());
}

#[test]
fn test_zk_missing_variable() {
    let err = ZkExtractor::new()
        .extract("Timeout", &state(&[("state", "<<>>")]), &state(&[("state", "<<>>")]))
        .unwrap_err();
    assert!(err.message().contains("msgs"));
}
