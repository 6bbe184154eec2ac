//! Integration tests for Pathgen
//!
//! These tests run the built binary end to end against small dot dumps.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SAMPLE_DOT: &str = r#"strict digraph DiskGraph {
0 [label="/\\ x = 0\n/\\ y = \"a\"",style = filled]
0 -> 1 [label="a",color="black",fontcolor="black"];
1 [label="/\\ x = 1\n/\\ y = \"a\""];
1 -> 2 [label="b",color="black",fontcolor="black"];
2 [label="/\\ x = 2\n/\\ y = \"b\""];
0 -> 3 [label="c",color="black",fontcolor="black"];
3 [label="/\\ x = 3\n/\\ y = \"b\""];
{rank = same; 0;}
}
"#;

fn pathgen(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pathgen"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("Failed to execute pathgen")
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("graph.dot");
    fs::write(&input, SAMPLE_DOT).unwrap();
    (dir, input)
}

fn generate(dir: &TempDir, input: &Path, step_limit: &str) -> Output {
    let prefix = dir.path().join("out");
    pathgen(
        &[
            "generate",
            input.to_str().unwrap(),
            prefix.to_str().unwrap(),
            step_limit,
            "--no-progress",
        ],
        dir.path(),
    )
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

#[test]
fn test_cli_invocation() {
    let dir = TempDir::new().unwrap();
    let output = pathgen(&["--help"], dir.path());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Enumerate bounded execution paths"));
}

#[test]
fn test_generate_full_paths() {
    let (dir, input) = setup();
    let output = generate(&dir, &input, "5");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(read(&dir, "out.edge"), "0 a 1 b 2\n0 c 3\n");
    assert_eq!(
        read(&dir, "out.message"),
        "[{\"action\":\"a\",\"diff\":[]},{\"action\":\"b\",\"diff\":[]}]\n[{\"action\":\"c\",\"diff\":[]}]\n"
    );

    let nodes = read(&dir, "out.node");
    assert_eq!(nodes.lines().count(), 4);
    assert!(nodes.starts_with("0 /\\\\ x = 0\\n/\\\\ y = \\\"a\\\"\n"));
}

#[test]
fn test_generate_truncated_paths() {
    let (dir, input) = setup();
    let output = generate(&dir, &input, "1");
    assert!(output.status.success());

    assert_eq!(read(&dir, "out.edge"), "0 a 1\n0 c 3\n");
    assert_eq!(read(&dir, "out.message").lines().count(), 2);
}

#[test]
fn test_wrong_argument_count() {
    let (dir, input) = setup();
    let output = pathgen(&["generate", input.to_str().unwrap(), "out"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "{}", stderr);
    assert!(!dir.path().join("out.edge").exists());
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let output = pathgen(&["generate", "missing.dot", "out", "3"], dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.dot"));
}

#[test]
fn test_unknown_protocol() {
    let (dir, input) = setup();
    let prefix = dir.path().join("out");
    let output = pathgen(
        &[
            "generate",
            input.to_str().unwrap(),
            prefix.to_str().unwrap(),
            "3",
            "--protocol",
            "paxos",
        ],
        dir.path(),
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("available: action, raft, zookeeper"));
}

#[test]
fn test_protocol_from_config_file() {
    let (dir, input) = setup();
    fs::write(dir.path().join("pathgen.toml"), "protocol = \"paxos\"\nprogress = false\n").unwrap();

    let output = generate(&dir, &input, "3");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("paxos"));

    let output = pathgen(&["-c", "missing.toml", "version"], dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_show_renders_labels() {
    let (dir, input) = setup();
    assert!(generate(&dir, &input, "5").status.success());

    let output = pathgen(&["show", "out", "2"], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "========================= 2 =========================\n\
         0\n\
         \t/\\ x = 0\n\
         \t/\\ y = \"a\"\n\
         c\n\
         3\n\
         \t/\\ x = 3\n\
         \t/\\ y = \"b\"\n"
    );

    let output = pathgen(&["show", "out", "3"], dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_stats() {
    let (dir, input) = setup();
    let output = pathgen(&["stats", input.to_str().unwrap()], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("     states: 4"));
    assert!(stdout.contains("transitions: 3"));
    assert!(stdout.contains("     leaves: 2"));
    assert!(stdout.contains("   estimate: 2"));
}
