//! Helpers for picking apart TLC state labels
//!
//! A label is a conjunction of `/\ name = value` lines, still escaped the way
//! the dot dump writes it. Values are TLA+ expressions: tuples `<<a, b>>`,
//! records `[f |-> v]`, sets `{..}` and bags `(m :> n @@ ..)`.

use pathgen_core::{ParseError, unescape_label};

/// The value of variable `name` in `state`, with all whitespace removed.
pub fn variable(state: &str, name: &str) -> Result<String, ParseError> {
    let state = unescape_label(state);
    for conjunct in state.split("/\\") {
        let Some(rest) = conjunct.trim_start().strip_prefix(name) else {
            continue;
        };
        let Some(value) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        return Ok(value.chars().filter(|c| !c.is_whitespace()).collect());
    }
    Err(ParseError::new(format!("state has no variable '{name}'")))
}

/// Split `s` on commas that are not nested inside `<<>>`, `[]`, `{}` or `()`.
pub fn split_top_level(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' if bytes.get(i + 1) == Some(&b'<') => {
                depth += 1;
                i += 1;
            }
            b'>' if bytes.get(i + 1) == Some(&b'>') => {
                depth -= 1;
                i += 1;
            }
            b'[' | b'{' | b'(' => depth += 1,
            b']' | b'}' | b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&s[start..]);
    parts
}

/// Elements of a compacted tuple `<<a,b,..>>`.
pub fn tuple_items(s: &str) -> Result<Vec<&str>, ParseError> {
    let inner = s
        .strip_prefix("<<")
        .and_then(|rest| rest.strip_suffix(">>"))
        .ok_or_else(|| ParseError::new(format!("expected a tuple, found '{s}'")))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(split_top_level(inner))
}

/// Contents of a compacted record `[..]` without the brackets.
pub fn record_body(s: &str) -> Result<&str, ParseError> {
    s.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| ParseError::new(format!("expected a record, found '{s}'")))
}

/// A tuple of tuples of records, e.g. per-node logs.
pub fn record_lists(s: &str) -> Result<Vec<Vec<String>>, ParseError> {
    tuple_items(s)?
        .into_iter()
        .map(|list| -> Result<Vec<String>, ParseError> {
            tuple_items(list)?
                .into_iter()
                .map(|r| record_body(r).map(str::to_string))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE: &str = r"/\\ log = <<<<[term |-> 1, value |-> 1]>>, <<>>>>\n/\\ term = 2\n/\\ termination = 0";

    #[test]
    fn test_variable_lookup() {
        assert_eq!(
            variable(STATE, "log").unwrap(),
            "<<<<[term|->1,value|->1]>>,<<>>>>"
        );
        // "term" must not match "termination"
        assert_eq!(variable(STATE, "term").unwrap(), "2");
        assert!(variable(STATE, "votes").is_err());
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("<<1,2>>,[a|-><<3,4>>,b|->{1,2}],x"),
            vec!["<<1,2>>", "[a|-><<3,4>>,b|->{1,2}]", "x"]
        );
    }

    #[test]
    fn test_record_lists() {
        let lists = record_lists("<<<<[a|->1],[a|->2]>>,<<>>>>").unwrap();
        assert_eq!(lists, vec![vec!["a|->1".to_string(), "a|->2".to_string()], vec![]]);
        assert!(tuple_items("[a|->1]").is_err());
    }
}
