//! Frame envelope codec.
//!
//! Every message the cabinet broadcasts is wrapped in the envelope
//! `![k[KEY],v[VALUE]]!`. This module recognizes the envelope and splits it
//! into a key and a raw value; interpreting the value is the parser table's
//! job (see [`crate::events`]).

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Wire key of the liveness probe sent by the cabinet.
pub const KEEPALIVE_KEY: &str = "alive";

/// Wire key of the reply the client must send back.
pub const KEEPALIVE_REPLY_KEY: &str = "im alive";

// KEY is matched non-greedily, so the first `],v[` sequence terminates it;
// VALUE runs to the closing `]]!` at end of line.
static ENVELOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!\[k\[(.*?)\],v\[(.*)\]\]!$").expect("envelope pattern is valid")
});

/// One decoded `(key, raw value)` unit.
///
/// Borrows from the input line and exists only for the duration of a single
/// decode step; parsed payloads are what get handed to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub key: &'a str,
    pub raw_value: &'a str,
}

/// Line does not match the envelope grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line does not match the `![k[..],v[..]]!` envelope")]
pub struct MalformedFrame;

/// Decodes one line of cabinet traffic into a [`Frame`].
pub fn decode(line: &str) -> Result<Frame<'_>, MalformedFrame> {
    let captures = ENVELOPE.captures(line).ok_or(MalformedFrame)?;
    Ok(Frame {
        key: captures.get(1).map_or("", |m| m.as_str()),
        raw_value: captures.get(2).map_or("", |m| m.as_str()),
    })
}

/// Wraps a key and value in the wire envelope.
pub fn encode(key: &str, value: &str) -> String {
    format!("![k[{key}],v[{value}]]!")
}

/// The `![k[im alive],v[]]!` frame answering a keepalive probe.
pub fn keepalive_reply() -> String {
    encode(KEEPALIVE_REPLY_KEY, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_splits_key_and_value() {
        let frame = decode("![k[playerKill],v[12,34,2,1]]!").unwrap();
        assert_eq!(frame.key, "playerKill");
        assert_eq!(frame.raw_value, "12,34,2,1");
    }

    #[test]
    fn decode_allows_empty_value() {
        let frame = decode("![k[alive],v[]]!").unwrap();
        assert_eq!(frame.key, KEEPALIVE_KEY);
        assert_eq!(frame.raw_value, "");
    }

    #[test]
    fn decode_key_stops_at_first_value_marker() {
        // A value containing `],v[` must not extend the key.
        let frame = decode("![k[a],v[b],v[c]]!").unwrap();
        assert_eq!(frame.key, "a");
        assert_eq!(frame.raw_value, "b],v[c");
    }

    #[test]
    fn decode_rejects_lines_outside_the_grammar() {
        for line in [
            "",
            "playerKill",
            "![k[playerKill]]!",
            "![k[a],v[b]]",
            "noise ![k[a],v[b]]!",
            "![k[a],v[b]]! noise",
        ] {
            assert_eq!(decode(line), Err(MalformedFrame), "line: {line:?}");
        }
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let line = encode("currentmatch", r#"{"id":"1"}"#);
        let frame = decode(&line).unwrap();
        assert_eq!(frame.key, "currentmatch");
        assert_eq!(frame.raw_value, r#"{"id":"1"}"#);
    }

    #[test]
    fn keepalive_reply_is_the_exact_handshake_frame() {
        assert_eq!(keepalive_reply(), "![k[im alive],v[]]!");
    }
}
