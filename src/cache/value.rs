//! Reply Conversion Module
//!
//! Converts raw store replies into the types exposed by the typed getters.

use redis::Value;

// == From Reply ==
/// A type a raw GET reply can be converted into.
///
/// `Value::Nil` always converts to `Ok(None)`; the error string is the reason
/// the reply could not be converted.
pub trait FromReply: Sized {
    /// Type name used in conversion errors
    const TARGET: &'static str;

    fn from_reply(value: Value) -> Result<Option<Self>, String>;
}

impl FromReply for String {
    const TARGET: &'static str = "string";

    fn from_reply(value: Value) -> Result<Option<Self>, String> {
        match value {
            Value::Nil => Ok(None),
            Value::BulkString(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| format!("value is not valid UTF-8: {}", e)),
            Value::SimpleString(s) => Ok(Some(s)),
            Value::Okay => Ok(Some("OK".to_string())),
            other => Err(unexpected(&other)),
        }
    }
}

impl FromReply for Vec<u8> {
    const TARGET: &'static str = "bytes";

    fn from_reply(value: Value) -> Result<Option<Self>, String> {
        match value {
            Value::Nil => Ok(None),
            Value::BulkString(bytes) => Ok(Some(bytes)),
            Value::SimpleString(s) => Ok(Some(s.into_bytes())),
            Value::Okay => Ok(Some(b"OK".to_vec())),
            other => Err(unexpected(&other)),
        }
    }
}

impl FromReply for i64 {
    const TARGET: &'static str = "int";

    fn from_reply(value: Value) -> Result<Option<Self>, String> {
        match value {
            Value::Nil => Ok(None),
            Value::Int(n) => Ok(Some(n)),
            Value::BulkString(bytes) => parse_int(&bytes).map(Some),
            Value::SimpleString(s) => parse_int(s.as_bytes()).map(Some),
            other => Err(unexpected(&other)),
        }
    }
}

impl FromReply for bool {
    const TARGET: &'static str = "bool";

    fn from_reply(value: Value) -> Result<Option<Self>, String> {
        match value {
            Value::Nil => Ok(None),
            Value::Boolean(b) => Ok(Some(b)),
            Value::Int(n) => Ok(Some(n != 0)),
            Value::BulkString(bytes) => parse_bool(&bytes).map(Some),
            Value::SimpleString(s) => parse_bool(s.as_bytes()).map(Some),
            other => Err(unexpected(&other)),
        }
    }
}

fn parse_int(bytes: &[u8]) -> Result<i64, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("value is not valid UTF-8: {}", e))?;
    text.parse::<i64>()
        .map_err(|e| format!("'{}' is not a base-10 integer: {}", text, e))
}

// Accepts the same spellings as strconv-style boolean parsing.
fn parse_bool(bytes: &[u8]) -> Result<bool, String> {
    match bytes {
        b"1" | b"t" | b"T" | b"TRUE" | b"true" | b"True" => Ok(true),
        b"0" | b"f" | b"F" | b"FALSE" | b"false" | b"False" => Ok(false),
        other => Err(format!(
            "'{}' is not a boolean",
            String::from_utf8_lossy(other)
        )),
    }
}

fn unexpected(value: &Value) -> String {
    format!("unexpected reply {:?}", value)
}
