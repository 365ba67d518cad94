//! Lenient decoding of upstream hot-list items.
//!
//! Upstream platforms disagree on types: `hot` arrives as an integer, a
//! float, a numeric string or not at all, and `timestamp` may be seconds,
//! milliseconds or an RFC 3339 string. Values that cannot be read are
//! dropped rather than failing the item.

use chrono::DateTime;
use hotspot_core::RawTopic;
use serde_json::Value;

/// Epoch values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Decodes one item of a platform's `data` array. Items without a non-blank
/// string title yield `None`.
pub(crate) fn raw_topic(item: &Value) -> Option<RawTopic> {
    let title = non_blank(item.get("title"))?;
    Some(RawTopic {
        title,
        url: non_blank(item.get("url")),
        mobile_url: non_blank(item.get("mobileUrl")),
        cover: non_blank(item.get("cover")),
        description: non_blank(item.get("desc")).or_else(|| non_blank(item.get("description"))),
        hot: item.get("hot").and_then(parse_hot),
        timestamp: item.get("timestamp").and_then(parse_timestamp),
    })
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_i64(value: f64) -> Option<i64> {
    // `as` saturates, so only non-finite input needs rejecting.
    value.is_finite().then(|| value.floor() as i64)
}

pub(crate) fn parse_hot(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let s = s.trim().replace(',', "");
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    }
}

pub(crate) fn parse_timestamp(value: &Value) -> Option<i64> {
    let epoch = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.timestamp()),
            }
        }
        _ => None,
    }?;

    let seconds = if epoch > MILLIS_THRESHOLD {
        epoch / 1_000
    } else {
        epoch
    };
    (seconds > 0).then_some(seconds)
}
