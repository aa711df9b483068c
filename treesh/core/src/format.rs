//! Text rendering for command results.

use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::client::NodeStat;

const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";
const COLUMN_GAP: usize = 2;

/// Renders epoch milliseconds as `Thu Jan 01 00:00:00 UTC 1970`.
#[must_use]
pub fn format_timestamp(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| millis.to_string(), |ts| ts.format(TIMESTAMP_FORMAT).to_string())
}

/// Multi-line `key = value` rendering of node metadata, in the order operators expect.
#[must_use]
pub fn render_stat(stat: &NodeStat) -> String {
    [
        format!("cZxid = {:x}", stat.czxid),
        format!("ctime = {}", format_timestamp(stat.ctime)),
        format!("mZxid = {:x}", stat.mzxid),
        format!("mtime = {}", format_timestamp(stat.mtime)),
        format!("pZxid = {:x}", stat.pzxid),
        format!("cversion = {}", stat.cversion),
        format!("dataVersion = {}", stat.version),
        format!("aclVersion = {}", stat.aversion),
        format!("ephemeralOwner = {:x}", stat.ephemeral_owner),
        format!("dataLength = {}", stat.data_length),
        format!("numChildren = {}", stat.num_children),
    ]
    .join("\n")
}

/// Lays names out row by row in equal-width columns that fit `width`.
///
/// A single name wider than `width` still gets its own line.
#[must_use]
pub fn columnize(names: &[String], width: usize) -> String {
    let Some(longest) = names.iter().map(|name| name.chars().count()).max() else {
        return String::new();
    };
    let column_width = longest + COLUMN_GAP;
    let columns = (width / column_width).max(1);
    names
        .chunks(columns)
        .map(|row| {
            row.iter()
                .map(|name| format!("{name:<column_width$}"))
                .collect::<String>()
                .trim_end()
                .to_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-prints payloads holding a JSON object or array; anything else is returned as is.
#[must_use]
pub fn render_payload(payload: &str) -> String {
    match serde_json::from_str::<Value>(payload) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| payload.to_owned())
        }
        _ => payload.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn stat_fields_in_fixed_order() {
        let stat = NodeStat {
            czxid: 0x1a,
            mzxid: 0x2b,
            pzxid: 0x3c,
            ctime: 0,
            mtime: 86_400_000,
            version: 4,
            cversion: 5,
            aversion: 6,
            ephemeral_owner: 0xff,
            data_length: 7,
            num_children: 8,
        };
        let expected = "cZxid = 1a
ctime = Thu Jan 01 00:00:00 UTC 1970
mZxid = 2b
mtime = Fri Jan 02 00:00:00 UTC 1970
pZxid = 3c
cversion = 5
dataVersion = 4
aclVersion = 6
ephemeralOwner = ff
dataLength = 7
numChildren = 8";
        assert_eq!(render_stat(&stat), expected);
    }

    #[test]
    fn columns_fit_the_width() {
        let listing = columnize(&names(&["a", "bb", "ccc", "dddd/"]), 16);
        assert_eq!(listing, "a      bb\nccc    dddd/");
        assert_eq!(columnize(&names(&["a", "b", "c"]), 80), "a  b  c");
    }

    #[test]
    fn narrow_terminals_get_one_name_per_line() {
        let listing = columnize(&names(&["alpha", "beta"]), 3);
        assert_eq!(listing, "alpha\nbeta");
        assert_eq!(columnize(&[], 80), "");
    }

    #[test]
    fn pretty_prints_json_containers_only() {
        assert_eq!(render_payload(r#"{"k":"v"}"#), "{\n  \"k\": \"v\"\n}");
        assert_eq!(render_payload("[1,2]"), "[\n  1,\n  2\n]");
        assert_eq!(render_payload("42"), "42");
        assert_eq!(render_payload("plain text"), "plain text");
    }
}
