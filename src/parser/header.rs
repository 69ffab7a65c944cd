use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use super::dom::{Document, Query};
use crate::error::PageResult;

static TRAILING_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*[^-])\s+-$").unwrap());

// The surrounding `td[colspan=8]` is shared with too much unrelated markup to
// use on its own, hence the long paths.
const HOST: &str = r#"td[colspan="8"] > div[align="center"] > font > font > b"#;
const DATE: &str = r#"td[colspan="8"] > div[align="center"] + font > center"#;
const LOCATION: &str =
    r#"td[colspan="8"] > div[align="center"] + font > center + font > font > center"#;
const JUDGE: &str = r#"td[colspan="4"] + td a.white"#;
const ENTRIES: &str = r#"td[colspan="4"] + td + td[colspan="2"] font"#;

/// Event details printed above the results table. Fields that can't be found
/// are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventHeader {
    pub host: String,
    pub date: String,
    pub location: String,
    pub judge: String,
    pub entries: String,
}

pub fn extract_header(doc: &Document) -> PageResult<EventHeader> {
    let text = |source: &'static str| -> PageResult<String> {
        Ok(doc.selection_text(&Query::new(source)?))
    };

    let header = EventHeader {
        host: text(HOST)?,
        date: trim_date(&text(DATE)?),
        location: text(LOCATION)?,
        judge: text(JUDGE)?,
        entries: text(ENTRIES)?,
    };
    trace!(?header, "parsed header");
    Ok(header)
}

/// "January 18, 2019 -" → "January 18, 2019"
fn trim_date(date: &str) -> String {
    TRAILING_DASH_RE
        .captures(date)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| date.to_string())
}
