use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::dom::{parent_element, Document, Query};
use crate::error::{PageError, PageResult};

static OPEN_WIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"openWin\('([^']+)'").unwrap());

const EVENT_LINK: &str = ".calendar-list-item__info-title > a";
const EVENT_BLOCK: &str = ".item-detail__event-misc";
const EVENT_TITLE: &str = ".item-detail__event-misc-title";
const BREED_LABEL: &str = r#"table td[colspan="4"] strong a strong"#;

const SPECIALTY_PREFIXES: &[&str] = &["Specialty", "Parent Specialty"];

/// Links to the individual events listed on a calendar day.
pub fn event_links(doc: &Document) -> PageResult<Vec<String>> {
    let query = Query::new(EVENT_LINK)?;
    let links: Vec<String> = doc
        .select(&query)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();
    trace!(?links, "event links");
    Ok(links)
}

/// Links to per-breed results for the breed's specialty competitions on an
/// event page. All-breed competitions would add a group level in between;
/// those blocks never carry a specialty title and are skipped.
pub fn result_links(doc: &Document, breed: &str) -> PageResult<Vec<String>> {
    let blocks = Query::new(EVENT_BLOCK)?;
    let title = Query::new(EVENT_TITLE)?;
    let label = Query::new(BREED_LABEL)?;

    let mut links = Vec::new();
    for block in doc.select(&blocks) {
        let heading = title
            .within(block)
            .next()
            .map(|t| doc.text(t))
            .unwrap_or_default();

        if !is_breed_specialty(&heading, breed) {
            trace!(heading, "not a specialty for this breed");
            continue;
        }

        // The results link lives in a javascript handler on the anchor
        // wrapping the breed label.
        for strong in label.within(block) {
            let Some(href) = parent_element(strong).and_then(|a| a.value().attr("href")) else {
                continue;
            };
            let link = OPEN_WIN_RE
                .captures(href)
                .and_then(|caps| caps.get(1))
                .ok_or_else(|| PageError::MissingLink {
                    href: href.to_string(),
                })?;
            debug!(heading, link = link.as_str(), "breed results");
            links.push(link.as_str().to_string());
        }
    }
    Ok(links)
}

fn is_breed_specialty(heading: &str, breed: &str) -> bool {
    SPECIALTY_PREFIXES.iter().any(|p| heading.starts_with(p)) && heading.ends_with(breed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::ParseOptions;

    fn parse(markup: &str) -> Document {
        Document::parse(markup, ParseOptions::default()).unwrap()
    }

    fn event_block(title: &str, link: &str) -> String {
        format!(
            r#"<div class="item-detail__event-misc">
                <div class="item-detail__event-misc-title">{title}</div>
                <table><tr><td colspan="4"><strong>
                  <a href="javascript:openWin('{link}','results')"><strong>name</strong></a>
                </strong></td></tr></table>
              </div>"#
        )
    }

    #[test]
    fn calendar_day_links() {
        let doc = parse(
            r#"<div class="calendar-list-item__info-title"><a href="link1">title 1</a></div>
               <div class="calendar-list-item__info-title"><a href="link2">title 2</a></div>
               <div class="other"><a href="nope">x</a></div>"#,
        );
        assert_eq!(event_links(&doc).unwrap(), vec!["link1", "link2"]);
    }

    #[test]
    fn specialty_links_for_breed_only() {
        let page = [
            event_block("Specialty Basenji", "link1"),
            event_block("Parent Specialty Basenji", "link2"),
            event_block("Other Basenji", "link3"),
            event_block("Specialty Whippet", "link4"),
        ]
        .concat();
        let doc = parse(&page);
        assert_eq!(result_links(&doc, "Basenji").unwrap(), vec!["link1", "link2"]);
        assert_eq!(result_links(&doc, "Whippet").unwrap(), vec!["link4"]);
    }

    #[test]
    fn query_string_survives() {
        let doc = parse(&event_block(
            "Specialty Basenji",
            "/apps/events/results.cfm?id=1&int_ref=5",
        ));
        assert_eq!(
            result_links(&doc, "Basenji").unwrap(),
            vec!["/apps/events/results.cfm?id=1&int_ref=5"]
        );
    }

    #[test]
    fn anchor_without_handler_is_an_error() {
        let page = event_block("Specialty Basenji", "x").replace("javascript:openWin('x','results')", "#");
        let doc = parse(&page);
        assert!(matches!(
            result_links(&doc, "Basenji"),
            Err(PageError::MissingLink { .. })
        ));
    }
}
