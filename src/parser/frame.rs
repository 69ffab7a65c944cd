use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

static DOCTYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!doctype ").unwrap());
static HTML_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<html\b").unwrap());
static HEAD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<head>").unwrap());

/// Which malformed page shape the raw text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Calendar "events on a day" page: junk preamble, a real document, then
    /// trailing junk starting with another `<head>`.
    Date,
    /// Event detail page: junk preamble followed by the real `<html>`.
    Event,
}

/// Cut the one parseable document out of a page made of several concatenated
/// documents. Never fails: with no markers the page comes back unchanged.
pub fn extract_frame(page: &str, kind: FrameKind) -> &str {
    let frame = match kind {
        FrameKind::Date => {
            let start = second_or_first(unquoted_markers(page, &DOCTYPE_RE));
            let rest = &page[start..];
            let end = HEAD_OPEN_RE
                .find_iter(rest)
                .nth(1)
                .map(|m| m.start())
                .unwrap_or(rest.len());
            &rest[..end]
        }
        FrameKind::Event => {
            let start = second_or_first(unquoted_markers(page, &HTML_OPEN_RE));
            &page[start..]
        }
    };

    trace!(?kind, html = %excerpt(frame, 300), "extracted frame");
    frame
}

/// Start offsets of marker matches that are not directly preceded by a quote,
/// so markers written from script string literals are skipped.
fn unquoted_markers(page: &str, re: &Regex) -> Vec<usize> {
    re.find_iter(page)
        .map(|m| m.start())
        .filter(|&start| !matches!(page[..start].chars().next_back(), Some('"' | '\'')))
        .collect()
}

fn second_or_first(markers: Vec<usize>) -> usize {
    markers
        .get(1)
        .or_else(|| markers.first())
        .copied()
        .unwrap_or(0)
}

/// Short single-line preview of a page body for log output.
pub fn excerpt(text: &str, length: usize) -> String {
    let head: String = text.chars().take(length * 2).collect();
    head.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(length)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_page_uses_second_doctype() {
        let page = "<!doctype html>\n    a\n    <!doctype html>\n    b\n  ";
        assert_eq!(
            extract_frame(page, FrameKind::Date),
            "<!doctype html>\n    b\n  "
        );
    }

    #[test]
    fn date_page_skips_quoted_doctype() {
        let page = "<!doctype html>\n    a\n    <script>\n      document.write(\"<!doctype html>\");\n    </script>\n    <!doctype html>\n    b\n  ";
        assert_eq!(
            extract_frame(page, FrameKind::Date),
            "<!doctype html>\n    b\n  "
        );
    }

    #[test]
    fn date_page_doctype_is_case_insensitive() {
        let page = "<!DOCTYPE html>a<!DocType html>b";
        assert_eq!(extract_frame(page, FrameKind::Date), "<!DocType html>b");
    }

    #[test]
    fn date_page_falls_back_to_first_doctype() {
        let page = "x\n    <!doctype html>\n    a\n  ";
        assert_eq!(
            extract_frame(page, FrameKind::Date),
            "<!doctype html>\n    a\n  "
        );
    }

    #[test]
    fn date_page_without_markers_is_unchanged() {
        assert_eq!(extract_frame("x", FrameKind::Date), "x");
        assert_eq!(extract_frame("", FrameKind::Date), "");
    }

    #[test]
    fn date_page_stops_at_second_head() {
        let page = "a\n    <head>\n    b\n    <head>\n    c\n  ";
        assert_eq!(
            extract_frame(page, FrameKind::Date),
            "a\n    <head>\n    b\n    "
        );
    }

    #[test]
    fn event_page_uses_second_html() {
        let page = "<html>\n    a\n    <html>\n    b\n  ";
        assert_eq!(extract_frame(page, FrameKind::Event), "<html>\n    b\n  ");
    }

    #[test]
    fn event_page_skips_quoted_html() {
        let page = "<html>\n    a\n    <script>\n      document.write(\"<html>\");\n    </script>\n    <html>\n    b\n  ";
        assert_eq!(extract_frame(page, FrameKind::Event), "<html>\n    b\n  ");
    }

    #[test]
    fn event_page_ignores_longer_tag_names() {
        let page = "<htmlx>a<html lang=\"en\">b";
        assert_eq!(
            extract_frame(page, FrameKind::Event),
            "<html lang=\"en\">b"
        );
    }

    #[test]
    fn event_page_falls_back_to_first_html_then_start() {
        assert_eq!(
            extract_frame("x\n    <html>\n    a\n  ", FrameKind::Event),
            "<html>\n    a\n  "
        );
        assert_eq!(extract_frame("x", FrameKind::Event), "x");
    }

    #[test]
    fn extraction_is_idempotent() {
        let date = "junk<!doctype html><head>x<!doctype html><head>keep<head>tail";
        let once = extract_frame(date, FrameKind::Date);
        assert_eq!(once, "<!doctype html><head>keep");
        assert_eq!(extract_frame(once, FrameKind::Date), once);

        let event = "<html>junk<html><body>keep</body></html>";
        let once = extract_frame(event, FrameKind::Event);
        assert_eq!(extract_frame(once, FrameKind::Event), once);
    }

    #[test]
    fn excerpt_collapses_whitespace() {
        assert_eq!(excerpt("a \n\n  b\tc", 300), "a b c");
        assert_eq!(excerpt("abcdef", 3), "abc");
    }
}
