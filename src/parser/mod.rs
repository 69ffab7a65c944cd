pub mod classify;
pub mod dom;
pub mod frame;
pub mod header;
pub mod labels;
pub mod links;
pub mod owners;
pub mod tree;

use serde::Serialize;
use tracing::debug;

use crate::error::PageResult;
use classify::Classifier;
use dom::{Document, ParseOptions};
use frame::{excerpt, extract_frame, FrameKind};
use header::EventHeader;
use tree::Section;

/// Everything recovered from one per-breed results page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    #[serde(flatten)]
    pub header: EventHeader,
    pub sections: Vec<Section>,
}

/// Calendar day page → event page links.
pub fn parse_date_page(page: &str) -> PageResult<Vec<String>> {
    debug!(page = %excerpt(page, 300), "parsing date page");
    let doc = Document::parse(extract_frame(page, FrameKind::Date), ParseOptions::default())?;
    links::event_links(&doc)
}

/// Event page → results links for the breed's specialties.
pub fn parse_event_page(page: &str, breed: &str) -> PageResult<Vec<String>> {
    debug!(page = %excerpt(page, 300), breed, "parsing event page");
    let doc = Document::parse(extract_frame(page, FrameKind::Event), ParseOptions::default())?;
    links::result_links(&doc, breed)
}

/// Four-stage pipeline: classify → order → fold, plus the header fields.
/// Results pages are well-formed, so no frame extraction here.
pub fn parse_result_page(page: &str) -> PageResult<ResultPage> {
    let doc = Document::parse(page, ParseOptions::default())?;
    let header = header::extract_header(&doc)?;

    let classifier = Classifier::new()?;
    let ordered = classify::normalize(&doc, classifier.classify(&doc))?;
    let fragments = classify::fragments(&doc, &ordered);
    let tree = tree::build_tree(&fragments);

    Ok(ResultPage {
        header,
        sections: tree.sections,
    })
}

// ── Tests ──
