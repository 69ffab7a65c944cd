use std::borrow::Cow;
use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use crate::error::{PageError, PageResult};

/// Knobs for turning page text into a tree.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Decode character references. Off for AKC pages: their links carry
    /// query strings like `&int_ref=5` that decode into garbage, and the
    /// owner column relies on seeing the literal `&nbsp;`.
    pub decode_entities: bool,
    /// Collapse whitespace runs in extracted text to single spaces.
    pub normalize_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            decode_entities: false,
            normalize_whitespace: true,
        }
    }
}

/// A compiled structural query that remembers its source text.
#[derive(Debug)]
pub struct Query {
    source: &'static str,
    selector: Selector,
}

impl Query {
    pub fn new(source: &'static str) -> PageResult<Self> {
        let selector = Selector::parse(source).map_err(|e| PageError::Selector {
            query: source,
            reason: e.to_string(),
        })?;
        Ok(Query { source, selector })
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Matches below `scope`, in document order.
    pub fn within<'a>(&'a self, scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        scope.select(&self.selector)
    }
}

/// A parsed page. Read-only: nothing downstream mutates the tree.
pub struct Document {
    html: Html,
    options: ParseOptions,
}

impl Document {
    pub fn parse(markup: &str, options: ParseOptions) -> PageResult<Self> {
        if markup.trim().is_empty() {
            return Err(PageError::EmptyDocument);
        }

        // Escaping every ampersand keeps references literal through the parser.
        let source: Cow<str> = if options.decode_entities {
            Cow::Borrowed(markup)
        } else {
            Cow::Owned(markup.replace('&', "&amp;"))
        };

        let html = Html::parse_document(&source);
        trace!(errors = html.errors.len(), "parsed document");
        Ok(Document { html, options })
    }

    /// All matches in the whole document, in document order.
    pub fn select<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(&query.selector)
    }

    /// Text content of one element.
    pub fn text(&self, element: ElementRef<'_>) -> String {
        self.clean(element.text().collect::<String>())
    }

    /// Combined text of every match, the way a jQuery-style `.text()` reads a
    /// whole selection. Empty when nothing matches.
    pub fn selection_text(&self, query: &Query) -> String {
        let raw: String = self.select(query).flat_map(|el| el.text()).collect();
        self.clean(raw)
    }

    /// Stable sort of `items` into pre-order, depth-first document order.
    /// Items pointing at the same node end up adjacent.
    pub fn sort_by_document_order<'a, T>(
        &'a self,
        items: &mut [T],
        node: impl Fn(&T) -> ElementRef<'a>,
    ) {
        let position: HashMap<_, usize> = self
            .html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();
        items.sort_by_key(|item| position.get(&node(item).id()).copied().unwrap_or(usize::MAX));
    }

    fn clean(&self, raw: String) -> String {
        if self.options.normalize_whitespace {
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            raw.trim().to_string()
        }
    }
}

/// Nearest ancestor element of `element`, if any.
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

// ── Tests ──
