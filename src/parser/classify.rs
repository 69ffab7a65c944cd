use scraper::ElementRef;
use tracing::{debug, trace};

use super::dom::{Document, Query};
use crate::error::{PageError, PageResult};

/// What a matched results-table cell means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Section,
    Class,
    Placement,
    Dog,
    Owner,
}

/// One query per role, run in this order. The results table has no nesting,
/// so these pick cells out by column position alone.
pub const ROLE_QUERIES: [(Role, &str); 5] = [
    (Role::Section, r#"td[colspan="5"]:nth-of-type(2)"#),
    (Role::Class, r#"td[colspan="5"]:nth-of-type(3)"#),
    (Role::Placement, r#"td[align="right"]:nth-of-type(4)"#),
    (Role::Dog, r#"td[align="right"]:nth-of-type(4) + td a"#),
    (Role::Owner, r#"td[align="right"]:nth-of-type(4) + td"#),
];

/// A role attached to a node through a side table; the node itself is untouched.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedNode<'a> {
    pub role: Role,
    pub node: ElementRef<'a>,
}

/// Role plus extracted text: what the tree builder folds over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub role: Role,
    pub text: String,
}

impl Fragment {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Fragment {
            role,
            text: text.into(),
        }
    }
}

pub struct Classifier {
    queries: Vec<(Role, Query)>,
}

impl Classifier {
    pub fn new() -> PageResult<Self> {
        let queries = ROLE_QUERIES
            .iter()
            .map(|&(role, source)| Ok((role, Query::new(source)?)))
            .collect::<PageResult<Vec<_>>>()?;
        Ok(Classifier { queries })
    }

    /// Tag every match of every role query. Grouped by role, not yet in
    /// document order.
    pub fn classify<'a>(&'a self, doc: &'a Document) -> Vec<ClassifiedNode<'a>> {
        let mut nodes = Vec::new();
        for (role, query) in &self.queries {
            let before = nodes.len();
            nodes.extend(doc.select(query).map(|node| ClassifiedNode { role: *role, node }));
            debug!(?role, query = query.source(), matches = nodes.len() - before, "classified");
        }
        nodes
    }
}

/// Put classified nodes into document order and collapse repeats of the same
/// physical node. A node claimed by two different roles is rejected.
pub fn normalize<'a>(
    doc: &'a Document,
    mut nodes: Vec<ClassifiedNode<'a>>,
) -> PageResult<Vec<ClassifiedNode<'a>>> {
    doc.sort_by_document_order(&mut nodes, |n| n.node);

    let mut ordered: Vec<ClassifiedNode<'a>> = Vec::with_capacity(nodes.len());
    for n in nodes {
        match ordered.last() {
            Some(prev) if prev.node.id() == n.node.id() => {
                if prev.role != n.role {
                    return Err(PageError::RoleConflict {
                        first: prev.role,
                        second: n.role,
                        text: doc.text(n.node),
                    });
                }
            }
            _ => ordered.push(n),
        }
    }

    trace!(roles = ?ordered.iter().map(|n| n.role).collect::<Vec<_>>(), "sorted");
    Ok(ordered)
}

/// Read the text off each ordered node.
pub fn fragments(doc: &Document, ordered: &[ClassifiedNode<'_>]) -> Vec<Fragment> {
    ordered
        .iter()
        .map(|n| Fragment::new(n.role, doc.text(n.node)))
        .collect()
}

// ── Tests ──
