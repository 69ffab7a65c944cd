use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

// Optional "(D)"/"(B)", optional comma, then the literal &nbsp; before the owners.
static OWNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\((?P<sex>.)\))?,?\s*(?:&nbsp;)\s*?(?P<owners>.*)").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSplit {
    pub owners: String,
    pub sex: Option<String>,
}

/// The owner cell repeats the dog's name (it wraps the dog link), sometimes
/// followed by a sex marker. Peel both off. Text that doesn't have the usual
/// shape comes back as-is, minus the dog name.
pub fn split_owner(owner_text: &str, dog: &str) -> OwnerSplit {
    let stripped = owner_text.replacen(dog, "", 1);
    let stripped = stripped.trim();

    match OWNER_RE.captures(stripped) {
        Some(caps) => OwnerSplit {
            owners: caps
                .name("owners")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            sex: caps.name("sex").map(|m| m.as_str().to_string()),
        },
        None => {
            trace!(owner_text, dog, "owner text without separator");
            OwnerSplit {
                owners: stripped.to_string(),
                sex: None,
            }
        }
    }
}
