/// Class names that come through malformed on results pages.
const CLASS_FIXES: &[(&str, &str)] = &[
    ("Bred By Exhibitor", "Bred-By-Exhibitor"),
    ("Bred-By Exhibitor", "Bred-By-Exhibitor"),
    ("American Bred", "American-Bred"),
    ("Amer-Bred", "American-Bred"),
    ("6-9 Month", "6-9 Months"),
    ("9-12 Month", "9-12 Months"),
    ("12-18 Month", "12-18 Months"),
    ("Twelve To Eighteen Month", "12-18 Months"),
    ("Veteran 7 - 9 Years", "Veteran 7-9 Years"),
];

/// Breed-winner awards: raw phrasing, canonical label, short code.
const PLACEMENT_AWARDS: &[(&str, &str, &str)] = &[
    ("Best of Breed", "Best of Breed", "BOB"),
    ("Best Of Breed", "Best of Breed", "BOB"),
    ("BOB", "Best of Breed", "BOB"),
    ("Best of Variety", "Best of Variety", "BOV"),
    ("Best Of Variety", "Best of Variety", "BOV"),
    ("Best of Winners", "Best of Winners", "BW"),
    ("Best Of Winners", "Best of Winners", "BW"),
    ("Best of Opposite Sex", "Best of Opposite Sex", "BOS"),
    ("Best Of Opposite Sex", "Best of Opposite Sex", "BOS"),
    ("Best of Opposite", "Best of Opposite Sex", "BOS"),
    ("BOS", "Best of Opposite Sex", "BOS"),
    ("Select Dog", "Select Dog", "SD"),
    ("Select Bitch", "Select Bitch", "SB"),
    ("Winners Dog", "Winners Dog", "WD"),
    ("Winners Bitch", "Winners Bitch", "WB"),
    ("Reserve Winners Dog", "Reserve Winners Dog", "RWD"),
    ("Reserve Winners Bitch", "Reserve Winners Bitch", "RWB"),
    ("Best Bred-By-Exhibitor", "Best Bred-By-Exhibitor", "BBE"),
    ("Best Bred By Exhibitor", "Best Bred-By-Exhibitor", "BBE"),
    ("Best Puppy", "Best Puppy", "BP"),
    ("Best Veteran", "Best Veteran", "BV"),
    ("Award of Merit", "Award of Merit", "AOM"),
    ("Award Of Merit", "Award of Merit", "AOM"),
];

/// A normalized placement: either a plain rank or a recognized award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementLabel {
    Plain(String),
    Award { label: &'static str, abbrev: &'static str },
}

impl PlacementLabel {
    /// Split into the label and the optional short code.
    pub fn into_parts(self) -> (String, Option<String>) {
        match self {
            PlacementLabel::Plain(label) => (label, None),
            PlacementLabel::Award { label, abbrev } => (label.to_string(), Some(abbrev.to_string())),
        }
    }
}

pub fn normalize_class(raw: &str) -> String {
    CLASS_FIXES
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_placement(raw: &str) -> PlacementLabel {
    match PLACEMENT_AWARDS.iter().find(|(from, _, _)| *from == raw) {
        Some(&(_, label, abbrev)) => PlacementLabel::Award { label, abbrev },
        None => PlacementLabel::Plain(raw.to_string()),
    }
}
