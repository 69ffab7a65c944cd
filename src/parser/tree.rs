use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use super::classify::{Fragment, Role};
use super::labels::{normalize_class, normalize_placement};
use super::owners::split_owner;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTree {
    pub sections: Vec<Section>,
}

/// Top-level grouping ("Breed Winners", "Dogs", "Bitches"). Award placements
/// hang directly off the section; ranked placements live under classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<Class>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placements: Option<Vec<Placement>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Class {
    pub class: String,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub placement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbrev: Option<String>,
    pub dog: String,
    pub owners: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

/// Where the most recent placement was put.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Section { section: usize, index: usize },
    Class { section: usize, class: usize, index: usize },
}

/// Most recently opened item per level.
#[derive(Debug, Default)]
struct Cursor {
    section: Option<usize>,
    class: Option<usize>,
    placement: Option<Slot>,
    finalized: bool,
}

/// Accumulator for the left-to-right fold over ordered fragments.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    sections: Vec<Section>,
    cursor: Cursor,
    /// dog name → award short codes seen so far, newest first ("BOS/BOB")
    ledger: HashMap<String, String>,
}

impl TreeBuilder {
    pub fn step(mut self, fragment: &Fragment) -> Self {
        let text = fragment.text.as_str();
        match fragment.role {
            Role::Section => self.open_section(text),
            Role::Class => self.open_class(text),
            Role::Placement => self.open_placement(text),
            Role::Dog | Role::Owner => self.fill_placement(fragment.role, text),
        }
        self
    }

    pub fn finish(mut self) -> ResultTree {
        // The closing "Best of Breed/Variety Competition" section repeats
        // placements already captured and is the only one without classes.
        if self.sections.len() > 1 && self.sections.last().is_some_and(|s| s.classes.is_none()) {
            if let Some(dropped) = self.sections.pop() {
                trace!(section = %dropped.section, "dropped trailing section");
            }
        }
        ResultTree {
            sections: self.sections,
        }
    }

    fn open_section(&mut self, text: &str) {
        self.sections.push(Section {
            section: text.to_string(),
            ..Section::default()
        });
        self.cursor = Cursor {
            section: Some(self.sections.len() - 1),
            ..Cursor::default()
        };
    }

    fn open_class(&mut self, text: &str) {
        // Blank class rows are layout filler.
        if text.trim().is_empty() {
            return;
        }
        let Some(si) = self.cursor.section else {
            debug!(class = text, "class outside any section, skipped");
            return;
        };

        let classes = self.sections[si].classes.get_or_insert_with(Vec::new);
        classes.push(Class {
            class: normalize_class(text),
            placements: Vec::new(),
        });
        self.cursor.class = Some(classes.len() - 1);
        self.cursor.placement = None;
        self.cursor.finalized = false;
    }

    // Blank placements are kept so the dog/owner cells that follow don't land
    // on the previous placement.
    fn open_placement(&mut self, text: &str) {
        let Some(si) = self.cursor.section else {
            debug!(placement = text, "placement outside any section, skipped");
            return;
        };

        let (label, abbrev) = normalize_placement(text).into_parts();
        let item = Placement {
            placement: label,
            abbrev,
            ..Placement::default()
        };

        let section = &mut self.sections[si];
        let slot = match self.cursor.class {
            Some(ci) => {
                let Some(class) = section.classes.as_mut().and_then(|c| c.get_mut(ci)) else {
                    return;
                };
                class.placements.push(item);
                Slot::Class {
                    section: si,
                    class: ci,
                    index: class.placements.len() - 1,
                }
            }
            None => {
                let placements = section.placements.get_or_insert_with(Vec::new);
                placements.push(item);
                Slot::Section {
                    section: si,
                    index: placements.len() - 1,
                }
            }
        };
        self.cursor.placement = Some(slot);
        self.cursor.finalized = false;
    }

    fn fill_placement(&mut self, role: Role, text: &str) {
        let Some(slot) = self.cursor.placement else {
            trace!(?role, text, "no open placement");
            return;
        };
        let Some(placement) = placement_mut(&mut self.sections, slot) else {
            return;
        };

        match role {
            Role::Dog => placement.dog = text.to_string(),
            _ => placement.owners = text.to_string(),
        }

        if !self.cursor.finalized && !placement.dog.is_empty() && !placement.owners.is_empty() {
            finalize(placement, &mut self.ledger);
            self.cursor.finalized = true;
        }
    }
}

fn placement_mut(sections: &mut [Section], slot: Slot) -> Option<&mut Placement> {
    match slot {
        Slot::Section { section, index } => sections
            .get_mut(section)?
            .placements
            .as_mut()?
            .get_mut(index),
        Slot::Class {
            section,
            class,
            index,
        } => sections
            .get_mut(section)?
            .classes
            .as_mut()?
            .get_mut(class)?
            .placements
            .get_mut(index),
    }
}

/// Split the owner cell, then carry award codes between a dog's placements:
/// an award pushes its code onto the dog's ledger entry, and a plain placement
/// for a dog with codes gets them appended ("1" → "1/SD").
fn finalize(placement: &mut Placement, ledger: &mut HashMap<String, String>) {
    let split = split_owner(&placement.owners, &placement.dog);
    placement.owners = split.owners;
    placement.sex = split.sex;

    let known = ledger.get(&placement.dog).cloned();
    match (&placement.abbrev, known) {
        (Some(abbrev), Some(known)) => {
            ledger.insert(placement.dog.clone(), format!("{}/{}", abbrev, known));
        }
        (Some(abbrev), None) => {
            ledger.insert(placement.dog.clone(), abbrev.clone());
        }
        (None, Some(known)) => {
            placement.placement = format!("{}/{}", placement.placement, known);
        }
        (None, None) => {}
    }
}

/// Fold ordered fragments into the section → class → placement tree.
pub fn build_tree(fragments: &[Fragment]) -> ResultTree {
    let tree = fragments
        .iter()
        .fold(TreeBuilder::default(), TreeBuilder::step)
        .finish();
    debug!(sections = tree.sections.len(), "built result tree");
    tree
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn frags(items: &[(Role, &str)]) -> Vec<Fragment> {
        items.iter().map(|&(role, text)| Fragment::new(role, text)).collect()
    }

    fn placement(label: &str, abbrev: Option<&str>, dog: &str, owners: &str) -> Placement {
        Placement {
            placement: label.into(),
            abbrev: abbrev.map(Into::into),
            dog: dog.into(),
            owners: owners.into(),
            sex: None,
        }
    }

    #[test]
    fn empty_input_has_no_sections() {
        assert_eq!(build_tree(&[]), ResultTree { sections: vec![] });
    }

    #[test]
    fn simple_class_placement() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Dogs"),
            (Role::Class, "Open"),
            (Role::Placement, "1"),
            (Role::Dog, "Rex"),
            (Role::Owner, "Rex &nbsp;Jane Doe"),
        ]));
        assert_eq!(
            tree,
            ResultTree {
                sections: vec![Section {
                    section: "Dogs".into(),
                    classes: Some(vec![Class {
                        class: "Open".into(),
                        placements: vec![placement("1", None, "Rex", "Jane Doe")],
                    }]),
                    placements: None,
                }],
            }
        );
    }

    #[test]
    fn owner_before_dog_still_splits() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Dogs"),
            (Role::Class, "Open"),
            (Role::Placement, "2"),
            (Role::Owner, "Rex (D), &nbsp;Jane Doe"),
            (Role::Dog, "Rex"),
        ]));
        let p = &tree.sections[0].classes.as_ref().unwrap()[0].placements[0];
        assert_eq!(p.owners, "Jane Doe");
        assert_eq!(p.sex.as_deref(), Some("D"));
    }

    #[test]
    fn blank_class_lines_are_skipped() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Dogs"),
            (Role::Class, "class 1"),
            (Role::Placement, "1"),
            (Role::Class, "  "),
            (Role::Dog, "Rex"),
            (Role::Owner, "Rex &nbsp;Jane"),
            (Role::Class, "class 2"),
        ]));
        let classes = tree.sections[0].classes.as_ref().unwrap();
        let names: Vec<&str> = classes.iter().map(|c| c.class.as_str()).collect();
        assert_eq!(names, vec!["class 1", "class 2"]);
        // the blank class did not reset the open placement
        assert_eq!(classes[0].placements[0].dog, "Rex");
        assert_eq!(classes[0].placements[0].owners, "Jane");
    }

    #[test]
    fn blank_placements_are_kept() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Dogs"),
            (Role::Class, "Open"),
            (Role::Placement, "1"),
            (Role::Dog, "Rex"),
            (Role::Owner, "Rex &nbsp;Jane"),
            (Role::Placement, ""),
            (Role::Dog, "Max"),
            (Role::Owner, "Max &nbsp;Bob"),
        ]));
        let placements = &tree.sections[0].classes.as_ref().unwrap()[0].placements;
        assert_eq!(
            placements,
            &vec![
                placement("1", None, "Rex", "Jane"),
                placement("", None, "Max", "Bob"),
            ]
        );
    }

    #[test]
    fn award_codes_cascade_into_class_placements() {
        let tree = build_tree(&frags(&[
            (Role::Section, "section 1"),
            (Role::Placement, "Select Dog"),
            (Role::Owner, "dogname &nbsp;owners names"),
            (Role::Dog, "dogname"),
            (Role::Class, "class 1"),
            (Role::Placement, "1"),
            (Role::Owner, "dogname &nbsp;owners names"),
            (Role::Dog, "dogname"),
        ]));
        assert_eq!(
            tree,
            ResultTree {
                sections: vec![Section {
                    section: "section 1".into(),
                    placements: Some(vec![placement(
                        "Select Dog",
                        Some("SD"),
                        "dogname",
                        "owners names"
                    )]),
                    classes: Some(vec![Class {
                        class: "class 1".into(),
                        placements: vec![placement("1/SD", None, "dogname", "owners names")],
                    }]),
                }],
            }
        );
    }

    #[test]
    fn award_codes_stack_newest_first() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Breed Winners"),
            (Role::Placement, "Best of Breed"),
            (Role::Dog, "Rex"),
            (Role::Owner, "Rex &nbsp;Jane"),
            (Role::Placement, "Best of Opposite Sex"),
            (Role::Dog, "Rex"),
            (Role::Owner, "Rex &nbsp;Jane"),
            (Role::Placement, "Select Bitch"),
            (Role::Dog, "Ada"),
            (Role::Owner, "Ada &nbsp;Bob"),
            (Role::Section, "Dogs"),
            (Role::Class, "Open"),
            (Role::Placement, "1"),
            (Role::Dog, "Rex"),
            (Role::Owner, "Rex &nbsp;Jane"),
            (Role::Placement, "2"),
            (Role::Dog, "Max"),
            (Role::Owner, "Max &nbsp;Sue"),
        ]));
        let open = &tree.sections[1].classes.as_ref().unwrap()[0];
        assert_eq!(open.placements[0].placement, "1/BOS/BOB");
        assert_eq!(open.placements[0].abbrev, None);
        assert_eq!(open.placements[1].placement, "2");
    }

    #[test]
    fn trailing_section_without_classes_is_dropped() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Dogs"),
            (Role::Class, "Open"),
            (Role::Placement, "1"),
            (Role::Section, "Best of Breed/Variety Competition"),
            (Role::Placement, "Best of Breed"),
        ]));
        assert_eq!(tree.sections.len(), 1);
        assert_eq!(tree.sections[0].section, "Dogs");
    }

    #[test]
    fn lone_section_without_classes_is_kept() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Breed Winners"),
            (Role::Placement, "Best of Breed"),
        ]));
        assert_eq!(tree.sections.len(), 1);
        assert_eq!(tree.sections[0].placements.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn every_placement_creates_one_item() {
        let tree = build_tree(&frags(&[
            (Role::Section, "Dogs"),
            (Role::Placement, "Winners Dog"),
            (Role::Class, "Puppy"),
            (Role::Placement, "1"),
            (Role::Placement, "2"),
            (Role::Placement, ""),
        ]));
        let section = &tree.sections[0];
        assert_eq!(section.placements.as_ref().unwrap().len(), 1);
        assert_eq!(section.classes.as_ref().unwrap()[0].placements.len(), 3);
    }

    #[test]
    fn fragments_before_any_section_are_ignored() {
        let tree = build_tree(&frags(&[
            (Role::Class, "Open"),
            (Role::Placement, "1"),
            (Role::Dog, "Rex"),
            (Role::Section, "Dogs"),
        ]));
        assert_eq!(
            tree.sections,
            vec![Section {
                section: "Dogs".into(),
                ..Section::default()
            }]
        );
    }
}
