use std::io::{self, Write};

use crate::parser::tree::{Class, Placement, Section};
use crate::parser::ResultPage;

const SEPARATOR: &str = "----------";

/// Column layout of the CSV report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Separate `Name` and `Owner` columns.
    Default,
    /// A combined `Name, Owner` column with upper-cased dog names and
    /// section titles, ready to paste into the club newsletter.
    Publishing,
}

impl Layout {
    fn headers(self) -> Vec<&'static str> {
        match self {
            Layout::Default => vec!["Event", "Section", "Class", "Placement", "Name", "Owner"],
            Layout::Publishing => vec!["Event", "Section", "Class", "Placement", "Name, Owner"],
        }
    }
}

/// One report line; unset columns render empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Line {
    event: String,
    section: String,
    class: String,
    placement: String,
    name: String,
    owner: String,
}

impl Line {
    fn event(text: impl Into<String>) -> Self {
        Line {
            event: text.into(),
            ..Line::default()
        }
    }

    fn separator() -> Self {
        Line {
            event: SEPARATOR.into(),
            section: SEPARATOR.into(),
            class: SEPARATOR.into(),
            placement: SEPARATOR.into(),
            name: SEPARATOR.into(),
            owner: SEPARATOR.into(),
        }
    }

    fn cells(self, layout: Layout) -> Vec<String> {
        let mut cells = vec![self.event, self.section, self.class, self.placement];
        match layout {
            Layout::Default => {
                cells.push(self.name);
                cells.push(self.owner);
            }
            Layout::Publishing => cells.push(self.name),
        }
        cells
    }
}

/// Write the full report: a header row, then a block per results page.
pub fn write_report<W: Write>(mut w: W, pages: &[ResultPage], layout: Layout) -> io::Result<()> {
    let headers: Vec<String> = layout.headers().into_iter().map(String::from).collect();
    write_row(&mut w, &headers)?;
    for page in pages {
        for line in page_lines(page, layout) {
            write_row(&mut w, &line.cells(layout))?;
        }
    }
    w.flush()
}

fn page_lines(page: &ResultPage, layout: Layout) -> Vec<Line> {
    let header = &page.header;
    let mut lines = vec![
        Line::separator(),
        Line::event(header.host.as_str()),
        Line::event(format!("Judge: {}", header.judge)),
        Line::event(header.location.as_str()),
        Line::event(header.date.as_str()),
    ];

    for (i, section) in page.sections.iter().enumerate() {
        // entry count goes on the first section title only
        let entries = (i == 0).then_some(header.entries.as_str());
        lines.extend(section_lines(section, entries, layout));
    }
    lines
}

fn section_lines(section: &Section, entries: Option<&str>, layout: Layout) -> Vec<Line> {
    let title = match entries.filter(|e| !e.is_empty()) {
        Some(entries) => format!("{} {}", section.section, entries),
        None => section.section.clone(),
    };
    let title = match layout {
        Layout::Publishing => title.to_uppercase(),
        Layout::Default => title,
    };

    let mut lines = vec![Line {
        section: title,
        ..Line::default()
    }];
    for class in section.classes.iter().flatten() {
        lines.extend(class_lines(class, layout));
    }
    for placement in section.placements.iter().flatten() {
        lines.push(placement_line(placement, layout));
    }
    lines
}

fn class_lines(class: &Class, layout: Layout) -> Vec<Line> {
    let mut lines = vec![Line {
        class: class.class.clone(),
        ..Line::default()
    }];
    lines.extend(class.placements.iter().map(|p| placement_line(p, layout)));
    lines
}

fn placement_line(placement: &Placement, layout: Layout) -> Line {
    let (name, owner) = match layout {
        Layout::Default => (placement.dog.clone(), placement.owners.clone()),
        Layout::Publishing => (
            format!("{}, {}", placement.dog.to_uppercase(), placement.owners),
            String::new(),
        ),
    };
    Line {
        placement: placement.placement.clone(),
        name,
        owner,
        ..Line::default()
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one comma-separated row, quoting fields as needed.
fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}
