use crate::model::{WorkOrderHeader, WorkOrderMeta};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Locations,
    Notes,
}

/// Recognized `Label:` prefixes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Label {
    Producer,
    Operator,
    Job,
    Notes,
    Location,
}

/// Split `Label: value` when the label is one we know. Paths never qualify
/// since labels are matched against a fixed list.
fn split_label(line: &str) -> Option<(Label, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = match label.trim().to_ascii_lowercase().as_str() {
        "producer" => Label::Producer,
        "operator" => Label::Operator,
        "job" => Label::Job,
        "notes" => Label::Notes,
        "location" | "locations" => Label::Location,
        _ => return None,
    };
    Some((label, value.trim()))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn append_note(notes: &mut Option<String>, text: &str) {
    match notes {
        Some(existing) if !existing.is_empty() => {
            existing.push(' ');
            existing.push_str(text);
        }
        _ => *notes = Some(text.to_string()),
    }
}

/// Parse a Xytech work order.
///
/// Metadata lines, `Notes:` included, precede the `Location:` marker; unknown
/// labels and title lines are ignored. Location lines follow until a `Notes:`
/// marker or end of input. Unlabelled lines after `Notes:` continue the note
/// text; a known label ends it.
pub fn parse_work_order(content: &str) -> WorkOrderMeta {
    let mut header = WorkOrderHeader::default();
    let mut locations = Vec::new();
    let mut section = Section::Header;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let labelled = split_label(line);
        if section == Section::Notes && labelled.is_some() {
            section = Section::Header;
        }

        match (section, labelled) {
            (_, Some((Label::Notes, value))) => {
                section = Section::Notes;
                if !value.is_empty() {
                    append_note(&mut header.notes, value);
                }
            }
            (Section::Header, Some((Label::Location, value))) => {
                section = Section::Locations;
                if !value.is_empty() {
                    locations.push(value.to_string());
                }
            }
            (Section::Header, Some((label, value))) => {
                let slot = match label {
                    Label::Producer => &mut header.producer,
                    Label::Operator => &mut header.operator,
                    Label::Job => &mut header.job,
                    Label::Notes | Label::Location => continue,
                };
                *slot = non_empty(value);
            }
            (Section::Header, None) => {
                log::debug!("xytech: ignoring header line '{line}'");
            }
            (Section::Locations, _) => locations.push(line.to_string()),
            (Section::Notes, _) => append_note(&mut header.notes, line),
        }
    }

    WorkOrderMeta { header, locations }
}
