use crate::message::Message;
use crate::model::{DicomEntry, EntryContent, TreeNodeKey};
use iced::widget::{button, column, row, text, Column, Space};
use iced::Length;
use std::collections::{BTreeMap, BTreeSet};

const INDENT: f32 = 18.0;

type SeriesMap<'a> = BTreeMap<&'a str, Vec<usize>>;
type StudyMap<'a> = BTreeMap<&'a str, SeriesMap<'a>>;
type PatientMap<'a> = BTreeMap<&'a str, StudyMap<'a>>;

/// Patient / study / series / instance hierarchy of everything imported.
pub fn tree_panel<'a>(
    entries: &'a [DicomEntry],
    collapsed_nodes: &BTreeSet<TreeNodeKey>,
    selected_instance: Option<usize>,
) -> Column<'a, Message> {
    let mut panel = column![text("Imported Instances").size(20)].spacing(6);
    if entries.is_empty() {
        return panel.push(text("No files imported"));
    }

    let mut patients = PatientMap::new();
    for (index, entry) in entries.iter().enumerate() {
        patients
            .entry(entry.patient_id.as_str())
            .or_default()
            .entry(entry.study_instance_uid.as_str())
            .or_default()
            .entry(entry.series_instance_uid.as_str())
            .or_default()
            .push(index);
    }

    for (patient, studies) in patients {
        let key = TreeNodeKey::patient(patient);
        let collapsed = collapsed_nodes.contains(&key);
        panel = panel.push(toggle_row(0, format!("Patient {patient}"), key, collapsed));
        if collapsed {
            continue;
        }

        for (study, series_map) in studies {
            let key = TreeNodeKey::study(patient, study);
            let collapsed = collapsed_nodes.contains(&key);
            panel = panel.push(toggle_row(1, format!("Study {study}"), key, collapsed));
            if collapsed {
                continue;
            }

            for (series, instances) in series_map {
                let key = TreeNodeKey::series(patient, study, series);
                let collapsed = collapsed_nodes.contains(&key);
                let modality = &entries[instances[0]].modality;
                let label = format!("{modality} series {series}");
                panel = panel.push(toggle_row(2, label, key, collapsed));
                if collapsed {
                    continue;
                }

                for index in instances {
                    let selected = selected_instance == Some(index);
                    panel = panel.push(instance_row(&entries[index], index, selected));
                }
            }
        }
    }
    panel
}

fn toggle_row<'a>(
    depth: u8,
    label: String,
    key: TreeNodeKey,
    collapsed: bool,
) -> iced::widget::Row<'a, Message> {
    let arrow = if collapsed { "▶" } else { "▼" };
    row![
        Space::with_width(Length::Fixed(INDENT * f32::from(depth))),
        button(text(format!("{arrow} {label}"))).on_press(Message::ToggleNode(key)),
    ]
}

fn instance_row(
    entry: &DicomEntry,
    index: usize,
    selected: bool,
) -> iced::widget::Row<'_, Message> {
    let kind = match &entry.content {
        EntryContent::Image(image) if image.geometry.is_none() => " (no geometry)",
        _ => "",
    };
    let marker = if selected { "▶ " } else { "" };
    let label = format!("{marker}{} {}{kind}", entry.modality, entry.sop_instance_uid);
    row![
        Space::with_width(Length::Fixed(INDENT * 3.0)),
        button(text(label)).on_press(Message::SelectInstance(index)),
    ]
}
