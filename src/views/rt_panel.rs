use crate::message::Message;
use crate::selection::{Branch, LeafPayload, NodeId};
use crate::sync::{RtSync, SyncState};
use iced::widget::{button, checkbox, column, container, pick_list, row, text, Column, Space};
use iced::{Alignment, Background, Color, Length};

const INDENT: f32 = 18.0;
const SWATCH: f32 = 12.0;

pub fn rt_panel(sync: &RtSync) -> Column<'_, Message> {
    let load_button =
        button("Load RT").on_press_maybe(sync.load_enabled().then_some(Message::LoadRt));
    let root = column![text("RT Layers").size(20), load_button].spacing(8);

    match sync.state() {
        SyncState::NoCase => root.push(text("No RT objects share this image's frame of reference")),
        SyncState::CaseLoaded { active: false } => {
            root.push(text("RT objects found, load them to display contours"))
        }
        SyncState::CaseLoaded { active: true } => {
            let structure_sets = pick_list(
                sync.structure_sets(),
                sync.selected_structure_set().cloned(),
                Message::SelectStructureSet,
            )
            .placeholder("No structure set")
            .width(Length::Fill);
            let plans = pick_list(
                sync.plans(),
                sync.selected_plan().cloned(),
                Message::SelectPlan,
            )
            .placeholder("No plan")
            .width(Length::Fill);

            let mut root = root.push(structure_sets).push(plans);
            for branch in Branch::ALL {
                root = root.push(branch_rows(sync, branch));
            }
            root
        }
    }
}

fn branch_rows(sync: &RtSync, branch: Branch) -> Column<'_, Message> {
    let tree = sync.tree();
    let node = NodeId::Branch(branch);
    let header = checkbox(branch.label(), tree.is_checked(node))
        .on_toggle(move |checked| Message::ToggleRtNode(node, checked));

    tree.leaves(branch)
        .fold(column![header].spacing(4), |column, (leaf, payload, checked)| {
            column.push(
                row![
                    Space::with_width(Length::Fixed(INDENT)),
                    swatch(leaf_color(payload)),
                    checkbox(payload.to_string(), checked)
                        .on_toggle(move |checked| Message::ToggleRtNode(leaf, checked)),
                ]
                .spacing(6)
                .align_y(Alignment::Center),
            )
        })
}

fn leaf_color(payload: &LeafPayload) -> Color {
    match payload {
        LeafPayload::Structure(layer) => layer.structure.color,
        LeafPayload::IsoDose(layer) => layer.iso_dose.color,
    }
}

fn swatch(color: Color) -> container::Container<'static, Message> {
    container(Space::new(Length::Fixed(SWATCH), Length::Fixed(SWATCH))).style(move |_| {
        container::Style {
            background: Some(Background::Color(color)),
            ..container::Style::default()
        }
    })
}
