use crate::config::RtDisplayConfig;
use crate::message::Message;
use crate::model::loader::load_dicom;
use crate::model::{DicomEntry, TreeNodeKey};
use crate::overlay::{GraphicListener, SliceView};
use crate::rt::related_elements;
use crate::sync::RtSync;
use crate::views::{image_panel, rt_panel, tree_panel};
use iced::widget::text::Wrapping;
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{application, Alignment, Element, Length, Task, Theme};
use rfd::AsyncFileDialog;
use std::collections::BTreeSet;

const APP_TITLE: &str = "RT Layers";
const MAIN_PANE: GraphicListener = GraphicListener(1);

pub fn run() -> iced::Result {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    application(APP_TITLE, App::update, App::view)
        .theme(App::theme)
        .run()
}

pub struct App {
    entries: Vec<DicomEntry>,
    selected_instance: Option<usize>,
    collapsed_nodes: BTreeSet<TreeNodeKey>,
    last_error: Option<String>,
    config: RtDisplayConfig,
    rt: RtSync,
    slice: SliceView,
}

impl Default for App {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            selected_instance: None,
            collapsed_nodes: BTreeSet::new(),
            last_error: None,
            config: RtDisplayConfig::load(),
            rt: RtSync::default(),
            slice: SliceView::new(MAIN_PANE),
        }
    }
}

impl App {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFiles => {
                let config = self.config.clone();
                Task::perform(
                    async move {
                        match AsyncFileDialog::new().pick_files().await {
                            Some(handles) if !handles.is_empty() => handles
                                .into_iter()
                                .map(|handle| load_dicom(handle.path().to_path_buf(), &config))
                                .collect(),
                            _ => Vec::new(),
                        }
                    },
                    Message::FilesLoaded,
                )
            }
            Message::FilesLoaded(results) => {
                let mut errors = Vec::new();
                let mut last_image = None;
                for result in results {
                    match result {
                        Ok(entry) => {
                            let index = self.entries.len();
                            if entry.image_element().is_some() {
                                last_image = Some(index);
                            }
                            self.entries.push(entry);
                        }
                        Err(err) => errors.push(err),
                    }
                }

                self.last_error = (!errors.is_empty()).then(|| errors.join("\n"));

                // RT objects imported next to an already shown image must
                // still reach the case, so re-activate in every case.
                if let Some(index) = last_image.or(self.selected_instance) {
                    self.activate(index);
                }
                Task::none()
            }
            Message::SelectInstance(index) => {
                if index < self.entries.len() {
                    self.activate(index);
                }
                Task::none()
            }
            Message::ToggleNode(key) => {
                if !self.collapsed_nodes.remove(&key) {
                    self.collapsed_nodes.insert(key);
                }
                Task::none()
            }
            Message::LoadRt => {
                if !self.rt.load(std::slice::from_mut(&mut self.slice)) {
                    log::warn!("Nothing to load for the active image");
                }
                Task::none()
            }
            Message::SelectStructureSet(id) => {
                self.rt
                    .select_structure_set(id, std::slice::from_mut(&mut self.slice));
                Task::none()
            }
            Message::SelectPlan(id) => {
                self.rt.select_plan(id, std::slice::from_mut(&mut self.slice));
                Task::none()
            }
            Message::ToggleRtNode(node, checked) => {
                self.rt
                    .toggle(node, checked, std::slice::from_mut(&mut self.slice));
                Task::none()
            }
        }
    }

    /// Makes `index` the active instance. Only images re-evaluate the RT
    /// case; other instances leave it as it is.
    fn activate(&mut self, index: usize) {
        let Some(entry) = self.entries.get(index) else {
            return;
        };
        self.selected_instance = Some(index);

        let shown = self.slice.image().map(|image| image.sop_instance_uid.as_str());
        if shown != Some(entry.sop_instance_uid.as_str()) {
            self.slice.show(entry.image_element().cloned());
        }

        if entry.image_element().is_some() {
            let related = related_elements(&self.entries, entry);
            self.rt
                .activate_image(related, std::slice::from_mut(&mut self.slice));
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let pick_button = button("Import DICOM Files").on_press(Message::PickFiles);

        let tree_column = tree_panel(&self.entries, &self.collapsed_nodes, self.selected_instance);
        let tree_panel = container(scrollable(tree_column))
            .padding(16)
            .width(Length::FillPortion(3));

        let rt_panel = container(scrollable(rt_panel(&self.rt)))
            .padding(16)
            .width(Length::FillPortion(2));

        let selected_view = self
            .selected_instance
            .and_then(|index| self.entries.get(index))
            .map(|entry| &entry.view);

        let image_content = image_panel(selected_view, &self.slice, &self.config);
        let image_panel = container(image_content)
            .padding(16)
            .width(Length::FillPortion(5))
            .height(Length::Fill)
            .align_x(Alignment::Center)
            .align_y(Alignment::Center);

        let mut content = column![row![tree_panel, rt_panel, image_panel]
            .spacing(16)
            .width(Length::Fill)
            .height(Length::Fill)]
        .spacing(16);

        if let Some(error) = &self.last_error {
            content = content.push(text(error).size(16).wrapping(Wrapping::Word));
        }

        column![pick_button, content]
            .padding(20)
            .spacing(20)
            .align_x(Alignment::Start)
            .into()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}
