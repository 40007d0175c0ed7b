mod app;
mod config;
mod image_pipeline;
mod message;
mod model;
mod overlay;
mod rt;
mod selection;
mod sync;
mod views;

fn main() -> iced::Result {
    app::run()
}
