//! Interactive star system viewer: fly a first-person camera through a
//! catalog of real stars, connect them into constellations, and travel to
//! any of them to see a procedurally generated planet system.

mod app;
mod body;
mod camera;
mod catalog;
mod config;
mod material;
mod math;
mod mesh;
mod render;
mod scene;
mod texture;

use app::App;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1600.0, 1000.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Starscape",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}
