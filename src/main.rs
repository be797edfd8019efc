mod app;
mod backend;
mod config;
mod error;
mod model;
mod ui;

fn main() {
    env_logger::init();

    let app = app::MonitorApp::new(config::Config::load());
    std::process::exit(app.run());
}
