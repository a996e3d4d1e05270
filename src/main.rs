use clap::Parser;

mod panel;
mod utils;

fn main() {
    utils::logger::init();

    let config = panel::config::Config::parse();

    panel::Windowing::run_app(config).expect("Windowing failed");
}
