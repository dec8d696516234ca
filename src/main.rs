mod app;
mod audio;
mod catalog;
mod config;
mod error;
mod media;
mod mpris;
mod probe;
mod runtime;
mod session;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
