//! ripple - terminal polyphonic synthesizer
//!
//! Run with: cargo run

mod app;
mod keymap;
mod ui;

use app::Ripple;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    Ripple::new().run()
}
