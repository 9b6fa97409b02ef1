//! Ripple - application wiring: audio device, message ring, terminal UI.
//!
//! The audio callback owns the engine outright. The UI thread owns only a
//! message producer, so every note and control change crosses to the audio
//! thread through the ring and is applied there in emission order.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::{
    event::{
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use rtrb::RingBuffer;

use ripple_dsp::{
    engine::{
        message::{EngineMessage, MessageReceiver},
        Engine,
    },
    MAX_BLOCK_SIZE,
};

use crate::ui::UiApp;

/// Capacity of the control-message ring between UI and audio threads.
const MESSAGE_CAPACITY: usize = 256;

pub struct Ripple;

impl Ripple {
    pub fn new() -> Self {
        Self
    }

    /// Run the application (takes over the terminal, plays audio).
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (tx, mut rx) = RingBuffer::<EngineMessage>::new(MESSAGE_CAPACITY);

        let mut engine = Engine::new(sample_rate);
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                // Apply pending control messages in emission order
                while let Some(message) = MessageReceiver::pop(&mut rx) {
                    engine.apply(message);
                }

                let total_frames = data.len() / channels;
                let mut written = 0;

                while written < total_frames {
                    let n = (total_frames - written).min(MAX_BLOCK_SIZE);
                    engine.render_block(&mut left[..n], &mut right[..n]);

                    // Interleave: channel 0 left, channel 1 right, extras
                    // mirror the left channel
                    let base = written * channels;
                    for i in 0..n {
                        let frame = &mut data[base + i * channels..base + (i + 1) * channels];
                        for (ch, slot) in frame.iter_mut().enumerate() {
                            *slot = if ch == 1 { right[i] } else { left[i] };
                        }
                    }

                    written += n;
                }
            },
            |err| eprintln!("audio error: {err}"),
            None,
        )?;
        stream.play()?;

        // Key-release reporting needs a terminal that speaks the kitty
        // keyboard protocol; without it the UI falls back to toggle mode
        let release_supported = supports_keyboard_enhancement().unwrap_or(false);

        let mut terminal = ratatui::init();
        if release_supported {
            execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = UiApp::new(tx, release_supported).run(&mut terminal);

        if release_supported {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();

        result
    }
}

impl Default for Ripple {
    fn default() -> Self {
        Self::new()
    }
}
