//! Terminal UI for ripple.
//!
//! Translates key presses into engine messages and renders the keyboard,
//! parameter controls and instrument status. All engine communication goes
//! one way through the message ring; the UI never reads engine state.

pub mod state;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::Producer;
use std::time::Duration;

use ripple_dsp::{
    dsp::oscillator::Waveform,
    engine::message::EngineMessage,
    pitch::NoteName,
};

use crate::keymap::note_for_key;
use state::UiState;

const BAR_WIDTH: usize = 24;

pub struct UiApp {
    tx: Producer<EngineMessage>,
    state: UiState,
    /// Whether the terminal reports key releases. Without them, a note key
    /// toggles its note on and off on successive presses.
    release_supported: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(tx: Producer<EngineMessage>, release_supported: bool) -> Self {
        Self {
            tx,
            state: UiState::new(),
            release_supported,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking input poll, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        Ok(())
    }

    fn send(&mut self, message: EngineMessage) {
        // Messages are dropped if the ring is full
        let _ = self.tx.push(message);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key.kind {
            KeyEventKind::Press => self.handle_press(key.code),
            KeyEventKind::Release => self.handle_release(key.code),
            // Held note keys must not retrigger, but held arrows keep
            // adjusting the selected control
            KeyEventKind::Repeat => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right) {
                    self.handle_press(key.code);
                }
            }
        }
    }

    fn handle_press(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.should_quit = true,

            KeyCode::Up => {
                self.state.selected = self.state.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                self.state.selected = (self.state.selected + 1).min(self.state.controls.len() - 1);
            }
            KeyCode::Left => {
                let (parameter, value) = self.state.adjust_selected(-1.0);
                self.send(EngineMessage::SetParameter { parameter, value });
            }
            KeyCode::Right => {
                let (parameter, value) = self.state.adjust_selected(1.0);
                self.send(EngineMessage::SetParameter { parameter, value });
            }

            KeyCode::Char(c) => self.handle_char(c),
            _ => {}
        }
    }

    fn handle_char(&mut self, c: char) {
        match c {
            '1' => {
                self.state.waveform = Waveform::Sine;
                self.send(EngineMessage::SetWaveform(Waveform::Sine));
            }
            '2' => {
                self.state.waveform = Waveform::Sawtooth;
                self.send(EngineMessage::SetWaveform(Waveform::Sawtooth));
            }
            'z' => {
                if self.state.octave > 1 {
                    self.state.octave -= 1;
                    self.send(EngineMessage::ShiftOctave(-1));
                }
            }
            'x' => {
                if self.state.octave < 7 {
                    self.state.octave += 1;
                    self.send(EngineMessage::ShiftOctave(1));
                }
            }
            'r' => {
                self.state.reset();
                self.send(EngineMessage::Reset);
            }
            _ => {
                if let Some((note, octave_offset)) = note_for_key(c) {
                    self.press_note(note, octave_offset);
                }
            }
        }
    }

    fn press_note(&mut self, note: NoteName, octave_offset: i32) {
        let key = (note, octave_offset);

        if self.state.held.contains(&key) {
            if !self.release_supported {
                // Toggle mode: second press releases the note
                self.state.held.remove(&key);
                self.send(EngineMessage::NoteOff { note, octave_offset });
            }
            return;
        }

        self.state.held.insert(key);
        self.send(EngineMessage::NoteOn { note, octave_offset });
    }

    fn handle_release(&mut self, code: KeyCode) {
        if let KeyCode::Char(c) = code {
            if let Some((note, octave_offset)) = note_for_key(c) {
                if self.state.held.remove(&(note, octave_offset)) {
                    self.send(EngineMessage::NoteOff { note, octave_offset });
                }
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(7), // Parameter controls
                Constraint::Length(4), // Keyboard
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        self.render_status(frame, chunks[0]);
        self.render_controls(frame, chunks[1]);
        self.render_keyboard(frame, chunks[2]);
        self.render_help(frame, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let wave = match self.state.waveform {
            Waveform::Sine => "sine",
            Waveform::Sawtooth => "sawtooth",
        };
        let status = Paragraph::new(format!("  wave: {wave}    octave: {}", self.state.octave))
            .block(Block::default().title(" ripple ").borders(Borders::ALL));
        frame.render_widget(status, area);
    }

    fn render_controls(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let mut lines = Vec::with_capacity(self.state.controls.len());

        for (i, row) in self.state.controls.iter().enumerate() {
            let filled = (row.fraction() * BAR_WIDTH as f64).round() as usize;
            let bar: String = "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled);

            let style = if i == self.state.selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            lines.push(Line::from(Span::styled(
                format!(
                    " {:<9} {} {:>6.0} {}",
                    row.label(),
                    bar,
                    row.value,
                    row.unit()
                ),
                style,
            )));
        }

        let block = Block::default().title(" controls ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_keyboard(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let mut lines = Vec::with_capacity(2);

        for octave_offset in 0..2i32 {
            let mut spans = vec![Span::raw(format!(
                " {:<2} ",
                self.state.octave + octave_offset
            ))];
            for note in NoteName::ALL {
                let held = self.state.held.contains(&(note, octave_offset));
                let style = if held {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else if note.is_sharp() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!("{:<3}", note.label()), style));
            }
            lines.push(Line::from(spans));
        }

        let block = Block::default().title(" keyboard ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_help(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let mode = if self.release_supported {
            "hold keys to play"
        } else {
            "keys toggle notes"
        };
        let help = Paragraph::new(format!(
            " [a..;] notes ({mode})  [z/x] octave  [1/2] wave  [up/down] select  [left/right] adjust  [r] reset  [esc] quit"
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, area);
    }
}
