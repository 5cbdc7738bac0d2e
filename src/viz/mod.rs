//! Terminal keyboard front end
//!
//! Shows:
//! - held keys on a two-row keyboard
//! - envelope, reverb, octave and volume settings
//! - the master output waveform
//!
//! `o` opens a WAV file and `n` renders a new sound from a description with
//! the built-in synth. Both replace the current sample after releasing held
//! notes.
//!
//! Key releases come from the terminal's keyboard enhancement protocol when
//! it is available. Otherwise the UI runs in latch mode, where pressing a
//! held key again releases it.

mod keyboard;
mod waveform;

pub use keyboard::Keyboard;
pub use waveform::Waveform;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing::{info, warn};

use crate::engine::{export_bank, Engine};
use crate::generate;
use crate::sample::Sample;
use crate::synth::Key;

/// Ring buffer of recent output samples for the waveform display
pub struct SampleBuffer {
    samples: Vec<f32>,
    capacity: usize,
    write_pos: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: vec![0.0; capacity],
            capacity,
            write_pos: 0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.samples[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    /// The most recent `count` samples, oldest first
    pub fn recent(&self, count: usize) -> Vec<f32> {
        let count = count.min(self.capacity);
        let start = self.write_pos + self.capacity - count;
        (start..start + count)
            .map(|i| self.samples[i % self.capacity])
            .collect()
    }

    /// Largest absolute value currently held
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |p, s| p.max(s.abs()))
    }
}

/// Parameter selected for editing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Attack,
    Release,
    Reverb,
    Octave,
    Volume,
}

impl Param {
    const ALL: [Param; 5] = [
        Param::Attack,
        Param::Release,
        Param::Reverb,
        Param::Octave,
        Param::Volume,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|&p| p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Param::Attack => "Attack",
            Param::Release => "Release",
            Param::Reverb => "Reverb",
            Param::Octave => "Octave",
            Param::Volume => "Volume",
        }
    }

    pub fn value_text(self, engine: &Engine) -> String {
        match self {
            Param::Attack => format!("{:.2}s", engine.envelope().attack()),
            Param::Release => format!("{:.2}s", engine.envelope().release()),
            Param::Reverb => format!("{:.0}%", engine.reverb_amount() * 100.0),
            Param::Octave => format!("{:+}", engine.octave()),
            Param::Volume => format!("{:.0}%", engine.master_volume() * 100.0),
        }
    }

    /// Move the value by `steps` increments; the engine clamps to range
    pub fn adjust(self, engine: &mut Engine, steps: i8) {
        match self {
            Param::Attack => {
                let attack = engine.envelope().attack() + 0.05 * steps as f64;
                engine.set_attack(attack);
            }
            Param::Release => {
                let release = engine.envelope().release() + 0.1 * steps as f64;
                engine.set_release(release);
            }
            Param::Reverb => {
                let amount = engine.reverb_amount() + 0.05 * steps as f32;
                engine.set_reverb_amount(amount);
            }
            Param::Octave => {
                let octave = engine.octave().saturating_add(steps);
                engine.set_octave(octave);
            }
            Param::Volume => {
                let volume = engine.master_volume() + 0.05 * steps as f32;
                engine.set_master_volume(volume);
            }
        }
    }
}

/// Text being typed on the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Path of a WAV file to load
    Path(String),
    /// Description for the built-in synth
    Sound(String),
}

impl Prompt {
    fn text_mut(&mut self) -> &mut String {
        match self {
            Prompt::Path(text) | Prompt::Sound(text) => text,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Prompt::Path(_) => "Open WAV",
            Prompt::Sound(_) => "Describe sound",
        }
    }
}

/// Front end state outside the engine
pub struct UiState {
    pub selected: Param,
    /// No key-release events; a second press releases
    pub latch: bool,
    pub status: String,
    pub export_path: PathBuf,
    /// Open text prompt; keys edit it instead of playing
    pub input: Option<Prompt>,
}

impl UiState {
    pub fn new(latch: bool, export_path: PathBuf) -> Self {
        let status = if latch {
            "Latch mode: press a key again to release it".to_string()
        } else {
            "Ready".to_string()
        };
        Self {
            selected: Param::Attack,
            latch,
            status,
            export_path,
            input: None,
        }
    }
}

/// What the event loop does after a key event
///
/// Everything past `Quit` runs through [`apply`] with the engine unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Continue,
    Quit,
    Export,
    Load(PathBuf),
    Generate(String),
}

/// Apply one terminal key event to the engine
pub fn handle_key(engine: &mut Engine, ui: &mut UiState, event: KeyEvent) -> UiAction {
    if event.kind == KeyEventKind::Repeat {
        return UiAction::Continue;
    }
    let pressed = event.kind == KeyEventKind::Press;

    if matches!(event.code, KeyCode::Char('c')) && event.modifiers.contains(KeyModifiers::CONTROL) {
        return UiAction::Quit;
    }
    if ui.input.is_some() {
        return if pressed { edit_prompt(ui, event.code) } else { UiAction::Continue };
    }

    match event.code {
        KeyCode::Char('q') | KeyCode::Esc if pressed => UiAction::Quit,
        KeyCode::Char('p') if pressed => UiAction::Export,
        KeyCode::Char('o') if pressed => {
            engine.all_notes_off();
            ui.input = Some(Prompt::Path(String::new()));
            UiAction::Continue
        }
        KeyCode::Char('n') if pressed => {
            engine.all_notes_off();
            ui.input = Some(Prompt::Sound(String::new()));
            UiAction::Continue
        }
        KeyCode::Char(c) => {
            if let Some(key) = Key::from_char(c) {
                play(engine, ui, key, pressed);
            }
            UiAction::Continue
        }
        KeyCode::Tab if pressed => {
            ui.selected = ui.selected.next();
            UiAction::Continue
        }
        KeyCode::BackTab if pressed => {
            ui.selected = ui.selected.prev();
            UiAction::Continue
        }
        KeyCode::Left if pressed => {
            ui.selected.adjust(engine, -1);
            UiAction::Continue
        }
        KeyCode::Right if pressed => {
            ui.selected.adjust(engine, 1);
            UiAction::Continue
        }
        KeyCode::Up if pressed => {
            Param::Octave.adjust(engine, 1);
            UiAction::Continue
        }
        KeyCode::Down if pressed => {
            Param::Octave.adjust(engine, -1);
            UiAction::Continue
        }
        _ => UiAction::Continue,
    }
}

fn edit_prompt(ui: &mut UiState, code: KeyCode) -> UiAction {
    match code {
        KeyCode::Char(c) => {
            if let Some(prompt) = ui.input.as_mut() {
                prompt.text_mut().push(c);
            }
        }
        KeyCode::Backspace => {
            if let Some(prompt) = ui.input.as_mut() {
                prompt.text_mut().pop();
            }
        }
        KeyCode::Esc => ui.input = None,
        KeyCode::Enter => {
            return match ui.input.take() {
                Some(Prompt::Path(text)) if !text.trim().is_empty() => {
                    UiAction::Load(PathBuf::from(text.trim()))
                }
                Some(Prompt::Sound(text)) if !text.trim().is_empty() => {
                    UiAction::Generate(text.trim().to_string())
                }
                _ => UiAction::Continue,
            };
        }
        _ => {}
    }
    UiAction::Continue
}

fn play(engine: &mut Engine, ui: &mut UiState, key: Key, pressed: bool) {
    if ui.latch {
        if !pressed {
            return;
        }
        if engine.active_keys().contains(&key) {
            engine.note_off(key);
        } else {
            engine.note_on(key);
        }
    } else if pressed {
        engine.note_on(key);
    } else {
        engine.note_off(key);
    }

    if !engine.has_sample() {
        ui.status = "No sample loaded".to_string();
    }
}

/// Run an action that must not hold the engine lock while it works
///
/// Decoding, synthesis and bank writing happen unlocked; the engine is
/// locked only to take a snapshot or to swap the new sample in.
pub fn apply(engine: &Mutex<Engine>, ui: &mut UiState, action: UiAction) -> Result<()> {
    match action {
        UiAction::Continue | UiAction::Quit => {}
        UiAction::Export => export(engine, ui)?,
        UiAction::Load(path) => {
            ui.status = match Sample::from_wav_file(&path) {
                Ok(sample) => {
                    swap_sample(engine, sample)?;
                    info!(path = %path.display(), "sample replaced");
                    format!("Loaded {}", path.display())
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "load failed");
                    format!("Load failed: {}", e)
                }
            };
        }
        UiAction::Generate(prompt) => {
            let (duration, seed) = {
                let engine = lock(engine)?;
                let generation = &engine.config().generation;
                (generation.duration as f64, u64::try_from(generation.seed).ok())
            };
            ui.status = match generate::synthesize(&prompt, duration, seed) {
                Ok(sample) => {
                    swap_sample(engine, sample)?;
                    info!(prompt = %prompt, "sample generated");
                    format!("Generated \"{}\"", prompt)
                }
                Err(e) => {
                    warn!(error = %e, "generation failed");
                    format!("Generation failed: {}", e)
                }
            };
        }
    }
    Ok(())
}

fn swap_sample(engine: &Mutex<Engine>, sample: Sample) -> Result<()> {
    let mut engine = lock(engine)?;
    engine.all_notes_off();
    engine.replace_sample(sample);
    Ok(())
}

fn export(engine: &Mutex<Engine>, ui: &mut UiState) -> Result<()> {
    if !lock(engine)?.has_sample() {
        ui.status = "No sample to export".to_string();
        return Ok(());
    }
    ui.status = match export_bank(engine, &ui.export_path) {
        Ok(bytes) => format!("Exported {} ({} bytes)", ui.export_path.display(), bytes),
        Err(e) => {
            warn!(error = %e, "export failed");
            format!("Export failed: {}", e)
        }
    };
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow!("lock poisoned"))
}

/// What the UI needs from the engine for one frame
struct Snapshot {
    active: Vec<Key>,
    params: Vec<(Param, String)>,
    voices: usize,
    sample: Option<String>,
}

impl Snapshot {
    fn take(engine: &Engine) -> Self {
        Self {
            active: engine.active_keys(),
            params: Param::ALL
                .iter()
                .map(|&p| (p, p.value_text(engine)))
                .collect(),
            voices: engine.sounding_voices(),
            sample: engine.sample().map(|s| {
                format!(
                    "{:.2}s {}ch {}Hz",
                    s.duration_secs(),
                    s.channel_count(),
                    s.sample_rate()
                )
            }),
        }
    }
}

/// Run the keyboard TUI until the user quits
pub fn run_keyboard(
    engine: Arc<Mutex<Engine>>,
    buffer: Arc<Mutex<SampleBuffer>>,
    export_path: PathBuf,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    info!(latch = !enhanced, "keyboard started");

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut ui = UiState::new(!enhanced, export_path);

    let result = event_loop(&mut terminal, &engine, &buffer, &mut ui);

    // Restore the terminal even if the loop failed
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    engine: &Mutex<Engine>,
    buffer: &Mutex<SampleBuffer>,
    ui: &mut UiState,
) -> Result<()> {
    loop {
        let snapshot = Snapshot::take(&*lock(engine)?);
        let width = terminal.size()?.width as usize;
        let (samples, peak) = {
            let buffer = lock(buffer)?;
            (buffer.recent(width * 8), buffer.peak())
        };

        terminal.draw(|f| draw_ui(f, &snapshot, &samples, peak, ui))?;

        if event::poll(Duration::from_millis(30))? {
            if let Event::Key(key) = event::read()? {
                let action = handle_key(&mut *lock(engine)?, ui, key);
                if action == UiAction::Quit {
                    lock(engine)?.all_notes_off();
                    return Ok(());
                }
                apply(engine, ui, action)?;
            }
        }
    }
}

fn draw_ui(f: &mut Frame, snapshot: &Snapshot, samples: &[f32], peak: f32, ui: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Parameters
            Constraint::Length(4), // Keyboard
            Constraint::Min(5),    // Waveform
            Constraint::Length(3), // Status
        ])
        .split(f.area());

    draw_params(f, chunks[0], snapshot, ui);

    let keyboard = Keyboard::new(&snapshot.active)
        .block(Block::default().borders(Borders::ALL).title(" Keys "));
    f.render_widget(keyboard, chunks[1]);

    let waveform = Waveform::new(samples)
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Output (peak {:.2}) ", peak)),
        );
    f.render_widget(waveform, chunks[2]);

    draw_status(f, chunks[3], snapshot, ui);
}

fn draw_params(f: &mut Frame, area: Rect, snapshot: &Snapshot, ui: &UiState) {
    let mut spans = Vec::new();
    for (param, value) in &snapshot.params {
        let style = if *param == ui.selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {}: {} ", param.label(), value), style));
        spans.push(Span::raw("│"));
    }
    spans.pop();

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Sound "));
    f.render_widget(paragraph, area);
}

fn draw_status(f: &mut Frame, area: Rect, snapshot: &Snapshot, ui: &UiState) {
    let text = if let Some(prompt) = &ui.input {
        let text = match prompt {
            Prompt::Path(text) | Prompt::Sound(text) => text,
        };
        Line::from(vec![
            Span::styled(format!(" {}: ", prompt.label()), Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}_", text)),
            Span::raw("  (Enter: ok  Esc: cancel)"),
        ])
    } else {
        let sample = snapshot.sample.as_deref().unwrap_or("no sample");
        Line::from(vec![
            Span::styled(format!(" {} ", ui.status), Style::default().fg(Color::Green)),
            Span::raw(format!("│ {} │ voices {} │ ", sample, snapshot.voices)),
            Span::raw("Tab/←→: edit  ↑↓: octave  o: open  n: new  p: export  q: quit"),
        ])
    };

    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplerConfig;
    use crate::sample::Sample;

    fn engine() -> Engine {
        let mut engine = Engine::new(SamplerConfig::default());
        engine.replace_sample(Sample::mono(44100, vec![0.5; 44100]).unwrap());
        engine
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    fn key(c: char) -> Key {
        Key::from_char(c).unwrap()
    }

    #[test]
    fn test_sample_buffer_recent() {
        let mut buffer = SampleBuffer::new(10);
        for i in 0..10 {
            buffer.push(i as f32);
        }
        assert_eq!(buffer.recent(3), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_sample_buffer_wrap() {
        let mut buffer = SampleBuffer::new(3);
        for s in [1.0, 2.0, 3.0, 4.0] {
            buffer.push(s);
        }
        assert_eq!(buffer.recent(10), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.peak(), 4.0);
    }

    #[test]
    fn test_param_cycle() {
        assert_eq!(Param::Attack.next(), Param::Release);
        assert_eq!(Param::Octave.next(), Param::Volume);
        assert_eq!(Param::Volume.next(), Param::Attack);
        assert_eq!(Param::Attack.prev(), Param::Volume);
    }

    #[test]
    fn test_press_and_release_with_key_events() {
        let mut engine = engine();
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        handle_key(&mut engine, &mut ui, press(KeyCode::Char('a')));
        assert_eq!(engine.active_keys(), vec![key('a')]);

        // Auto-repeat does not retrigger or release
        let repeat = KeyEvent::new_with_kind(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Repeat);
        handle_key(&mut engine, &mut ui, repeat);
        assert_eq!(engine.active_keys(), vec![key('a')]);

        handle_key(&mut engine, &mut ui, release(KeyCode::Char('a')));
        assert!(engine.active_keys().is_empty());
    }

    #[test]
    fn test_latch_mode_toggles() {
        let mut engine = engine();
        let mut ui = UiState::new(true, PathBuf::from("sample.sf2"));

        handle_key(&mut engine, &mut ui, press(KeyCode::Char('s')));
        assert_eq!(engine.active_keys(), vec![key('s')]);
        handle_key(&mut engine, &mut ui, press(KeyCode::Char('s')));
        assert!(engine.active_keys().is_empty());
    }

    #[test]
    fn test_param_editing() {
        let mut engine = engine();
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        handle_key(&mut engine, &mut ui, press(KeyCode::Right));
        assert!((engine.envelope().attack() - 0.15).abs() < 1e-9);

        handle_key(&mut engine, &mut ui, press(KeyCode::Tab));
        handle_key(&mut engine, &mut ui, press(KeyCode::Tab));
        assert_eq!(ui.selected, Param::Reverb);
        handle_key(&mut engine, &mut ui, press(KeyCode::Left));
        assert!((engine.reverb_amount() - 0.15).abs() < 1e-6);

        handle_key(&mut engine, &mut ui, press(KeyCode::Up));
        handle_key(&mut engine, &mut ui, press(KeyCode::Up));
        handle_key(&mut engine, &mut ui, press(KeyCode::Up));
        assert_eq!(engine.octave(), 2);

        handle_key(&mut engine, &mut ui, press(KeyCode::BackTab));
        handle_key(&mut engine, &mut ui, press(KeyCode::Tab));
        handle_key(&mut engine, &mut ui, press(KeyCode::Tab));
        assert_eq!(ui.selected, Param::Volume);
        handle_key(&mut engine, &mut ui, press(KeyCode::Left));
        assert!((engine.master_volume() - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_quit_keys() {
        let mut engine = engine();
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        assert_eq!(handle_key(&mut engine, &mut ui, press(KeyCode::Char('q'))), UiAction::Quit);
        assert_eq!(handle_key(&mut engine, &mut ui, press(KeyCode::Esc)), UiAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut engine, &mut ui, ctrl_c), UiAction::Quit);
        assert_eq!(handle_key(&mut engine, &mut ui, release(KeyCode::Char('q'))), UiAction::Continue);
    }

    #[test]
    fn test_export_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.sf2");
        let engine = Mutex::new(engine());
        let mut ui = UiState::new(false, path.clone());

        let action = handle_key(&mut engine.lock().unwrap(), &mut ui, press(KeyCode::Char('p')));
        assert_eq!(action, UiAction::Export);
        assert!(!path.exists());

        apply(&engine, &mut ui, action).unwrap();
        assert!(path.exists());
        assert!(ui.status.starts_with("Exported"));
    }

    #[test]
    fn test_export_without_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.sf2");
        let engine = Mutex::new(Engine::new(SamplerConfig::default()));
        let mut ui = UiState::new(false, path.clone());

        apply(&engine, &mut ui, UiAction::Export).unwrap();
        assert!(!path.exists());
        assert_eq!(ui.status, "No sample to export");
    }

    fn type_text(engine: &mut Engine, ui: &mut UiState, text: &str) -> UiAction {
        for c in text.chars() {
            handle_key(engine, ui, press(KeyCode::Char(c)));
        }
        handle_key(engine, ui, press(KeyCode::Enter))
    }

    #[test]
    fn test_prompt_captures_keys() {
        let mut engine = engine();
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        handle_key(&mut engine, &mut ui, press(KeyCode::Char('a')));
        handle_key(&mut engine, &mut ui, press(KeyCode::Char('o')));
        // Opening the prompt releases held notes
        assert!(engine.active_keys().is_empty());
        assert_eq!(ui.input, Some(Prompt::Path(String::new())));

        // Layout keys type instead of playing, q does not quit
        handle_key(&mut engine, &mut ui, press(KeyCode::Char('s')));
        handle_key(&mut engine, &mut ui, press(KeyCode::Char('q')));
        handle_key(&mut engine, &mut ui, press(KeyCode::Backspace));
        assert!(engine.active_keys().is_empty());
        assert_eq!(ui.input, Some(Prompt::Path("s".to_string())));

        let action = type_text(&mut engine, &mut ui, ".wav");
        assert_eq!(action, UiAction::Load(PathBuf::from("s.wav")));
        assert_eq!(ui.input, None);
    }

    #[test]
    fn test_prompt_cancel_and_empty() {
        let mut engine = engine();
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        handle_key(&mut engine, &mut ui, press(KeyCode::Char('n')));
        handle_key(&mut engine, &mut ui, press(KeyCode::Char('x')));
        assert_eq!(handle_key(&mut engine, &mut ui, press(KeyCode::Esc)), UiAction::Continue);
        assert_eq!(ui.input, None);

        handle_key(&mut engine, &mut ui, press(KeyCode::Char('n')));
        assert_eq!(type_text(&mut engine, &mut ui, "  "), UiAction::Continue);
        assert_eq!(ui.input, None);
    }

    #[test]
    fn test_load_replaces_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.wav");
        let replacement = Sample::mono(22050, vec![0.25; 1000]).unwrap();
        crate::engine::recorder::write_sample_wav(&path, &replacement).unwrap();

        let engine = Mutex::new(engine());
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));
        engine.lock().unwrap().note_on(key('a'));

        apply(&engine, &mut ui, UiAction::Load(path)).unwrap();

        let engine = engine.lock().unwrap();
        let current = engine.sample().unwrap();
        assert_eq!(current.sample_rate(), 22050);
        assert_eq!(current.frame_count(), 1000);
        assert!(engine.active_keys().is_empty());
        assert!(ui.status.starts_with("Loaded"));
    }

    #[test]
    fn test_load_failure_keeps_sample() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Mutex::new(engine());
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        apply(&engine, &mut ui, UiAction::Load(dir.path().join("missing.wav"))).unwrap();

        assert_eq!(engine.lock().unwrap().sample().unwrap().frame_count(), 44100);
        assert!(ui.status.starts_with("Load failed"));
    }

    #[test]
    fn test_generate_replaces_sample() {
        let mut config = SamplerConfig::default();
        config.generation.seed = 7;
        config.generation.duration = 1.0;
        let engine = Mutex::new(Engine::new(config));
        let mut ui = UiState::new(false, PathBuf::from("sample.sf2"));

        apply(&engine, &mut ui, UiAction::Generate("deep bass".to_string())).unwrap();

        let sample = engine.lock().unwrap().sample().unwrap();
        assert_eq!(sample.sample_rate(), 44100);
        assert_eq!(sample.frame_count(), 44100);
        assert_eq!(ui.status, "Generated \"deep bass\"");
    }
}
