//! Player state and the terminal host loop.

use crate::cpu::execute::TIMER_HZ;
use crate::cpu::io::{KeyState, RandomSource, NUM_KEYS};
use crate::{Cpu, CpuState, Rom, Step};
use crossterm::event::KeyCode;
use std::time::{Duration, Instant};

/// Terminals rarely report key releases, so a press holds the key this long.
const KEY_HOLD: Duration = Duration::from_millis(120);

/// Map a terminal key to a hex keypad key.
///
/// ```text
/// 1 2 3 4      1 2 3 C
/// q w e r  ->  4 5 6 D
/// a s d f      7 8 9 E
/// z x c v      A 0 B F
/// ```
pub fn map_key(code: KeyCode) -> Option<u8> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Player application state.
pub struct PlayerApp {
    /// The machine being played.
    pub cpu: Cpu,
    /// ROM image, kept for resets.
    pub rom: Rom,
    /// Instructions per second.
    pub hz: u32,
    /// Is execution paused?
    pub paused: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    held_until: [Option<Instant>; NUM_KEYS as usize],
    /// Fractional instruction budget carried between frames.
    budget: f64,
}

impl PlayerApp {
    /// Create a player with the ROM loaded.
    pub fn new(rom: Rom, hz: u32, rng: Box<dyn RandomSource>) -> Self {
        let mut cpu = Cpu::new();
        cpu.set_random(rng);
        let status = match cpu.load_rom(&rom.bytes) {
            Ok(()) => format!("Running {}", rom.name),
            Err(e) => format!("Error: {}", e),
        };

        Self {
            cpu,
            rom,
            hz,
            paused: false,
            should_quit: false,
            status,
            held_until: [None; NUM_KEYS as usize],
            budget: 0.0,
        }
    }

    /// Handle a key press from the terminal.
    pub fn key_down(&mut self, code: KeyCode, now: Instant) {
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                self.paused = !self.paused;
                self.status = if self.paused { "Paused.".into() } else { "Running.".into() };
            }
            KeyCode::Backspace => self.reset(),
            other => {
                if let Some(key) = map_key(other) {
                    self.held_until[key as usize] = Some(now + KEY_HOLD);
                    if self.cpu.press_key(key) {
                        self.status = format!("Key {:X} delivered", key);
                    }
                }
            }
        }
    }

    /// Handle a key release, for terminals that report them.
    pub fn key_up(&mut self, code: KeyCode) {
        if let Some(key) = map_key(code) {
            self.held_until[key as usize] = None;
        }
    }

    /// Keys considered held at `now`.
    pub fn keys_at(&self, now: Instant) -> KeyState {
        let mut keys = KeyState::new();
        for (key, until) in self.held_until.iter().enumerate() {
            if until.map_or(false, |t| t > now) {
                keys.set(key as u8, true);
            }
        }
        keys
    }

    /// Advance one 1/60 s frame: run this frame's share of instructions,
    /// then tick the timers once.
    pub fn frame(&mut self, now: Instant) {
        if self.paused || self.cpu.is_halted() {
            return;
        }

        self.cpu.set_keypad(Box::new(self.keys_at(now)));

        self.budget += self.hz as f64 / TIMER_HZ as f64;
        while self.budget >= 1.0 {
            self.budget -= 1.0;
            match self.cpu.step() {
                Ok(Step::Executed(_)) => {}
                Ok(Step::AwaitingKey { register }) => {
                    self.status = format!("Waiting for key (V{:X})", register);
                    self.budget = 0.0;
                    break;
                }
                Err(e) => {
                    self.status = format!("Halted: {}", e);
                    self.budget = 0.0;
                    break;
                }
            }
        }

        self.cpu.tick_timers();
    }

    /// Reload the ROM from scratch.
    pub fn reset(&mut self) {
        self.status = match self.cpu.load_rom(&self.rom.bytes) {
            Ok(()) => "Reset. Running.".into(),
            Err(e) => format!("Error: {}", e),
        };
        self.held_until = [None; NUM_KEYS as usize];
        self.budget = 0.0;
        self.paused = false;
    }

    /// Short state label for the status panel.
    pub fn state_label(&self) -> String {
        match self.cpu.state() {
            CpuState::Running if self.paused => "Paused".into(),
            CpuState::Running => "Running".into(),
            CpuState::AwaitingKey(x) => format!("Key wait V{:X}", x),
            CpuState::Halted => "Halted".into(),
        }
    }
}

/// Play a ROM in the terminal until Esc is pressed.
pub fn run_player(rom: Rom, hz: u32, rng: Box<dyn RandomSource>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    let frame_time = Duration::from_secs(1) / TIMER_HZ;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PlayerApp::new(rom, hz, rng);
    let mut next_frame = Instant::now();

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Drain input until the next frame is due
        loop {
            let wait = next_frame.saturating_duration_since(Instant::now());
            if !event::poll(wait)? {
                break;
            }
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => app.key_down(key.code, Instant::now()),
                    _ => app.key_up(key.code),
                }
            }
        }

        next_frame += frame_time;
        app.frame(Instant::now());

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
