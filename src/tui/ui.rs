//! UI rendering for the player.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
    style::{Color, Style, Modifier},
};
use crate::cpu::display::{Display, HEIGHT, WIDTH};
use super::app::PlayerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PlayerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(WIDTH as u16 + 2),
            Constraint::Min(30),
        ])
        .split(frame.area());

    // Left side: the screen and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEIGHT as u16 / 2 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    draw_screen(frame, left_chunks[0], app);
    draw_status(frame, left_chunks[1], app);

    // Right side: registers and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),
            Constraint::Length(6),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Pack two pixel rows into one line of half-block characters.
pub fn screen_lines(display: &Display) -> Vec<String> {
    (0..HEIGHT)
        .step_by(2)
        .map(|y| {
            (0..WIDTH)
                .map(|x| match (display.pixel(x, y), display.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

/// Draw the framebuffer.
fn draw_screen(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    let lines: Vec<Line> = screen_lines(&app.cpu.display)
        .into_iter()
        .map(Line::from)
        .collect();

    let border = if app.cpu.sound_active() { Color::Yellow } else { Color::Cyan };

    let screen = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(format!(" {} ", app.rom.name))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)));

    frame.render_widget(screen, area);
}

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    let regs = &app.cpu.regs;
    let v = regs.all();

    let mut content: Vec<Line> = (0..4)
        .map(|row| {
            let spans: Vec<Span> = (0..4)
                .map(|col| {
                    let n = row * 4 + col;
                    Span::raw(format!("V{:X}={:02X}  ", n, v[n]))
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::raw("PC: "),
        Span::styled(format!("{:03X}", regs.pc), Style::default().fg(Color::Yellow)),
        Span::raw("   I: "),
        Span::styled(format!("{:03X}", regs.i()), Style::default().fg(Color::White)),
    ]));
    content.push(Line::from(vec![
        Span::raw("DT: "),
        Span::raw(format!("{:02X}", regs.delay)),
        Span::raw("    ST: "),
        Span::raw(format!("{:02X}", regs.sound)),
        Span::raw("   SP: "),
        Span::raw(format!("{}", app.cpu.stack.depth())),
    ]));
    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
    ]));
    content.push(Line::from(vec![
        Span::raw("State: "),
        Span::styled(app.state_label(),
            if app.cpu.is_halted() {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            }),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("Keypad: 1234 / qwer / asdf / zxcv"),
        Line::from("Space: Pause  Backspace: Reset"),
        Line::from("Esc: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
