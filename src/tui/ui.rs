//! UI rendering for the terminal frontend.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
    style::{Color, Style},
};
use crate::cpu::display::{Framebuffer, HEIGHT, WIDTH};
use crate::cpu::{Cpu, CpuState};

/// Main draw function.
pub fn draw(frame: &mut Frame, cpu: &Cpu) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEIGHT as u16 / 2 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let screen = Rect {
        width: chunks[0].width.min(WIDTH as u16 + 2),
        ..chunks[0]
    };
    draw_screen(frame, screen, cpu.framebuffer());
    draw_status(frame, chunks[1], cpu);
}

/// Pack two framebuffer rows into one line of half-block glyphs.
pub(crate) fn screen_lines(fb: &Framebuffer) -> Vec<String> {
    (0..HEIGHT)
        .step_by(2)
        .map(|y| {
            (0..WIDTH)
                .map(|x| match (fb.pixel(x, y), fb.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

fn draw_screen(frame: &mut Frame, area: Rect, fb: &Framebuffer) {
    let lines: Vec<Line> = screen_lines(fb).into_iter().map(Line::from).collect();

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .block(Block::default()
            .title(" CHIP-8 ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, cpu: &Cpu) {
    let state_style = match cpu.state {
        CpuState::Running => Style::default().fg(Color::Green),
        CpuState::AwaitingKey { .. } => Style::default().fg(Color::Yellow),
        CpuState::Faulted => Style::default().fg(Color::Red),
    };

    let content = Line::from(vec![
        Span::raw(format!("PC: {:03X}  I: {:03X}  ", cpu.regs.pc, cpu.regs.i)),
        Span::styled(format!("{:?}", cpu.state), state_style),
        Span::raw("   Esc: quit"),
    ]);

    let status = Paragraph::new(content)
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}
