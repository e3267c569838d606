use crossterm::{
    cursor,
    event::{self, KeyCode, KeyEvent, KeyModifiers},
    execute, queue, terminal,
};
use lifegrid::{LifeEngine, Pos2};
use std::io::{self, Write};

pub enum ConsoleCommand {
    Exit,
    TogglePause,
    StepBack,
    Handled,
}

/// Full-screen view onto the engine, panned with the arrow keys
pub struct ConsoleRender {
    tl: Pos2,
    report: String,
}
impl ConsoleRender {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), cursor::Hide)?;
        Ok(Self {
            tl: Pos2::default(),
            report: String::new(),
        })
    }

    pub fn render(&self, engine: &LifeEngine) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        // the last row holds the report
        let br = self.tl + Pos2::new(cols as i32, rows.saturating_sub(1) as i32);
        let max_state = engine.rule().max_state();

        let mut stdout = io::stdout();
        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
        for (cell, state) in engine.window(self.tl, br).iter() {
            let cell = cell - self.tl;
            queue!(stdout, cursor::MoveTo(cell.x as u16, cell.y as u16))?;
            let glyph = if state == max_state { "█" } else { "▒" };
            stdout.write_all(glyph.as_bytes())?;
        }

        queue!(stdout, cursor::MoveTo(0, rows.saturating_sub(1)))?;
        stdout.write_all(self.report.as_bytes())?;
        stdout.flush()
    }

    pub fn poll_events(&mut self) -> io::Result<Option<ConsoleCommand>> {
        if !event::poll(std::time::Duration::from_secs(0))? {
            return Ok(None);
        }

        let event::Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            return Ok(Some(ConsoleCommand::Handled));
        };
        let command = match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => ConsoleCommand::Exit,
            KeyCode::Char('q') | KeyCode::Esc => ConsoleCommand::Exit,
            KeyCode::Char(' ') => ConsoleCommand::TogglePause,
            KeyCode::Backspace | KeyCode::Char('b') => ConsoleCommand::StepBack,
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                match code {
                    KeyCode::Up => self.tl.y -= 1,
                    KeyCode::Down => self.tl.y += 1,
                    KeyCode::Left => self.tl.x -= 1,
                    _ => self.tl.x += 1,
                }
                ConsoleCommand::Handled
            }
            _ => ConsoleCommand::Handled,
        };
        Ok(Some(command))
    }

    pub fn set_report(&mut self, report: String) {
        self.report = report;
    }
}
impl Drop for ConsoleRender {
    fn drop(&mut self) {
        // nothing left to report to if restoring the terminal fails
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), cursor::Show);
    }
}
