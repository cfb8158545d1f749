use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use polycell_config::Config;
use polycell_engine::{
    CellEditor, Cmd, EditorConfig, LanguageKind, PrivateNames, SwitchCommand, SwitchOutcome,
    TOGGLE_LANGUAGE_KEY, TransformContext, snap_to_char_boundary,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{env, io::stdout, path::PathBuf, process};

fn editor_config(config: &Config) -> EditorConfig {
    EditorConfig {
        history_limit: config.editor.history_limit,
        toggle_language_key: config.editor.toggle_language_key.clone(),
    }
}

fn toggle_key(editor_config: &EditorConfig) -> KeyCode {
    parse_key(&editor_config.toggle_language_key).unwrap_or_else(|| {
        log::warn!(
            "Unknown toggle key {:?}, using {TOGGLE_LANGUAGE_KEY}",
            editor_config.toggle_language_key
        );
        KeyCode::F(4)
    })
}

struct App {
    cell_path: PathBuf,
    editor: CellEditor,
    config: Config,
    editor_config: EditorConfig,
    toggle_key: KeyCode,
    status: String,
}

impl App {
    fn new(cell_path: PathBuf, config: Config) -> Result<Self> {
        let host = if cell_path.exists() {
            std::fs::read_to_string(&cell_path)
                .with_context(|| format!("Failed to read cell file {}", cell_path.display()))?
        } else {
            String::new()
        };

        let editor_config = editor_config(&config);
        let toggle_key = toggle_key(&editor_config);
        let engine = config.sql.default_engine.clone();
        let ctx = TransformContext::new(&PrivateNames, &engine)
            .with_dataframe_base(&config.sql.dataframe_base);
        let editor = CellEditor::from_config(&host, &ctx, &editor_config);
        log::info!("Opened {} as {}", cell_path.display(), editor.language());

        Ok(Self {
            cell_path,
            editor,
            config,
            editor_config,
            toggle_key,
            status: String::new(),
        })
    }

    fn switch_to(&mut self, target: LanguageKind) {
        let engine = self.config.sql.default_engine.clone();
        let ctx = TransformContext::new(&PrivateNames, &engine)
            .with_dataframe_base(&self.config.sql.dataframe_base);
        let outcome = self
            .editor
            .switch_language(SwitchCommand::transform(target), &ctx);
        self.report(outcome);
    }

    fn toggle(&mut self) {
        let engine = self.config.sql.default_engine.clone();
        let ctx = TransformContext::new(&PrivateNames, &engine)
            .with_dataframe_base(&self.config.sql.dataframe_base);
        let outcome = self.editor.toggle_language(&ctx);
        self.report(outcome);
    }

    fn report(&mut self, outcome: SwitchOutcome) {
        self.status = match outcome {
            SwitchOutcome::Unchanged => "No other language fits this cell".to_string(),
            SwitchOutcome::Switched => format!("Switched to {}", self.editor.language()),
            SwitchOutcome::FellBack => "Could not convert, cell is now python".to_string(),
        };
    }

    fn insert(&mut self, text: &str) {
        self.editor.apply(Cmd::InsertText {
            at: self.editor.cursor(),
            text: text.to_string(),
        });
    }

    fn backspace(&mut self) {
        let cursor = self.editor.cursor();
        if cursor == 0 {
            return;
        }
        let start = snap_to_char_boundary(&self.editor.text(), cursor - 1);
        self.editor.apply(Cmd::DeleteRange {
            range: start..cursor,
        });
    }

    fn move_cursor(&mut self, key: KeyCode) {
        let text = self.editor.text();
        let cursor = self.editor.cursor();
        let target = match key {
            KeyCode::Left => snap_to_char_boundary(&text, cursor.saturating_sub(1)),
            KeyCode::Right => next_char_boundary(&text, cursor),
            KeyCode::Up => vertical_move(&text, cursor, -1),
            KeyCode::Down => vertical_move(&text, cursor, 1),
            KeyCode::Home => line_start(&text, cursor),
            KeyCode::End => line_end(&text, cursor),
            _ => cursor,
        };
        self.editor.set_cursor(target);
    }

    fn save(&mut self) -> Result<()> {
        std::fs::write(&self.cell_path, self.editor.host_code())
            .with_context(|| format!("Failed to write {}", self.cell_path.display()))?;
        self.status = format!("Saved {}", self.cell_path.display());
        Ok(())
    }

    /// Returns `false` once the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == self.toggle_key {
            self.toggle();
            return Ok(true);
        }
        match key.code {
            KeyCode::Esc => return Ok(false),
            KeyCode::Char('q') if ctrl => return Ok(false),
            KeyCode::Char('s') if ctrl => self.save()?,
            KeyCode::Char('z') if ctrl => {
                if !self.editor.undo() {
                    self.status = "Nothing to undo".to_string();
                }
            }
            KeyCode::Char('y') if ctrl => {
                if !self.editor.redo() {
                    self.status = "Nothing to redo".to_string();
                }
            }
            KeyCode::F(5) => self.switch_to(LanguageKind::Python),
            KeyCode::F(6) => self.switch_to(LanguageKind::Markdown),
            KeyCode::F(7) => self.switch_to(LanguageKind::Sql),
            KeyCode::Char(c) if !ctrl => self.insert(c.encode_utf8(&mut [0; 4])),
            KeyCode::Tab => self.insert("    "),
            KeyCode::Enter => self.insert("\n"),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::Home
            | KeyCode::End => self.move_cursor(key.code),
            _ => {}
        }
        Ok(true)
    }
}

/// `F1`..`F12` or a single character
fn parse_key(name: &str) -> Option<KeyCode> {
    if let Some(number) = name.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        return (1..=12).contains(&number).then_some(KeyCode::F(number));
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeyCode::Char(c)),
        _ => None,
    }
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos.min(text.len())..]
        .chars()
        .next()
        .map_or(text.len(), |c| pos + c.len_utf8())
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

/// Cursor one line up or down, keeping the column where the line allows
fn vertical_move(text: &str, pos: usize, direction: i8) -> usize {
    let start = line_start(text, pos);
    let column = text[start..pos].chars().count();
    let target_start = if direction < 0 {
        if start == 0 {
            return pos;
        }
        line_start(text, start - 1)
    } else {
        let end = line_end(text, pos);
        if end == text.len() {
            return pos;
        }
        end + 1
    };
    let target_end = line_end(text, target_start);
    text[target_start..target_end]
        .char_indices()
        .nth(column)
        .map_or(target_end, |(i, _)| target_start + i)
}

/// Line and column (in characters) of a byte offset
fn line_and_column(text: &str, pos: usize) -> (usize, usize) {
    let before = &text[..pos];
    let line = before.matches('\n').count();
    let column = before[line_start(text, pos)..].chars().count();
    (line, column)
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <cell-file>", args[0]);
        process::exit(1);
    }
    let cell_path = PathBuf::from(&args[1]);

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let mut app = App::new(cell_path, config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)?
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Line::from(vec![
        Span::styled(
            format!(" {} ", app.editor.language()),
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}  ", app.cell_path.display())),
        Span::styled(app.status.clone(), Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(header), rows[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let text = app.editor.text();
    let document: Vec<Line> = text.split('\n').map(|l| Line::from(l.to_string())).collect();
    let surface = app.editor.editing_surface();
    let title = format!("Edit ({:?})", surface.highlighting);
    f.render_widget(
        Paragraph::new(document).block(Block::default().borders(Borders::ALL).title(title)),
        panels[0],
    );
    place_cursor(f, panels[0], &text, app.editor.cursor());

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(panels[1]);

    let host: Vec<Line> = app
        .editor
        .host_code()
        .split('\n')
        .map(|l| Line::from(l.to_string()))
        .collect();
    f.render_widget(
        Paragraph::new(host).block(Block::default().borders(Borders::ALL).title("Stored as")),
        side[0],
    );

    let metadata: Vec<Line> = app
        .editor
        .metadata()
        .iter()
        .map(|(key, value)| Line::from(format!("{key}: {value}")))
        .collect();
    f.render_widget(
        Paragraph::new(metadata).block(Block::default().borders(Borders::ALL).title("Metadata")),
        side[1],
    );

    let help = Line::from(vec![
        Span::raw(format!("{}: Toggle | ", app.editor_config.toggle_language_key)),
        Span::raw("F5/F6/F7: Python/Markdown/SQL | "),
        Span::raw("^Z/^Y: Undo/Redo | ^S: Save | Esc: Quit"),
    ]);
    f.render_widget(Paragraph::new(help), rows[2]);
}

fn place_cursor(f: &mut Frame, area: Rect, text: &str, cursor: usize) {
    let (line, column) = line_and_column(text, cursor);
    let x = area.x + 1 + column as u16;
    let y = area.y + 1 + line as u16;
    if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
        f.set_cursor_position((x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("F4", Some(KeyCode::F(4)))]
    #[case("F12", Some(KeyCode::F(12)))]
    #[case("F13", None)]
    #[case("t", Some(KeyCode::Char('t')))]
    #[case("Ctrl-t", None)]
    fn test_parse_key(#[case] name: &str, #[case] expected: Option<KeyCode>) {
        assert_eq!(parse_key(name), expected);
    }

    #[rstest]
    #[case("F2", KeyCode::F(2))]
    #[case("Hyper-x", KeyCode::F(4))]
    fn test_toggle_key_comes_from_editor_config(#[case] name: &str, #[case] expected: KeyCode) {
        let mut config = Config::default();
        config.editor.toggle_language_key = name.to_string();

        let editor_config = editor_config(&config);

        assert_eq!(editor_config.toggle_language_key, name);
        assert_eq!(toggle_key(&editor_config), expected);
    }

    #[test]
    fn test_vertical_move_keeps_column() {
        let text = "SELECT *\nFROM t\nWHERE x";

        assert_eq!(vertical_move(text, 7, 1), 15);
        assert_eq!(vertical_move(text, 11, 1), 18);
        assert_eq!(vertical_move(text, 11, -1), 2);
        assert_eq!(vertical_move(text, 2, -1), 2);
    }

    #[test]
    fn test_line_and_column_counts_characters() {
        assert_eq!(line_and_column("é\nab", 5), (1, 2));
        assert_eq!(line_and_column("éa", 3), (0, 2));
    }

    #[test]
    fn test_next_char_boundary() {
        assert_eq!(next_char_boundary("éa", 0), 2);
        assert_eq!(next_char_boundary("éa", 3), 3);
    }
}
