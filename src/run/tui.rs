use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::config::AppConfig;
use crate::finance::parse_input_amount;
use crate::ui::app::{App, InputMode, PendingAction, Screen, BUDGET_COLUMNS, TARGET_COLUMN};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};
use crate::workbook::Workbook;

pub(crate) fn as_tui(config: AppConfig) -> Result<()> {
    let mut wb = super::ready(&config)?;
    let mut app = App::new(config, wb.describe());
    app.refresh_all(&mut wb)?;
    tracing::info!(source = %app.source, "starting TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut wb);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "TUI exited with an error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    wb: &mut Workbook,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // Tab, status and command bars
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            let handled = match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, wb),
                InputMode::Command => handle_command_input(key, app, wb),
                InputMode::Editing => handle_editing_input(key, app),
                InputMode::Confirm => handle_confirm_input(key, app, wb),
            };
            // A failed read or write is reported and the session carries on
            if let Err(e) = handled {
                tracing::error!(error = %format!("{e:#}"), "command failed");
                app.input_mode = InputMode::Normal;
                app.set_status(format!("Error: {e:#}"));
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: KeyEvent, app: &mut App, wb: &mut Workbook) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            commands::handle_command("q", app, wb)?;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..page(app) / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..page(app) / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char('q') => commands::handle_command("q", app, wb)?,
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('1') => switch_screen(app, wb, Screen::Dashboard)?,
        KeyCode::Char('2') => switch_screen(app, wb, Screen::Budgets)?,
        KeyCode::Char('3') => switch_screen(app, wb, Screen::Spending)?,
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            switch_screen(app, wb, screens[next])?;
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, wb, screens[prev])?;
        }
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('r') => commands::handle_command("refresh", app, wb)?,
        KeyCode::Esc => app.status_message.clear(),

        // Dashboard
        KeyCode::Char('v') if app.screen == Screen::Dashboard => {
            commands::handle_command("verse", app, wb)?;
        }
        KeyCode::Char('m') if app.screen == Screen::Dashboard => {
            commands::handle_command("mode toggle", app, wb)?;
        }

        // Budget editor
        KeyCode::Char('h') | KeyCode::Left if app.screen == Screen::Budgets => {
            app.budget_column = app.budget_column.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right if app.screen == Screen::Budgets => {
            if app.budget_column + 1 < BUDGET_COLUMNS {
                app.budget_column += 1;
            }
        }
        KeyCode::Enter if app.screen == Screen::Budgets => {
            if let Some(text) = app.selected_cell_text() {
                app.command_input = text;
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('s') if app.screen == Screen::Budgets => {
            commands::handle_command("scenario toggle", app, wb)?;
        }
        KeyCode::Char('w') if app.screen == Screen::Budgets => {
            commands::handle_command("save", app, wb)?;
        }
        KeyCode::Char('u') if app.screen == Screen::Budgets => {
            commands::handle_command("discard", app, wb)?;
        }
        KeyCode::Char('a') if app.screen == Screen::Budgets => {
            start_command(app, "add-category ");
        }

        // Daily spending
        KeyCode::Char('a') if app.screen == Screen::Spending => {
            start_command(app, "add ");
        }
        KeyCode::Char('H') if app.screen == Screen::Spending => {
            commands::handle_command("prev-month", app, wb)?;
        }
        KeyCode::Char('L') if app.screen == Screen::Spending => {
            commands::handle_command("next-month", app, wb)?;
        }
        KeyCode::Char('c') if app.screen == Screen::Spending => {
            commands::handle_command("clear-filters", app, wb)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Spending => {
            commands::handle_command("export", app, wb)?;
        }
        _ => {}
    }
    Ok(())
}

fn start_command(app: &mut App, prefix: &str) {
    app.command_input = prefix.to_string();
    app.input_mode = InputMode::Command;
}

fn handle_command_input(key: KeyEvent, app: &mut App, wb: &mut Workbook) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, wb)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Typing a new value into the selected budget cell. An empty value clears
/// the monthly target, or zeroes a check.
fn handle_editing_input(key: KeyEvent, app: &mut App) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.trim().to_string();
            app.command_input.clear();
            app.input_mode = InputMode::Normal;

            let value = if input.is_empty() {
                None
            } else {
                match parse_input_amount(&input) {
                    Ok(v) => Some(v),
                    Err(msg) => {
                        app.set_status(msg);
                        return Ok(());
                    }
                }
            };
            if app.set_selected_cell(value) {
                let column = if app.budget_column == TARGET_COLUMN {
                    "Monthly_Target"
                } else {
                    app.scenario.check_columns()[app.budget_column]
                };
                let category = app
                    .draft
                    .get(app.budget_index)
                    .map(|r| r.category.clone())
                    .unwrap_or_default();
                app.set_status(format!(
                    "{category} {column} = {} ({} unsaved, w to save)",
                    app.selected_cell_text().unwrap_or_default(),
                    app.dirty_cells()
                ));
            }
        }
        KeyCode::Esc => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.command_input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: KeyEvent, app: &mut App, wb: &mut Workbook) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            if let Some(action) = app.pending_action.take() {
                match action {
                    PendingAction::DiscardDraft => {
                        app.reset_draft();
                        app.set_status("Discarded budget edits");
                    }
                    PendingAction::QuitWithDraft => {
                        app.running = false;
                    }
                    PendingAction::ReloadBudgets => {
                        app.budgets = wb.budgets()?;
                        app.reset_draft();
                        app.set_status("Reloaded budgets from the sheet");
                    }
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, wb: &mut Workbook, screen: Screen) -> Result<()> {
    app.screen = screen;
    app.refresh_current(wb)?;
    app.set_status(format!("{screen}"));
    Ok(())
}

/// List rows visible on the current screen.
fn page(app: &App) -> usize {
    let chrome = match app.screen {
        // Borders, header and totals row
        Screen::Budgets => 4,
        // Filter panel and list borders
        Screen::Spending => 5,
        Screen::Dashboard => 0,
    };
    app.visible_rows.saturating_sub(chrome).max(1)
}

fn handle_move_down(app: &mut App) {
    let page = page(app);
    match app.screen {
        Screen::Budgets => {
            let len = app.draft.len();
            scroll_down(&mut app.budget_index, &mut app.budget_scroll, len, page);
        }
        Screen::Spending => {
            let len = app.filtered_spending().len();
            scroll_down(&mut app.spending_index, &mut app.spending_scroll, len, page);
        }
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Budgets => scroll_up(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Spending => scroll_up(&mut app.spending_index, &mut app.spending_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Budgets => scroll_to_top(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Spending => scroll_to_top(&mut app.spending_index, &mut app.spending_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = page(app);
    match app.screen {
        Screen::Budgets => {
            let len = app.draft.len();
            scroll_to_bottom(&mut app.budget_index, &mut app.budget_scroll, len, page);
        }
        Screen::Spending => {
            let len = app.filtered_spending().len();
            scroll_to_bottom(&mut app.spending_index, &mut app.spending_scroll, len, page);
        }
        Screen::Dashboard => {}
    }
}
