//! Pagemark CLI - Terminal viewer for highlighting paged documents

mod cursor;
mod io;
mod store;
mod ui;
mod view;

use std::io::stdout;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{error, info};

use pagemark_core::{AnnotationStore, InteractionEvent, Mode, Outcome, Tool};

use crate::store::JsonFileStore;
use crate::view::{Focus, Viewer};

fn main() -> Result<()> {
    // Get file path from args
    let args: Vec<String> = std::env::args().collect();
    let Some(file_path) = args.get(1) else {
        bail!("Usage: pagemark <document.xhtml>");
    };

    let log_path = io::init_logging()?;
    let config = io::load_config()?;
    let source = io::load_file(file_path)?;
    let store = JsonFileStore::new(io::store_path()?);
    info!(document = %source.document_id, log = %log_path.display(), "opening document");

    let mut viewer = Viewer::open(&source.markup, &source.title, &source.document_id, store, config)?;
    let groups = viewer.app.stored_groups().len();
    viewer.set_status(&format!("Loaded {} ({} stored highlights)", file_path, groups));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut viewer);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        error!(error = %e, "viewer stopped");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: Backend, S: AnnotationStore>(terminal: &mut Terminal<B>, viewer: &mut Viewer<S>) -> Result<()> {
    while viewer.running {
        terminal.draw(|f| ui::draw(f, viewer))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Clear status on any key
            viewer.clear_status();

            if viewer.show_help {
                viewer.show_help = false;
            } else if viewer.selection_start.is_some() {
                handle_selection(viewer, key.code);
            } else if viewer.focus == Focus::Sidebar {
                handle_sidebar(viewer, key.code);
            } else {
                handle_pages(viewer, key.code)?;
            }
        }
    }
    Ok(())
}

fn handle_pages<S: AnnotationStore>(viewer: &mut Viewer<S>, code: KeyCode) -> Result<()> {
    match code {
        KeyCode::Char('q') => viewer.running = false,
        KeyCode::Char('?') => viewer.show_help = true,
        KeyCode::Tab => viewer.toggle_focus(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => viewer.cursor.move_down(),
        KeyCode::Char('k') | KeyCode::Up => viewer.cursor.move_up(),
        KeyCode::Char('h') | KeyCode::Left => viewer.cursor.move_left(),
        KeyCode::Char('l') | KeyCode::Right => viewer.cursor.move_right(),
        KeyCode::Char('w') => viewer.cursor.move_word_forward(),
        KeyCode::Char('b') => viewer.cursor.move_word_back(),
        KeyCode::Char('0') | KeyCode::Home => viewer.cursor.move_to_start(),
        KeyCode::Char('$') | KeyCode::End => viewer.cursor.move_to_end(),
        KeyCode::Char('g') => viewer.cursor.move_to_top(),
        KeyCode::Char('G') => viewer.cursor.move_to_bottom(),

        // Tools
        KeyCode::Char('1') => toggle_tool(viewer, Tool::Highlight),
        KeyCode::Char('2') => toggle_tool(viewer, Tool::Erase),
        KeyCode::Char('3') => toggle_tool(viewer, Tool::Draw),
        KeyCode::Char('4') => toggle_tool(viewer, Tool::Text),
        KeyCode::Char('c') => {
            let config = viewer.app.config().clone();
            if let Some(color) = viewer.app.session.cycle_color(&config, Tool::Highlight) {
                let msg = format!("Highlight colour: {}", color);
                viewer.set_status(&msg);
            }
        }

        KeyCode::Char('v') => viewer.start_selection(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            if viewer.app.session.mode != Mode::Erasing {
                viewer.set_status("Press v to select text, or 2 to erase");
            } else if let Some(point) = viewer.hit_point() {
                match viewer.app.handle(InteractionEvent::EraseAt(point)) {
                    Outcome::Erased(id) => viewer.set_status(&format!("Erased {}", id)),
                    _ => viewer.set_status("No highlight under cursor"),
                }
            }
        }

        KeyCode::Char('X') => match viewer.app.handle(InteractionEvent::EraseAll) {
            Outcome::ErasedAll(count) => viewer.set_status(&format!("Erased {} highlights", count)),
            _ => viewer.set_status("Nothing erased"),
        },
        KeyCode::Char('R') => {
            let restored = viewer.render_pages()?;
            viewer.set_status(&format!("Re-rendered, restored {} highlights", restored));
        }

        _ => {}
    }
    Ok(())
}

fn handle_selection<S: AnnotationStore>(viewer: &mut Viewer<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => viewer.cancel_selection(),
        KeyCode::Char('j') | KeyCode::Down => viewer.cursor.move_down(),
        KeyCode::Char('k') | KeyCode::Up => viewer.cursor.move_up(),
        KeyCode::Char('h') | KeyCode::Left => viewer.cursor.move_left(),
        KeyCode::Char('l') | KeyCode::Right => viewer.cursor.move_right(),
        KeyCode::Char('w') => viewer.cursor.move_word_forward(),
        KeyCode::Char('b') => viewer.cursor.move_word_back(),
        KeyCode::Char('$') | KeyCode::End => viewer.cursor.move_to_end(),
        KeyCode::Enter | KeyCode::Char('a') => {
            if viewer.app.session.mode != Mode::Highlighting {
                viewer.cancel_selection();
                viewer.set_status("Press 1 to enter highlight mode first");
                return;
            }
            let Some(range) = viewer.take_selection() else {
                viewer.set_status("Empty selection");
                return;
            };
            match viewer.app.handle(InteractionEvent::SelectionCommit(range)) {
                Outcome::Highlighted(id) => viewer.set_status(&format!("Highlighted as {}", id)),
                _ => viewer.set_status("Highlight not saved"),
            }
        }
        _ => {}
    }
}

fn handle_sidebar<S: AnnotationStore>(viewer: &mut Viewer<S>, code: KeyCode) {
    match code {
        KeyCode::Char('q') => viewer.running = false,
        KeyCode::Char('?') => viewer.show_help = true,
        KeyCode::Tab | KeyCode::Esc => viewer.toggle_focus(),
        KeyCode::Char('j') | KeyCode::Down => viewer.next_group(),
        KeyCode::Char('k') | KeyCode::Up => viewer.prev_group(),
        KeyCode::Char('d') => {
            if viewer.erase_selected_group() {
                viewer.set_status("Highlight erased");
            }
        }
        _ => {}
    }
}

fn toggle_tool<S: AnnotationStore>(viewer: &mut Viewer<S>, tool: Tool) {
    match viewer.app.handle(InteractionEvent::ToolToggled(tool)) {
        Outcome::ModeChanged(Mode::Idle) => viewer.set_status("Idle"),
        Outcome::ModeChanged(_) => {
            let msg = format!("{} mode", tool.as_str());
            viewer.set_status(&msg);
        }
        Outcome::Rejected(e) => viewer.set_status(&e.to_string()),
        _ => {}
    }
}
