use std::error::Error;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::warn;

use crate::auth::session::SessionGate;
use crate::cli::handlers;
use crate::engine::state::ViewState;
use crate::engine::sync::Engine;
use crate::io::{config_io, logging};
use crate::model::todo::Todo;

use super::input;
use super::render;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing a new todo into the input row
    Insert,
    /// Editing the selected todo's text in place
    Edit,
}

/// Transient edit state, scoped to one todo. Rows edit independently; a
/// failed save keeps the buffer so the user can retry or cancel.
#[derive(Debug, Clone)]
pub struct EditState {
    pub id: i64,
    pub buffer: String,
    /// True while waiting for the save to resolve
    pub submitted: bool,
}

/// Completion notices from spawned engine operations back to the event
/// loop. Snapshots alone cannot distinguish "not started yet" from "already
/// finished", so the spawned task reports explicitly.
#[derive(Debug, Clone, Copy)]
pub enum UiEvent {
    AddFinished { ok: bool },
    EditFinished { id: i64, ok: bool },
}

/// TUI state: a consumer of engine snapshots plus its own cursor/buffers.
pub struct App {
    pub engine: Engine,
    pub session: Rc<SessionGate>,
    pub view: ViewState,
    pub mode: Mode,
    pub cursor: usize,
    /// Input row buffer for new todos
    pub input: String,
    /// True while an add is waiting on the server (input clears on success)
    pub add_in_flight: bool,
    pub edit: Option<EditState>,
    pub should_quit: bool,
    events_tx: UnboundedSender<UiEvent>,
    events_rx: UnboundedReceiver<UiEvent>,
}

impl App {
    pub fn new(engine: Engine, session: Rc<SessionGate>) -> Self {
        let view = engine.snapshot();
        let (events_tx, events_rx) = unbounded_channel();
        App {
            engine,
            session,
            view,
            mode: Mode::Navigate,
            cursor: 0,
            input: String::new(),
            add_in_flight: false,
            edit: None,
            should_quit: false,
            events_tx,
            events_rx,
        }
    }

    pub fn authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn selected(&self) -> Option<&Todo> {
        self.view.items.get(self.cursor)
    }

    /// Drain completion notices, then pull a fresh snapshot: the input
    /// clears only after a confirmed add, edit mode survives a failed save.
    pub fn refresh(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                UiEvent::AddFinished { ok } => {
                    self.add_in_flight = false;
                    if ok {
                        self.input.clear();
                        self.mode = Mode::Navigate;
                    }
                }
                UiEvent::EditFinished { id, ok } => {
                    if let Some(edit) = self.edit.as_mut() {
                        if edit.id == id {
                            if ok {
                                self.edit = None;
                                self.mode = Mode::Navigate;
                            } else {
                                // stay in edit mode with the buffer intact
                                edit.submitted = false;
                            }
                        }
                    }
                }
            }
        }

        self.view = self.engine.snapshot();
        if !self.view.items.is_empty() && self.cursor >= self.view.items.len() {
            self.cursor = self.view.items.len() - 1;
        }
    }

    // -- intents, dispatched without blocking the event loop --

    pub fn submit_add(&mut self) {
        // the initial fetch and add share the global flag; the view keeps
        // the input inert while either is pending
        if self.add_in_flight || self.view.global_loading {
            return;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        self.add_in_flight = true;
        let engine = self.engine.clone();
        let tx = self.events_tx.clone();
        tokio::task::spawn_local(async move {
            let result = engine.add_todo(&text).await;
            if let Err(err) = &result {
                warn!(%err, "add rejected");
            }
            let ok = result.is_ok() && engine.snapshot().global_error.is_none();
            let _ = tx.send(UiEvent::AddFinished { ok });
        });
    }

    pub fn toggle_selected(&self) {
        if let Some(todo) = self.selected() {
            let id = todo.id;
            let engine = self.engine.clone();
            tokio::task::spawn_local(async move {
                if let Err(err) = engine.toggle_todo(id).await {
                    warn!(id, %err, "toggle rejected");
                }
            });
        }
    }

    pub fn delete_selected(&self) {
        if let Some(todo) = self.selected() {
            let id = todo.id;
            let engine = self.engine.clone();
            tokio::task::spawn_local(async move {
                if let Err(err) = engine.delete_todo(id).await {
                    warn!(id, %err, "delete rejected");
                }
            });
        }
    }

    pub fn begin_edit(&mut self) {
        if let Some(todo) = self.selected() {
            self.edit = Some(EditState {
                id: todo.id,
                buffer: todo.text.clone(),
                submitted: false,
            });
            self.mode = Mode::Edit;
        }
    }

    pub fn submit_edit(&mut self) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        if edit.submitted {
            return;
        }
        let text = edit.buffer.trim().to_string();
        if text.is_empty() {
            return;
        }
        edit.submitted = true;
        let id = edit.id;
        let engine = self.engine.clone();
        let tx = self.events_tx.clone();
        tokio::task::spawn_local(async move {
            let result = engine.edit_todo(id, &text).await;
            if let Err(err) = &result {
                warn!(id, %err, "edit rejected");
            }
            let ok = result.is_ok() && !engine.snapshot().item_errors.contains_key(&id);
            let _ = tx.send(UiEvent::EditFinished { id, ok });
        });
    }
}

/// Entry point: load config, establish a session, run the event loop on a
/// single-threaded runtime.
pub fn run(config_flag: Option<&str>) -> Result<(), Box<dyn Error>> {
    let path = handlers::config_path(config_flag)?;
    let config = handlers::load_config(&path)?;
    if let Ok(data_dir) = config_io::default_data_dir() {
        logging::init_tui_logging(&data_dir);
    }
    let (engine, session) = handlers::connect(&config)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    rt.block_on(local.run_until(event_loop(engine, session)))
}

async fn event_loop(engine: Engine, session: Rc<SessionGate>) -> Result<(), Box<dyn Error>> {
    session.init().await;

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(engine.clone(), session);
    if app.authenticated() {
        let engine = engine.clone();
        tokio::task::spawn_local(async move {
            let _ = engine.initialize().await;
        });
    }

    let result = run_loop(&mut terminal, &mut app).await;

    // late gateway resolutions must not touch the discarded state
    engine.close();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let mut events = EventStream::new();
    loop {
        app.refresh();
        terminal.draw(|frame| render::draw(frame, app))?;
        if app.should_quit {
            return Ok(());
        }

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Some(Ok(_)) => {} // resize etc: redraw on the next pass
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            // wake to reconcile in-flight operations into the view
            _ = tokio::time::sleep(Duration::from_millis(120)) => {}
        }
    }
}
