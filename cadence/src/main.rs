use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cadence::config::load_config;
use cadence::ipc::{self, Request};
use cadence::persistence::{self, FileStore, MemoryStore, Store};
use cadence::{DesktopSignal, SessionController};

mod app;
mod ui;

use app::{App, InputMode};

fn main() -> Result<()> {
    let config = load_config()?;
    init_tracing();

    let store: Box<dyn Store> = match FileStore::open_default() {
        Ok(store) => {
            info!("Persisting to {:?}", store.dir());
            Box::new(store)
        }
        Err(e) => {
            warn!("No data directory ({}); nothing will be saved", e);
            Box::new(MemoryStore::new())
        }
    };
    let session = SessionController::new(
        store,
        Box::new(DesktopSignal),
        config.session_settings(),
    );

    let (tx, rx) = mpsc::channel::<Request>(32);
    spawn_ipc_server(config.socket_path.clone(), tx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(session, config);
    let res = run_app(&mut terminal, app, rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing() {
    let Ok(dir) = persistence::data_dir() else {
        return;
    };
    let file = match std::fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("cadence.log"))
    }) {
        Ok(file) => file,
        Err(_) => return,
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
}

fn spawn_ipc_server(socket_path: PathBuf, tx: mpsc::Sender<Request>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new().context("Failed to start IPC runtime") {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("{:#}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(ipc::server::serve(&socket_path, tx)) {
            error!("IPC server stopped: {:#}", e);
        }
    });
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut requests: mpsc::Receiver<Request>,
) -> Result<()> {
    loop {
        app.advance_clock(Instant::now());
        while let Ok(request) = requests.try_recv() {
            app.handle_request(request);
        }

        terminal.draw(|f| ui::draw(f, &app))?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code);
                }
            }
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match app.mode {
        InputMode::Normal => match code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char(' ') => app.toggle(),
            KeyCode::Char('r') => app.cancel_or_reset(),
            KeyCode::Char(c @ '1'..='5') => {
                if let Some(slot) = c.to_digit(10) {
                    app.replay_slot(slot as usize);
                }
            }
            KeyCode::Char('m') => app.switch_mode(),
            KeyCode::Char('e') => app.begin_input(InputMode::EditingDuration),
            KeyCode::Char('p') => app.next_preset(),
            KeyCode::Char('a') => app.begin_input(InputMode::AddingPhase),
            KeyCode::Char('n') => app.begin_input(InputMode::RenamingPhase(app.selected_phase)),
            KeyCode::Char('t') => app.begin_input(InputMode::RetimingPhase(app.selected_phase)),
            KeyCode::Char('d') => app.delete_selected_phase(),
            KeyCode::Char('x') => {
                if !app.session.history().is_empty() {
                    app.mode = InputMode::DeletingHistory;
                }
            }
            KeyCode::Char('l') => app.toggle_loop(),
            KeyCode::Char('s') => app.toggle_sound(),
            KeyCode::Char('?') => app.mode = InputMode::ShowHelp,
            KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),
            _ => {}
        },
        InputMode::ShowHelp => {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.mode = InputMode::Normal;
            }
        }
        InputMode::DeletingHistory => match code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Char(c) => app.handle_char(c),
            _ => {}
        },
        _ => match code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Enter => app.handle_char('\n'),
            KeyCode::Backspace => app.handle_backspace(),
            KeyCode::Char(c) => app.handle_char(c),
            _ => {}
        },
    }
}
