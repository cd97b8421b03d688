use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use relaycode::app::{App, Focus, InputMode, StatusLevel};
use relaycode::config;
use relaycode::infrastructure::chain::{CallSigner, CommandSigner};
use relaycode::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
use relaycode::ui;

const DEFAULT_ENDPOINT: &str = "wss://rpc.polkadot.io";

#[derive(Debug, Parser)]
#[command(
    name = "relaycode",
    version,
    about = "Relaycode: a Substrate extrinsic builder TUI"
)]
struct Args {
    /// Node endpoint (e.g. wss://rpc.polkadot.io or http://localhost:9933).
    /// Takes precedence over configured endpoints.
    #[arg(long)]
    url: Option<String>,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = config::load();
    let (endpoints, labels) = endpoints_from_args_and_config(&args, &config);

    let signer: Option<Arc<dyn CallSigner>> = config.account.as_ref().and_then(|account| {
        account.sign_command.as_ref().map(|command| {
            Arc::new(CommandSigner::new(account.address.clone(), command.clone()))
                as Arc<dyn CallSigner>
        })
    });

    let mut app = App::new(endpoints.clone(), labels, config.account.clone());
    app.set_status("Connecting…", StatusLevel::Info);

    let runtime = RuntimeBridge::new(endpoints, app.initial_token(), signer)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_runtime(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &mut app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        pump_runtime(&mut app, &runtime);
    }
}

fn pump_runtime(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::Connected {
                token,
                endpoint_index,
                endpoint,
                chain,
                spec_version,
                metadata,
            } => app.apply_connected(token, endpoint_index, endpoint, chain, spec_version, metadata),
            RuntimeEvent::ConnectFailed { token, message } => {
                app.apply_connect_failed(token, message)
            }
            RuntimeEvent::Submitted { hash } => app.apply_submitted(hash),
            RuntimeEvent::SubmitFailed { message } => app.apply_submit_failed(message),
        }
    }

    if let Some((index, token)) = app.take_switch_request() {
        let _ = runtime.send(RuntimeCommand::SwitchEndpoint { index, token });
    }
    if let Some(token) = app.take_refresh_request() {
        let _ = runtime.send(RuntimeCommand::Refresh { token });
    }
    if let Some(call) = app.take_submit_request() {
        let _ = runtime.send(RuntimeCommand::Submit { call });
    }
}

fn endpoints_from_args_and_config(
    args: &Args,
    config: &config::Config,
) -> (Vec<String>, Vec<String>) {
    let mut endpoints = Vec::new();
    let mut labels = Vec::new();

    if let Some(url) = args.url.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        endpoints.push(url.to_string());
        labels.push(format!("cli ({url})"));
    }

    for entry in &config.endpoints {
        let url = entry.url.trim();
        if url.is_empty() || endpoints.iter().any(|e| e == url) {
            continue;
        }
        endpoints.push(url.to_string());
        labels.push(entry.label());
    }

    if endpoints.is_empty() {
        endpoints.push(DEFAULT_ENDPOINT.to_string());
        labels.push(DEFAULT_ENDPOINT.to_string());
    }

    (endpoints, labels)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::EditArg => handle_arg_edit_mode(app, key),
        InputMode::EditHex => handle_hex_edit_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => app.should_quit = true,
        (KeyCode::Char('c'), mods) if mods.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        (KeyCode::Char('?'), _) => app.help_open = true,
        (KeyCode::Tab, _) => app.cycle_focus(),
        (KeyCode::Up | KeyCode::Char('k'), _) => app.move_up(),
        (KeyCode::Down | KeyCode::Char('j'), _) => app.move_down(),
        (KeyCode::Enter, _) => app.select_current(),
        (KeyCode::Char('i'), _) => {
            if app.focus == Focus::Args {
                app.begin_arg_edit();
            }
        }
        (KeyCode::Char('e'), _) => app.toggle_editing(),
        (KeyCode::Char('y'), _) => copy_call_data(app),
        (KeyCode::Char('s'), _) => app.request_submit(),
        (KeyCode::Char('['), _) => app.cycle_endpoint(false),
        (KeyCode::Char(']'), _) => app.cycle_endpoint(true),
        (KeyCode::Char('r'), _) => app.refresh(),
        (KeyCode::Esc, _) => app.status = None,
        _ => {}
    }
}

fn handle_arg_edit_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => app.finish_edit(),
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.input_char(ch);
        }
        _ => {}
    }
}

fn handle_hex_edit_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.finish_edit(),
        KeyCode::Enter => app.commit_hex_edit(),
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.input_char(ch);
        }
        _ => {}
    }
}

fn copy_call_data(app: &mut App) {
    use arboard::Clipboard;

    let Some(text) = app.call_data_hex() else {
        app.set_status("Nothing to copy", StatusLevel::Warn);
        return;
    };
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.set_status(format!("Copied {text}"), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(_) => app.set_status("Clipboard not available", StatusLevel::Error),
    }
}
