//! REEL - Terminal Tape Deck
//!
//! Plays audio reels through a vintage tape transport: spinning spools,
//! mechanical winding noise, and a rack of gramophone-era coloration.

mod config;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};

use reel_audio::{
    DeckHandle, PlaybackEngine, SystemClock, TapeCommand, TapeDeck, TapeEvent, TapeLoader,
    TransportController,
};
use reel_input::{Command, InputHandler};
use reel_tui::{App, FxRackWidget, SpoolsWidget, Theme, TransportWidget};

use config::Config;

/// Frame rate for UI updates
const FPS: u64 = 30;

fn main() -> anyhow::Result<()> {
    let reels = parse_args()?;
    let app_config = Config::load();
    init_logging();

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (handle, command_rx, event_tx, shutdown) = DeckHandle::create_channels();

    // Spawn audio thread
    let audio_config = app_config.clone();
    let audio_handle = thread::spawn(move || {
        run_audio_thread(reels, audio_config, command_rx, event_tx, shutdown);
    });

    let result = run_app(&mut terminal, handle, &app_config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let _ = audio_handle.join();

    result
}

/// Collect the reel files from argv, keyed `reel_1`, `reel_2`, ...
fn parse_args() -> anyhow::Result<Vec<(String, PathBuf)>> {
    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: reel <audio-file>...");
    }
    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| (format!("reel_{}", i + 1), path))
        .collect())
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reel");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(log_dir.join("reel.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
}

fn run_audio_thread(
    reels: Vec<(String, PathBuf)>,
    app_config: Config,
    command_rx: Receiver<TapeCommand>,
    event_tx: Sender<TapeEvent>,
    shutdown: Arc<AtomicBool>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(d) => d,
        None => {
            let _ = event_tx.send(TapeEvent::Error("No audio output device found".into()));
            return;
        }
    };

    let stream_config = match device.default_output_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = event_tx.send(TapeEvent::Error(format!("Failed to get audio config: {e}")));
            return;
        }
    };

    let sample_rate = stream_config.sample_rate().0;
    let channels = stream_config.channels() as usize;

    // Load every reel up front; any failure aborts startup.
    let loader = TapeLoader::new(sample_rate);
    let assets = match loader.load_set(&reels) {
        Ok(assets) => assets,
        Err(e) => {
            tracing::error!(error = %e, "reel loading failed");
            let _ = event_tx.send(TapeEvent::Error(e.to_string()));
            return;
        }
    };

    let mut engine = PlaybackEngine::new(sample_rate, Box::new(SystemClock::new()));
    for asset in assets.into_values() {
        engine.insert_asset(asset);
    }
    engine.select(&reels[0].0);

    let controller = TransportController::new(
        engine,
        app_config.transport(),
        Box::new(SystemClock::new()),
    );
    let deck = Arc::new(Mutex::new(TapeDeck::new(controller)));
    let deck_for_callback = deck.clone();

    // Pre-allocated scratch for non-stereo outputs (no allocation in the
    // audio callback).
    let mut stereo_scratch = vec![0.0f32; 16384];

    let stream = device.build_output_stream(
        &stream_config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // try_lock: on contention, silence beats blocking the device.
            if let Some(mut deck) = deck_for_callback.try_lock() {
                if channels == 2 {
                    deck.render(data);
                } else {
                    let frames = data.len() / channels;
                    let stereo = &mut stereo_scratch[..frames * 2];
                    deck.render(stereo);
                    for (i, frame) in data.chunks_mut(channels).enumerate() {
                        let mono = (stereo[i * 2] + stereo[i * 2 + 1]) * 0.5;
                        for sample in frame.iter_mut() {
                            *sample = mono;
                        }
                    }
                }
            } else {
                data.fill(0.0);
            }
        },
        |err| {
            tracing::error!(error = %err, "audio stream error");
        },
        None,
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = event_tx.send(TapeEvent::Error(format!("Failed to create audio stream: {e}")));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = event_tx.send(TapeEvent::Error(format!("Failed to start audio: {e}")));
        return;
    }

    tracing::info!(sample_rate, channels, reels = reels.len(), "deck ready");

    let mut last_snapshot = Instant::now();
    let snapshot_interval = Duration::from_millis(33); // ~30fps

    while !shutdown.load(Ordering::Relaxed) {
        match command_rx.recv_timeout(Duration::from_millis(10)) {
            Ok(TapeCommand::Shutdown) => break,
            Ok(command) => deck.lock().handle_command(command),
            Err(_) => {}
        }

        {
            let mut deck = deck.lock();
            deck.tick();
            if last_snapshot.elapsed() >= snapshot_interval {
                let _ = event_tx.try_send(TapeEvent::Snapshot(Box::new(deck.snapshot())));
                last_snapshot = Instant::now();
            }
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: DeckHandle,
    app_config: &Config,
) -> anyhow::Result<()> {
    let mut app = App::new(Theme::by_name(&app_config.theme));
    let input_handler = InputHandler::new();

    let frame_duration = Duration::from_millis(1000 / FPS);
    let mut last_frame = Instant::now();

    loop {
        if app.should_quit {
            handle.send(TapeCommand::Shutdown);
            handle.shutdown();
            break;
        }

        while let Ok(event) = handle.events().try_recv() {
            app.handle_event(event);
        }

        terminal.draw(|frame| render_ui(frame, &app))?;

        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = input_handler.handle_key(key) {
                    dispatch(&mut app, &handle, command);
                }
            }
        }

        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        last_frame = Instant::now();
    }

    Ok(())
}

fn dispatch(app: &mut App, handle: &DeckHandle, command: Command) {
    if command == Command::Quit {
        app.should_quit = true;
        return;
    }
    // On the failure screen the deck is gone; only quit works.
    if app.failure.is_some() {
        return;
    }

    let tape_command = match command {
        Command::Play => TapeCommand::PressPlay,
        Command::Stop => TapeCommand::PressStop,
        Command::Rewind => TapeCommand::PressRewind,
        Command::FastForward => TapeCommand::PressFastForward,
        Command::SelectRate(rate) => TapeCommand::SelectRate(rate),
        Command::ToggleEffect(name) => TapeCommand::ToggleEffect(name),
        Command::AdjustMasterVolume(delta) => TapeCommand::AdjustMasterVolume(delta),
        Command::Quit => return,
    };
    handle.send(tape_command);
}

fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let theme = &app.theme;

    let background = ratatui::widgets::Block::default().style(theme.normal());
    frame.render_widget(background, area);

    if let Some(ref failure) = app.failure {
        render_failure(frame, area, theme, failure);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Title
        Constraint::Min(8),    // Spool window
        Constraint::Length(4), // Transport bar
        Constraint::Length(6), // Coloration rack
    ])
    .split(area);

    render_title(frame, chunks[0], theme);

    let Some(ref snapshot) = app.snapshot else {
        let waiting = Paragraph::new(Line::from(Span::styled("warming up...", theme.dim())));
        frame.render_widget(waiting, chunks[1]);
        return;
    };

    let progress = if snapshot.duration > 0.0 {
        snapshot.position / snapshot.duration
    } else {
        0.0
    };
    let spools = SpoolsWidget::new(theme)
        .angles(snapshot.spool_angles.0, snapshot.spool_angles.1)
        .progress(progress);
    frame.render_widget(spools, chunks[1]);

    let transport = TransportWidget::new(theme)
        .buttons(snapshot.buttons)
        .readout(&snapshot.readout)
        .selected_rate(snapshot.selected_rate);
    frame.render_widget(transport, chunks[2]);

    let fx = FxRackWidget::new(theme)
        .effects(snapshot.crackle, snapshot.gramophone, snapshot.echo)
        .master_volume(snapshot.master_volume);
    frame.render_widget(fx, chunks[3]);
}

fn render_title(frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    let title = " REEL - Tape Deck ";
    let width = area.width as usize;
    let pad = width.saturating_sub(title.len()) / 2;
    let rest = width.saturating_sub(pad + title.len());
    let padded = format!("{:═<pad$}{}{:═<rest$}", "", title, "");

    let line = Line::from(Span::styled(padded, theme.title()));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_failure(frame: &mut ratatui::Frame, area: Rect, theme: &Theme, failure: &str) {
    let lines = vec![
        Line::from(Span::styled("REEL JAMMED", theme.danger_style())),
        Line::from(""),
        Line::from(Span::styled(failure.to_string(), theme.normal())),
        Line::from(""),
        Line::from(Span::styled("press q to quit", theme.dim())),
    ];
    let y = area.y + area.height.saturating_sub(5) / 2;
    let message_area = Rect::new(area.x, y, area.width, 5.min(area.height));
    frame.render_widget(
        Paragraph::new(lines).alignment(ratatui::layout::Alignment::Center),
        message_area,
    );
}
