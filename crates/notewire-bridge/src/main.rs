//! notewire - MIDI + computer keyboard to serial bridge
//!
//! Reads events from a MIDI input device and from the computer keyboard,
//! encodes them into 3-byte frames and writes them to a serial port.

use anyhow::Result;
use clap::{Parser, Subcommand};
use notewire_bridge::FrameSink;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ratatui::prelude::*;
use std::collections::VecDeque;
use std::io::{self, stdout};
use std::time::Duration;

use notewire_bridge::{
    config::Config,
    keyboard::Keyboard,
    logger::{init_tui_logger, LogEntry},
    midi::MidiInputManager,
    os_keyboard::{is_available as os_keyboard_available, OsKeyEvent, OsKeyboardListener},
    router::Router,
    serial::{list_ports, SerialSink},
    ui::{push_log, render, UiState},
};
use notewire_proto::MidiEvent;

#[derive(Parser)]
#[command(name = "notewire")]
#[command(author, version, about = "MIDI + keyboard to serial bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/notewire/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Serial port path (default: last port of the sorted enumeration)
    #[arg(short, long)]
    port: Option<String>,

    /// Serial line rate in symbols/second
    #[arg(long)]
    baud: Option<u32>,

    /// MIDI input device name filter (default: first available device)
    #[arg(short, long)]
    device: Option<String>,

    /// Run without a MIDI input device (keyboard only)
    #[arg(long)]
    no_midi: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
    /// List available serial ports
    ListPorts,
    /// List available MIDI input devices
    ListDevices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            env_logger::init();
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            env_logger::init();
            let path = Config::config_path()?;
            println!("{}", path.display());
            return Ok(());
        }
        Some(Commands::ListPorts) => {
            env_logger::init();
            let ports = list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found");
            } else {
                println!("Available serial ports:");
                for port in ports {
                    println!("  {}", port);
                }
            }
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            env_logger::init();
            let devices = MidiInputManager::list_devices("notewire")?;
            if devices.is_empty() {
                println!("No MIDI input devices found");
            } else {
                println!("Available MIDI input devices:");
                for device in devices {
                    println!("  {}: {}", device.port_index, device.name);
                }
            }
            return Ok(());
        }
        None => {}
    }

    // Load config
    let mut config = if let Some(path) = cli.config {
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)?
    } else {
        Config::load_or_default()
    };

    // Apply CLI overrides
    if cli.port.is_some() {
        config.serial.port = cli.port;
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    if cli.device.is_some() {
        config.midi.device = cli.device;
    }

    run_tui(config, cli.no_midi)
}

fn run_tui(config: Config, no_midi: bool) -> Result<()> {
    let log_rx = init_tui_logger();

    // The sink and router come up before the terminal so that open errors
    // print normally
    let sink = SerialSink::open(&config.serial)?;
    let sink_name = sink.name().to_string();
    let router = Router::spawn(Box::new(sink));

    // MIDI is optional: without a device the keyboard still plays
    let mut midi = MidiInputManager::new(&config.midi);
    if !no_midi {
        let result = match &config.midi.device {
            Some(name) => midi.open_by_name(name, router.sender()),
            None => midi.open_first(router.sender()),
        };
        if let Err(e) = result {
            log::warn!("No MIDI input: {}", e);
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut keyboard = Keyboard::new(Duration::from_millis(config.keyboard.note_release_ms));

    // OS keyboard listener for reliable key release detection
    let os_keyboard = if os_keyboard_available() {
        OsKeyboardListener::new()
    } else {
        None
    };

    let result = run_event_loop(
        &mut terminal,
        &mut keyboard,
        &router,
        os_keyboard.as_ref(),
        log_rx,
        &config,
        &sink_name,
        midi.device().map(|d| d.name.clone()),
    );

    // Cleanup
    if enhanced {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;

    // Close the device, then let the router drain and surface any error
    midi.close();
    drop(os_keyboard);
    router.shutdown()?;

    result
}

#[allow(clippy::too_many_arguments)]
fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    keyboard: &mut Keyboard,
    router: &Router,
    os_keyboard: Option<&OsKeyboardListener>,
    log_rx: crossbeam_channel::Receiver<LogEntry>,
    config: &Config,
    sink_name: &str,
    midi_device: Option<String>,
) -> Result<()> {
    let line_label = config.serial.line_label();
    let mut log: VecDeque<LogEntry> = VecDeque::new();
    let mut has_focus = true;

    loop {
        // Collect new activity
        while let Ok(entry) = log_rx.try_recv() {
            push_log(&mut log, entry);
        }

        // Draw
        terminal.draw(|frame| {
            let state = UiState {
                keyboard,
                log: &log,
                sink_name,
                line_label: &line_label,
                midi_device: midi_device.as_deref(),
                os_keyboard_active: os_keyboard.is_some() && has_focus,
                theme: &config.theme,
            };
            render(frame, &state);
        })?;

        // The router dying means the serial line is gone; stop here and
        // let shutdown surface the error
        if router.is_stopped() {
            return Ok(());
        }

        // Process OS keyboard events only when focused
        if has_focus {
            if let Some(os_kb) = os_keyboard {
                while let Some(kb_event) = os_kb.try_recv() {
                    match kb_event {
                        OsKeyEvent::Press('\x1b') => {
                            send_all(router, keyboard.release_all());
                            return Ok(());
                        }
                        OsKeyEvent::Press(c) => {
                            if let Some(event) = keyboard.key_down(c) {
                                log::info!("Key down - {}", c.to_ascii_uppercase());
                                router.send(event);
                            }
                        }
                        OsKeyEvent::Release(c) => {
                            if let Some(event) = keyboard.key_up(c) {
                                log::info!("Key up - {}", c.to_ascii_uppercase());
                                router.send(event);
                            }
                        }
                    }
                }
            }
        } else if let Some(os_kb) = os_keyboard {
            // Drain OS keyboard events when not focused
            while os_kb.try_recv().is_some() {}
        }

        // Auto-release for terminals without key-up detection
        if os_keyboard.is_none() {
            send_all(router, keyboard.release_expired());
        }

        // Poll for terminal events
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::FocusGained => {
                    has_focus = true;
                }
                Event::FocusLost => {
                    has_focus = false;
                    // Release all notes when losing focus
                    send_all(router, keyboard.release_all());
                }
                Event::Key(key) => {
                    has_focus = true;

                    match (key.kind, key.code) {
                        (KeyEventKind::Press, KeyCode::Esc) => {
                            send_all(router, keyboard.release_all());
                            return Ok(());
                        }
                        (KeyEventKind::Press, KeyCode::Char('c'))
                            if key.modifiers.contains(KeyModifiers::CONTROL) =>
                        {
                            send_all(router, keyboard.release_all());
                            return Ok(());
                        }
                        // Terminal keyboard input only matters when the OS
                        // listener is not delivering the same keys
                        (KeyEventKind::Press, KeyCode::Char(c)) if os_keyboard.is_none() => {
                            if let Some(event) = keyboard.key_down(c) {
                                log::info!("Key down - {}", c.to_ascii_uppercase());
                                router.send(event);
                            }
                        }
                        (KeyEventKind::Repeat, KeyCode::Char(c)) if os_keyboard.is_none() => {
                            // Extend the auto-release window, no new event
                            keyboard.touch(c);
                        }
                        (KeyEventKind::Release, KeyCode::Char(c)) if os_keyboard.is_none() => {
                            if let Some(event) = keyboard.key_up(c) {
                                log::info!("Key up - {}", c.to_ascii_uppercase());
                                router.send(event);
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
}

fn send_all(router: &Router, events: Vec<MidiEvent>) {
    for event in events {
        router.send(event);
    }
}
