use anyhow::{bail, Context, Result};
use cadence_ipc::{
    read_message, write_message, Command, IpcError, Mode, Response, RunState, SOCKET_PATH,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tokio::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "cadencectl")]
#[command(about = "Control a running cadence timer", long_about = None)]
struct Cli {
    /// Socket the cadence UI listens on
    #[arg(long, global = true, default_value = SOCKET_PATH)]
    socket: PathBuf,

    /// Print the raw JSON response
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start, pause or reset depending on the current state
    Toggle,
    /// Stop and reload the current duration
    Cancel,
    /// Switch between a single timer and the phase cycle
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Set the remaining time while idle, as mm:ss or minutes
    Duration {
        #[arg(value_parser = parse_clock_arg)]
        time: u64,
    },
    /// Use a preset length for the single timer
    Preset { minutes: u32 },
    /// Edit the phase cycle
    Phase {
        #[command(subcommand)]
        action: PhaseAction,
    },
    /// Restart the cycle after the last phase
    Loop {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Chime at the end of each phase
    Sound {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Start a recent session again (1 is the newest)
    Replay { slot: usize },
    /// Show recent sessions, or forget one
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Show the phase cycle
    Phases,
    /// Show the timer state
    Status,
}

#[derive(Subcommand, Debug)]
enum PhaseAction {
    /// Append a phase
    Add {
        name: String,
        #[arg(default_value_t = 5)]
        minutes: u32,
    },
    /// Rename or retime a phase (1 is the first)
    Edit {
        position: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Remove a phase (1 is the first)
    Rm { position: usize },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Forget a recent session (1 is the newest)
    Delete { slot: usize },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ModeArg {
    Timer,
    Cycle,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Switch {
    On,
    Off,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Timer => Mode::Timer,
            ModeArg::Cycle => Mode::Cycle,
        }
    }
}

impl Commands {
    fn into_command(self) -> Result<Command> {
        let command = match self {
            Commands::Start => Command::Start,
            Commands::Pause => Command::Pause,
            Commands::Toggle => Command::Toggle,
            Commands::Cancel => Command::CancelOrReset,
            Commands::Mode { mode } => Command::SwitchMode { mode: mode.into() },
            Commands::Duration { time } => Command::EditDuration { seconds: time },
            Commands::Preset { minutes } => Command::SelectPreset { minutes },
            Commands::Phase { action } => match action {
                PhaseAction::Add { name, minutes } => Command::AddPhase { name, minutes },
                PhaseAction::Edit {
                    position,
                    name,
                    minutes,
                } => {
                    if name.is_none() && minutes.is_none() {
                        bail!("nothing to change: pass --name and/or --minutes");
                    }
                    Command::EditPhase {
                        index: zero_based(position)?,
                        name,
                        minutes,
                    }
                }
                PhaseAction::Rm { position } => Command::RemovePhase {
                    index: zero_based(position)?,
                },
            },
            Commands::Loop { state } => Command::SetLoop {
                enabled: state == Switch::On,
            },
            Commands::Sound { state } => Command::SetSound {
                enabled: state == Switch::On,
            },
            Commands::Replay { slot } => Command::ReplayHistory {
                index: zero_based(slot)?,
            },
            Commands::History { action: None } => Command::ListHistory,
            Commands::History {
                action: Some(HistoryAction::Delete { slot }),
            } => Command::DeleteHistory {
                index: zero_based(slot)?,
            },
            Commands::Phases => Command::ListPhases,
            Commands::Status => Command::Status,
        };
        Ok(command)
    }
}

fn zero_based(position: usize) -> Result<usize> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("positions start at 1"),
    }
}

/// `mm:ss` or a bare number of minutes.
fn parse_clock_arg(s: &str) -> Result<u64, String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<u64>()
            .map_err(|_| format!("'{}' is not a number", part))
    };
    let seconds = match s.split_once(':') {
        Some((minutes, seconds)) => parse(minutes)?
            .saturating_mul(60)
            .saturating_add(parse(seconds)?),
        None => parse(s)?.saturating_mul(60),
    };
    if seconds == 0 {
        return Err("duration must be longer than zero".to_string());
    }
    Ok(seconds)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.into_command()?;

    let response = send_command(&cli.socket, command).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        Response::Ok => println!("OK"),
        Response::Ignored { reason } => println!("Ignored: {}", reason),
        Response::Status(status) => {
            let state = match status.state {
                RunState::Idle => "idle",
                RunState::Running => "running",
                RunState::Paused => "paused",
                RunState::Finished => "finished",
            };
            println!("Mode: {:?}", status.mode);
            println!("State: {}", state);
            println!(
                "Time left: {} of {}",
                clock(status.time_left),
                clock(status.total_time)
            );
            if let (Some(index), Some(name)) = (status.phase_index, status.phase_name) {
                println!("Phase: {} ({})", name, index + 1);
            }
            println!(
                "Loop: {}  Sound: {}",
                on_off(status.loop_enabled),
                on_off(status.sound_enabled)
            );
        }
        Response::Phases(phases) => {
            let total = phases
                .iter()
                .fold(0u32, |total, p| total.saturating_add(p.minutes));
            for (i, phase) in phases.iter().enumerate() {
                println!("{}. {} ({}m)", i + 1, phase.name, phase.minutes);
            }
            println!("Total: {} min ({} phases)", total, phases.len());
        }
        Response::History(items) => {
            if items.is_empty() {
                println!("No recent sessions");
            }
            for (i, item) in items.iter().enumerate() {
                println!("{}. {}m {}", i + 1, item.total_minutes, item.label);
            }
        }
        Response::Error(e) => eprintln!("Error: {}", e),
    }

    Ok(())
}

fn clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

async fn send_command(socket: &Path, cmd: Command) -> Result<Response> {
    let stream = match UnixStream::connect(socket).await {
        Ok(stream) => stream,
        Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound) => {
            return Err(IpcError::ConnectionRefused.into());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to connect to {:?}", socket)),
    };
    let (reader, mut writer) = stream.into_split();

    write_message(&mut writer, &cmd).await?;
    let response = read_message(&mut BufReader::new(reader)).await?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Result<Command> {
        let mut argv = vec!["cadencectl"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.command.into_command()
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(
            command(&["replay", "1"]).unwrap(),
            Command::ReplayHistory { index: 0 }
        );
        assert_eq!(
            command(&["phase", "rm", "2"]).unwrap(),
            Command::RemovePhase { index: 1 }
        );
        assert!(command(&["history", "delete", "0"]).is_err());
    }

    #[test]
    fn duration_accepts_clock_or_minutes() {
        assert_eq!(
            command(&["duration", "1:30"]).unwrap(),
            Command::EditDuration { seconds: 90 }
        );
        assert_eq!(
            command(&["duration", "10"]).unwrap(),
            Command::EditDuration { seconds: 600 }
        );
        assert!(command(&["duration", "0:00"]).is_err());
        assert!(command(&["duration", "abc"]).is_err());
    }

    #[test]
    fn phase_edit_needs_a_change() {
        assert!(command(&["phase", "edit", "1"]).is_err());
        assert_eq!(
            command(&["phase", "edit", "1", "--minutes", "50"]).unwrap(),
            Command::EditPhase {
                index: 0,
                name: None,
                minutes: Some(50)
            }
        );
    }

    #[test]
    fn switches_and_modes_map_to_commands() {
        assert_eq!(
            command(&["mode", "cycle"]).unwrap(),
            Command::SwitchMode { mode: Mode::Cycle }
        );
        assert_eq!(
            command(&["loop", "off"]).unwrap(),
            Command::SetLoop { enabled: false }
        );
        assert_eq!(command(&["history"]).unwrap(), Command::ListHistory);
        assert_eq!(
            command(&["phase", "add", "Review"]).unwrap(),
            Command::AddPhase {
                name: "Review".into(),
                minutes: 5
            }
        );
    }
}
