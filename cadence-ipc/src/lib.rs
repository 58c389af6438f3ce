//! Inter-process communication between cadence and cadencectl
//!
//! We use Unix domain sockets for local IPC - they're fast, secure,
//! and perfect for this use case. Every message is one line of JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Commands that cadencectl can send to cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Pause,
    /// Primary action: start, pause or reset depending on the run state
    Toggle,
    CancelOrReset,
    SwitchMode { mode: Mode },
    EditDuration { seconds: u64 },
    SelectPreset { minutes: u32 },
    AddPhase { name: String, minutes: u32 },
    EditPhase {
        index: usize,
        name: Option<String>,
        minutes: Option<u32>,
    },
    RemovePhase { index: usize },
    SetLoop { enabled: bool },
    SetSound { enabled: bool },
    ReplayHistory { index: usize },
    DeleteHistory { index: usize },
    Status,
    ListPhases,
    ListHistory,
}

/// Responses from cadence back to cadencectl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Ok,
    /// The command was understood but had no effect in the current state
    Ignored { reason: String },
    Status(SessionStatus),
    Phases(Vec<Phase>),
    History(Vec<HistoryItem>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Timer,
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// A named sub-duration of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub minutes: u32,
}

impl Phase {
    pub fn new(name: impl Into<String>, minutes: u32) -> Self {
        Self {
            name: name.into(),
            minutes,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.minutes) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub mode: Mode,
    pub state: RunState,
    pub time_left: u64,  // seconds
    pub total_time: u64, // seconds
    pub phase_index: Option<usize>,
    pub phase_name: Option<String>,
    pub loop_enabled: bool,
    pub sound_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub mode: Mode,
    pub total_minutes: u32,
    pub label: String,
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection closed before a message was received")]
    Closed,

    #[error("Connection refused - is cadence running?")]
    ConnectionRefused,
}

pub const SOCKET_PATH: &str = "/tmp/cadence.sock";

/// Write one newline-terminated JSON message.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = serde_json::to_vec(message)?;
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one newline-terminated JSON message.
pub async fn read_message<R, T>(reader: &mut R) -> Result<T, IpcError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(IpcError::Closed);
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn messages_are_line_delimited() {
        let (client, server) = tokio::io::duplex(1024);
        let (_, mut client_writer) = tokio::io::split(client);
        let (server_reader, _) = tokio::io::split(server);
        let mut server_reader = BufReader::new(server_reader);

        write_message(&mut client_writer, &Command::EditPhase {
            index: 1,
            name: None,
            minutes: Some(10),
        })
        .await
        .unwrap();
        write_message(&mut client_writer, &Command::Status).await.unwrap();

        let first: Command = read_message(&mut server_reader).await.unwrap();
        let second: Command = read_message(&mut server_reader).await.unwrap();
        assert_eq!(
            first,
            Command::EditPhase {
                index: 1,
                name: None,
                minutes: Some(10)
            }
        );
        assert_eq!(second, Command::Status);
    }

    #[tokio::test]
    async fn closed_stream_is_reported() {
        let mut empty = BufReader::new(&b""[..]);
        let result: Result<Command, _> = read_message(&mut empty).await;
        assert!(matches!(result, Err(IpcError::Closed)));
    }

    #[test]
    fn modes_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Cycle).unwrap(), "\"cycle\"");
        assert_eq!(
            serde_json::to_string(&RunState::Finished).unwrap(),
            "\"finished\""
        );
    }

    #[test]
    fn phase_duration_is_whole_minutes() {
        assert_eq!(Phase::new("Work", 25).duration_secs(), 1500);
    }
}
