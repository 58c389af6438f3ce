//! Unix domain socket server for IPC

use anyhow::{Context, Result};
use cadence_ipc::{read_message, write_message, Command, Response};
use std::path::Path;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// A command waiting for the session thread, with the channel to answer on.
#[derive(Debug)]
pub struct Request {
    pub command: Command,
    pub reply: oneshot::Sender<Response>,
}

impl Request {
    pub fn respond(self, response: Response) {
        // The client may have hung up already; nothing to do then.
        let _ = self.reply.send(response);
    }
}

pub async fn serve(socket_path: &Path, requests: mpsc::Sender<Request>) -> Result<()> {
    // Remove old socket if it exists
    let _ = std::fs::remove_file(socket_path);

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind IPC socket at {:?}", socket_path))?;
    info!("IPC server listening on {:?}", socket_path);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let requests = requests.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, requests).await {
                        error!("Error handling client: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(stream: UnixStream, requests: mpsc::Sender<Request>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let command: Command = read_message(&mut reader).await?;

    let (reply, answer) = oneshot::channel();
    let response = if requests.send(Request { command, reply }).await.is_err() {
        Response::Error("cadence is shutting down".to_string())
    } else {
        answer
            .await
            .unwrap_or_else(|_| Response::Error("session dropped the request".to_string()))
    };

    write_message(&mut writer, &response).await?;
    Ok(())
}
