use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::controls;
use crate::visualizer::{SegmentBuffer, SweepController};

/// Commands sent from IPC server to render loop
#[derive(Debug)]
pub enum IpcCommand {
    Pause { reply: oneshot::Sender<String> },
    Resume { reply: oneshot::Sender<String> },
    Toggle { reply: oneshot::Sender<String> },
    Clear { reply: oneshot::Sender<String> },
    SetMultiplier { value: f64, reply: oneshot::Sender<String> },
    SetIncrement { value: f64, reply: oneshot::Sender<String> },
    SetPoints { value: i64, reply: oneshot::Sender<String> },
    SetInterval { value: u64, reply: oneshot::Sender<String> },
    SetPoint { value: usize, reply: oneshot::Sender<String> },
    Status { reply: oneshot::Sender<String> },
    Ping { reply: oneshot::Sender<String> },
}

/// Get the socket path for IPC
pub fn socket_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(dir).join("timestable.sock")
    } else {
        PathBuf::from("/tmp/timestable.sock")
    }
}

/// Parse a protocol line into an IpcCommand
fn parse_command(line: &str, reply: oneshot::Sender<String>) -> Result<IpcCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["pause"] => Ok(IpcCommand::Pause { reply }),
        ["resume"] => Ok(IpcCommand::Resume { reply }),
        ["toggle"] => Ok(IpcCommand::Toggle { reply }),
        ["clear"] => Ok(IpcCommand::Clear { reply }),
        ["multiplier", val] => {
            let value = controls::parse_multiplier(val).context("Invalid multiplier")?;
            Ok(IpcCommand::SetMultiplier { value, reply })
        }
        ["increment", val] => {
            let v: f64 = val.parse().context("Invalid increment")?;
            Ok(IpcCommand::SetIncrement {
                value: controls::clamp_increment(v),
                reply,
            })
        }
        ["points", val] => {
            let value = controls::parse_num_points(val).context("Invalid point count")?;
            Ok(IpcCommand::SetPoints { value, reply })
        }
        ["interval", val] => {
            let v: u64 = val.parse().context("Invalid interval")?;
            Ok(IpcCommand::SetInterval {
                value: controls::clamp_interval(v),
                reply,
            })
        }
        ["point", val] => {
            let value: usize = val.parse().context("Invalid point index")?;
            Ok(IpcCommand::SetPoint { value, reply })
        }
        ["status"] => Ok(IpcCommand::Status { reply }),
        ["ping"] => Ok(IpcCommand::Ping { reply }),
        _ => Err(anyhow::anyhow!("Unknown command: {}", line)),
    }
}

/// Render a one-line summary of the controller state.
pub fn status_line(controller: &SweepController, segments: usize) -> String {
    let state = controller.state();
    format!(
        "paused={} points={} multiplier={:.3} increment={:.3} interval={} point={} color={} segments={}",
        state.paused,
        state.num_points,
        state.multiplier,
        state.multiplier_increment,
        state.interval_millis,
        state.current_point,
        controller.colors().mode(),
        segments,
    )
}

fn reply_result<E: std::fmt::Display>(
    reply: oneshot::Sender<String>,
    result: std::result::Result<(), E>,
    ok: String,
) {
    let message = match result {
        Ok(()) => ok,
        Err(e) => format!("err: {}", e),
    };
    let _ = reply.send(message);
}

/// Process an IPC command by mutating render loop state
pub fn process_ipc_command(
    cmd: IpcCommand,
    controller: &mut SweepController,
    surface: &mut SegmentBuffer,
) {
    match cmd {
        IpcCommand::Pause { reply } => {
            controller.set_pause(true);
            let _ = reply.send("ok: paused".to_string());
        }
        IpcCommand::Resume { reply } => {
            controller.set_pause(false);
            let _ = reply.send("ok: running".to_string());
        }
        IpcCommand::Toggle { reply } => {
            let state = if controller.toggle_pause() {
                "paused"
            } else {
                "running"
            };
            let _ = reply.send(format!("ok: {}", state));
        }
        IpcCommand::Clear { reply } => {
            controller.clear(surface);
            let _ = reply.send("ok: cleared".to_string());
        }
        IpcCommand::SetMultiplier { value, reply } => {
            reply_result(reply, controller.set_multiplier(value), format!("ok: {}", value));
        }
        IpcCommand::SetIncrement { value, reply } => {
            reply_result(
                reply,
                controller.set_mult_increment(value),
                format!("ok: {}", value),
            );
        }
        IpcCommand::SetPoints { value, reply } => {
            reply_result(reply, controller.set_num_points(value), format!("ok: {}", value));
        }
        IpcCommand::SetInterval { value, reply } => {
            controller.set_interval_time(value);
            let _ = reply.send(format!("ok: {}", value));
        }
        IpcCommand::SetPoint { value, reply } => {
            reply_result(reply, controller.set_point(value), format!("ok: {}", value));
        }
        IpcCommand::Status { reply } => {
            let _ = reply.send(format!("ok: {}", status_line(controller, surface.len())));
        }
        IpcCommand::Ping { reply } => {
            let _ = reply.send("ok: pong".to_string());
        }
    }
}

/// Handle a single client connection
async fn handle_client(stream: UnixStream, cmd_tx: mpsc::Sender<IpcCommand>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();
    buf_reader.read_line(&mut line).await?;
    let line = line.trim();

    if line.is_empty() {
        return Ok(());
    }

    let (reply_tx, reply_rx) = oneshot::channel();

    let command = match parse_command(line, reply_tx) {
        Ok(cmd) => cmd,
        Err(e) => {
            writer
                .write_all(format!("err: {:#}\n", e).as_bytes())
                .await?;
            return Ok(());
        }
    };

    cmd_tx
        .send(command)
        .await
        .map_err(|_| anyhow::anyhow!("Render loop has shut down"))?;

    let response = reply_rx
        .await
        .unwrap_or_else(|_| "err: internal error".to_string());

    writer
        .write_all(format!("{}\n", response).as_bytes())
        .await?;
    Ok(())
}

/// Start the IPC server, listening for commands on a Unix socket
pub async fn start_server(cmd_tx: mpsc::Sender<IpcCommand>) -> Result<()> {
    let path = socket_path();

    // Remove stale socket from previous run
    let _ = std::fs::remove_file(&path);

    let listener = UnixListener::bind(&path).context("Failed to bind IPC socket")?;

    info!("IPC server listening on {}", path.display());

    loop {
        let (stream, _) = listener.accept().await?;
        let cmd_tx = cmd_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, cmd_tx).await {
                debug!("IPC client error: {}", e);
            }
        });
    }
}

/// Send a command to a running instance (client mode)
pub async fn send_command(line: &str) -> Result<String> {
    let path = socket_path();

    let stream = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        UnixStream::connect(&path),
    )
    .await
    .context("Connection timed out")?
    .context("Could not connect to timestable. Is it running?")?;

    let (reader, mut writer) = stream.into_split();

    writer.write_all(format!("{}\n", line).as_bytes()).await?;
    writer.shutdown().await?;

    let mut buf_reader = BufReader::new(reader);
    let mut response = String::new();

    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        buf_reader.read_line(&mut response),
    )
    .await
    .context("Response timed out")?
    .context("Failed to read response")?;

    Ok(response.trim().to_string())
}
