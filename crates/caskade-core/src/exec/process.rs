//! Child-process supervision: line-streamed output and two-stage shutdown.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep_until, timeout, timeout_at};

use crate::queue::item::InstallItem;
use crate::types::LogStream;

use super::error::ExecError;
use super::events::EventSink;
use super::session::InstallSession;

/// How a supervised child ended.
pub(crate) enum ProcessOutcome {
    Exited(ExitStatus),
    Cancelled,
}

/// Spawn `command` and supervise it to completion: stream stdout and stderr
/// line-by-line into the item log and the event sink, and shut the child
/// down in two stages (SIGTERM, then SIGKILL after `kill_grace`) when the
/// session is cancelled.
pub(crate) async fn run_streamed(
    mut command: Command,
    item: &mut InstallItem,
    session: &InstallSession,
    events: &EventSink,
    kill_grace: Duration,
) -> Result<ProcessOutcome, ExecError> {
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = command
        .spawn()
        .map_err(|source| ExecError::Spawn { program, source })?;
    session.set_current_pid(child.id());

    let mut out_lines = child.stdout.take().map(|s| BufReader::new(s).lines());
    let mut err_lines = child.stderr.take().map(|s| BufReader::new(s).lines());
    let mut out_open = out_lines.is_some();
    let mut err_open = err_lines.is_some();

    let mut term_deadline: Option<Instant> = None;
    let mut killed = false;

    while out_open || err_open {
        tokio::select! {
            line = next_line(&mut out_lines), if out_open => match line {
                Some(text) => {
                    item.push_log(text.clone());
                    events.log(&item.id, text, LogStream::Stdout).await;
                }
                None => out_open = false,
            },
            line = next_line(&mut err_lines), if err_open => match line {
                Some(text) => {
                    item.push_log(format!("[stderr] {text}"));
                    events.log(&item.id, text, LogStream::Stderr).await;
                }
                None => err_open = false,
            },
            _ = session.cancelled(), if term_deadline.is_none() => {
                terminate(&mut child);
                term_deadline = Some(Instant::now() + kill_grace);
            }
            _ = sleep_until(term_deadline.unwrap_or_else(Instant::now)),
                if term_deadline.is_some() && !killed =>
            {
                // Grace expired with output still open; force kill and stop
                // draining. Orphaned grandchildren may keep the pipes open
                // past the child's death, so EOF cannot be relied on here.
                let _ = child.start_kill();
                killed = true;
                break;
            }
        }
    }

    let status = match term_deadline {
        // Already force-killed: just reap.
        Some(_) if killed => child.wait().await?,
        // SIGTERM sent while streaming: the child gets whatever is left of
        // the grace period.
        Some(deadline) => match timeout_at(deadline, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                child.kill().await?;
                child.wait().await?
            }
        },
        // Not cancelled so far; it can still happen while we wait.
        None => {
            tokio::select! {
                status = child.wait() => status?,
                _ = session.cancelled() => {
                    terminate(&mut child);
                    term_deadline = Some(Instant::now() + kill_grace);
                    match timeout(kill_grace, child.wait()).await {
                        Ok(status) => status?,
                        Err(_) => {
                            child.kill().await?;
                            child.wait().await?
                        }
                    }
                }
            }
        }
    };
    session.set_current_pid(None);

    if term_deadline.is_some() {
        Ok(ProcessOutcome::Cancelled)
    } else {
        Ok(ProcessOutcome::Exited(status))
    }
}

async fn next_line<R>(lines: &mut Option<Lines<BufReader<R>>>) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    match lines.as_mut() {
        Some(reader) => match reader.next_line().await {
            Ok(line) => line,
            // A mid-stream read error ends the stream like EOF.
            Err(_) => None,
        },
        None => None,
    }
}

/// Ask the child to shut down. SIGTERM on unix, so package managers can
/// release file locks and reap their own children; elsewhere the forceful
/// kill is all the platform offers.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // tokio's kill is SIGKILL-only; SIGTERM needs the raw pid.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }
}

/// Human-readable description of a non-success exit.
pub(crate) fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with code {code}"),
        // No exit code means the child was taken down by a signal.
        None => "terminated by signal".to_string(),
    }
}

/// Scripts get a real shell; package installs never do.
pub(crate) fn shell_command(line: &str) -> Command {
    #[cfg(unix)]
    {
        let mut command = Command::new("sh");
        command.arg("-c").arg(line);
        command
    }
    #[cfg(not(unix))]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", line]);
        command
    }
}
