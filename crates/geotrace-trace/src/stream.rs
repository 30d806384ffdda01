use crate::parser::{parse_line, Grammar, TraceTool};
use geotrace_model::HopEvent;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Hop(HopEvent),
    /// Sent exactly once by the producer when its stream is over.
    Done,
    /// Wakes a blocked consumer after cancellation was requested.
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct TraceSettings {
    pub tool: TraceTool,
    pub max_hops: Option<u32>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            tool: TraceTool::platform_default(),
            max_hops: None,
        }
    }
}

const TRACERT_DEFAULT_MAX_HOPS: u32 = 100;

pub fn trace_command(target: &str, settings: &TraceSettings) -> Command {
    let mut cmd = Command::new(settings.tool.program());
    match settings.tool {
        TraceTool::Traceroute => {
            cmd.arg("-n");
            if let Some(max_hops) = settings.max_hops {
                cmd.arg("-m").arg(max_hops.to_string());
            }
        }
        TraceTool::Tracert => {
            cmd.arg("-d")
                .arg("-h")
                .arg(settings.max_hops.unwrap_or(TRACERT_DEFAULT_MAX_HOPS).to_string());
        }
    }
    cmd.arg(target);
    cmd
}

/// Parses every line of `reader` and forwards the hops, then sends `Done`.
///
/// Returns the number of hop events sent. A read error ends the stream like EOF.
pub fn forward_hops<R: BufRead>(reader: R, grammar: Grammar, sender: &Sender<TraceEvent>) -> u64 {
    let mut sequence: u64 = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("trace output read failed: {err}");
                break;
            }
        };

        let Some(parsed) = parse_line(&line, grammar) else {
            debug!("dropping trace line: {}", line.trim());
            continue;
        };

        let event = HopEvent {
            sequence,
            address: parsed.address,
            latency_ms: parsed.latency_ms,
        };
        if sender.send(TraceEvent::Hop(event)).is_err() {
            debug!("hop receiver dropped; discarding remaining trace output");
            break;
        }
        sequence += 1;
    }

    let _ = sender.send(TraceEvent::Done);
    sequence
}

/// Collects a stream's lines into one space-joined message, or `None` if it was empty.
pub fn collect_stderr<R: BufRead>(reader: R) -> Option<String> {
    let mut buf = String::new();
    for line in reader.lines().map_while(Result::ok) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(line);
    }
    (!buf.is_empty()).then_some(buf)
}

/// Sends `Done` if the producer thread unwinds before reaching its own sentinel.
struct DoneOnPanic(Sender<TraceEvent>);

impl Drop for DoneOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            let _ = self.0.send(TraceEvent::Done);
        }
    }
}

/// Runs `cmd` and streams its stdout through the parser on a new thread.
///
/// Spawn failure is logged and reported to the receiver as a plain `Done`.
/// Anything the tool prints on stderr is logged as a warning.
pub fn spawn_command_stream(
    mut cmd: Command,
    grammar: Grammar,
    sender: Sender<TraceEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let _guard = DoneOnPanic(sender.clone());
        let program = cmd.get_program().to_string_lossy().into_owned();
        let spawned = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                error!("failed to spawn {program}: {err}");
                let _ = sender.send(TraceEvent::Done);
                return;
            }
        };

        let stderr_reader = child.stderr.take().map(|stderr| {
            thread::spawn(move || collect_stderr(BufReader::new(stderr)))
        });

        match child.stdout.take() {
            Some(stdout) => {
                let sent = forward_hops(BufReader::new(stdout), grammar, &sender);
                info!("{program} output ended after {sent} hop events");
            }
            None => {
                error!("missing {program} stdout");
                let _ = sender.send(TraceEvent::Done);
            }
        }

        if let Some(Ok(Some(message))) = stderr_reader.map(|handle| handle.join()) {
            warn!("{program}: {message}");
        }

        match child.wait() {
            Ok(status) if !status.success() => warn!("{program} exited with {status}"),
            Ok(_) => {}
            Err(err) => warn!("failed to wait for {program}: {err}"),
        }
    })
}

pub fn spawn_traceroute_stream(
    target: &str,
    settings: &TraceSettings,
    sender: Sender<TraceEvent>,
) -> JoinHandle<()> {
    info!("starting {} to {target}", settings.tool);
    spawn_command_stream(trace_command(target, settings), settings.tool.grammar(), sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn stderr_lines_are_joined() {
        let text = "traceroute: unknown host nowhere.invalid\n\n  try again  \n";
        assert_eq!(
            collect_stderr(Cursor::new(text)),
            Some("traceroute: unknown host nowhere.invalid try again".to_string())
        );
        assert_eq!(collect_stderr(Cursor::new("\n \n")), None);
    }

    #[test]
    fn panicking_producer_still_sends_sentinel() {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let _guard = DoneOnPanic(tx);
            panic!("reader blew up");
        });
        assert!(handle.join().is_err());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![TraceEvent::Done]);
    }

    #[test]
    fn clean_exit_adds_no_extra_sentinel() {
        let (tx, rx) = mpsc::channel();
        let guard_tx = tx.clone();
        thread::spawn(move || {
            let _guard = DoneOnPanic(guard_tx);
            forward_hops(Cursor::new(" 1  10.0.0.1  1.500 ms\n"), Grammar::Decimal, &tx);
        })
        .join()
        .unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events.last(), Some(&TraceEvent::Done));
    }
}
