use geotrace_trace::{
    spawn_command_stream, trace_command, Grammar, TraceEvent, TraceSettings, TraceTool,
};
use std::process::Command;
use std::sync::mpsc;

#[test]
fn spawn_failure_sends_single_sentinel() {
    let (tx, rx) = mpsc::channel();
    let cmd = Command::new("geotrace-no-such-trace-binary");
    let handle = spawn_command_stream(cmd, Grammar::Decimal, tx);
    handle.join().unwrap();

    let events: Vec<TraceEvent> = rx.try_iter().collect();
    assert_eq!(events, vec![TraceEvent::Done]);
}

#[cfg(unix)]
#[test]
fn subprocess_output_is_streamed_in_order() {
    let (tx, rx) = mpsc::channel();
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(
        "printf ' 1  10.0.0.1  1.500 ms\\n 2  * * *\\n 3  10.0.0.3  7.250 ms\\n'",
    );
    let handle = spawn_command_stream(cmd, Grammar::Decimal, tx);

    let mut hops = Vec::new();
    loop {
        match rx.recv().unwrap() {
            TraceEvent::Hop(hop) => hops.push(hop),
            TraceEvent::Done => break,
            TraceEvent::Interrupted => panic!("unexpected interrupt"),
        }
    }
    handle.join().unwrap();

    assert_eq!(hops.len(), 2);
    assert_eq!(hops[0].sequence, 0);
    assert_eq!(hops[0].address.as_deref(), Some("10.0.0.1"));
    assert_eq!(hops[1].sequence, 1);
    assert_eq!(hops[1].latency_ms, Some(7.25));
}

#[test]
fn trace_commands_use_numeric_mode() {
    let settings = TraceSettings {
        tool: TraceTool::Traceroute,
        max_hops: Some(20),
    };
    let cmd = trace_command("example.com", &settings);
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(cmd.get_program(), "traceroute");
    assert_eq!(args, vec!["-n", "-m", "20", "example.com"]);

    let settings = TraceSettings {
        tool: TraceTool::Tracert,
        max_hops: None,
    };
    let cmd = trace_command("example.com", &settings);
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(cmd.get_program(), "tracert");
    assert_eq!(args, vec!["-d", "-h", "100", "example.com"]);
}

#[cfg(unix)]
#[test]
fn stderr_output_does_not_disturb_hops() {
    let (tx, rx) = mpsc::channel();
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(
        "echo 'traceroute: warning: multiple interfaces found' >&2; \
         printf ' 1  10.0.0.1  1.500 ms\\n'; exit 2",
    );
    let handle = spawn_command_stream(cmd, Grammar::Decimal, tx);
    handle.join().unwrap();

    let events: Vec<TraceEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], TraceEvent::Hop(hop) if hop.address.as_deref() == Some("10.0.0.1")));
    assert_eq!(events[1], TraceEvent::Done);
}
