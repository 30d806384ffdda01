//! Trace process streaming and line parsing.

pub mod parser;
pub mod stream;

pub use parser::{parse_line, Grammar, ParsedHop, TraceTool};
pub use stream::{
    collect_stderr, forward_hops, spawn_command_stream, spawn_traceroute_stream, trace_command,
    TraceEvent, TraceSettings,
};
