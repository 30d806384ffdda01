use std::fmt;
use std::str::FromStr;

/// Latency token layout used by a trace tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Whole milliseconds, `12 ms` or `<1 ms` (Windows `tracert`).
    Integer,
    /// Fractional milliseconds, `12.345 ms` (`traceroute`).
    Decimal,
}

/// The fields one trace line contributed. At least one is always set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHop {
    pub address: Option<String>,
    pub latency_ms: Option<f64>,
}

pub fn parse_line(line: &str, grammar: Grammar) -> Option<ParsedHop> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let mut address: Option<String> = None;
    let mut latency_ms: Option<f64> = None;

    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i];

        if address.is_none() {
            let candidate = strip_wrapping(tok);
            if is_ip_token(candidate) {
                address = Some(candidate.to_string());
                i += 1;
                continue;
            }
        }

        if latency_ms.is_none() {
            let next = tokens.get(i + 1).copied();
            if let Some((val, consumed_next)) = parse_rtt(tok, next, grammar) {
                latency_ms = Some(val);
                i += if consumed_next { 2 } else { 1 };
                continue;
            }
        }

        if address.is_some() && latency_ms.is_some() {
            break;
        }
        i += 1;
    }

    if address.is_none() && latency_ms.is_none() {
        return None;
    }

    Some(ParsedHop {
        address,
        latency_ms,
    })
}

fn strip_wrapping(token: &str) -> &str {
    token
        .trim_end_matches(',')
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']'])
}

fn is_ip_token(token: &str) -> bool {
    if token.ends_with("ms") {
        return false;
    }

    is_ipv4(token) || is_ipv6(token)
}

fn is_ipv4(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    for part in parts {
        if part.is_empty() || part.len() > 3 {
            return false;
        }
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if part.parse::<u8>().is_err() {
            return false;
        }
    }

    true
}

fn is_ipv6(token: &str) -> bool {
    if token.matches(':').count() < 2 || token.len() > 39 {
        return false;
    }
    if !token.chars().any(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    token
        .chars()
        .all(|c| c.is_ascii_hexdigit() || c == ':')
}

fn parse_rtt(token: &str, next: Option<&str>, grammar: Grammar) -> Option<(f64, bool)> {
    if let Some(num) = token.strip_suffix("ms") {
        if !num.is_empty() {
            if let Some(val) = parse_latency_number(num, grammar) {
                return Some((val, false));
            }
        }
    }

    if matches!(next, Some("ms")) {
        if let Some(val) = parse_latency_number(token, grammar) {
            return Some((val, true));
        }
    }

    None
}

fn parse_latency_number(text: &str, grammar: Grammar) -> Option<f64> {
    match grammar {
        Grammar::Integer => {
            let digits = text.strip_prefix('<').unwrap_or(text);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u64>().ok().map(|val| val as f64)
        }
        Grammar::Decimal => {
            let (whole, frac) = text.split_once('.')?;
            if whole.is_empty() || frac.is_empty() {
                return None;
            }
            if !whole.chars().all(|c| c.is_ascii_digit())
                || !frac.chars().all(|c| c.is_ascii_digit())
            {
                return None;
            }
            text.parse::<f64>().ok()
        }
    }
}

/// A trace utility and the way its output is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceTool {
    Traceroute,
    Tracert,
}

impl TraceTool {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            TraceTool::Tracert
        } else {
            TraceTool::Traceroute
        }
    }

    pub fn grammar(self) -> Grammar {
        match self {
            TraceTool::Traceroute => Grammar::Decimal,
            TraceTool::Tracert => Grammar::Integer,
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            TraceTool::Traceroute => "traceroute",
            TraceTool::Tracert => "tracert",
        }
    }
}

impl fmt::Display for TraceTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for TraceTool {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "traceroute" => Ok(TraceTool::Traceroute),
            "tracert" => Ok(TraceTool::Tracert),
            other => Err(format!("unknown trace tool: {other}")),
        }
    }
}
