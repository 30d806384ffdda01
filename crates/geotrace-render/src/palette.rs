use std::fmt;
use std::str::FromStr;

/// Hue advance per segment for the sequence policy.
pub const HUE_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorPolicy {
    #[default]
    Latency,
    Sequence,
}

impl FromStr for ColorPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "latency" => Ok(ColorPolicy::Latency),
            "sequence" => Ok(ColorPolicy::Sequence),
            other => Err(format!("unknown color policy: {other}")),
        }
    }
}

impl fmt::Display for ColorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorPolicy::Latency => f.write_str("latency"),
            ColorPolicy::Sequence => f.write_str("sequence"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBucket {
    Fast,
    Moderate,
    Slow,
    /// 30-40 ms inclusive, or no latency at all.
    Default,
}

impl LatencyBucket {
    pub const ALL: [LatencyBucket; 4] = [
        LatencyBucket::Fast,
        LatencyBucket::Moderate,
        LatencyBucket::Slow,
        LatencyBucket::Default,
    ];

    pub fn classify(latency_ms: Option<f64>) -> Self {
        match latency_ms {
            Some(ms) if ms < 20.0 => LatencyBucket::Fast,
            Some(ms) if ms < 30.0 => LatencyBucket::Moderate,
            Some(ms) if ms > 40.0 => LatencyBucket::Slow,
            _ => LatencyBucket::Default,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            LatencyBucket::Fast => "green",
            LatencyBucket::Moderate => "yellow",
            LatencyBucket::Slow => "red",
            LatencyBucket::Default => "blue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LatencyBucket::Fast => "&lt; 20 ms",
            LatencyBucket::Moderate => "20 to 30 ms",
            LatencyBucket::Slow => "&gt; 40 ms",
            LatencyBucket::Default => "30 to 40 ms or unknown",
        }
    }
}

/// Color for the `segment_index`-th segment (0-based) of a route.
pub fn segment_color(policy: ColorPolicy, segment_index: usize, latency_ms: Option<f64>) -> String {
    match policy {
        ColorPolicy::Latency => LatencyBucket::classify(latency_ms).color().to_string(),
        ColorPolicy::Sequence => sequence_color(segment_index),
    }
}

pub fn sequence_color(segment_index: usize) -> String {
    let hue = (segment_index as f64 * HUE_STEP).rem_euclid(1.0);
    let (r, g, b) = hsv_to_rgb(hue, 1.0, 1.0);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// `h`, `s`, `v` in `[0, 1]`.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    let to_byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}
