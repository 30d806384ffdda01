use geotrace_render::ColorPolicy;
use geotrace_trace::TraceSettings;
use std::path::{Path, PathBuf};

/// Everything one trace run needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub destination: String,
    pub trace: TraceSettings,
    pub token_file: PathBuf,
    pub color_policy: ColorPolicy,
    pub report_path: Option<PathBuf>,
    pub map_path: Option<PathBuf>,
    pub receipt_path: Option<PathBuf>,
}

pub struct OutputOptions<'a> {
    pub out_dir: &'a Path,
    pub report: bool,
    pub map: bool,
}

impl RunConfig {
    pub fn new(
        destination: &str,
        trace: TraceSettings,
        token_file: PathBuf,
        color_policy: ColorPolicy,
        outputs: OutputOptions<'_>,
    ) -> Self {
        let stem = short_dest_name(destination);
        let file = |suffix: &str| outputs.out_dir.join(format!("{stem}_{suffix}"));

        Self {
            destination: destination.trim().to_string(),
            trace,
            token_file,
            color_policy,
            report_path: outputs.report.then(|| file("route.csv")),
            map_path: outputs.map.then(|| file("map.html")),
            receipt_path: outputs.report.then(|| file("run.json")),
        }
    }
}

/// File stem for a destination: hostnames keep their first label with runs of
/// non-word characters collapsed to `_`; numeric addresses are used as given.
pub fn short_dest_name(destination: &str) -> String {
    let destination = destination.trim();
    if !destination.chars().any(|c| c.is_alphabetic()) {
        return destination.to_string();
    }

    let first = destination.split('.').next().unwrap_or(destination);
    let mut out = String::with_capacity(first.len());
    let mut in_run = false;
    for c in first.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}
