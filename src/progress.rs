//! Generation progress reporting.
//!
//! Reports observable progress during `tripweave generate` so users see how
//! many photos have been read and how many spots are resolved. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for one generation run.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationEvent {
    /// Metadata read for `n` of `total` photos.
    Extracting { n: u64, total: u64 },
    /// Grouping geotagged photos into spots.
    Clustering { geotagged: u64 },
    /// Place names resolved for `done` of `total` spots.
    Resolving { done: u64, total: u64 },
    /// Computing dates, title, and tags.
    Assembling,
    /// Finished, possibly with warnings.
    Complete { spots: u64, warnings: u64 },
}

/// Reports generation progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the trip generator.
    fn report(&self, event: GenerationEvent);
}

/// Human-friendly progress on stderr: "generate  resolving  3 / 12 spots".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: GenerationEvent) {
        let line = match &event {
            GenerationEvent::Extracting { n, total } => format!(
                "generate  extracting  {} / {} photos\n",
                format_number(*n),
                format_number(*total)
            ),
            GenerationEvent::Clustering { geotagged } => format!(
                "generate  clustering  {} geotagged photos\n",
                format_number(*geotagged)
            ),
            GenerationEvent::Resolving { done, total } => format!(
                "generate  resolving  {} / {} spots\n",
                format_number(*done),
                format_number(*total)
            ),
            GenerationEvent::Assembling => "generate  assembling...\n".to_string(),
            GenerationEvent::Complete { spots, warnings } => format!(
                "generate  done  {} spots, {} warnings\n",
                format_number(*spots),
                format_number(*warnings)
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: GenerationEvent) {
        if let Ok(line) = serde_json::to_string(&event_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

fn event_json(event: &GenerationEvent) -> serde_json::Value {
    match event {
        GenerationEvent::Extracting { n, total } => serde_json::json!({
            "event": "progress",
            "phase": "extracting",
            "n": n,
            "total": total
        }),
        GenerationEvent::Clustering { geotagged } => serde_json::json!({
            "event": "progress",
            "phase": "clustering",
            "geotagged": geotagged
        }),
        GenerationEvent::Resolving { done, total } => serde_json::json!({
            "event": "progress",
            "phase": "resolving",
            "n": done,
            "total": total
        }),
        GenerationEvent::Assembling => serde_json::json!({
            "event": "progress",
            "phase": "assembling"
        }),
        GenerationEvent::Complete { spots, warnings } => serde_json::json!({
            "event": "complete",
            "spots": spots,
            "warnings": warnings
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: GenerationEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human, or json.",
                other
            ),
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn resolving_event_json_shape() {
        let v = event_json(&GenerationEvent::Resolving { done: 3, total: 7 });
        assert_eq!(v["phase"], "resolving");
        assert_eq!(v["n"], 3);
        assert_eq!(v["total"], 7);
    }

    #[test]
    fn progress_mode_parse() {
        assert_eq!(ProgressMode::parse("json").unwrap(), ProgressMode::Json);
        assert!(ProgressMode::parse("loud").is_err());
    }
}
