//! Filter-graph construction for the two pipeline shapes.
//!
//! ```text
//! no noise:    [stdin mp3] ─ EQ chain ─────────────────────────▶ encode
//!
//! with noise:  [0:a] ─ EQ chain ─────────────────[voice]─┐
//!              [1:a] ─ mono ─ volume=v ──────────[noise]─┴ amix(duration=first) ─▶ encode
//! ```
//!
//! Only numbers that were already parsed end up inside the graph text.
//! File paths travel as separate `-i` arguments.

use crate::config::{EqualizerConfig, NoiseConfig};

/// Label of the mixed output pad in the two-input graph.
pub const MIX_OUTPUT_LABEL: &str = "out";

// ---------------------------------------------------------------------------
// EQ chain
// ---------------------------------------------------------------------------

/// Comma-joined EQ filter chain for the voice stream.
pub fn eq_chain(eq: &EqualizerConfig) -> String {
    let mut stages = vec![
        format!("lowshelf=f={}:g={}", eq.bass_freq_hz, eq.bass_gain_db),
        format!(
            "equalizer=f={}:width_type=o:width={}:g={}",
            eq.mid_freq_hz, eq.mid_width_octaves, eq.mid_gain_db
        ),
        format!("highshelf=f={}:g={}", eq.treble_freq_hz, eq.treble_gain_db),
    ];
    if eq.limiter {
        stages.push("alimiter=level_in=1:level_out=0.95:limit=0.95:attack=5:release=50".into());
    }
    stages.join(",")
}

// ---------------------------------------------------------------------------
// Noise volume
// ---------------------------------------------------------------------------

/// Parse a record's volume string.
///
/// Anything that is not a finite decimal in `[0, max_volume]` yields
/// `default_volume`.
pub fn effective_volume(raw: Option<&str>, noise: &NoiseConfig) -> f64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && (0.0..=noise.max_volume).contains(v))
        .unwrap_or(noise.default_volume)
}

// ---------------------------------------------------------------------------
// FilterGraph
// ---------------------------------------------------------------------------

/// Filter arguments of one engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterGraph {
    /// Single input: a plain `-af` chain.
    Simple { chain: String },
    /// Voice + looped noise: a `-filter_complex` graph whose result is
    /// exposed on `output_label`.
    Mix {
        graph: String,
        output_label: &'static str,
        volume: f64,
    },
}

impl FilterGraph {
    /// Voice-only graph.
    pub fn voice_only(eq: &EqualizerConfig) -> Self {
        FilterGraph::Simple {
            chain: eq_chain(eq),
        }
    }

    /// Voice plus noise mixed under it.  The mix lasts exactly as long as
    /// input 0 (`duration=first`).
    pub fn with_noise(eq: &EqualizerConfig, volume: f64, dropout_transition_secs: u32) -> Self {
        let graph = format!(
            "[0:a]{eq}[voice];\
             [1:a]aformat=channel_layouts=mono,volume={volume}[noise];\
             [voice][noise]amix=inputs=2:duration=first:dropout_transition={dropout_transition_secs}[{MIX_OUTPUT_LABEL}]",
            eq = eq_chain(eq),
        );
        FilterGraph::Mix {
            graph,
            output_label: MIX_OUTPUT_LABEL,
            volume,
        }
    }

    pub fn is_mix(&self) -> bool {
        matches!(self, FilterGraph::Mix { .. })
    }

    /// ffmpeg arguments selecting this graph.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            FilterGraph::Simple { chain } => vec!["-af".into(), chain.clone()],
            FilterGraph::Mix {
                graph,
                output_label,
                ..
            } => vec![
                "-filter_complex".into(),
                graph.clone(),
                "-map".into(),
                format!("[{output_label}]"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
