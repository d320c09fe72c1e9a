//! Search graph vertices and edges.

use looptune_kernel::fingerprint::StateFingerprint;

/// GFLOPS value mapped to the hottest fill colour in rendered graphs.
pub const COLOR_SCALE_GFLOPS: f64 = 120.0;

const COLOR_COLD: (u8, u8, u8) = (0xfd, 0xf5, 0xdf);
const COLOR_HOT: (u8, u8, u8) = (0xe0, 0x66, 0x66);

/// A visited state in the search graph.
///
/// `gflops` is always the ground-truth (`loop_nest`) score, whatever eval
/// mode was used to rank candidates on the way here.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNodeV1 {
    pub fingerprint: StateFingerprint,
    /// Actions from the search root to this state (shortest seen so far).
    pub actions: Vec<String>,
    pub gflops: f64,
    /// Seconds since search start when this record was written.
    pub time: f64,
    /// Presentation only.
    pub label: String,
    /// Presentation only.
    pub fill_color: String,
    /// Presentation only: set by best-path extraction.
    pub on_best_path: bool,
}

impl SearchNodeV1 {
    #[must_use]
    pub fn new(fingerprint: StateFingerprint, actions: Vec<String>, gflops: f64, time: f64) -> Self {
        let label = format!(
            "GFLOPS = {gflops:9.4}\n T = {time:9.4} s\n[{}]",
            actions.join(", ")
        );
        Self {
            fingerprint,
            actions,
            gflops,
            time,
            label,
            fill_color: fill_color(gflops),
            on_best_path: false,
        }
    }

    /// Number of actions from the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.actions.len()
    }
}

/// A transition between two visited states, keyed by action name.
///
/// Several edges may connect the same pair of fingerprints as long as their
/// actions differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEdgeV1 {
    pub from: StateFingerprint,
    pub to: StateFingerprint,
    pub action: String,
    /// Presentation only: set by best-path extraction.
    pub on_best_path: bool,
}

/// Linear interpolation from a pale cream to red as GFLOPS approach
/// [`COLOR_SCALE_GFLOPS`]. Out-of-range values clamp.
#[must_use]
pub fn fill_color(gflops: f64) -> String {
    let t = if gflops.is_finite() {
        (gflops / COLOR_SCALE_GFLOPS).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mix = |a: u8, b: u8| -> u8 {
        let v = f64::from(a) * (1.0 - t) + f64::from(b) * t;
        // clamp keeps the cast lossless
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let out = v.round().clamp(0.0, 255.0) as u8;
        out
    };
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(COLOR_COLD.0, COLOR_HOT.0),
        mix(COLOR_COLD.1, COLOR_HOT.1),
        mix(COLOR_COLD.2, COLOR_HOT.2)
    )
}
