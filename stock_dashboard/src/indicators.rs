//! Moving-average overlays on the closing price.
//!
//! Output is always aligned one-to-one with the input series. Entries before the
//! window fills are `None`, never a numeric placeholder.

use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::series::Series;

pub const DEFAULT_WINDOW: NonZeroUsize = NonZeroUsize::new(20).unwrap();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma,
    Ema,
}

impl IndicatorKind {
    pub fn short_name(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    /// Accepts `sma` or `ema`, case-insensitively. The window comes from the engine,
    /// so labelled forms like `SMA_50` are rejected rather than silently resized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(IndicatorKind::Sma),
            "ema" => Ok(IndicatorKind::Ema),
            _ => Err(format!("unknown indicator {s:?} (expected sma or ema)")),
        }
    }
}

/// How the exponential average gets its first value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaSeed {
    /// EMA[W-1] is the mean of the first W closes, matching the SMA at that index.
    #[default]
    SimpleMean,
    /// The recurrence starts at close[0]; entries before W-1 are masked.
    /// Same numbers as pandas `ewm(span=W, adjust=False, min_periods=W)`.
    FirstClose,
}

/// One overlay aligned with its source series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Column label, e.g. `SMA_20`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.kind.short_name(), self.window)
    }

    /// Legend name, e.g. `SMA 20`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.kind.short_name(), self.window)
    }
}

/// Computes overlays with a fixed window and EMA seeding rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorEngine {
    pub window: NonZeroUsize,
    pub ema_seed: EmaSeed,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            ema_seed: EmaSeed::default(),
        }
    }
}

impl IndicatorEngine {
    pub fn new(window: NonZeroUsize, ema_seed: EmaSeed) -> Self {
        Self { window, ema_seed }
    }

    pub fn compute(&self, series: &Series, kind: IndicatorKind) -> IndicatorSeries {
        let closes = series.closes();
        let window = self.window.get();
        if closes.len() < window && !closes.is_empty() {
            tracing::warn!(
                symbol = %series.symbol,
                indicator = %kind,
                window,
                bars = closes.len(),
                "window longer than series; indicator undefined"
            );
        }
        let values = match kind {
            IndicatorKind::Sma => sma(&closes, self.window),
            IndicatorKind::Ema => ema(&closes, self.window, self.ema_seed),
        };
        IndicatorSeries {
            kind,
            window,
            values,
        }
    }
}

/// Rolling arithmetic mean of the last `window` values.
pub fn sma(values: &[f64], window: NonZeroUsize) -> Vec<Option<f64>> {
    let w = window.get();
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= w {
            sum -= values[i - w];
        }
        out.push((i + 1 >= w).then(|| sum / w as f64));
    }
    out
}

/// Exponential moving average with `alpha = 2 / (window + 1)`.
pub fn ema(values: &[f64], window: NonZeroUsize, seed: EmaSeed) -> Vec<Option<f64>> {
    let w = window.get();
    let mut out = vec![None; values.len()];
    if values.len() < w {
        return out;
    }
    let alpha = 2.0 / (w as f64 + 1.0);

    let (mut prev, start) = match seed {
        EmaSeed::SimpleMean => {
            // Summed front to back, the same order `sma` uses for its first window.
            let mut sum = 0.0;
            for v in &values[..w] {
                sum += v;
            }
            (sum / w as f64, w)
        }
        EmaSeed::FirstClose => (values[0], 1),
    };
    if start >= w {
        out[start - 1] = Some(prev);
    }
    for (i, v) in values.iter().enumerate().skip(start) {
        prev = v * alpha + prev * (1.0 - alpha);
        if i + 1 >= w {
            out[i] = Some(prev);
        }
    }
    out
}
