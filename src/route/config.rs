/// Configuration for route segmentation with tunable thresholds.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Share of points, in percent, that make up the approach window.
    pub approach_pct: usize,

    /// Share of points, in percent, that make up the trigger window.
    /// The exit window takes whatever remains.
    pub trigger_pct: usize,

    /// Average congestion at or below this is light traffic
    pub low_max: f64,

    /// Average congestion at or below this (and above `low_max`) is moderate
    pub medium_max: f64,

    /// Extra travel time as a share of the free-flow duration
    pub medium_delay_factor: f64,
    pub high_delay_factor: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            approach_pct: 30,
            trigger_pct: 40,
            low_max: 0.3,
            medium_max: 0.7,
            medium_delay_factor: 0.2,
            high_delay_factor: 0.4,
        }
    }
}
