use phy::{DelayTap, MAX_MODULES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneStatus {
    Uncalibrated,
    InProgress,
    Calibrated,
    Failed,
}

impl Default for LaneStatus {
    fn default() -> LaneStatus { LaneStatus::Uncalibrated }
}

/// Training state of one data byte lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitLane {
    pub index:        usize,
    /// DQ/DQS write delay where leveling feedback turned from 0 to 1.
    pub wlevel_delay: u16,
    /// Leveling feedback started at 1: DQS lags CK by more than a bit time.
    pub high_skew:    bool,
    pub bitslip:      u8,
    /// Largest zero-error read window, first and last tap.
    pub window:       Option<(u16, u16)>,
    pub delay:        DelayTap,
    pub status:       LaneStatus,
}

impl BitLane {
    pub fn new(index: usize) -> BitLane {
        BitLane { index: index, ..BitLane::default() }
    }

    /// Distance from the selected tap to the nearer edge of its window.
    pub fn margin(&self) -> Option<u16> {
        self.window.map(|(first, last)| {
            let tap = self.delay.value();
            if tap < first || tap > last { 0 }
            else { ::core::cmp::min(tap - first, last - tap) }
        })
    }
}

/// Outcome of one boot's training, handed to the caller once the
/// controller runs under hardware control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    lanes:   [BitLane; MAX_MODULES],
    modules: usize,
    pub cdly: Option<u16>,
}

impl Calibration {
    pub fn new(modules: usize) -> Calibration {
        let mut lanes = [BitLane::default(); MAX_MODULES];
        for (index, lane) in lanes.iter_mut().enumerate() {
            lane.index = index;
        }
        Calibration { lanes: lanes, modules: modules, cdly: None }
    }

    pub fn lanes(&self) -> &[BitLane] {
        &self.lanes[..self.modules]
    }

    pub fn lanes_mut(&mut self) -> &mut [BitLane] {
        &mut self.lanes[..self.modules]
    }

    pub fn lane(&self, module: usize) -> &BitLane {
        &self.lanes()[module]
    }

    pub fn lane_mut(&mut self, module: usize) -> &mut BitLane {
        &mut self.lanes_mut()[module]
    }

    pub fn passed(&self) -> bool {
        self.lanes().iter().all(|lane| lane.status == LaneStatus::Calibrated)
    }
}
