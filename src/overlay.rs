use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use log::trace;

use crate::constants::*;

// Draw order, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverlayKind {
    InfoPanel,
    SpeedIndicator,
    ModeIndicator,
    MuteIndicator,
}

impl OverlayKind {
    pub fn duration(self) -> Duration {
        match self {
            OverlayKind::InfoPanel => INFO_PANEL_DURATION,
            OverlayKind::SpeedIndicator => SPEED_INDICATOR_DURATION,
            OverlayKind::ModeIndicator => MODE_INDICATOR_DURATION,
            OverlayKind::MuteIndicator => MUTE_INDICATOR_DURATION,
        }
    }
}

#[derive(Debug, Default)]
pub struct OverlayScheduler {
    expiries: BTreeMap<OverlayKind, Instant>,
}

impl OverlayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expiry to `now + duration` unless it already runs later.
    pub fn arm(&mut self, kind: OverlayKind, duration: Duration, now: Instant) {
        let wanted = now + duration;
        let expiry = self.expiries.entry(kind).or_insert(wanted);
        if wanted > *expiry {
            *expiry = wanted;
        }
        trace!("Overlay {:?} armed until {:?}", kind, *expiry);
    }

    pub fn show(&mut self, kind: OverlayKind, now: Instant) {
        self.arm(kind, kind.duration(), now);
    }

    pub fn is_active(&self, kind: OverlayKind, now: Instant) -> bool {
        self.expiries.get(&kind).is_some_and(|expiry| now < *expiry)
    }

    /// Early dismissal; only the info panel is ever closed this way.
    pub fn dismiss(&mut self, kind: OverlayKind) {
        self.expiries.remove(&kind);
    }

    #[cfg(test)]
    pub fn expiry(&self, kind: OverlayKind) -> Option<Instant> {
        self.expiries.get(&kind).copied()
    }

    pub fn active(&self, now: Instant) -> impl Iterator<Item = OverlayKind> + '_ {
        self.expiries
            .iter()
            .filter(move |(_, expiry)| now < **expiry)
            .map(|(kind, _)| *kind)
    }
}

// Drives `PlaybackMode::AutoCycle`; disarmed in every other mode.
#[derive(Debug, Clone)]
pub struct CycleTimer {
    interval: Duration,
    last_cycle: Option<Instant>,
}

impl CycleTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_cycle: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.last_cycle = Some(now);
    }

    pub fn disarm(&mut self) {
        self.last_cycle = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.last_cycle.is_some()
    }

    /// True once per elapsed interval; resets the reference point when it fires.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.last_cycle {
            Some(last) if now.saturating_duration_since(last) >= self.interval => {
                self.last_cycle = Some(now);
                true
            }
            _ => false,
        }
    }
}
