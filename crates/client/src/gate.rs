use std::time::{Duration, Instant};

use horde::StateFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    AwaitingIdentity,
    AwaitingFirstFullState,
    Ready,
}

/// Orders the three async handshake facts (assigned identity, map data,
/// first full snapshot) so a delta is provably never applied against an
/// incomplete world.
///
/// A full state that arrives before the identity is dropped outright: the
/// identity decides which entity in it is "ours", and applying without
/// that knowledge would mis-seed reconciliation. One that arrives after
/// the identity but before the map is buffered; the identity and map
/// events both poke the same pending-frame check.
#[derive(Debug)]
pub struct InitGate {
    phase: GatePhase,
    awaiting_map: bool,
    pending_full: Option<StateFrame>,
    last_request: Option<Instant>,
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InitGate {
    pub fn new() -> Self {
        Self {
            phase: GatePhase::AwaitingIdentity,
            awaiting_map: true,
            pending_full: None,
            last_request: None,
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == GatePhase::Ready
    }

    pub fn awaiting_map(&self) -> bool {
        self.awaiting_map
    }

    pub fn accepts_delta(&self) -> bool {
        self.phase == GatePhase::Ready
    }

    pub fn identity_received(&mut self) {
        if self.phase == GatePhase::AwaitingIdentity {
            self.phase = GatePhase::AwaitingFirstFullState;
        }
    }

    pub fn map_received(&mut self) {
        self.awaiting_map = false;
    }

    /// Routes an arriving full-state frame: apply now (`Some`), or dropped
    /// or buffered (`None`).
    pub fn offer_full_state(&mut self, frame: StateFrame) -> Option<StateFrame> {
        if self.phase == GatePhase::AwaitingIdentity {
            log::debug!("dropping full state received before identity assignment");
            return None;
        }
        if self.awaiting_map {
            log::debug!("buffering full state until map data arrives");
            self.pending_full = Some(frame);
            return None;
        }
        Some(frame)
    }

    /// Releases a buffered full state once every gate fact is in.
    pub fn take_pending(&mut self) -> Option<StateFrame> {
        if self.phase != GatePhase::AwaitingIdentity && !self.awaiting_map {
            self.pending_full.take()
        } else {
            None
        }
    }

    pub fn mark_ready(&mut self) {
        self.phase = GatePhase::Ready;
    }

    pub fn reset(&mut self) {
        self.phase = GatePhase::AwaitingIdentity;
        self.awaiting_map = true;
        self.pending_full = None;
        self.last_request = None;
    }

    /// Idle retry: true when the client should (re-)request a full state.
    pub fn should_request_full_state(&mut self, now: Instant, interval: Duration) -> bool {
        if self.is_ready() {
            self.last_request = None;
            return false;
        }
        match self.last_request {
            None => {
                self.last_request = Some(now);
                false
            }
            Some(last) if now.duration_since(last) >= interval => {
                self.last_request = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde::GameStateMeta;

    fn frame() -> StateFrame {
        StateFrame {
            records: Vec::new(),
            meta: GameStateMeta {
                is_full_state: true,
                ..Default::default()
            },
            removed_ids: Vec::new(),
            map_data: Some(Vec::new()),
        }
    }

    #[test]
    fn full_state_before_identity_is_dropped_not_buffered() {
        let mut gate = InitGate::new();
        assert!(gate.offer_full_state(frame()).is_none());

        gate.identity_received();
        gate.map_received();
        assert!(gate.take_pending().is_none());
    }

    #[test]
    fn full_state_waits_for_map() {
        let mut gate = InitGate::new();
        gate.identity_received();

        assert!(gate.offer_full_state(frame()).is_none());
        assert!(gate.take_pending().is_none());

        gate.map_received();
        assert!(gate.take_pending().is_some());
    }

    #[test]
    fn facts_arrive_in_any_order() {
        let mut gate = InitGate::new();
        gate.map_received();
        gate.identity_received();
        assert!(gate.offer_full_state(frame()).is_some());
    }

    #[test]
    fn deltas_refused_until_ready() {
        let mut gate = InitGate::new();
        assert!(!gate.accepts_delta());
        gate.identity_received();
        gate.map_received();
        assert!(!gate.accepts_delta());
        gate.mark_ready();
        assert!(gate.accepts_delta());
    }

    #[test]
    fn request_timer_arms_then_fires() {
        let mut gate = InitGate::new();
        let t0 = Instant::now();
        let interval = Duration::from_secs(3);

        assert!(!gate.should_request_full_state(t0, interval));
        assert!(!gate.should_request_full_state(t0 + Duration::from_secs(1), interval));
        assert!(gate.should_request_full_state(t0 + Duration::from_secs(4), interval));

        gate.mark_ready();
        assert!(!gate.should_request_full_state(t0 + Duration::from_secs(60), interval));
    }

    #[test]
    fn disconnect_resets_everything() {
        let mut gate = InitGate::new();
        gate.identity_received();
        gate.map_received();
        gate.mark_ready();

        gate.reset();
        assert_eq!(gate.phase(), GatePhase::AwaitingIdentity);
        assert!(gate.awaiting_map());
    }
}
