use std::collections::VecDeque;
use std::time::Instant;

use glam::Vec2;

use horde::net::{encode_disconnect, encode_full_state_request};
use horde::{
    decode_message, registry_hash, Entity, EntityId, GameStateMeta, Message, SpatialGrid,
    StateFrame, PROTOCOL_VERSION,
};

use crate::config::ClientConfig;
use crate::gate::InitGate;
use crate::interpolation::InterpolationManager;
use crate::mirror::ClientMirror;
use crate::prediction::Reconciler;

/// Accumulated top-level game state. Frame metadata fields are optional
/// on the wire; an absent field leaves the last received value alone.
#[derive(Debug, Clone, Default)]
pub struct WorldStatus {
    pub wave_number: Option<u8>,
    pub wave_state: Option<String>,
    pub cycle_start: Option<f64>,
    pub cycle_duration: Option<f64>,
    pub phase_start: Option<f64>,
    pub phase_duration: Option<f64>,
}

impl WorldStatus {
    fn merge(&mut self, meta: &GameStateMeta) {
        if let Some(wave) = meta.wave_number {
            self.wave_number = Some(wave);
        }
        if let Some(state) = &meta.wave_state {
            self.wave_state = Some(state.clone());
        }
        if let Some(start) = meta.cycle_start {
            self.cycle_start = Some(start);
        }
        if let Some(duration) = meta.cycle_duration {
            self.cycle_duration = Some(duration);
        }
        if let Some(start) = meta.phase_start {
            self.phase_start = Some(start);
        }
        if let Some(duration) = meta.phase_duration {
            self.phase_duration = Some(duration);
        }
    }
}

/// Message-driven client facade: feeds received buffers through the
/// initialization gate into the mirror, reconciles the local player, and
/// buffers snapshots for remote-entity interpolation. Inbound frames are
/// handled one at a time in arrival order; transport is the caller's
/// problem, outbound messages are queued in an outbox.
pub struct GameClient {
    config: ClientConfig,
    gate: InitGate,
    mirror: ClientMirror,
    reconciler: Reconciler,
    interpolation: InterpolationManager,
    local_id: Option<EntityId>,
    map_data: Option<Vec<u8>>,
    status: WorldStatus,
    last_applied_timestamp: Option<f64>,
    compatible: bool,
    auto_reconnect: bool,
    outbox: VecDeque<Vec<u8>>,
}

impl Default for GameClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl GameClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config.reconciliation.clone()),
            interpolation: InterpolationManager::new(config.interpolation.clone()),
            config,
            gate: InitGate::new(),
            mirror: ClientMirror::new(),
            local_id: None,
            map_data: None,
            status: WorldStatus::default(),
            last_applied_timestamp: None,
            compatible: true,
            auto_reconnect: true,
            outbox: VecDeque::new(),
        }
    }

    /// Applies one received buffer. Undecodable input drops that one
    /// frame; the connection survives and waits for the next.
    pub fn handle_message(&mut self, buf: &[u8]) {
        let message = match decode_message(buf) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("dropping undecodable frame: {err}");
                return;
            }
        };

        if !self.compatible && !matches!(message, Message::Hello { .. }) {
            log::debug!("ignoring message on incompatible connection");
            return;
        }

        match message {
            Message::Hello {
                protocol_version,
                registry_hash: remote_hash,
            } => self.handle_hello(protocol_version, remote_hash),
            Message::AssignIdentity { entity_id } => {
                log::info!("assigned entity id {entity_id}");
                self.local_id = Some(entity_id);
                self.gate.identity_received();
                self.drain_pending();
            }
            Message::MapData(data) => {
                self.map_data = Some(data);
                self.gate.map_received();
                self.drain_pending();
            }
            Message::GameState(frame) => self.handle_game_state(frame),
            Message::FullStateRequest => {
                // Server-bound only; a client receiving one ignores it.
            }
            Message::Disconnect => {
                log::info!("disconnected by server");
                self.reset();
            }
        }
    }

    fn handle_hello(&mut self, protocol_version: u16, remote_hash: u64) {
        if protocol_version != PROTOCOL_VERSION || remote_hash != registry_hash() {
            // Codes would not mean the same thing on both sides; no
            // partial recovery is possible.
            log::error!(
                "registry/protocol mismatch (peer v{protocol_version}, local v{PROTOCOL_VERSION}); disabling reconnection"
            );
            self.compatible = false;
            self.auto_reconnect = false;
        }
    }

    fn handle_game_state(&mut self, frame: StateFrame) {
        if frame.meta.is_full_state {
            if let Some(map) = &frame.map_data {
                if !map.is_empty() {
                    self.map_data = Some(map.clone());
                    self.gate.map_received();
                }
            }
            if let Some(frame) = self.gate.offer_full_state(frame) {
                self.apply_full(frame);
            }
            return;
        }

        if !self.gate.accepts_delta() {
            // Expected steady-state during connect, not an error.
            log::debug!("dropping delta frame before initialization completed");
            return;
        }
        if self.is_stale(&frame) {
            log::debug!("dropping stale delta frame");
            return;
        }

        if let Some(timestamp) = frame.meta.timestamp {
            self.last_applied_timestamp = Some(timestamp);
        }
        self.status.merge(&frame.meta);
        self.mirror.apply_delta(
            &frame,
            self.local_id,
            &mut self.reconciler,
            &mut self.interpolation,
        );
    }

    fn apply_full(&mut self, frame: StateFrame) {
        if self.is_stale(&frame) {
            log::debug!("dropping stale full-state frame");
            return;
        }
        if let Some(timestamp) = frame.meta.timestamp {
            self.last_applied_timestamp = Some(timestamp);
        }
        self.status.merge(&frame.meta);
        self.mirror.apply_full(
            &frame,
            self.local_id,
            &mut self.reconciler,
            &mut self.interpolation,
        );
        self.gate.mark_ready();
    }

    fn is_stale(&self, frame: &StateFrame) -> bool {
        match (frame.meta.timestamp, self.last_applied_timestamp) {
            (Some(incoming), Some(applied)) => incoming < applied,
            _ => false,
        }
    }

    fn drain_pending(&mut self) {
        if let Some(frame) = self.gate.take_pending() {
            self.apply_full(frame);
        }
    }

    /// Periodic housekeeping: re-requests a full state on an idle timer
    /// while the gate is not ready.
    pub fn update(&mut self, now: Instant) {
        if self.compatible
            && self
                .gate
                .should_request_full_state(now, self.config.full_state_retry)
        {
            log::debug!("requesting full state resync");
            self.outbox.push_back(encode_full_state_request());
        }
    }

    pub fn disconnect(&mut self) {
        self.outbox.push_back(encode_disconnect());
        self.reset();
    }

    fn reset(&mut self) {
        self.gate.reset();
        self.mirror.clear();
        self.interpolation.clear();
        self.reconciler.reset();
        self.local_id = None;
        self.map_data = None;
        self.status = WorldStatus::default();
        self.last_applied_timestamp = None;
    }

    pub fn poll_outbound(&mut self) -> Option<Vec<u8>> {
        self.outbox.pop_front()
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    pub fn local_id(&self) -> Option<EntityId> {
        self.local_id
    }

    pub fn local_player(&self) -> Option<&Entity> {
        self.mirror.get(self.local_id?)
    }

    pub fn ghost_position(&self) -> Option<Vec2> {
        self.reconciler.ghost()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.mirror.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.mirror.entities()
    }

    pub fn entity_count(&self) -> usize {
        self.mirror.len()
    }

    pub fn spatial(&self) -> &SpatialGrid {
        self.mirror.grid()
    }

    pub fn map_data(&self) -> Option<&[u8]> {
        self.map_data.as_deref()
    }

    pub fn status(&self) -> &WorldStatus {
        &self.status
    }

    /// Where to draw an entity right now: the local player renders its
    /// predicted position straight from the mirror, remote entities render
    /// the interpolated sample and fall back to the raw mirror position
    /// until enough snapshots exist.
    pub fn render_position(&self, id: EntityId, render_time: f64) -> Option<Vec2> {
        if self.local_id == Some(id) {
            return self.mirror.get(id)?.position();
        }
        self.interpolation
            .interpolated_position(id, render_time)
            .or_else(|| self.mirror.get(id)?.position())
    }
}
