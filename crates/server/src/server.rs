use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::time::{Duration, Instant};

use glam::Vec2;

use horde::net::{encode_assign_identity, encode_hello, encode_map_data};
use horde::{decode_message, EntityId, EntityKind, Message, StateEncoder, World};

use crate::config::ServerConfig;
use crate::simulation::WaveDirector;

const SPAWN_RING_RADIUS: f32 = 4.0;

struct RemoteClient {
    entity_id: EntityId,
    tx: SyncSender<Vec<u8>>,
    dropped_frames: u64,
}

/// One authoritative game instance. Entity state is mutated only inside
/// `tick`; the flush at the end of each tick serializes once and fans the
/// bytes out to every client queue. Fan-out never blocks: a backpressured
/// client loses frames, not the simulation.
pub struct GameServer {
    config: ServerConfig,
    world: World,
    encoder: StateEncoder,
    director: WaveDirector,
    clients: HashMap<u32, RemoteClient>,
    next_client_id: u32,
    map_data: Vec<u8>,
    start: Instant,
    tick: u64,
}

impl GameServer {
    pub fn new(config: ServerConfig, map_data: Vec<u8>) -> Self {
        Self {
            config,
            world: World::new(),
            encoder: StateEncoder::new(),
            director: WaveDirector::new(),
            clients: HashMap::new(),
            next_client_id: 1,
            map_data,
            start: Instant::now(),
            tick: 0,
        }
    }

    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Admits a connection. The transport delivers the returned queue's
    /// frames however it likes; the handshake (hello, identity, map, full
    /// snapshot) is already enqueued on it.
    pub fn accept(&mut self) -> Option<(u32, Receiver<Vec<u8>>)> {
        if self.clients.len() >= self.config.max_clients {
            log::warn!("rejecting connection: server full");
            return None;
        }

        let (tx, rx) = sync_channel(self.config.client_queue_depth);
        let slot = self.clients.len();
        let entity_id = self
            .world
            .spawn_at(EntityKind::Player, spawn_point(slot));

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let client = RemoteClient {
            entity_id,
            tx,
            dropped_frames: 0,
        };
        let _ = client.tx.try_send(encode_hello());
        let _ = client.tx.try_send(encode_assign_identity(entity_id));
        let _ = client.tx.try_send(encode_map_data(&self.map_data));
        let _ = client.tx.try_send(self.encoder.encode_full(
            &self.world,
            self.director.meta(self.now_ms(), true),
            &self.map_data,
        ));
        self.clients.insert(client_id, client);

        log::info!("client {client_id} connected as entity {entity_id}");
        Some((client_id, rx))
    }

    pub fn handle_message(&mut self, client_id: u32, buf: &[u8]) {
        let message = match decode_message(buf) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("undecodable message from client {client_id}: {err}");
                return;
            }
        };

        match message {
            Message::FullStateRequest => {
                log::debug!("client {client_id} requested a full state");
                let frame = self.encoder.encode_full(
                    &self.world,
                    self.director.meta(self.now_ms(), true),
                    &self.map_data,
                );
                if let Some(client) = self.clients.get_mut(&client_id) {
                    let _ = client.tx.try_send(frame);
                }
            }
            Message::Disconnect => self.drop_client(client_id),
            other => {
                log::debug!("ignoring client {client_id} message: {other:?}");
            }
        }
    }

    pub fn drop_client(&mut self, client_id: u32) {
        if let Some(client) = self.clients.remove(&client_id) {
            self.world.despawn(client.entity_id);
            log::info!(
                "client {client_id} disconnected ({} frames dropped)",
                client.dropped_frames
            );
        }
    }

    /// One simulation step plus its flush.
    pub fn step(&mut self, dt: f32) {
        self.tick += 1;
        let now_ms = self.now_ms();
        self.director.tick(&mut self.world, now_ms, dt);
        self.flush(now_ms);
    }

    fn flush(&mut self, now_ms: f64) {
        let full = self.config.full_state_interval > 0
            && self.tick % self.config.full_state_interval as u64 == 0;

        let frame = if full {
            self.encoder.encode_full(
                &self.world,
                self.director.meta(now_ms, true),
                &self.map_data,
            )
        } else {
            self.encoder
                .encode_delta(&mut self.world, self.director.meta(now_ms, false))
        };
        self.broadcast(frame);
    }

    fn broadcast(&mut self, frame: Vec<u8>) {
        let mut gone = Vec::new();
        for (client_id, client) in &mut self.clients {
            match client.tx.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    client.dropped_frames += 1;
                    log::debug!("client {client_id} backpressured, frame dropped");
                }
                Err(TrySendError::Disconnected(_)) => gone.push(*client_id),
            }
        }
        for client_id in gone {
            self.drop_client(client_id);
        }
    }

    /// Fixed-timestep loop; `max_ticks == 0` runs until interrupted.
    pub fn run(&mut self, max_ticks: u64) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate as f64);
        let dt = tick_duration.as_secs_f32();
        let mut last = Instant::now();
        let mut accumulator = Duration::ZERO;

        loop {
            let now = Instant::now();
            accumulator += now - last;
            last = now;

            while accumulator >= tick_duration {
                self.step(dt);
                accumulator -= tick_duration;

                if self.tick % (self.config.tick_rate as u64 * 10) == 0 {
                    log::info!(
                        "tick {}: {} entities, {} clients, wave {}",
                        self.tick,
                        self.world.len(),
                        self.clients.len(),
                        self.director.wave()
                    );
                }
                if max_ticks > 0 && self.tick >= max_ticks {
                    return;
                }
            }

            std::thread::sleep(tick_duration.saturating_sub(accumulator).min(tick_duration));
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }
}

fn spawn_point(slot: usize) -> Vec2 {
    let angle = slot as f32 * 0.61 * std::f32::consts::TAU;
    Vec2::new(angle.cos(), angle.sin()) * SPAWN_RING_RADIUS
}
