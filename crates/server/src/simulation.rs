use glam::Vec2;

use horde::{EntityKind, GameStateMeta, World};

pub const CYCLE_DURATION_MS: f64 = 240_000.0;
pub const CALM_DURATION_MS: f64 = 20_000.0;
pub const ASSAULT_DURATION_MS: f64 = 45_000.0;

const ZOMBIE_SPEED: f32 = 1.8;
const SPAWN_RADIUS: f32 = 60.0;
const BASE_WAVE_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavePhase {
    Calm,
    Assault,
}

impl WavePhase {
    pub fn name(self) -> &'static str {
        match self {
            WavePhase::Calm => "calm",
            WavePhase::Assault => "assault",
        }
    }

    fn duration_ms(self) -> f64 {
        match self {
            WavePhase::Calm => CALM_DURATION_MS,
            WavePhase::Assault => ASSAULT_DURATION_MS,
        }
    }
}

/// Drives the wave/phase clock and the zombie drift that exercises dirty
/// tracking every tick. Wave fields only ride in the flush metadata when
/// they changed; absent metadata means "unchanged" on the client.
#[derive(Debug)]
pub struct WaveDirector {
    wave: u8,
    phase: WavePhase,
    phase_start_ms: f64,
    cycle_start_ms: f64,
    meta_dirty: bool,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self {
            wave: 0,
            phase: WavePhase::Calm,
            phase_start_ms: 0.0,
            cycle_start_ms: 0.0,
            meta_dirty: true,
        }
    }

    pub fn wave(&self) -> u8 {
        self.wave
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn tick(&mut self, world: &mut World, now_ms: f64, dt: f32) {
        while now_ms - self.cycle_start_ms >= CYCLE_DURATION_MS {
            self.cycle_start_ms += CYCLE_DURATION_MS;
            self.meta_dirty = true;
        }

        if now_ms - self.phase_start_ms >= self.phase.duration_ms() {
            self.advance_phase(world, now_ms);
        }

        drive_zombies(world, dt);
    }

    fn advance_phase(&mut self, world: &mut World, now_ms: f64) {
        self.phase = match self.phase {
            WavePhase::Calm => WavePhase::Assault,
            WavePhase::Assault => WavePhase::Calm,
        };
        self.phase_start_ms = now_ms;
        self.meta_dirty = true;

        if self.phase == WavePhase::Assault {
            self.wave = self.wave.saturating_add(1);
            let count = BASE_WAVE_SIZE + self.wave as u32 * 2;
            spawn_wave(world, self.wave, count);
            log::info!("wave {} started: {count} zombies", self.wave);
        }
    }

    /// Metadata for the next flush. Wave/phase fields are included only
    /// when they changed since the last delta (or always, on a full
    /// snapshot); emitting a delta consumes the dirtiness.
    pub fn meta(&mut self, now_ms: f64, full: bool) -> GameStateMeta {
        let include = full || self.meta_dirty;
        let meta = GameStateMeta {
            timestamp: Some(now_ms),
            cycle_start: include.then_some(self.cycle_start_ms),
            cycle_duration: include.then_some(CYCLE_DURATION_MS),
            wave_number: include.then_some(self.wave),
            wave_state: include.then(|| self.phase.name().to_string()),
            phase_start: include.then_some(self.phase_start_ms),
            phase_duration: include.then_some(self.phase.duration_ms()),
            is_full_state: full,
        };
        if !full {
            self.meta_dirty = false;
        }
        meta
    }
}

fn spawn_wave(world: &mut World, wave: u8, count: u32) {
    for i in 0..count {
        let angle =
            (i as f32 / count as f32 + wave as f32 * 0.37) * std::f32::consts::TAU;
        let position = Vec2::new(angle.cos(), angle.sin()) * SPAWN_RADIUS;
        world.spawn_at(EntityKind::Zombie, position);
    }
}

fn drive_zombies(world: &mut World, dt: f32) {
    let players: Vec<Vec2> = world
        .entities()
        .filter(|entity| entity.kind == EntityKind::Player)
        .filter_map(|entity| entity.position())
        .collect();
    if players.is_empty() {
        return;
    }

    for entity in world.entities_mut() {
        if entity.kind != EntityKind::Zombie {
            continue;
        }
        let Some(position) = entity.position() else {
            continue;
        };

        let target = players
            .iter()
            .copied()
            .min_by(|a, b| {
                a.distance_squared(position)
                    .total_cmp(&b.distance_squared(position))
            })
            .unwrap_or(Vec2::ZERO);

        let delta = target - position;
        if delta.length_squared() < 0.25 {
            // In melee range: stop, but only dirty the entity once.
            if entity.velocity() != Some(Vec2::ZERO) {
                entity.set_velocity(Vec2::ZERO);
            }
            continue;
        }

        let velocity = delta.normalize_or_zero() * ZOMBIE_SPEED;
        entity.set_velocity(velocity);
        entity.set_position(position + velocity * dt);
    }
}
