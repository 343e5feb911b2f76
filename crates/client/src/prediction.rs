use glam::Vec2;

use horde::{Entity, SpatialGrid};

pub const DEFAULT_ERROR_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// Divergence beyond this many world units is corrected with a hard
    /// snap instead of letting the local prediction stand.
    pub error_threshold: f32,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            error_threshold: DEFAULT_ERROR_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Small drift: the local prediction kept winning visually.
    Held,
    /// Large divergence (teleport, desync): the authoritative position
    /// replaced the prediction outright.
    Snapped,
}

/// Reconciles the locally-controlled entity's predicted position against
/// the authoritative one. The most recent server position is held as the
/// ghost position, separate from whatever is being rendered.
#[derive(Debug, Default)]
pub struct Reconciler {
    config: ReconciliationConfig,
    ghost: Option<Vec2>,
}

impl Reconciler {
    pub fn new(config: ReconciliationConfig) -> Self {
        Self {
            config,
            ghost: None,
        }
    }

    /// Last authoritative position received for the local player.
    pub fn ghost(&self) -> Option<Vec2> {
        self.ghost
    }

    /// Called after the incoming positional fields have been applied to
    /// `entity`; `client_pos` is the rendered position captured before the
    /// apply. Small error restores the prediction, large error accepts the
    /// server outright, and the spatial grid tracks whichever position is
    /// rendered.
    pub fn reconcile(
        &mut self,
        entity: &mut Entity,
        grid: &mut SpatialGrid,
        client_pos: Vec2,
    ) -> ReconcileOutcome {
        let Some(server_pos) = entity.position() else {
            return ReconcileOutcome::Held;
        };
        self.ghost = Some(server_pos);

        let error = client_pos.distance(server_pos);
        if error > self.config.error_threshold {
            grid.insert(entity.id, server_pos);
            ReconcileOutcome::Snapped
        } else {
            entity.set_position(client_pos);
            grid.insert(entity.id, client_pos);
            ReconcileOutcome::Held
        }
    }

    /// Full-state resyncs bypass the trust policy and always snap.
    pub fn snap_to(&mut self, server_pos: Vec2) {
        self.ghost = Some(server_pos);
    }

    pub fn reset(&mut self) {
        self.ghost = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde::{factory, EntityKind};

    fn player_at(pos: Vec2) -> Entity {
        let mut entity = factory::spawn(1, EntityKind::Player);
        entity.set_position(pos);
        entity
    }

    #[test]
    fn small_drift_trusts_the_prediction() {
        let mut reconciler = Reconciler::new(ReconciliationConfig::default());
        let mut grid = SpatialGrid::default();

        // Server says (10, 0); we rendered (0, 0).
        let mut entity = player_at(Vec2::new(10.0, 0.0));
        let outcome = reconciler.reconcile(&mut entity, &mut grid, Vec2::ZERO);

        assert_eq!(outcome, ReconcileOutcome::Held);
        assert_eq!(entity.position(), Some(Vec2::ZERO));
        assert_eq!(grid.position(1), Some(Vec2::ZERO));
        // The authoritative position is still remembered for next time.
        assert_eq!(reconciler.ghost(), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn large_divergence_snaps() {
        let mut reconciler = Reconciler::new(ReconciliationConfig::default());
        let mut grid = SpatialGrid::default();

        let mut entity = player_at(Vec2::new(1000.0, 0.0));
        let outcome = reconciler.reconcile(&mut entity, &mut grid, Vec2::ZERO);

        assert_eq!(outcome, ReconcileOutcome::Snapped);
        assert_eq!(entity.position(), Some(Vec2::new(1000.0, 0.0)));
        assert_eq!(grid.position(1), Some(Vec2::new(1000.0, 0.0)));
    }

    #[test]
    fn threshold_is_configurable() {
        let mut reconciler = Reconciler::new(ReconciliationConfig {
            error_threshold: 5.0,
        });
        let mut grid = SpatialGrid::default();

        let mut entity = player_at(Vec2::new(10.0, 0.0));
        let outcome = reconciler.reconcile(&mut entity, &mut grid, Vec2::ZERO);
        assert_eq!(outcome, ReconcileOutcome::Snapped);
    }
}
