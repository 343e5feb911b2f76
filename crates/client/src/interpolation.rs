use std::collections::{HashMap, VecDeque};

use glam::Vec2;

use horde::EntityId;

pub const DEFAULT_INTERPOLATION_DELAY_MS: f64 = 100.0;
pub const DEFAULT_HISTORY_WINDOW_MS: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct InterpolationConfig {
    /// Render this far behind the newest snapshot. The fixed delay buys a
    /// bracketing pair of snapshots to interpolate between.
    pub delay_ms: f64,
    pub window_ms: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_INTERPOLATION_DELAY_MS,
            window_ms: DEFAULT_HISTORY_WINDOW_MS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PositionSnapshot {
    pub position: Vec2,
    pub timestamp: f64,
}

/// Smooths remote entities between discrete network updates by keeping a
/// short timestamped position history per entity and sampling it slightly
/// in the past. Never extrapolates: with a single snapshot the sample is
/// returned verbatim, and a query past the newest snapshot clamps to it.
#[derive(Debug, Default)]
pub struct InterpolationManager {
    config: InterpolationConfig,
    histories: HashMap<EntityId, VecDeque<PositionSnapshot>>,
}

impl InterpolationManager {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            histories: HashMap::new(),
        }
    }

    pub fn add_snapshot(&mut self, id: EntityId, position: Vec2, timestamp: f64) {
        let history = self.histories.entry(id).or_default();

        // Frames are applied in server order; a snapshot older than the
        // newest one is a duplicate or reorder artifact and is ignored.
        if history
            .back()
            .is_some_and(|last| timestamp < last.timestamp)
        {
            log::debug!("ignoring out-of-order snapshot for entity {id}");
            return;
        }

        history.push_back(PositionSnapshot {
            position,
            timestamp,
        });

        let horizon = timestamp - self.config.window_ms;
        while history
            .front()
            .is_some_and(|oldest| oldest.timestamp < horizon)
        {
            history.pop_front();
        }
    }

    pub fn interpolated_position(&self, id: EntityId, render_time: f64) -> Option<Vec2> {
        let history = self.histories.get(&id)?;
        let first = history.front()?;
        if history.len() == 1 {
            return Some(first.position);
        }

        let target = render_time - self.config.delay_ms;
        if target <= first.timestamp {
            return Some(first.position);
        }
        let last = history.back()?;
        if target >= last.timestamp {
            return Some(last.position);
        }

        for pair in history.iter().zip(history.iter().skip(1)) {
            let (from, to) = pair;
            if from.timestamp <= target && target <= to.timestamp {
                let duration = to.timestamp - from.timestamp;
                let t = if duration > 0.0 {
                    ((target - from.timestamp) / duration) as f32
                } else {
                    0.0
                };
                return Some(from.position.lerp(to.position, t));
            }
        }

        Some(last.position)
    }

    pub fn snapshot_count(&self, id: EntityId) -> usize {
        self.histories.get(&id).map_or(0, VecDeque::len)
    }

    pub fn forget(&mut self, id: EntityId) {
        self.histories.remove(&id);
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_without_delay() -> InterpolationManager {
        InterpolationManager::new(InterpolationConfig {
            delay_ms: 0.0,
            window_ms: DEFAULT_HISTORY_WINDOW_MS,
        })
    }

    #[test]
    fn test_midpoint_interpolation() {
        let mut manager = manager_without_delay();
        manager.add_snapshot(5, Vec2::new(0.0, 0.0), 0.0);
        manager.add_snapshot(5, Vec2::new(100.0, 0.0), 100.0);

        let pos = manager.interpolated_position(5, 50.0).unwrap();
        assert!((pos - Vec2::new(50.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_single_snapshot_returned_verbatim() {
        let mut manager = manager_without_delay();
        manager.add_snapshot(5, Vec2::new(7.0, -2.0), 40.0);

        assert_eq!(
            manager.interpolated_position(5, 500.0),
            Some(Vec2::new(7.0, -2.0))
        );
    }

    #[test]
    fn test_no_extrapolation_past_newest() {
        let mut manager = manager_without_delay();
        manager.add_snapshot(5, Vec2::ZERO, 0.0);
        manager.add_snapshot(5, Vec2::new(10.0, 0.0), 100.0);

        assert_eq!(
            manager.interpolated_position(5, 1000.0),
            Some(Vec2::new(10.0, 0.0))
        );
    }

    #[test]
    fn test_render_delay_shifts_the_sample() {
        let mut manager = InterpolationManager::new(InterpolationConfig {
            delay_ms: 100.0,
            window_ms: DEFAULT_HISTORY_WINDOW_MS,
        });
        manager.add_snapshot(5, Vec2::ZERO, 0.0);
        manager.add_snapshot(5, Vec2::new(100.0, 0.0), 100.0);

        // Render time 150 samples server time 50.
        let pos = manager.interpolated_position(5, 150.0).unwrap();
        assert!((pos - Vec2::new(50.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_window_pruning() {
        let mut manager = manager_without_delay();
        for i in 0..100 {
            manager.add_snapshot(5, Vec2::new(i as f32, 0.0), i as f64 * 50.0);
        }
        // 1s window at 50ms cadence keeps ~21 snapshots.
        assert!(manager.snapshot_count(5) <= 22);
    }

    #[test]
    fn test_unknown_entity_degrades_to_none() {
        let manager = manager_without_delay();
        assert_eq!(manager.interpolated_position(99, 0.0), None);
    }
}
