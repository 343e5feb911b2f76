pub mod client;
pub mod config;
pub mod gate;
pub mod interpolation;
pub mod mirror;
pub mod prediction;

pub use client::{GameClient, WorldStatus};
pub use config::ClientConfig;
pub use gate::{GatePhase, InitGate};
pub use interpolation::{InterpolationConfig, InterpolationManager, PositionSnapshot};
pub use mirror::ClientMirror;
pub use prediction::{ReconcileOutcome, Reconciler, ReconciliationConfig};
