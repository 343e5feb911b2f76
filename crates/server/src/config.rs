#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub max_clients: usize,
    /// Ticks between periodic full snapshots (0 disables them; joining
    /// clients still get one immediately).
    pub full_state_interval: u32,
    /// Outbound frames buffered per client before frames are dropped
    /// instead of stalling the tick.
    pub client_queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_clients: 32,
            full_state_interval: 120,
            client_queue_depth: 64,
        }
    }
}
