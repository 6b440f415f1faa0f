use fleetwatch_monitor::CycleRunner;
use std::sync::Arc;

pub struct AppState {
    pub service: &'static str,
    pub runner: Arc<dyn CycleRunner>,
}

impl AppState {
    pub fn new(runner: Arc<dyn CycleRunner>) -> Self {
        AppState {
            service: "fleetwatch-node",
            runner,
        }
    }
}
