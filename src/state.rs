use std::sync::Arc;

use flag_evaluator::FlagSet;

/// Shared by every request; one immutable snapshot of the loaded flags.
#[derive(Clone)]
pub struct AppState {
    pub flags: Arc<FlagSet>,
}

impl AppState {
    pub fn new(flags: FlagSet) -> Self {
        Self {
            flags: Arc::new(flags),
        }
    }
}
