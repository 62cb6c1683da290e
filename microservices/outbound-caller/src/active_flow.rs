//! Flow sid used for new executions, replaced in place by the redeployer

use parking_lot::RwLock;
use voxpool_core::FlowSid;

#[derive(Debug, Default)]
pub struct ActiveFlow {
    sid: RwLock<Option<FlowSid>>,
}

impl ActiveFlow {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            sid: RwLock::new(initial.map(FlowSid::new)),
        }
    }

    pub fn current(&self) -> Option<FlowSid> {
        self.sid.read().clone()
    }

    /// Last write wins; returns the sid that was replaced.
    pub fn replace(&self, sid: FlowSid) -> Option<FlowSid> {
        self.sid.write().replace(sid)
    }
}
