use std::sync::Arc;

use super::device::{DeviceContext, DeviceId};

/// Ordered submission channel of a device.
///
/// Every `execute` encodes one single-use command buffer and submits it
/// here.
#[derive(Debug)]
pub struct CommandQueue {
    pub(crate) ctx: Arc<DeviceContext>,
}

impl CommandQueue {
    pub(crate) fn new(ctx: Arc<DeviceContext>) -> Self {
        Self { ctx }
    }

    pub fn device_id(&self) -> DeviceId {
        self.ctx.id
    }
}
