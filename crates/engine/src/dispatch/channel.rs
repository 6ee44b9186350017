use crate::rules::{ChannelAction, ChannelKind};

use super::result::{ChannelResult, DispatchIntent};

/// One delivery mechanism. `send` never returns an error: delivery failure is
/// folded into the tagged `ChannelResult` so it stays observable in the audit
/// trail. Implementations must bound their own I/O; the coordinator adds an
/// outer timeout on top.
#[async_trait::async_trait]
pub trait ChannelDispatcher: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn send(&self, intent: &DispatchIntent, action: &ChannelAction) -> ChannelResult;
}
