//! Command orchestration helpers from page actions to the command bridge.

use command_bridge::{BridgeClient, PendingInvocation};
use shared::protocol::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    LoadInstalledCount,
    Update,
}

impl PageAction {
    pub fn command(self) -> Command {
        match self {
            Self::LoadInstalledCount => Command::get_installed_addon_count(),
            Self::Update => Command::update(),
        }
    }
}

pub fn dispatch_page_action(bridge: &BridgeClient, action: PageAction) -> PendingInvocation {
    let pending = bridge.invoke(action.command());
    tracing::debug!(
        action = ?action,
        invocation_id = %pending.id(),
        command = pending.command().name(),
        "dispatched page action"
    );
    pending
}
