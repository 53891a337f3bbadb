//! Home page controller: the installed-addon count shown on mount and the
//! update control.

use std::collections::VecDeque;

use command_bridge::{BridgeClient, Invocation, PendingInvocation};
use shared::domain::{AddonCount, InvocationId};

use crate::controller::{
    events::{err_label, StatusEntry, StatusLevel, UiError, UiErrorContext, UiEvent},
    orchestration::{dispatch_page_action, PageAction},
};

const MAX_STATUS_ENTRIES: usize = 200;

#[derive(Debug, Default)]
pub struct HomeState {
    installed_addon_count: Option<AddonCount>,
    status_log: VecDeque<StatusEntry>,
    last_error: Option<UiError>,
    updates_in_flight: usize,
}

impl HomeState {
    /// `None` until the count resolves successfully.
    pub fn installed_addon_count(&self) -> Option<AddonCount> {
        self.installed_addon_count
    }

    /// Oldest first; capped at the most recent entries.
    pub fn status_log(&self) -> &VecDeque<StatusEntry> {
        &self.status_log
    }

    pub fn last_error(&self) -> Option<&UiError> {
        self.last_error.as_ref()
    }

    pub fn updates_in_flight(&self) -> usize {
        self.updates_in_flight
    }

    fn push_status(&mut self, level: StatusLevel, message: String) {
        if self.status_log.len() == MAX_STATUS_ENTRIES {
            self.status_log.pop_front();
        }
        self.status_log.push_back(StatusEntry { level, message });
    }
}

struct Outstanding {
    action: PageAction,
    pending: PendingInvocation,
}

pub struct HomeController {
    bridge: BridgeClient,
    state: HomeState,
    mounted: bool,
    outstanding: Vec<Outstanding>,
}

impl HomeController {
    pub fn new(bridge: BridgeClient) -> Self {
        Self {
            bridge,
            state: HomeState::default(),
            mounted: false,
            outstanding: Vec::new(),
        }
    }

    /// Requests the installed count once per controller; later calls are ignored.
    pub fn on_mount(&mut self) -> bool {
        if self.mounted {
            tracing::debug!("home page already mounted");
            return false;
        }
        self.mounted = true;
        self.dispatch(PageAction::LoadInstalledCount);
        true
    }

    /// Every activation dispatches its own `update`, even while earlier ones run.
    pub fn on_update_clicked(&mut self) -> InvocationId {
        self.state.updates_in_flight += 1;
        self.dispatch(PageAction::Update)
    }

    /// Applies every finished invocation to the page state on the calling thread.
    pub fn process_resolutions(&mut self) -> usize {
        let mut resolved = 0;
        for Outstanding { action, pending } in std::mem::take(&mut self.outstanding) {
            match pending.try_finish() {
                Ok(invocation) => {
                    resolved += 1;
                    let event = resolution_event(action, invocation);
                    self.apply(event);
                }
                Err(pending) => self.outstanding.push(Outstanding { action, pending }),
            }
        }
        resolved
    }

    pub fn has_pending(&self) -> bool {
        !self.outstanding.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn state(&self) -> &HomeState {
        &self.state
    }

    fn dispatch(&mut self, action: PageAction) -> InvocationId {
        let pending = dispatch_page_action(&self.bridge, action);
        let id = pending.id();
        self.outstanding.push(Outstanding { action, pending });
        id
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::InstalledCountLoaded(count) => {
                tracing::info!(count = count.0, "installed addon count loaded");
                self.state.installed_addon_count = Some(count);
                self.state
                    .push_status(StatusLevel::Info, format!("Installed addons: {count}"));
            }
            UiEvent::UpdateFinished {
                invocation_id,
                outcome,
            } => {
                self.state.updates_in_flight = self.state.updates_in_flight.saturating_sub(1);
                tracing::info!(%invocation_id, %outcome, "update finished");
                self.state
                    .push_status(StatusLevel::Info, format!("Update finished: {outcome}"));
            }
            UiEvent::Error(err) => {
                if err.context() == UiErrorContext::Update {
                    self.state.updates_in_flight = self.state.updates_in_flight.saturating_sub(1);
                }
                tracing::error!(
                    context = ?err.context(),
                    category = ?err.category(),
                    code = err.code().unwrap_or("none"),
                    "{}",
                    err.message()
                );
                self.state.push_status(
                    StatusLevel::Error,
                    format!("{} error: {}", err_label(err.category()), err.message()),
                );
                self.state.last_error = Some(err);
            }
        }
    }
}

fn resolution_event(action: PageAction, invocation: Invocation) -> UiEvent {
    let invocation_id = invocation.id();
    match action {
        PageAction::LoadInstalledCount => match invocation.into_result::<AddonCount>() {
            Ok(count) => UiEvent::InstalledCountLoaded(count),
            Err(err) => UiEvent::Error(UiError::from_bridge(UiErrorContext::InstalledCount, &err)),
        },
        PageAction::Update => match invocation.into_outcome() {
            Ok(outcome) => UiEvent::UpdateFinished {
                invocation_id,
                outcome,
            },
            Err(err) => UiEvent::Error(UiError::from_bridge(UiErrorContext::Update, &err)),
        },
    }
}

#[cfg(test)]
#[path = "tests/home_tests.rs"]
mod tests;
