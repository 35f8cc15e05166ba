//! Customization gate
//!
//! Tracks whether the caregiver has reviewed and saved the protocol. Until
//! they have, every start shows the "using default settings" warning. The
//! only transition is `Unconfirmed -> Confirmed`; nothing here moves it back,
//! including a protocol reset.

use log::{info, warn};

use crate::storage::{write_text, KvStore, CONFIRMED_KEY};

/// Stored value meaning "confirmed"; anything else means unconfirmed
pub const CONFIRMED_VALUE: &str = "true";

pub const DEFAULTS_WARNING: &str = "This app is currently running with generic default values, \
not a personalized protocol. Before using this as a treatment guide, customize the carb amounts \
and contact info to match the care plan prescribed by your physician.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unconfirmed,
    Confirmed,
}

/// What the presentation layer should do after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSignal {
    ShowWarning,
    Quiet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizationGate {
    state: GateState,
    has_saved_data: bool,
}

impl Default for CustomizationGate {
    fn default() -> Self {
        Self {
            state: GateState::Unconfirmed,
            has_saved_data: false,
        }
    }
}

impl CustomizationGate {
    /// Decide the start state from the stored flag and whether any of the
    /// settings, contacts or name slices were found.
    pub fn on_load(stored_flag: Option<&str>, has_saved_data: bool) -> (Self, LoadSignal) {
        let confirmed = stored_flag == Some(CONFIRMED_VALUE);
        if confirmed && has_saved_data {
            let gate = Self {
                state: GateState::Confirmed,
                has_saved_data,
            };
            (gate, LoadSignal::Quiet)
        } else {
            // A flag with nothing saved behind it is not trusted.
            let gate = Self {
                state: GateState::Unconfirmed,
                has_saved_data,
            };
            (gate, LoadSignal::ShowWarning)
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Record that a settings, contacts or name slice has been written
    pub fn mark_data_saved(&mut self) {
        self.has_saved_data = true;
    }

    /// Confirmed and backed by saved data
    pub fn is_customized(&self) -> bool {
        self.state == GateState::Confirmed && self.has_saved_data
    }

    /// Enter `Confirmed` and persist the flag before returning.
    ///
    /// The in-memory state moves even if the write fails; the warning then
    /// reappears on the next start.
    pub fn confirm(&mut self, store: &mut dyn KvStore) {
        if self.state == GateState::Unconfirmed {
            info!("Protocol confirmed by caregiver");
        }
        self.state = GateState::Confirmed;
        if !write_text(store, CONFIRMED_KEY, CONFIRMED_VALUE) {
            warn!("Confirmation not persisted; the defaults warning will return next start");
        }
    }
}
