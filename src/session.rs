//! Application session
//!
//! Owns the protocol table, contacts, display name and customization gate for
//! one run. Everything is read from the store once at startup and written
//! back after each mutation; a failing store never stops the session, it
//! just leaves the defaults in place.

use log::{info, warn};

use crate::carbs::CarbValue;
use crate::contacts::{ContactBook, ContactField};
use crate::engine::{recommend_input, Recommendation};
use crate::error::CalcError;
use crate::gate::{CustomizationGate, LoadSignal};
use crate::protocol::ProtocolTable;
use crate::storage::{read_text, write_text, KvStore, CONFIRMED_KEY, CONTACTS_KEY, NAME_KEY, SETTINGS_KEY};
use crate::trend::TrendDirection;

pub struct Session {
    store: Box<dyn KvStore>,
    table: ProtocolTable,
    contacts: ContactBook,
    name: String,
    gate: CustomizationGate,
    load_signal: LoadSignal,
}

impl Session {
    /// Read all four slices and settle the gate state
    pub fn load(store: Box<dyn KvStore>) -> Self {
        let table = read_text(&*store, SETTINGS_KEY).and_then(|json| {
            ProtocolTable::from_json(&json)
                .map_err(|e| warn!("Stored protocol ignored: {}", e))
                .ok()
        });
        let contacts = read_text(&*store, CONTACTS_KEY).and_then(|json| {
            ContactBook::from_json(&json)
                .map_err(|e| warn!("Stored contacts ignored: {}", e))
                .ok()
        });
        let name = read_text(&*store, NAME_KEY).filter(|n| !n.is_empty());
        let flag = read_text(&*store, CONFIRMED_KEY);

        let has_saved_data = table.is_some() || contacts.is_some() || name.is_some();
        info!(
            "Loaded session: settings={} contacts={} name={} confirmed={:?}",
            table.is_some(),
            contacts.is_some(),
            name.is_some(),
            flag
        );
        let (gate, load_signal) = CustomizationGate::on_load(flag.as_deref(), has_saved_data);

        Self {
            store,
            table: table.unwrap_or_default(),
            contacts: contacts.unwrap_or_default(),
            name: name.unwrap_or_default(),
            gate,
            load_signal,
        }
    }

    pub fn table(&self) -> &ProtocolTable {
        &self.table
    }

    pub fn contacts(&self) -> &ContactBook {
        &self.contacts
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gate(&self) -> &CustomizationGate {
        &self.gate
    }

    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    /// Signal computed at startup
    pub fn load_signal(&self) -> LoadSignal {
        self.load_signal
    }

    /// Whether the defaults warning should be on screen right now
    pub fn should_warn(&self) -> bool {
        self.load_signal == LoadSignal::ShowWarning && !self.gate.is_customized()
    }

    pub fn is_customized(&self) -> bool {
        self.gate.is_customized()
    }

    pub fn get_recommendation(&self, trend: Option<TrendDirection>, reading: &str) -> Option<Recommendation> {
        recommend_input(trend, reading, &self.table)
    }

    /// Edit one cell from typed input and persist the table
    pub fn edit_cell(&mut self, trend: TrendDirection, band: usize, input: &str) -> Result<CarbValue, CalcError> {
        let value = self.table.set_cell(trend, band, input)?;
        self.persist_settings();
        Ok(value)
    }

    pub fn set_finger_poke(&mut self, trend: TrendDirection, band: usize, on: bool) -> Result<(), CalcError> {
        self.table.set_finger_poke(trend, band, on)?;
        self.persist_settings();
        Ok(())
    }

    pub fn set_retest(&mut self, trend: TrendDirection, band: usize, on: bool) -> Result<(), CalcError> {
        self.table.set_retest(trend, band, on)?;
        self.persist_settings();
        Ok(())
    }

    /// Restore the built-in protocol. Confirmation is left as it was.
    pub fn reset_to_defaults(&mut self) {
        self.table.reset_to_defaults();
        self.persist_settings();
    }

    /// Save action on the protocol editor
    pub fn confirm_protocol(&mut self) {
        self.persist_settings();
        self.gate.confirm(&mut *self.store);
    }

    /// Save action on the contact editor: adopt the draft and confirm
    pub fn confirm_contacts(&mut self, draft: ContactBook) {
        self.contacts = draft;
        self.persist_contacts();
        self.gate.confirm(&mut *self.store);
    }

    pub fn set_contact_field(&mut self, field: ContactField, value: &str) {
        self.contacts.set(field, value);
        self.persist_contacts();
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if write_text(&mut *self.store, NAME_KEY, &self.name) && !self.name.is_empty() {
            self.gate.mark_data_saved();
        }
    }

    fn persist_settings(&mut self) {
        match self.table.to_json() {
            Ok(json) => {
                if write_text(&mut *self.store, SETTINGS_KEY, &json) {
                    self.gate.mark_data_saved();
                }
            }
            Err(e) => warn!("Could not encode protocol: {}", e),
        }
    }

    fn persist_contacts(&mut self) {
        match self.contacts.to_json() {
            Ok(json) => {
                if write_text(&mut *self.store, CONTACTS_KEY, &json) {
                    self.gate.mark_data_saved();
                }
            }
            Err(e) => warn!("Could not encode contacts: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateState;
    use crate::storage::MemoryStore;
    use crate::urgency::UrgencyTier;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Memory store whose contents outlive the session that owns it
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<HashMap<String, Vec<u8>>>>);

    impl KvStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CalcError> {
            Ok(self.0.borrow().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &[u8]) -> Result<(), CalcError> {
            self.0.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }
    }

    impl SharedStore {
        fn text(&self, key: &str) -> Option<String> {
            read_text(self, key)
        }
    }

    struct UnavailableStore;

    impl KvStore for UnavailableStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CalcError> {
            Err(CalcError::PersistenceUnavailable(key.to_string()))
        }

        fn set(&mut self, key: &str, _value: &[u8]) -> Result<(), CalcError> {
            Err(CalcError::PersistenceUnavailable(key.to_string()))
        }
    }

    #[test]
    fn test_first_run_uses_defaults_and_warns() {
        let session = Session::load(Box::new(MemoryStore::new()));
        assert!(session.table().is_default());
        assert_eq!(session.contacts(), &ContactBook::default());
        assert_eq!(session.name(), "");
        assert_eq!(session.load_signal(), LoadSignal::ShowWarning);
        assert!(session.should_warn());
        assert!(!session.is_customized());
    }

    #[test]
    fn test_edit_cell_writes_through() {
        let store = SharedStore::default();
        let mut session = Session::load(Box::new(store.clone()));

        let value = session.edit_cell(TrendDirection::Flat, 4, "pump").unwrap();
        assert_eq!(value, CarbValue::CheckPump);
        let rec = session.get_recommendation(Some(TrendDirection::Flat), "130").unwrap();
        assert_eq!(rec.urgency, UrgencyTier::Pump);
        assert_eq!(rec.action().main, "Check Insulin Pump");

        let saved = ProtocolTable::from_json(&store.text(SETTINGS_KEY).unwrap()).unwrap();
        assert_eq!(saved.cell(TrendDirection::Flat, 4).unwrap().carbs, CarbValue::CheckPump);
        // Editing alone does not confirm.
        assert_eq!(store.text(CONFIRMED_KEY), None);
        assert!(!session.is_customized());
    }

    #[test]
    fn test_bad_cell_input_changes_nothing() {
        let store = SharedStore::default();
        let mut session = Session::load(Box::new(store.clone()));
        let err = session.edit_cell(TrendDirection::DoubleDown, 0, "xyz").unwrap_err();
        assert!(matches!(err, CalcError::InvalidCellInput(_)));
        assert_eq!(
            session.table().cell(TrendDirection::DoubleDown, 0).unwrap().carbs,
            CarbValue::Grams(15)
        );
        assert_eq!(store.text(SETTINGS_KEY), None);
    }

    #[test]
    fn test_confirm_protocol_survives_restart() {
        let store = SharedStore::default();
        {
            let mut session = Session::load(Box::new(store.clone()));
            session.confirm_protocol();
            assert!(session.is_customized());
            assert!(!session.should_warn());
        }

        assert_eq!(store.text(CONFIRMED_KEY).as_deref(), Some("true"));
        assert!(store.text(SETTINGS_KEY).is_some());

        let session = Session::load(Box::new(store.clone()));
        assert_eq!(session.gate().state(), GateState::Confirmed);
        assert_eq!(session.load_signal(), LoadSignal::Quiet);
        assert!(session.is_customized());
    }

    #[test]
    fn test_confirm_contacts_adopts_draft() {
        let store = SharedStore::default();
        let mut session = Session::load(Box::new(store.clone()));
        let mut draft = session.contacts().clone();
        draft.set(ContactField::NurseName, "Nurse Johnson");
        draft.set(ContactField::NursePhone, "(503) 555-0200");

        session.confirm_contacts(draft);
        assert!(session.contacts().has_nurse());
        assert!(session.is_customized());

        let reloaded = Session::load(Box::new(store.clone()));
        assert_eq!(reloaded.contacts().nurse.name, "Nurse Johnson");
        assert!(reloaded.is_customized());
    }

    #[test]
    fn test_reset_keeps_confirmation() {
        let store = SharedStore::default();
        let mut session = Session::load(Box::new(store.clone()));
        session.edit_cell(TrendDirection::DoubleDown, 0, "20").unwrap();
        session.confirm_protocol();

        session.reset_to_defaults();
        assert!(session.table().is_default());
        assert!(session.is_customized());

        let reloaded = Session::load(Box::new(store.clone()));
        assert!(reloaded.table().is_default());
        assert_eq!(reloaded.gate().state(), GateState::Confirmed);
    }

    #[test]
    fn test_saved_data_without_confirmation_warns() {
        let store = SharedStore::default();
        {
            let mut session = Session::load(Box::new(store.clone()));
            session.set_name("Ada");
            session.set_contact_field(ContactField::PhysicianName, "Dr. Smith");
        }
        let session = Session::load(Box::new(store.clone()));
        assert_eq!(session.name(), "Ada");
        assert_eq!(session.contacts().physician.name, "Dr. Smith");
        assert!(session.should_warn());
    }

    #[test]
    fn test_contact_edits_wait_for_save() {
        let store = SharedStore::default();
        let mut session = Session::load(Box::new(store.clone()));
        session.set_contact_field(ContactField::NursePhone, "(503) 555-0200");
        assert!(store.text(CONTACTS_KEY).is_some());
        assert_eq!(store.text(CONFIRMED_KEY), None);
        assert!(!session.is_customized());

        session.confirm_contacts(session.contacts().clone());
        assert_eq!(store.text(CONFIRMED_KEY).as_deref(), Some("true"));
        assert!(session.is_customized());
    }

    #[test]
    fn test_name_is_stored_as_typed() {
        let store = SharedStore::default();
        let mut session = Session::load(Box::new(store.clone()));
        session.set_name("  Ada ");
        assert_eq!(session.name(), "  Ada ");
        assert_eq!(store.text(NAME_KEY).as_deref(), Some("  Ada "));

        let reloaded = Session::load(Box::new(store.clone()));
        assert_eq!(reloaded.name(), "  Ada ");
    }

    #[test]
    fn test_stale_flag_without_data_warns() {
        let mut store = SharedStore::default();
        store.set(CONFIRMED_KEY, b"true").unwrap();
        let session = Session::load(Box::new(store));
        assert_eq!(session.gate().state(), GateState::Unconfirmed);
        assert!(session.should_warn());
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let mut store = SharedStore::default();
        store.set(SETTINGS_KEY, br#"{"bands": [], "carbAmount": []}"#).unwrap();
        store.set(CONFIRMED_KEY, b"true").unwrap();
        let session = Session::load(Box::new(store));
        assert!(session.table().is_default());
        assert!(session.should_warn());
    }

    #[test]
    fn test_unavailable_store_is_absorbed() {
        let mut session = Session::load(Box::new(UnavailableStore));
        assert!(session.table().is_default());
        assert!(session.should_warn());

        session.edit_cell(TrendDirection::Flat, 0, "10").unwrap();
        session.set_name("Ada");
        session.confirm_protocol();
        assert_eq!(session.gate().state(), GateState::Confirmed);
        // Nothing was saved, so the confirmation is not backed by data.
        assert!(!session.is_customized());

        let rec = session.get_recommendation(Some(TrendDirection::Flat), "60").unwrap();
        assert_eq!(rec.carb_amount, CarbValue::Grams(10));
    }

    #[test]
    fn test_recommendation_requires_both_inputs() {
        let session = Session::load(Box::new(MemoryStore::new()));
        assert!(session.get_recommendation(None, "100").is_none());
        assert!(session.get_recommendation(Some(TrendDirection::Flat), "").is_none());
        assert!(session.get_recommendation(Some(TrendDirection::Flat), "100").is_some());
    }
}
