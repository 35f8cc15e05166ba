//! Care-team contacts

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalcError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Physician {
    pub name: String,
    pub practice: String,
    pub phone: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Nurse {
    pub name: String,
    pub school: String,
    pub phone: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emergency {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

impl Default for Emergency {
    fn default() -> Self {
        Self {
            phone: "911".to_string(),
            notes: "For severe hypoglycemia / unconsciousness".to_string(),
        }
    }
}

/// Physician, school nurse and emergency numbers. All fields are free text;
/// a missing field reads as blank.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactBook {
    pub physician: Physician,
    pub nurse: Nurse,
    pub emergency: Emergency,
}

/// Addressable contact field, written `section.field` on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    PhysicianName,
    PhysicianPractice,
    PhysicianPhone,
    PhysicianNotes,
    NurseName,
    NurseSchool,
    NursePhone,
    NurseNotes,
    EmergencyPhone,
    EmergencyNotes,
}

impl ContactField {
    pub const ALL: [ContactField; 10] = [
        ContactField::PhysicianName,
        ContactField::PhysicianPractice,
        ContactField::PhysicianPhone,
        ContactField::PhysicianNotes,
        ContactField::NurseName,
        ContactField::NurseSchool,
        ContactField::NursePhone,
        ContactField::NurseNotes,
        ContactField::EmergencyPhone,
        ContactField::EmergencyNotes,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ContactField::PhysicianName => "physician.name",
            ContactField::PhysicianPractice => "physician.practice",
            ContactField::PhysicianPhone => "physician.phone",
            ContactField::PhysicianNotes => "physician.notes",
            ContactField::NurseName => "nurse.name",
            ContactField::NurseSchool => "nurse.school",
            ContactField::NursePhone => "nurse.phone",
            ContactField::NurseNotes => "nurse.notes",
            ContactField::EmergencyPhone => "emergency.phone",
            ContactField::EmergencyNotes => "emergency.notes",
        }
    }
}

impl FromStr for ContactField {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.key() == wanted)
            .ok_or_else(|| CalcError::UnknownContactField(s.to_string()))
    }
}

impl ContactBook {
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::PhysicianName => &self.physician.name,
            ContactField::PhysicianPractice => &self.physician.practice,
            ContactField::PhysicianPhone => &self.physician.phone,
            ContactField::PhysicianNotes => &self.physician.notes,
            ContactField::NurseName => &self.nurse.name,
            ContactField::NurseSchool => &self.nurse.school,
            ContactField::NursePhone => &self.nurse.phone,
            ContactField::NurseNotes => &self.nurse.notes,
            ContactField::EmergencyPhone => &self.emergency.phone,
            ContactField::EmergencyNotes => &self.emergency.notes,
        }
    }

    pub fn set(&mut self, field: ContactField, value: &str) {
        let slot = match field {
            ContactField::PhysicianName => &mut self.physician.name,
            ContactField::PhysicianPractice => &mut self.physician.practice,
            ContactField::PhysicianPhone => &mut self.physician.phone,
            ContactField::PhysicianNotes => &mut self.physician.notes,
            ContactField::NurseName => &mut self.nurse.name,
            ContactField::NurseSchool => &mut self.nurse.school,
            ContactField::NursePhone => &mut self.nurse.phone,
            ContactField::NurseNotes => &mut self.nurse.notes,
            ContactField::EmergencyPhone => &mut self.emergency.phone,
            ContactField::EmergencyNotes => &mut self.emergency.notes,
        };
        *slot = value.to_string();
    }

    pub fn has_physician(&self) -> bool {
        !self.physician.name.is_empty() || !self.physician.phone.is_empty()
    }

    pub fn has_nurse(&self) -> bool {
        !self.nurse.name.is_empty() || !self.nurse.phone.is_empty()
    }

    /// Emergency numbers don't count; they are always pre-filled.
    pub fn has_any_contact(&self) -> bool {
        self.has_physician() || self.has_nurse()
    }

    pub fn from_json(json: &str) -> Result<Self, CalcError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CalcError> {
        Ok(serde_json::to_string(self)?)
    }
}
