//! Ordered, never-empty list of named phases.

use cadence_ipc::Phase;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Fields of a phase to overwrite; `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseEdit {
    pub name: Option<String>,
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseList {
    phases: Vec<Phase>,
}

impl PhaseList {
    /// Build a list, rejecting an empty sequence or any phase shorter than a minute.
    pub fn new(phases: Vec<Phase>) -> Result<Self> {
        if phases.is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "a cycle needs at least one phase".into(),
            ));
        }
        for phase in &phases {
            validate_minutes(phase.minutes)?;
        }
        Ok(Self { phases })
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn first(&self) -> &Phase {
        &self.phases[0]
    }

    pub fn as_slice(&self) -> &[Phase] {
        &self.phases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Phase> {
        self.phases.iter()
    }

    /// Saturates at `u32::MAX`.
    pub fn total_minutes(&self) -> u32 {
        self.phases
            .iter()
            .fold(0u32, |total, p| total.saturating_add(p.minutes))
    }

    pub fn add(&mut self, name: &str, minutes: u32) -> Result<()> {
        let name = validate_name(name)?;
        validate_minutes(minutes)?;
        self.phases.push(Phase::new(name, minutes));
        Ok(())
    }

    /// Apply an edit atomically: either every field is valid and written, or nothing changes.
    pub fn edit(&mut self, index: usize, edit: PhaseEdit) -> Result<()> {
        let len = self.phases.len();
        let name = edit.name.as_deref().map(validate_name).transpose()?;
        if let Some(minutes) = edit.minutes {
            validate_minutes(minutes)?;
        }
        let phase = self.phases.get_mut(index).ok_or(SessionError::OutOfRange {
            collection: "phases",
            index,
            len,
        })?;
        if let Some(name) = name {
            phase.name = name;
        }
        if let Some(minutes) = edit.minutes {
            phase.minutes = minutes;
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Phase> {
        let len = self.phases.len();
        if index >= len {
            return Err(SessionError::OutOfRange {
                collection: "phases",
                index,
                len,
            });
        }
        if len == 1 {
            return Err(SessionError::InvalidConfiguration(
                "cannot remove the only phase".into(),
            ));
        }
        Ok(self.phases.remove(index))
    }
}

impl Default for PhaseList {
    fn default() -> Self {
        Self {
            phases: vec![Phase::new("Work", 25), Phase::new("Break", 5)],
        }
    }
}

impl TryFrom<Vec<Phase>> for PhaseList {
    type Error = SessionError;

    fn try_from(phases: Vec<Phase>) -> Result<Self> {
        Self::new(phases)
    }
}

impl From<PhaseList> for Vec<Phase> {
    fn from(list: PhaseList) -> Self {
        list.phases
    }
}

fn validate_minutes(minutes: u32) -> Result<()> {
    if minutes == 0 {
        return Err(SessionError::InvalidConfiguration(
            "phase duration must be at least one minute".into(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidConfiguration(
            "phase name cannot be blank".into(),
        ));
    }
    Ok(trimmed.to_string())
}
