use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{Correction, ParsedRecord};

/// What a bank correction was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankOrigin {
    Save,
    BankInfo,
}

/// The single value a command is still waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierField {
    UpdateId,
    DeleteId,
    BankName,
    Category,
    CreateGroup,
    JoinGroup,
}

impl IdentifierField {
    pub fn prompt(self) -> &'static str {
        match self {
            IdentifierField::UpdateId => "✏️ Send the ID of the cashback to update:",
            IdentifierField::DeleteId => "🗑 Send the ID of the cashback to delete:",
            IdentifierField::BankName => "🏦 Send the bank name:",
            IdentifierField::Category => "🔍 Send the category:",
            IdentifierField::CreateGroup => "👥 Send a name for the new group:",
            IdentifierField::JoinGroup => "👥 Send the name of the group to join:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingConfirmation,
    AwaitingBankCorrection { origin: BankOrigin },
    AwaitingCategoryCorrection,
    AwaitingManualInput,
    AwaitingUpdateData,
    AwaitingDeleteConfirm,
    AwaitingIdentifierInput(IdentifierField),
}

/// In-flight dialogue for one user. No state at all means idle.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    pub phase: Phase,
    pub pending_record: Option<ParsedRecord>,
    pub pending_match: Option<Correction>,
    pub target_record_id: Option<i64>,
    pub page_cursor: usize,
}

impl ConversationState {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            pending_record: None,
            pending_match: None,
            target_record_id: None,
            page_cursor: 0,
        }
    }

    pub fn with_record(mut self, record: ParsedRecord) -> Self {
        self.pending_record = Some(record);
        self
    }

    pub fn with_match(mut self, correction: Correction) -> Self {
        self.pending_match = Some(correction);
        self
    }

    pub fn with_target(mut self, id: i64) -> Self {
        self.target_record_id = Some(id);
        self
    }
}

type Slot = Arc<Mutex<Option<ConversationState>>>;

/// Per-user conversation states. Each user has a slot with its own lock, held
/// for a whole turn, so turns of one user run in arrival order while other
/// users proceed independently.
#[derive(Debug, Default)]
pub struct StateTable {
    slots: Mutex<HashMap<i64, Slot>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, user: i64) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(user).or_default())
    }

    /// Runs `f` with exclusive access to the user's state.
    pub fn with_user<T>(&self, user: i64, f: impl FnOnce(&mut Option<ConversationState>) -> T) -> T {
        let slot = self.slot(user);
        let (out, idle) = {
            let mut guard: MutexGuard<'_, Option<ConversationState>> =
                slot.lock().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut guard);
            (out, guard.is_none())
        };
        if idle {
            self.release(user, &slot);
        }
        out
    }

    /// Drops an idle user's slot unless another turn already holds it.
    fn release(&self, user: i64, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by the caller.
        let unused = slots
            .get(&user)
            .is_some_and(|s| Arc::ptr_eq(s, slot) && Arc::strong_count(s) == 2);
        if unused && slot.lock().unwrap_or_else(PoisonError::into_inner).is_none() {
            slots.remove(&user);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub fn get(&self, user: i64) -> Option<ConversationState> {
        self.with_user(user, |state| state.clone())
    }

    pub fn clear(&self, user: i64) {
        self.with_user(user, |slot| *slot = None);
    }
}
