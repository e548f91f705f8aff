//! Handlers for messages that arrive while a conversation is in progress.
//!
//! Each handler receives the state taken out of the user's slot and returns
//! the next one. Only the confirmation prompt and the single-value prompts
//! stay put on input they cannot use; every other phase ends on any answer.

use tracing::{debug, info};

use crate::advisor::{ask, Advisor, Step};
use crate::answer::{self, Answer};
use crate::conversation::{BankOrigin, ConversationState, IdentifierField, Phase};
use crate::error::{AdvisorError, Result};
use crate::fmt;
use crate::models::{ParsedRecord, Sender};
use crate::parser;
use crate::reply::Reply;

/// Free text counts as a cancel only when it is not a record.
fn is_cancel(text: &str) -> bool {
    !text.contains(',') && answer::classify(text) == Answer::Cancel
}

fn pending_record(state: &ConversationState) -> Result<ParsedRecord> {
    state
        .pending_record
        .clone()
        .ok_or_else(|| AdvisorError::NotFound("pending cashback record".into()))
}

fn target_id(state: &ConversationState) -> Result<i64> {
    state
        .target_record_id
        .ok_or_else(|| AdvisorError::NotFound("selected cashback record".into()))
}

pub(crate) fn manual_prompt(record: Option<&ParsedRecord>) -> String {
    let mut text = format!("✏️ Send the full record:\n{}", parser::RECORD_FORMAT);
    if let Some(record) = record {
        text.push_str(&format!(
            "\n\nWhat I have so far:\n{}, {}, {}, {}, {}",
            record.bank_name,
            record.category,
            record.percent,
            record.cap,
            record.expiry.format(fmt::DATE_FORMAT)
        ));
    }
    text
}

impl Advisor {
    pub(crate) fn continue_dialogue(&self, sender: &Sender, text: &str, state: ConversationState) -> Result<Step> {
        match state.phase {
            Phase::AwaitingConfirmation => self.on_confirmation(sender, text, state),
            Phase::AwaitingBankCorrection { origin } => self.on_bank_correction(sender, text, state, origin),
            Phase::AwaitingCategoryCorrection => self.on_category_correction(sender, text, state),
            Phase::AwaitingManualInput => self.on_manual_input(sender, text),
            Phase::AwaitingUpdateData => self.on_update_data(sender, text, state),
            Phase::AwaitingDeleteConfirm => self.on_delete_confirm(sender, text, state),
            Phase::AwaitingIdentifierInput(field) => self.on_identifier(sender, text, state, field),
        }
    }

    fn on_confirmation(&self, sender: &Sender, text: &str, state: ConversationState) -> Result<Step> {
        let answer = answer::classify(text);
        debug!(user = sender.id, ?answer, "confirmation answer");
        match answer {
            Answer::Yes => {
                let collective = self.require_collective(sender)?;
                let correction = state.pending_match.clone().unwrap_or_default();
                let record = self.apply_correction(&collective, pending_record(&state)?, &correction)?;
                self.store_record(sender, &collective, &record, false)
            }
            Answer::No => {
                let collective = self.require_collective(sender)?;
                self.store_record(sender, &collective, &pending_record(&state)?, true)
            }
            Answer::ManualEdit => {
                let record = pending_record(&state)?;
                Ok(Step::wait(
                    Reply::text(manual_prompt(Some(&record))),
                    ConversationState::new(Phase::AwaitingManualInput).with_record(record),
                ))
            }
            Answer::Cancel => Ok(Step::done(Reply::cancelled())),
            _ => Ok(Step::wait(
                Reply::with_buttons("❓ Please choose one of the options", answer::confirm_buttons()),
                state,
            )),
        }
    }

    fn on_bank_correction(
        &self,
        sender: &Sender,
        text: &str,
        state: ConversationState,
        origin: BankOrigin,
    ) -> Result<Step> {
        match answer::classify(text) {
            Answer::Yes => {
                let collective = self.require_collective(sender)?;
                let suggested = state
                    .pending_match
                    .as_ref()
                    .and_then(|c| c.bank.as_ref())
                    .map(|m| m.candidate.clone())
                    .ok_or_else(|| AdvisorError::NotFound("suggested bank".into()))?;
                match origin {
                    BankOrigin::Save => {
                        let correction = state.pending_match.clone().unwrap_or_default();
                        let record = self.apply_correction(&collective, pending_record(&state)?, &correction)?;
                        self.save_pipeline(sender, &collective, record, false)
                    }
                    BankOrigin::BankInfo => self.bank_info(&collective, &suggested, false),
                }
            }
            Answer::ManualEdit => {
                let mut next = ConversationState::new(Phase::AwaitingIdentifierInput(IdentifierField::BankName));
                if origin == BankOrigin::Save {
                    next = next.with_record(pending_record(&state)?);
                }
                Ok(Step::wait(Reply::text(IdentifierField::BankName.prompt()), next))
            }
            Answer::No if origin == BankOrigin::Save => Ok(Step::done(Reply::text(
                "Okay, nothing saved. Send the record again to continue.",
            ))),
            _ => Ok(Step::done(Reply::cancelled())),
        }
    }

    fn on_category_correction(&self, sender: &Sender, text: &str, state: ConversationState) -> Result<Step> {
        match answer::classify(text) {
            Answer::Yes => {
                let collective = self.require_collective(sender)?;
                let category = state
                    .pending_match
                    .and_then(|c| c.category)
                    .map(|m| m.candidate)
                    .ok_or_else(|| AdvisorError::NotFound("suggested category".into()))?;
                // The accepted name is searched as is, without another suggestion.
                self.search_best(&collective, &category, false)
            }
            Answer::ManualEdit => Ok(ask(IdentifierField::Category)),
            _ => Ok(Step::done(Reply::cancelled())),
        }
    }

    fn on_manual_input(&self, sender: &Sender, text: &str) -> Result<Step> {
        if is_cancel(text) {
            return Ok(Step::done(Reply::cancelled()));
        }
        let record = parser::parse_complete(text, self.today())?;
        let collective = self.require_collective(sender)?;
        self.store_record(sender, &collective, &record, true)
    }

    fn on_update_data(&self, sender: &Sender, text: &str, state: ConversationState) -> Result<Step> {
        if is_cancel(text) {
            return Ok(Step::done(Reply::cancelled()));
        }
        let record = parser::parse_complete(text, self.today())?;
        let id = target_id(&state)?;
        self.owned_offer(sender, id)?;
        let offer = self.store.update_record(id, &record)?;
        Ok(Step::done(Reply::text(fmt::updated_offer(&offer))))
    }

    fn on_delete_confirm(&self, sender: &Sender, text: &str, state: ConversationState) -> Result<Step> {
        if answer::classify(text) != Answer::Yes {
            return Ok(Step::done(Reply::text("❌ Deletion cancelled.")));
        }
        let id = target_id(&state)?;
        self.owned_offer(sender, id)?;
        self.store.delete_record(id)?;
        info!(user = sender.id, id, "offer deleted by owner");
        Ok(Step::done(Reply::text(format!("✅ Cashback ID {id} deleted."))))
    }

    fn on_identifier(
        &self,
        sender: &Sender,
        text: &str,
        state: ConversationState,
        field: IdentifierField,
    ) -> Result<Step> {
        if is_cancel(text) {
            return Ok(Step::done(Reply::cancelled()));
        }

        match field {
            IdentifierField::UpdateId | IdentifierField::DeleteId => {
                let cursor = match answer::classify(text) {
                    Answer::NextPage => state.page_cursor + 1,
                    Answer::PrevPage => state.page_cursor.saturating_sub(1),
                    _ => return self.begin_edit(sender, field, parser::parse_id(text)?),
                };
                let collective = self.require_collective(sender)?;
                self.ask_record_id(sender, &collective, field, cursor)
            }
            IdentifierField::BankName => {
                let bank = parser::parse_name(text)?;
                let collective = self.require_collective(sender)?;
                match state.pending_record {
                    Some(mut record) => {
                        record.bank_name = bank;
                        self.save_pipeline(sender, &collective, record, false)
                    }
                    None => self.bank_info(&collective, &bank, true),
                }
            }
            IdentifierField::Category => {
                let collective = self.require_collective(sender)?;
                self.search_best(&collective, &parser::normalize(text), true)
            }
            IdentifierField::CreateGroup | IdentifierField::JoinGroup => self.apply_group(sender, field, text),
        }
    }
}
