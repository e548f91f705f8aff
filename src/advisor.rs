use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::conversation::{ConversationState, IdentifierField, Phase, StateTable};
use crate::error::{AdvisorError, Result};
use crate::models::Sender;
use crate::parser;
use crate::reply::Reply;
use crate::settings::Settings;
use crate::store::RecordStore;

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Outcome of one handled message: the reply and the state to keep, if any.
#[derive(Debug)]
pub struct Step {
    pub reply: Reply,
    pub next: Option<ConversationState>,
}

impl Step {
    /// Reply and return to idle.
    pub fn done(reply: Reply) -> Self {
        Self { reply, next: None }
    }

    /// Reply and wait for the next message in `state`.
    pub fn wait(reply: Reply, state: ConversationState) -> Self {
        Self { reply, next: Some(state) }
    }
}

const HELP: &str = "💳 Cashback advisor

Send a cashback offer as one line:
  Bank, Category, Percent, Cap[, Expiry]
  e.g. Тинькофф, Такси, 5%, 3000
Several lines at once are saved in one go.

Send just a category (e.g. Такси) to find the best offer.

Commands:
  /add - how to add an offer
  /best [category] - best offer for a category
  /list [all|1-10|1-5,8] - offers of your group
  /update [id] - change one of your offers
  /delete [id] - delete one of your offers
  /bankinfo [bank] - active offers of a bank
  /banklist - banks with active offers
  /categorylist - categories with active offers
  /creategroup [name] - create a group
  /joingroup [name] - join a group
  /groupinfo [name] - members of a group and their offers
  /userinfo [id] - offers of one member (you by default)
  /cancel - cancel the current operation";

/// Routes user messages to commands, conversation states, record entry and
/// best-offer search. One instance serves all users.
pub struct Advisor {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) settings: Settings,
    clock: Clock,
    states: StateTable,
}

impl Advisor {
    pub fn new(store: Arc<dyn RecordStore>, settings: Settings) -> Self {
        Self {
            store,
            settings,
            clock: Arc::new(|| Local::now().date_naive()),
            states: StateTable::new(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Handles one message. Messages of the same user are processed one at a
    /// time, in the order they arrive.
    pub fn on_text(&self, sender: &Sender, text: &str) -> Reply {
        let text = text.trim();
        if text.is_empty() {
            return Reply::text("Send /help to see what I can do.");
        }
        if is_cancel_command(text) {
            return self.on_cancel(sender);
        }

        self.states.with_user(sender.id, |slot| {
            let is_command = text.starts_with('/');
            // A command replaces whatever was in progress.
            let current = if is_command { None } else { slot.take() };
            let kept = current.clone();

            match self.dispatch(sender, text, current) {
                Ok(step) => {
                    *slot = step.next;
                    step.reply
                }
                Err(e) => {
                    if e.is_retriable() {
                        *slot = kept;
                    } else {
                        warn!(user = sender.id, error = %e, "step failed, conversation reset");
                        *slot = None;
                    }
                    Reply::error(&e)
                }
            }
        })
    }

    /// Drops any conversation in progress.
    pub fn on_cancel(&self, sender: &Sender) -> Reply {
        self.states.clear(sender.id);
        debug!(user = sender.id, "conversation cancelled");
        Reply::cancelled()
    }

    #[cfg(test)]
    pub(crate) fn state_of(&self, user: i64) -> Option<ConversationState> {
        self.states.get(user)
    }

    fn dispatch(&self, sender: &Sender, text: &str, current: Option<ConversationState>) -> Result<Step> {
        if let Some(command) = text.strip_prefix('/') {
            let (name, args) = match command.split_once(char::is_whitespace) {
                Some((name, args)) => (name, args.trim()),
                None => (command, ""),
            };
            return self.run_command(sender, &name.to_lowercase(), args);
        }

        if let Some(state) = current {
            debug!(user = sender.id, phase = ?state.phase, "continuing conversation");
            return self.continue_dialogue(sender, text, state);
        }

        let collective = self.require_collective(sender)?;
        if text.contains(',') {
            self.save_message(sender, &collective, text)
        } else {
            self.search_best(&collective, &parser::normalize(text), true)
        }
    }

    pub(crate) fn require_collective(&self, sender: &Sender) -> Result<String> {
        self.store
            .user_collective(sender.id)?
            .ok_or(AdvisorError::NotInCollective)
    }

    fn run_command(&self, sender: &Sender, name: &str, args: &str) -> Result<Step> {
        debug!(user = sender.id, command = name, args, "command");
        match name {
            "start" => self.start(sender),
            "help" => Ok(Step::done(Reply::text(HELP))),
            "add" => {
                self.require_collective(sender)?;
                Ok(Step::done(Reply::text(format!(
                    "📝 Send the cashback offer as one line:\n{}\n\nExample: Тинькофф, Такси, 5%, 3000\n\nOr /cancel to stop.",
                    parser::RECORD_FORMAT
                ))))
            }
            "best" => {
                let collective = self.require_collective(sender)?;
                if args.is_empty() {
                    Ok(ask(IdentifierField::Category))
                } else {
                    self.search_best(&collective, &parser::normalize(args), true)
                }
            }
            "list" => {
                let collective = self.require_collective(sender)?;
                self.list_offers(&collective, parser::parse_list_args(args)?)
            }
            "update" | "delete" => {
                let collective = self.require_collective(sender)?;
                let field = if name == "update" {
                    IdentifierField::UpdateId
                } else {
                    IdentifierField::DeleteId
                };
                if args.is_empty() {
                    self.ask_record_id(sender, &collective, field, 0)
                } else {
                    self.begin_edit(sender, field, parser::parse_id(args)?)
                }
            }
            "bankinfo" => {
                let collective = self.require_collective(sender)?;
                if args.is_empty() {
                    Ok(ask(IdentifierField::BankName))
                } else {
                    self.bank_info(&collective, &parser::normalize(args), true)
                }
            }
            "banklist" => {
                let collective = self.require_collective(sender)?;
                self.bank_list(&collective)
            }
            "categorylist" => {
                let collective = self.require_collective(sender)?;
                self.category_list(&collective)
            }
            "groupinfo" => self.group_info(sender, args),
            "userinfo" => self.user_info(sender, args),
            "creategroup" | "joingroup" => {
                let field = if name == "creategroup" {
                    IdentifierField::CreateGroup
                } else {
                    IdentifierField::JoinGroup
                };
                if args.is_empty() {
                    Ok(ask(field))
                } else {
                    self.apply_group(sender, field, args)
                }
            }
            other => Err(AdvisorError::Validation(format!(
                "unknown command /{other}. Send /help for the list of commands"
            ))),
        }
    }

    fn start(&self, sender: &Sender) -> Result<Step> {
        let membership = match self.store.user_collective(sender.id)? {
            Some(name) => format!("You are in group \"{name}\"."),
            None => "To begin, create a group with /creategroup or join one with /joingroup.".to_string(),
        };
        Ok(Step::done(Reply::text(format!(
            "👋 Hi, {}!\n\nI keep track of your group's cashback offers and find the best one for a purchase.\n\n{membership}\n\nSend /help for details.",
            sender.name
        ))))
    }

    pub(crate) fn apply_group(&self, sender: &Sender, field: IdentifierField, raw: &str) -> Result<Step> {
        let name = parser::parse_name(raw)?;
        let text = if field == IdentifierField::CreateGroup {
            if self.store.collective_exists(&name)? {
                return Err(AdvisorError::Validation(format!(
                    "group \"{name}\" already exists, join it with /joingroup {name}"
                )));
            }
            self.store.create_collective(&name, sender)?;
            format!("✅ Group \"{name}\" created. Others can join with /joingroup {name}")
        } else {
            self.store.join_collective(sender, &name)?;
            format!("✅ You joined group \"{name}\"")
        };
        Ok(Step::done(Reply::text(text)))
    }
}

/// Prompt for a single value and wait for it.
pub(crate) fn ask(field: IdentifierField) -> Step {
    Step::wait(
        Reply::text(field.prompt()),
        ConversationState::new(Phase::AwaitingIdentifierInput(field)),
    )
}

fn is_cancel_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case("/cancel"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::SqliteStore;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()
    }

    pub fn alice() -> Sender {
        Sender { id: 1, name: "Alice".into() }
    }

    pub fn bob() -> Sender {
        Sender { id: 2, name: "Bob".into() }
    }

    pub fn test_advisor() -> (tempfile::TempDir, Advisor) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        let advisor = Advisor::new(Arc::new(store), Settings::default())
            .with_clock(Arc::new(today));
        (dir, advisor)
    }

    /// Advisor where Alice and Bob share the group "Семья".
    pub fn family_advisor() -> (tempfile::TempDir, Advisor) {
        let (dir, advisor) = test_advisor();
        advisor.on_text(&alice(), "/creategroup Семья");
        advisor.on_text(&bob(), "/joingroup Семья");
        (dir, advisor)
    }
}
