//! Record entry, best-offer search, bank info and listings.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::advisor::{Advisor, Step};
use crate::answer;
use crate::conversation::{BankOrigin, ConversationState, IdentifierField, Phase};
use crate::error::{AdvisorError, Result};
use crate::fmt;
use crate::models::{Correction, NameField, Offer, ParsedRecord, Sender};
use crate::parser::{self, ListSelection};
use crate::policy::{self, Action};
use crate::reply::Reply;
use crate::similarity;

const MAX_RESULTS: usize = 5;

fn lower(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Offers whose category equals or contains `query`: exact names first, then
/// by percent and cap, both descending.
fn matching_offers(offers: &[Offer], query: &str) -> Vec<Offer> {
    let query = lower(query);
    let mut found: Vec<(bool, &Offer)> = offers
        .iter()
        .filter_map(|o| {
            let category = lower(&o.category);
            if category == query {
                Some((true, o))
            } else if category.contains(&query) {
                Some((false, o))
            } else {
                None
            }
        })
        .collect();
    found.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.percent.total_cmp(&a.1.percent))
            .then_with(|| b.1.cap.total_cmp(&a.1.cap))
    });
    found.into_iter().map(|(_, o)| o.clone()).collect()
}

fn by_value_desc(a: &Offer, b: &Offer) -> Ordering {
    b.percent
        .total_cmp(&a.percent)
        .then_with(|| b.cap.total_cmp(&a.cap))
}

fn contains_name(names: &[String], name: &str) -> bool {
    let name = lower(name);
    names.iter().any(|n| lower(n) == name)
}

impl Advisor {
    fn active_offers(&self, collective: &str) -> Result<Vec<Offer>> {
        let today = self.today();
        Ok(self
            .store
            .list_records(collective)?
            .into_iter()
            .filter(|o| o.is_active(today))
            .collect())
    }

    /// The configured bank catalog followed by the names already in use.
    fn bank_candidates(&self, collective: &str) -> Result<Vec<String>> {
        let stored = self.store.candidate_names(collective, NameField::Bank)?;
        Ok(similarity::dedup_names(
            self.settings.known_banks.iter().cloned().chain(stored),
        ))
    }

    /// Applies the corrections the user accepted, after checking each one
    /// against freshly fetched names. A name that disappeared is not applied.
    pub(crate) fn apply_correction(
        &self,
        collective: &str,
        mut record: ParsedRecord,
        correction: &Correction,
    ) -> Result<ParsedRecord> {
        if correction.is_empty() {
            return Ok(record);
        }
        if let Some(bank) = &correction.bank {
            if contains_name(&self.bank_candidates(collective)?, &bank.candidate) {
                record.bank_name = bank.candidate.clone();
            } else {
                warn!(bank = %bank.candidate, "suggested bank no longer known, keeping input");
            }
        }
        if let Some(category) = &correction.category {
            let fresh = self.store.candidate_names(collective, NameField::Category)?;
            if contains_name(&fresh, &category.candidate) {
                record.category = category.candidate.clone();
            } else {
                warn!(category = %category.candidate, "suggested category no longer known, keeping input");
            }
        }
        Ok(record)
    }

    pub(crate) fn store_record(
        &self,
        sender: &Sender,
        collective: &str,
        record: &ParsedRecord,
        force: bool,
    ) -> Result<Step> {
        let offer = self.store.create_record(collective, record, sender, force)?;
        Ok(Step::done(Reply::text(fmt::saved_offer(&offer))))
    }

    /// A message containing a comma: one record, or several on separate lines.
    pub(crate) fn save_message(&self, sender: &Sender, collective: &str, text: &str) -> Result<Step> {
        let lines = parser::record_lines(text);
        if lines.len() > 1 {
            return self.save_batch(sender, collective, &lines);
        }
        let line = lines.first().copied().unwrap_or(text);
        let record = parser::parse_complete(line, self.today())?;
        debug!(
            bank = %record.bank_name,
            category = %record.category,
            percent = record.percent,
            cap = record.cap,
            "record parsed"
        );
        self.save_pipeline(sender, collective, record, true)
    }

    /// Checks the bank (unless already settled) and the category against known
    /// names, asking the user when a correction looks likely, then saves.
    pub(crate) fn save_pipeline(
        &self,
        sender: &Sender,
        collective: &str,
        mut record: ParsedRecord,
        check_bank: bool,
    ) -> Result<Step> {
        if check_bank {
            let candidates = self.bank_candidates(collective)?;
            if let Some(found) = similarity::best_bank_match(&record.bank_name, &candidates) {
                let action = policy::decide_bank(&record.bank_name, &found);
                debug!(input = %record.bank_name, candidate = %found.candidate, score = found.score, ?action, "bank check");
                match action {
                    Action::AutoAccept => record.bank_name = found.candidate,
                    Action::StrongSuggest => {
                        let text = format!(
                            "💡 Possible typo in the bank name:\n\nYou wrote: \"{}\"\nDid you mean: \"{}\"?\n\n❓ Fix it?",
                            record.bank_name, found.candidate
                        );
                        let state = ConversationState::new(Phase::AwaitingBankCorrection { origin: BankOrigin::Save })
                            .with_record(record)
                            .with_match(Correction { bank: Some(found), category: None });
                        return Ok(Step::wait(Reply::with_buttons(text, answer::confirm_buttons()), state));
                    }
                    _ => {}
                }
            }
        }

        let categories = self.store.candidate_names(collective, NameField::Category)?;
        if let Some(found) = similarity::best_match(&record.category, &categories) {
            let action = policy::decide(&record.category, &found);
            debug!(input = %record.category, candidate = %found.candidate, score = found.score, distance = found.distance, ?action, "category check");
            match action {
                Action::AutoAccept => record.category = found.candidate,
                Action::StrongSuggest | Action::WeakSuggest => {
                    let text = format!(
                        "{}\n\n💡 Did you mean:\n📁 Category: {} → {}\n\n❓ Fix and save?",
                        fmt::parsed_record(&record),
                        record.category,
                        found.candidate
                    );
                    let state = ConversationState::new(Phase::AwaitingConfirmation)
                        .with_record(record)
                        .with_match(Correction { bank: None, category: Some(found) });
                    return Ok(Step::wait(Reply::with_buttons(text, answer::confirm_buttons()), state));
                }
                Action::NoMatch => {}
            }
        }

        self.store_record(sender, collective, &record, false)
    }

    /// Saves every line on its own. Bank typos are fixed silently; lines that
    /// fail are reported and skipped.
    fn save_batch(&self, sender: &Sender, collective: &str, lines: &[&str]) -> Result<Step> {
        let today = self.today();
        let banks = self.bank_candidates(collective)?;
        let mut report = Vec::with_capacity(lines.len());
        let mut saved = 0;

        for (i, line) in lines.iter().enumerate() {
            let mut record = match parser::parse_complete(line, today) {
                Ok(record) => record,
                Err(e) => {
                    report.push(format!("❌ {}. {line}: {e}", i + 1));
                    continue;
                }
            };
            if let Some(found) = similarity::best_bank_match(&record.bank_name, &banks) {
                if policy::decide_bank(&record.bank_name, &found) != Action::NoMatch {
                    record.bank_name = found.candidate;
                }
            }
            match self.store.create_record(collective, &record, sender, true) {
                Ok(offer) => {
                    saved += 1;
                    report.push(format!(
                        "✅ {}. {} · {} · {} → ID {}",
                        i + 1,
                        offer.bank_name,
                        offer.category,
                        fmt::percent(offer.percent),
                        offer.id
                    ));
                }
                Err(e) if e.is_retriable() => report.push(format!("❌ {}. {line}: {e}", i + 1)),
                Err(e) => return Err(e),
            }
        }

        info!(user = sender.id, saved, total = lines.len(), "batch saved");
        Ok(Step::done(Reply::text(format!(
            "📦 Saved {saved} of {}:\n\n{}",
            lines.len(),
            report.join("\n")
        ))))
    }

    /// Best active offers for a category, falling back to the catch-all
    /// category and then to a suggestion when `suggest` is set.
    pub(crate) fn search_best(&self, collective: &str, query: &str, suggest: bool) -> Result<Step> {
        if query.is_empty() {
            return Err(AdvisorError::Validation("send a category, e.g. Такси".into()));
        }
        let active = self.active_offers(collective)?;

        let found = matching_offers(&active, query);
        if !found.is_empty() {
            let shown = &found[..found.len().min(MAX_RESULTS)];
            return Ok(Step::done(Reply::text(fmt::best_offers(shown, query, None))));
        }

        let fallback = &self.settings.fallback_category;
        if lower(fallback) != lower(query) {
            let found = matching_offers(&active, fallback);
            if !found.is_empty() {
                let shown = &found[..found.len().min(MAX_RESULTS)];
                return Ok(Step::done(Reply::text(fmt::best_offers(shown, query, Some(fallback)))));
            }
        }

        if suggest {
            let candidates = self.store.candidate_names(collective, NameField::Category)?;
            if let Some(found) = similarity::best_match(query, &candidates) {
                let action = policy::decide(query, &found);
                debug!(query, candidate = %found.candidate, score = found.score, distance = found.distance, ?action, "category search");
                if action.is_suggestion() {
                    let text = format!(
                        "❌ No cashback for \"{query}\".\n\n💡 Did you mean \"{}\"?",
                        found.candidate
                    );
                    let state = ConversationState::new(Phase::AwaitingCategoryCorrection)
                        .with_match(Correction { bank: None, category: Some(found) });
                    return Ok(Step::wait(Reply::with_buttons(text, answer::confirm_buttons()), state));
                }
            }
        }

        Ok(Step::done(Reply::text(fmt::not_found(query))))
    }

    /// Active offers of one bank, offering a correction for an unknown name
    /// when `correct` is set.
    pub(crate) fn bank_info(&self, collective: &str, bank: &str, correct: bool) -> Result<Step> {
        let wanted = lower(bank);
        let mut found: Vec<Offer> = self
            .active_offers(collective)?
            .into_iter()
            .filter(|o| lower(&o.bank_name) == wanted)
            .collect();
        if !found.is_empty() {
            found.sort_by(by_value_desc);
            return Ok(Step::done(Reply::text(fmt::bank_info(&found[0].bank_name, &found))));
        }

        if correct {
            let candidates = self.bank_candidates(collective)?;
            if let Some(found) = similarity::best_bank_match(bank, &candidates) {
                let action = policy::decide_bank(bank, &found);
                debug!(query = bank, candidate = %found.candidate, score = found.score, ?action, "bank info lookup");
                if action == Action::StrongSuggest {
                    let text = format!(
                        "❌ No cashback at \"{bank}\".\n\n💡 Did you mean \"{}\"?",
                        found.candidate
                    );
                    let state = ConversationState::new(Phase::AwaitingBankCorrection { origin: BankOrigin::BankInfo })
                        .with_match(Correction { bank: Some(found), category: None });
                    return Ok(Step::wait(Reply::with_buttons(text, answer::confirm_buttons()), state));
                }
            }
        }

        Ok(Step::done(Reply::text(format!("❌ No active cashback at {bank}."))))
    }

    pub(crate) fn bank_list(&self, collective: &str) -> Result<Step> {
        let mut names = similarity::dedup_names(self.active_offers(collective)?.into_iter().map(|o| o.bank_name));
        if names.is_empty() {
            return Ok(Step::done(Reply::text("📭 No active cashback in your group yet.")));
        }
        names.sort();
        Ok(Step::done(Reply::text(fmt::name_list("🏦 Banks with active cashback", &names))))
    }

    pub(crate) fn category_list(&self, collective: &str) -> Result<Step> {
        let mut names = similarity::dedup_names(self.active_offers(collective)?.into_iter().map(|o| o.category));
        if names.is_empty() {
            return Ok(Step::done(Reply::text("📭 No active cashback in your group yet.")));
        }
        names.sort();
        Ok(Step::done(Reply::text(fmt::name_list("📁 Categories with active cashback", &names))))
    }

    pub(crate) fn list_offers(&self, collective: &str, selection: ListSelection) -> Result<Step> {
        let offers = self.store.list_records(collective)?;
        if offers.is_empty() {
            return Ok(Step::done(Reply::text("📭 No cashback in your group yet.")));
        }
        let total = offers.len();
        let rows: Vec<(usize, &Offer)> = match selection {
            ListSelection::Latest => {
                let start = total.saturating_sub(self.settings.list_default_count.max(1));
                (start..total).map(|i| (i + 1, &offers[i])).collect()
            }
            ListSelection::All => offers.iter().enumerate().map(|(i, o)| (i + 1, o)).collect(),
            ListSelection::Indices(positions) => positions
                .into_iter()
                .filter(|&p| p <= total)
                .map(|p| (p, &offers[p - 1]))
                .collect(),
        };
        if rows.is_empty() {
            return Err(AdvisorError::Validation(format!(
                "nothing at those positions, the group has {total} offers"
            )));
        }
        Ok(Step::done(Reply::text(fmt::offer_table(&rows, total))))
    }

    /// Members of a group with their offer counts. Without `args`, the sender's group.
    pub(crate) fn group_info(&self, sender: &Sender, args: &str) -> Result<Step> {
        let name = if args.is_empty() {
            self.require_collective(sender)?
        } else {
            let name = parser::parse_name(args)?;
            if !self.store.collective_exists(&name)? {
                return Err(AdvisorError::NotFound(format!("group \"{name}\"")));
            }
            name
        };

        let members = self.store.group_members(&name)?;
        let offers = self.store.list_records(&name)?;
        let today = self.today();
        let stats: Vec<fmt::MemberStats<'_>> = members
            .iter()
            .map(|member| {
                let own: Vec<&Offer> = offers.iter().filter(|o| o.author_id == member.user_id).collect();
                fmt::MemberStats {
                    member,
                    total: own.len(),
                    active: own.iter().filter(|o| o.is_active(today)).count(),
                    latest: own.last().copied(),
                }
            })
            .collect();
        Ok(Step::done(Reply::text(fmt::group_info(&name, offers.len(), &stats))))
    }

    /// Offers one member added to the sender's group. Without `args`, the sender's own.
    pub(crate) fn user_info(&self, sender: &Sender, args: &str) -> Result<Step> {
        let collective = self.require_collective(sender)?;
        let target = if args.is_empty() { sender.id } else { parser::parse_id(args)? };
        let own: Vec<Offer> = self
            .store
            .list_records(&collective)?
            .into_iter()
            .filter(|o| o.author_id == target)
            .collect();

        let Some(first) = own.first() else {
            let text = if target == sender.id {
                "📭 You have no cashback offers in this group yet.".to_string()
            } else {
                format!("📭 User {target} has no cashback offers in this group yet.")
            };
            return Ok(Step::done(Reply::text(text)));
        };
        Ok(Step::done(Reply::text(fmt::user_info(
            &first.author_name,
            &collective,
            &own,
            self.today(),
        ))))
    }

    /// The offer, if it exists and belongs to `sender`.
    pub(crate) fn owned_offer(&self, sender: &Sender, id: i64) -> Result<Offer> {
        let offer = self
            .store
            .lookup_record(id)?
            .ok_or_else(|| AdvisorError::NotFound(format!("cashback with ID {id}")))?;
        if offer.author_id != sender.id {
            warn!(user = sender.id, id, owner = offer.author_id, "ownership check failed");
            return Err(AdvisorError::Ownership("You can only change your own cashback offers.".into()));
        }
        Ok(offer)
    }

    /// Prompts for an update/delete id, showing one page of the sender's offers.
    pub(crate) fn ask_record_id(
        &self,
        sender: &Sender,
        collective: &str,
        field: IdentifierField,
        cursor: usize,
    ) -> Result<Step> {
        let own: Vec<Offer> = self
            .store
            .list_records(collective)?
            .into_iter()
            .filter(|o| o.author_id == sender.id)
            .collect();
        if own.is_empty() {
            return Ok(Step::done(Reply::text("📭 You have no cashback offers in this group yet.")));
        }

        let page_size = self.settings.page_size.max(1);
        let pages = own.len().div_ceil(page_size);
        let cursor = cursor.min(pages - 1);
        let mut text = format!("{}\n\nYour offers (page {}/{pages}):\n", field.prompt(), cursor + 1);
        for offer in own.iter().skip(cursor * page_size).take(page_size) {
            text.push_str(&format!("• {}\n", fmt::offer_line(offer)));
        }

        let mut state = ConversationState::new(Phase::AwaitingIdentifierInput(field));
        state.page_cursor = cursor;
        Ok(Step::wait(
            Reply::with_buttons(text, answer::page_buttons(cursor > 0, cursor + 1 < pages)),
            state,
        ))
    }

    /// Starts an update or delete of an owned offer.
    pub(crate) fn begin_edit(&self, sender: &Sender, field: IdentifierField, id: i64) -> Result<Step> {
        let offer = self.owned_offer(sender, id)?;
        if field == IdentifierField::UpdateId {
            Ok(Step::wait(
                Reply::text(fmt::update_prompt(&offer)),
                ConversationState::new(Phase::AwaitingUpdateData).with_target(id),
            ))
        } else {
            Ok(Step::wait(
                Reply::with_buttons(fmt::delete_prompt(&offer), answer::delete_buttons()),
                ConversationState::new(Phase::AwaitingDeleteConfirm).with_target(id),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::advisor::testing::*;

    fn offer(id: i64, category: &str, percent: f64, cap: f64) -> Offer {
        Offer {
            id,
            collective: "Семья".into(),
            bank_name: "Сбер".into(),
            category: category.into(),
            percent,
            cap,
            expiry: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            author_id: 1,
            author_name: "Alice".into(),
        }
    }

    #[test]
    fn test_matching_offers_order() {
        let offers = vec![
            offer(1, "Такси и каршеринг", 10.0, 1000.0),
            offer(2, "Такси", 5.0, 1000.0),
            offer(3, "Такси", 5.0, 3000.0),
            offer(4, "Кино", 15.0, 1000.0),
        ];
        let ids: Vec<i64> = matching_offers(&offers, "такси").iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_best_offer_found() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Такси, 5, 1000");
        advisor.on_text(&bob(), "Альфа, Такси, 7%, 2000");
        let reply = advisor.on_text(&alice(), "такси");
        assert!(reply.text.starts_with("🏆"), "{}", reply.text);
        let first = reply.text.lines().find(|l| l.starts_with("🥇")).unwrap();
        assert!(first.contains("Альфа") && first.contains("Bob"));
        assert!(advisor.state_of(1).is_none());
    }

    #[test]
    fn test_fallback_category_used() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Все покупки, 1, 5000");
        let reply = advisor.on_text(&alice(), "/best Зоопарк");
        assert!(reply.text.contains("\"Все покупки\""), "{}", reply.text);
        assert!(advisor.state_of(1).is_none());
    }

    #[test]
    fn test_exact_category_without_active_offers_is_not_found() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Такси, 5, 1000, 01.2025");
        let reply = advisor.on_text(&alice(), "Такси");
        assert!(reply.text.contains("No active cashback found"), "{}", reply.text);
        assert!(advisor.state_of(1).is_none());
    }

    #[test]
    fn test_category_check_on_save_auto_accepts_case() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Такси, 5, 1000");
        let reply = advisor.on_text(&bob(), "сбер, такси, 6, 1000");
        assert!(reply.text.contains("saved"), "{}", reply.text);
        let offers = advisor.store.list_records("Семья").unwrap();
        assert_eq!(offers[1].category, "Такси");
        assert_eq!(offers[1].bank_name, "Сбер");

        advisor.on_text(&bob(), "сбер, такси, 6, 1000");
        let offers = advisor.store.list_records("Семья").unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[2].category, offers[1].category);
        assert_eq!(offers[2].bank_name, offers[1].bank_name);
    }

    #[test]
    fn test_catalog_bank_in_other_case_is_canonicalized() {
        let (_dir, advisor) = family_advisor();
        let reply = advisor.on_text(&alice(), "альфа, Такси, 5, 1000");
        assert!(reply.text.starts_with("✅ Cashback saved!"), "{}", reply.text);
        assert!(advisor.state_of(1).is_none());
        let offers = advisor.store.list_records("Семья").unwrap();
        assert_eq!(offers[0].bank_name, "Альфа");
    }

    #[test]
    fn test_group_info_counts_offers_per_member() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Такси, 5, 1000");
        advisor.on_text(&alice(), "ВТБ, Кино, 3, 500, 31.01.2025");

        let reply = advisor.on_text(&bob(), "/groupinfo");
        let text = &reply.text;
        assert!(text.contains("Members: 2"), "{text}");
        assert!(text.contains("Cashback offers: 2"), "{text}");
        assert!(text.contains("1. Alice\n   💳 Offers: 2 (active: 1)"), "{text}");
        assert!(text.contains("Latest: ВТБ · Кино (ID 2)"), "{text}");
        assert!(text.contains("2. Bob\n   📝 No offers yet"), "{text}");
    }

    #[test]
    fn test_group_info_of_unknown_group() {
        let (_dir, advisor) = family_advisor();
        let reply = advisor.on_text(&alice(), "/groupinfo Нет такой");
        assert_eq!(reply.text, "❌ Not found: group \"Нет такой\"");
        let reply = advisor.on_text(&alice(), "/GroupInfo Семья");
        assert!(reply.text.starts_with("📊 Group \"Семья\""), "{}", reply.text);
    }

    #[test]
    fn test_user_info_lists_one_members_offers() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Такси, 5, 1000");
        advisor.on_text(&alice(), "ВТБ, Кино, 3, 500, 31.01.2025");

        let reply = advisor.on_text(&bob(), "/userinfo 1");
        assert!(reply.text.starts_with("👤 Cashback of Alice"), "{}", reply.text);
        assert!(reply.text.contains("Offers: 2 (active: 1)"), "{}", reply.text);
        assert!(reply.text.contains("ВТБ · Кино") && reply.text.contains("(ID 2) ⏰"), "{}", reply.text);

        let reply = advisor.on_text(&bob(), "/userinfo");
        assert_eq!(reply.text, "📭 You have no cashback offers in this group yet.");
        let reply = advisor.on_text(&alice(), "/userinfo 42");
        assert_eq!(reply.text, "📭 User 42 has no cashback offers in this group yet.");
        let reply = advisor.on_text(&alice(), "/userinfo Боб");
        assert!(reply.text.starts_with("⚠️ invalid id"), "{}", reply.text);
    }

    #[test]
    fn test_missing_fields_reported() {
        let (_dir, advisor) = family_advisor();
        let reply = advisor.on_text(&alice(), "Сбер, Такси, 0, 1000");
        assert!(reply.text.contains("missing data: percent"), "{}", reply.text);
        assert!(advisor.state_of(1).is_none());
    }

    #[test]
    fn test_batch_entry() {
        let (_dir, advisor) = family_advisor();
        let reply = advisor.on_text(
            &alice(),
            "Тинькоф, Такси, 5, 1000\nСбер, Кино, 150, 1000\nВТБ, Аптеки, 3%, 2000р",
        );
        assert!(reply.text.contains("Saved 2 of 3"), "{}", reply.text);
        let offers = advisor.store.list_records("Семья").unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].bank_name, "Тинькофф");
        assert!(advisor.state_of(1).is_none());
    }

    #[test]
    fn test_list_selections() {
        let (_dir, advisor) = family_advisor();
        let lines: Vec<String> = ["Кино", "Цветы", "Спорт", "Такси", "Зоотовары", "Книги", "Аптеки"]
            .iter()
            .map(|c| format!("Сбер, {c}, 5, 1000"))
            .collect();
        advisor.on_text(&alice(), &lines.join("\n"));

        let reply = advisor.on_text(&alice(), "/list");
        assert!(reply.text.contains("showing 5 of 7"), "{}", reply.text);
        assert!(!reply.text.contains("Кино"));
        let reply = advisor.on_text(&alice(), "/list all");
        assert!(reply.text.contains("showing 7 of 7"));
        let reply = advisor.on_text(&alice(), "/list 1-2,7,20");
        assert!(reply.text.contains("showing 3 of 7"));
        let reply = advisor.on_text(&alice(), "/list 30");
        assert!(reply.text.starts_with("⚠️"));
    }

    #[test]
    fn test_bank_and_category_lists_skip_expired() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&alice(), "Сбер, Такси, 5, 1000\nВТБ, Кино, 5, 1000, 01.2025");
        let reply = advisor.on_text(&alice(), "/banklist");
        assert!(reply.text.contains("Сбер") && !reply.text.contains("ВТБ"), "{}", reply.text);
        let reply = advisor.on_text(&alice(), "/categorylist");
        assert!(reply.text.contains("Такси") && !reply.text.contains("Кино"));
    }

    #[test]
    fn test_bankinfo_unknown_bank() {
        let (_dir, advisor) = family_advisor();
        let reply = advisor.on_text(&alice(), "/bankinfo Неизвестный");
        assert!(reply.text.contains("No active cashback at Неизвестный"), "{}", reply.text);
        assert!(advisor.state_of(1).is_none());
    }

    #[test]
    fn test_stale_category_hint_is_dropped() {
        let (_dir, advisor) = family_advisor();
        advisor.on_text(&bob(), "Сбер, Рестораны, 5, 1000");
        advisor.on_text(&alice(), "Сбер, Ресторны, 7, 2000");
        let bob_offer = advisor.store.list_records("Семья").unwrap()[0].id;
        advisor.store.delete_record(bob_offer).unwrap();
        let reply = advisor.on_text(&alice(), "да");
        assert!(reply.text.contains("saved"));
        let offers = advisor.store.list_records("Семья").unwrap();
        assert_eq!(offers[0].category, "Ресторны");
    }
}
