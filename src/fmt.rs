use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use chrono::NaiveDate;

use crate::models::{Member, Offer, ParsedRecord};

pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Format a float as a ruble amount with thousands separators: 12 345₽
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let whole = format!("{:.0}", val.abs());

    let mut grouped = String::new();
    for (i, c) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped}₽")
    } else {
        format!("{grouped}₽")
    }
}

pub fn percent(val: f64) -> String {
    format!("{val:.1}%")
}

/// One-line summary used in lists.
pub fn offer_line(offer: &Offer) -> String {
    format!(
        "{} · {} · {} up to {} · until {} · {} (ID {})",
        offer.bank_name,
        offer.category,
        percent(offer.percent),
        money(offer.cap),
        offer.expiry.format(DATE_FORMAT),
        offer.author_name,
        offer.id
    )
}

/// The record as a line the user can copy, edit and send back.
pub fn copy_line(offer: &Offer) -> String {
    format!(
        "{}, {}, {:.1}, {:.0}, {}",
        offer.bank_name,
        offer.category,
        offer.percent,
        offer.cap,
        offer.expiry.format(DATE_FORMAT)
    )
}

pub fn parsed_record(record: &ParsedRecord) -> String {
    format!(
        "🏦 Bank: {}\n📁 Category: {}\n💰 Cashback: {}\n💵 Cap: {}\n📅 Until: {}",
        record.bank_name,
        record.category,
        percent(record.percent),
        money(record.cap),
        record.expiry.format(DATE_FORMAT)
    )
}

pub fn saved_offer(offer: &Offer) -> String {
    format!(
        "✅ Cashback saved!\n\n🆔 ID: {}\n🏦 Bank: {}\n📁 Category: {}\n📅 Until: {}\n💰 Cashback: {}\n💵 Cap: {}\n👤 Card: {}",
        offer.id,
        offer.bank_name,
        offer.category,
        offer.expiry.format(DATE_FORMAT),
        percent(offer.percent),
        money(offer.cap),
        offer.author_name
    )
}

pub fn updated_offer(offer: &Offer) -> String {
    format!(
        "✅ Cashback updated!\n\n🆔 ID: {}\n🏦 Bank: {}\n📁 Category: {}\n📅 Until: {}\n💰 Cashback: {}\n💵 Cap: {}",
        offer.id,
        offer.bank_name,
        offer.category,
        offer.expiry.format(DATE_FORMAT),
        percent(offer.percent),
        money(offer.cap)
    )
}

/// Search results, best first. `fallback` marks results from the catch-all category.
pub fn best_offers(offers: &[Offer], requested: &str, fallback: Option<&str>) -> String {
    let mut text = match fallback {
        Some(name) => format!(
            "ℹ️ No offers for \"{requested}\", but \"{name}\" applies to every purchase:\n\n"
        ),
        None => format!("🏆 Best cashback for \"{requested}\":\n\n"),
    };
    for (i, offer) in offers.iter().enumerate() {
        let medal = match i {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "•",
        };
        text.push_str(&format!("{medal} {}\n", offer_line(offer)));
    }
    text
}

pub fn not_found(category: &str) -> String {
    format!(
        "❌ No active cashback found for \"{category}\".\n\nTo add one, send:\nBank, {category}, Percent, Cap"
    )
}

pub fn bank_info(bank: &str, offers: &[Offer]) -> String {
    let mut text = format!("🏦 Active cashback at {bank}:\n\n");
    for offer in offers {
        text.push_str(&format!("• {}\n", offer_line(offer)));
    }
    text
}

pub fn name_list(title: &str, names: &[String]) -> String {
    let mut text = format!("{title} ({}):\n\n", names.len());
    for name in names {
        text.push_str(&format!("• {name}\n"));
    }
    text
}

/// `/list` output: a table with the listing position of each row.
pub fn offer_table(rows: &[(usize, &Offer)], total: usize) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "ID", "Bank", "Category", "%", "Cap", "Until", "Card"]);
    for (pos, offer) in rows {
        table.add_row(vec![
            pos.to_string(),
            offer.id.to_string(),
            offer.bank_name.clone(),
            offer.category.clone(),
            format!("{:.1}", offer.percent),
            money(offer.cap),
            offer.expiry.format(DATE_FORMAT).to_string(),
            offer.author_name.clone(),
        ]);
    }
    format!("📋 Cashback in group: showing {} of {total}\n{table}", rows.len())
}

/// What one member has contributed to a group.
pub struct MemberStats<'a> {
    pub member: &'a Member,
    pub total: usize,
    pub active: usize,
    pub latest: Option<&'a Offer>,
}

pub fn group_info(name: &str, total: usize, members: &[MemberStats<'_>]) -> String {
    let mut text = format!(
        "📊 Group \"{name}\"\n\n📌 Members: {}\n💳 Cashback offers: {total}\n\n",
        members.len()
    );
    if members.is_empty() {
        text.push_str("📝 No members yet.");
        return text;
    }
    text.push_str("👤 Members:\n\n");
    for (i, stats) in members.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, stats.member.name));
        match stats.latest {
            Some(latest) => {
                text.push_str(&format!("   💳 Offers: {} (active: {})\n", stats.total, stats.active));
                text.push_str(&format!(
                    "   🕒 Latest: {} · {} (ID {})\n",
                    latest.bank_name, latest.category, latest.id
                ));
            }
            None => text.push_str("   📝 No offers yet\n"),
        }
        text.push('\n');
    }
    text
}

/// Every offer of one member, expired ones marked with ⏰.
pub fn user_info(name: &str, collective: &str, offers: &[Offer], today: NaiveDate) -> String {
    let active = offers.iter().filter(|o| o.is_active(today)).count();
    let mut text = format!(
        "👤 Cashback of {name}\n\n👥 Group: {collective}\n💳 Offers: {} (active: {active})\n\n",
        offers.len()
    );
    for (i, offer) in offers.iter().enumerate() {
        let mark = if offer.is_active(today) { "" } else { " ⏰" };
        text.push_str(&format!("{}. {}{mark}\n", i + 1, offer_line(offer)));
    }
    text
}

pub fn update_prompt(offer: &Offer) -> String {
    format!(
        "📝 Updating cashback ID {}\n\nCurrent data:\n{}\n\nSend the new line (copy and edit):\n{}",
        offer.id,
        offer_line(offer),
        copy_line(offer)
    )
}

pub fn delete_prompt(offer: &Offer) -> String {
    format!("⚠️ Delete this cashback?\n\n{}", offer_line(offer))
}
