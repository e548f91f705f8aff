use chrono::NaiveDate;

/// The user sending a message. `id` is the transport-level identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub name: String,
}

/// A member of a collective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: i64,
    pub name: String,
}

/// A cashback offer as stored for a collective.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: i64,
    pub collective: String,
    pub bank_name: String,
    pub category: String,
    pub percent: f64,
    pub cap: f64,
    pub expiry: NaiveDate,
    pub author_id: i64,
    pub author_name: String,
}

impl Offer {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.expiry >= today
    }
}

/// Intermediate representation of user text before it becomes an [`Offer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub bank_name: String,
    pub category: String,
    pub percent: f64,
    pub cap: f64,
    pub expiry: NaiveDate,
}

impl ParsedRecord {
    /// Names of fields that are still empty. Zero percent or cap counts as missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bank_name.trim().is_empty() {
            missing.push("bank");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.percent == 0.0 {
            missing.push("percent");
        }
        if self.cap == 0.0 {
            missing.push("cap");
        }
        missing
    }
}

/// Which stored column a candidate set is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Bank,
    Category,
}

impl NameField {
    pub fn column(self) -> &'static str {
        match self {
            NameField::Bank => "bank_name",
            NameField::Category => "category",
        }
    }
}

/// Best candidate for a noisy query, as produced by the similarity scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub candidate: String,
    pub score: f64,
    pub distance: usize,
}

/// Corrections proposed to the user and awaiting an answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correction {
    pub bank: Option<MatchResult>,
    pub category: Option<MatchResult>,
}

impl Correction {
    pub fn is_empty(&self) -> bool {
        self.bank.is_none() && self.category.is_none()
    }
}
