use crate::error::Result;
use crate::models::{Member, NameField, Offer, ParsedRecord, Sender};

/// Persistence for offers and collectives. Every call goes to the backend;
/// nothing is cached between calls.
pub trait RecordStore: Send + Sync {
    /// Distinct values of `field` among the collective's offers.
    fn candidate_names(&self, collective: &str, field: NameField) -> Result<Vec<String>>;

    /// Stores a record. `force` means the user already confirmed or typed the
    /// values, so the backend must not second-guess them.
    fn create_record(&self, collective: &str, record: &ParsedRecord, author: &Sender, force: bool) -> Result<Offer>;

    fn lookup_record(&self, id: i64) -> Result<Option<Offer>>;

    fn update_record(&self, id: i64, record: &ParsedRecord) -> Result<Offer>;

    fn delete_record(&self, id: i64) -> Result<()>;

    /// All offers of a collective, oldest first.
    fn list_records(&self, collective: &str) -> Result<Vec<Offer>>;

    fn user_collective(&self, user: i64) -> Result<Option<String>>;

    fn create_collective(&self, name: &str, creator: &Sender) -> Result<()>;

    fn join_collective(&self, user: &Sender, name: &str) -> Result<()>;

    fn collective_exists(&self, name: &str) -> Result<bool>;

    /// Members of a collective in the order they joined.
    fn group_members(&self, collective: &str) -> Result<Vec<Member>>;
}
