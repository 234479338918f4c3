//! # Store Module
//!
//! Holds the entity tables and the relationship indices derived from them, so
//! rule scans answer lookups in O(1)/O(k) without walking the raw lists.

use crate::model::{
    normalize, Account, AccountContactRelation, Contact, EmailContactPoint, EntityBatch,
    EntityKind, ImportPayload, Individual, PhoneContactPoint,
};
use hashbrown::HashMap;
use tracing::debug;

/// A contact together with the specific relation that binds it to an account.
/// Contacts related through two relations appear once per relation.
#[derive(Debug, Clone, Copy)]
pub struct RelatedContact<'a> {
    pub contact: &'a Contact,
    pub relation: &'a AccountContactRelation,
}

/// Main storage for the imported snapshot and its derived indices.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    accounts: HashMap<String, Account>,
    contacts: HashMap<String, Contact>,
    individuals: HashMap<String, Individual>,
    relations: Vec<AccountContactRelation>,
    phones: Vec<PhoneContactPoint>,
    emails: Vec<EmailContactPoint>,

    // Derived indices, rebuilt wholesale after every replace. Relation and
    // contact-point indices hold positions into the backing Vec tables.
    account_to_relations: HashMap<String, Vec<usize>>,
    contact_to_individual: HashMap<String, String>,
    individual_to_contacts: HashMap<String, Vec<String>>,
    individual_to_phones: HashMap<String, Vec<usize>>,
    individual_to_emails: HashMap<String, Vec<usize>>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one entity table with a new snapshot, then rebuild every
    /// derived index. Id-keyed tables drop records with a blank id and keep
    /// the last record on duplicate ids; list tables are installed as-is.
    pub fn replace(&mut self, batch: EntityBatch) {
        let kind = batch.kind();
        let count = batch.len();
        self.install(batch);
        self.rebuild_indices();
        debug!(kind = %kind, records = count, "replaced entity table");
    }

    /// Replace every table present in the payload, rebuilding indices once at
    /// the end. Order does not matter.
    pub fn bulk_replace(&mut self, payload: ImportPayload) {
        for batch in payload.into_batches() {
            let kind = batch.kind();
            let count = batch.len();
            self.install(batch);
            debug!(kind = %kind, records = count, "replaced entity table");
        }
        self.rebuild_indices();
    }

    fn install(&mut self, batch: EntityBatch) {
        match batch {
            EntityBatch::Accounts(records) => {
                self.accounts = Self::index_by_id(records, |record| &record.id);
            }
            EntityBatch::Contacts(records) => {
                self.contacts = Self::index_by_id(records, |record| &record.id);
            }
            EntityBatch::Individuals(records) => {
                self.individuals = Self::index_by_id(records, |record| &record.id);
            }
            EntityBatch::AccountContactRelations(records) => {
                self.relations = records;
            }
            EntityBatch::ContactPointPhones(records) => {
                self.phones = records;
            }
            EntityBatch::ContactPointEmails(records) => {
                self.emails = records;
            }
        }
    }

    fn index_by_id<T, F>(records: Vec<T>, id_of: F) -> HashMap<String, T>
    where
        F: Fn(&T) -> &String,
    {
        let mut table = HashMap::with_capacity(records.len());
        for record in records {
            let id = id_of(&record);
            if id.is_empty() {
                continue;
            }
            table.insert(id.clone(), record);
        }
        table
    }

    /// Rebuild all derived indices from the current tables. Relations whose
    /// account or contact side is blank are skipped, so keyed lookups never
    /// surface them.
    fn rebuild_indices(&mut self) {
        self.account_to_relations = HashMap::new();
        for (position, relation) in self.relations.iter().enumerate() {
            if relation.account_id.is_empty() || relation.contact_id.is_empty() {
                continue;
            }
            self.account_to_relations
                .entry(relation.account_id.clone())
                .or_default()
                .push(position);
        }

        self.contact_to_individual = HashMap::new();
        self.individual_to_contacts = HashMap::new();
        for (contact_id, contact) in &self.contacts {
            if let Some(individual_id) = contact.individual_id.as_deref() {
                if individual_id.is_empty() {
                    continue;
                }
                self.contact_to_individual
                    .insert(contact_id.clone(), individual_id.to_string());
                self.individual_to_contacts
                    .entry(individual_id.to_string())
                    .or_default()
                    .push(contact_id.clone());
            }
        }

        self.individual_to_phones = HashMap::new();
        for (position, phone) in self.phones.iter().enumerate() {
            if phone.parent_id.is_empty() {
                continue;
            }
            self.individual_to_phones
                .entry(phone.parent_id.clone())
                .or_default()
                .push(position);
        }

        self.individual_to_emails = HashMap::new();
        for (position, email) in self.emails.iter().enumerate() {
            if email.parent_id.is_empty() {
                continue;
            }
            self.individual_to_emails
                .entry(email.parent_id.clone())
                .or_default()
                .push(position);
        }

        debug!(
            accounts = self.accounts.len(),
            contacts = self.contacts.len(),
            relations = self.relations.len(),
            "rebuilt relationship indices"
        );
    }

    /// Get an account by id.
    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    /// The raw relation table, in import order.
    pub fn relations(&self) -> &[AccountContactRelation] {
        &self.relations
    }

    /// Account ids that appear on at least one indexed relation, sorted.
    /// These may reference accounts missing from the accounts table; name
    /// resolution falls back to the id for those.
    pub fn related_account_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .account_to_relations
            .keys()
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Get a contact by id.
    pub fn contact(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.get(contact_id)
    }

    /// All account ids, sorted so scans are deterministic.
    pub fn account_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.accounts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All contact ids, sorted so scans are deterministic.
    pub fn contact_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.contacts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Contacts bound to an account, each paired with its relation record.
    /// Relations whose contact does not resolve are skipped.
    pub fn contacts_for_account(&self, account_id: &str) -> Vec<RelatedContact<'_>> {
        let Some(positions) = self.account_to_relations.get(account_id) else {
            return Vec::new();
        };
        positions
            .iter()
            .filter_map(|&position| {
                let relation = &self.relations[position];
                self.contacts
                    .get(&relation.contact_id)
                    .map(|contact| RelatedContact { contact, relation })
            })
            .collect()
    }

    /// The individual behind a contact, when the edge resolves.
    pub fn individual_for_contact(&self, contact_id: &str) -> Option<&Individual> {
        let individual_id = self.contact_to_individual.get(contact_id)?;
        self.individuals.get(individual_id)
    }

    /// Phone contact points reachable from a contact via its individual.
    pub fn phones_for_contact(&self, contact_id: &str) -> Vec<&PhoneContactPoint> {
        let Some(individual_id) = self.contact_to_individual.get(contact_id) else {
            return Vec::new();
        };
        self.individual_to_phones
            .get(individual_id)
            .map(|positions| positions.iter().map(|&p| &self.phones[p]).collect())
            .unwrap_or_default()
    }

    /// Email contact points reachable from a contact via its individual.
    pub fn emails_for_contact(&self, contact_id: &str) -> Vec<&EmailContactPoint> {
        let Some(individual_id) = self.contact_to_individual.get(contact_id) else {
            return Vec::new();
        };
        self.individual_to_emails
            .get(individual_id)
            .map(|positions| positions.iter().map(|&p| &self.emails[p]).collect())
            .unwrap_or_default()
    }

    /// Contacts holding the given role on any account. The role token is
    /// matched case/space-insensitively against the parsed role list.
    pub fn contacts_with_role(&self, role: &str) -> Vec<RelatedContact<'_>> {
        let wanted = normalize(role);
        if wanted.is_empty() {
            return Vec::new();
        }
        self.relations
            .iter()
            .filter(|relation| {
                relation
                    .parsed_roles()
                    .iter()
                    .any(|token| normalize(token) == wanted)
            })
            .filter_map(|relation| {
                self.contacts
                    .get(&relation.contact_id)
                    .map(|contact| RelatedContact { contact, relation })
            })
            .collect()
    }

    /// Accounts whose customer marking equals the given value after
    /// normalization.
    pub fn accounts_with_marking(&self, marking: &str) -> Vec<&Account> {
        let wanted = normalize(marking);
        let mut matches: Vec<&Account> = self
            .accounts
            .values()
            .filter(|account| normalize(&account.customer_marking) == wanted)
            .collect();
        matches.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Resolve an account's display name, falling back to the id.
    pub fn account_name(&self, account_id: &str) -> String {
        self.accounts
            .get(account_id)
            .map(|account| account.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| account_id.to_string())
    }

    /// Resolve a contact's display name, falling back to the id.
    pub fn contact_name(&self, contact_id: &str) -> String {
        match self.contacts.get(contact_id) {
            Some(contact) => {
                crate::model::display_name(&contact.first_name, &contact.last_name, contact_id)
            }
            None => contact_id.to_string(),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn individual_count(&self) -> usize {
        self.individuals.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn phone_count(&self) -> usize {
        self.phones.len()
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.contacts.is_empty()
            && self.individuals.is_empty()
            && self.relations.is_empty()
            && self.phones.is_empty()
            && self.emails.is_empty()
    }

    /// Record count for one kind, for import summaries.
    pub fn count_for(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Accounts => self.account_count(),
            EntityKind::Contacts => self.contact_count(),
            EntityKind::Individuals => self.individual_count(),
            EntityKind::AccountContactRelations => self.relation_count(),
            EntityKind::ContactPointPhones => self.phone_count(),
            EntityKind::ContactPointEmails => self.email_count(),
        }
    }
}
