//! # Data Model
//!
//! Typed records for the six CRM entity kinds, plus the text-normalization
//! helpers every rule comparison goes through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A CRM organization record. Root entity; holds no references out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Free-text classification tag (e.g. "D1").
    pub customer_marking: String,
}

/// A person-in-a-role record, bound to accounts via relations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Reference to the underlying physical person, when known.
    pub individual_id: Option<String>,
    pub fiscal_code: String,
    pub vat_number: String,
    pub mobile_phone: String,
    pub phone: String,
    pub email: String,
}

/// The physical person shared by possibly many contact role-bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

/// Join record binding one contact to one account with zero or more roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContactRelation {
    pub id: String,
    pub account_id: String,
    pub contact_id: String,
    /// Semicolon-delimited role labels; may be empty.
    pub roles: String,
}

impl AccountContactRelation {
    /// Parse the role list: split on `;`, trim, drop empty tokens.
    /// "No role" is an empty list, never an error.
    pub fn parsed_roles(&self) -> Vec<&str> {
        self.roles
            .split(';')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .collect()
    }

    /// True when the relation carries no usable role token.
    pub fn has_no_role(&self) -> bool {
        self.parsed_roles().is_empty()
    }
}

/// A phone number attached to an individual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneContactPoint {
    pub id: String,
    pub parent_id: String,
    pub telephone_number: String,
}

/// An email address attached to an individual, with an optional type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContactPoint {
    pub id: String,
    pub parent_id: String,
    pub email_address: String,
    pub point_type: String,
}

/// The six entity kinds the store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Accounts,
    Contacts,
    Individuals,
    AccountContactRelations,
    ContactPointPhones,
    ContactPointEmails,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Accounts,
        EntityKind::Contacts,
        EntityKind::Individuals,
        EntityKind::AccountContactRelations,
        EntityKind::ContactPointPhones,
        EntityKind::ContactPointEmails,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Accounts => "accounts",
            EntityKind::Contacts => "contacts",
            EntityKind::Individuals => "individuals",
            EntityKind::AccountContactRelations => "account_contact_relations",
            EntityKind::ContactPointPhones => "contact_point_phones",
            EntityKind::ContactPointEmails => "contact_point_emails",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a kind string does not name a known entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityKind {
    pub kind: String,
}

impl fmt::Display for UnknownEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity kind '{}'", self.kind)
    }
}

impl std::error::Error for UnknownEntityKind {}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "accounts" => Ok(EntityKind::Accounts),
            "contacts" => Ok(EntityKind::Contacts),
            "individuals" => Ok(EntityKind::Individuals),
            "account_contact_relations" => Ok(EntityKind::AccountContactRelations),
            "contact_point_phones" => Ok(EntityKind::ContactPointPhones),
            "contact_point_emails" => Ok(EntityKind::ContactPointEmails),
            other => Err(UnknownEntityKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// One full table for one entity kind, used by snapshot replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityBatch {
    Accounts(Vec<Account>),
    Contacts(Vec<Contact>),
    Individuals(Vec<Individual>),
    AccountContactRelations(Vec<AccountContactRelation>),
    ContactPointPhones(Vec<PhoneContactPoint>),
    ContactPointEmails(Vec<EmailContactPoint>),
}

impl EntityBatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBatch::Accounts(_) => EntityKind::Accounts,
            EntityBatch::Contacts(_) => EntityKind::Contacts,
            EntityBatch::Individuals(_) => EntityKind::Individuals,
            EntityBatch::AccountContactRelations(_) => EntityKind::AccountContactRelations,
            EntityBatch::ContactPointPhones(_) => EntityKind::ContactPointPhones,
            EntityBatch::ContactPointEmails(_) => EntityKind::ContactPointEmails,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntityBatch::Accounts(records) => records.len(),
            EntityBatch::Contacts(records) => records.len(),
            EntityBatch::Individuals(records) => records.len(),
            EntityBatch::AccountContactRelations(records) => records.len(),
            EntityBatch::ContactPointPhones(records) => records.len(),
            EntityBatch::ContactPointEmails(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A full or partial snapshot: one optional table per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPayload {
    pub accounts: Option<Vec<Account>>,
    pub contacts: Option<Vec<Contact>>,
    pub individuals: Option<Vec<Individual>>,
    pub account_contact_relations: Option<Vec<AccountContactRelation>>,
    pub contact_point_phones: Option<Vec<PhoneContactPoint>>,
    pub contact_point_emails: Option<Vec<EmailContactPoint>>,
}

impl ImportPayload {
    /// Drain the payload into one batch per present kind, in table order.
    pub fn into_batches(self) -> Vec<EntityBatch> {
        let mut batches = Vec::new();
        if let Some(records) = self.accounts {
            batches.push(EntityBatch::Accounts(records));
        }
        if let Some(records) = self.contacts {
            batches.push(EntityBatch::Contacts(records));
        }
        if let Some(records) = self.individuals {
            batches.push(EntityBatch::Individuals(records));
        }
        if let Some(records) = self.account_contact_relations {
            batches.push(EntityBatch::AccountContactRelations(records));
        }
        if let Some(records) = self.contact_point_phones {
            batches.push(EntityBatch::ContactPointPhones(records));
        }
        if let Some(records) = self.contact_point_emails {
            batches.push(EntityBatch::ContactPointEmails(records));
        }
        batches
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_none()
            && self.contacts.is_none()
            && self.individuals.is_none()
            && self.account_contact_relations.is_none()
            && self.contact_point_phones.is_none()
            && self.contact_point_emails.is_none()
    }
}

/// Trim and lowercase a value for comparisons. Absent text becomes the empty
/// string so comparisons never see a null.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Reduce a phone number to its digits for comparisons.
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

/// Title-case a normalized token for display ("billing" -> "Billing").
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-readable contact name: "First Last", falling back to the id.
pub fn display_name(first: &str, last: &str, fallback: &str) -> String {
    let full = format!("{} {}", first.trim(), last.trim());
    let full = full.trim();
    if full.is_empty() {
        fallback.to_string()
    } else {
        full.to_string()
    }
}

/// Join roles into a readable list, keeping first occurrence order.
pub fn format_roles<'a, I>(roles: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut unique: Vec<&str> = Vec::new();
    for role in roles {
        if !role.is_empty() && !unique.contains(&role) {
            unique.push(role);
        }
    }
    unique.join(", ")
}
