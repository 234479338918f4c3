//! # Rule Catalog
//!
//! The fixed set of data-quality rule algorithms. Each handler scans the
//! record store read-only and returns findings; the engine owns dispatch,
//! templating and failure isolation.

use crate::definitions::Channel;
use crate::model::{
    display_name, format_roles, normalize, normalize_phone, title_case, Contact,
};
use crate::store::RecordStore;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One emitted data-quality alert.
///
/// `contact_id`/`contact_name` are comma-joined for multi-contact findings and
/// empty for account-level findings. `context` carries the raw grouping fields
/// for message templating and export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub account_id: String,
    pub account_name: String,
    pub contact_id: String,
    pub contact_name: String,
    pub details: String,
    pub message: String,
    pub definition_id: String,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl Finding {
    fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    /// Ids listed in `contact_id`, splitting multi-valued entries.
    pub fn contact_ids(&self) -> Vec<&str> {
        self.contact_id
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

/// Suppresses repeated emission of one grouping within a single engine run.
/// Keys are rule-specific composites; the engine resets the tracker at the
/// start of every run, so findings are never deduplicated across runs.
#[derive(Debug, Default)]
pub struct DedupeTracker {
    seen: HashSet<String>,
}

impl DedupeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    /// True the first time this composite key is seen in the current run.
    pub fn first(&mut self, parts: &[&str]) -> bool {
        self.seen.insert(parts.join("::"))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn normalized_name(contact: &Contact) -> (String, String) {
    (
        normalize(&contact.first_name),
        normalize(&contact.last_name),
    )
}

fn joined_ids(ids: &[String]) -> String {
    ids.join(", ")
}

fn joined_names(store: &RecordStore, ids: &[String]) -> String {
    ids.iter()
        .map(|id| store.contact_name(id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Contacts on one account sharing normalized name and a non-empty normalized
/// role. Emits one finding per (account, name, role) group with at least
/// `min_count` distinct contacts.
pub fn duplicate_role_same_name(
    store: &RecordStore,
    min_count: u32,
    tracker: &mut DedupeTracker,
) -> Vec<Finding> {
    let min_count = min_count.max(2) as usize;
    let mut findings = Vec::new();

    for account_id in store.related_account_ids() {
        let mut buckets: HashMap<(String, String, String), Vec<String>> = HashMap::new();
        for related in store.contacts_for_account(account_id) {
            let (first, last) = normalized_name(related.contact);
            for role in related.relation.parsed_roles() {
                let role = normalize(role);
                if role.is_empty() {
                    continue;
                }
                buckets
                    .entry((first.clone(), last.clone(), role))
                    .or_default()
                    .push(related.contact.id.clone());
            }
        }

        let mut groups: Vec<_> = buckets.into_iter().collect();
        groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for ((first, last, role), mut contact_ids) in groups {
            contact_ids.sort_unstable();
            contact_ids.dedup();
            if contact_ids.len() < min_count {
                continue;
            }
            if !tracker.first(&["duplicate_role_same_name", account_id, &first, &last, &role]) {
                continue;
            }

            let account_name = store.account_name(account_id);
            let shown_name = title_case(&format!("{} {}", first, last));
            let message = format!(
                "Account '{}' has {} contacts named {} with the role '{}'.",
                account_name,
                contact_ids.len(),
                shown_name,
                role
            );
            findings.push(
                Finding {
                    account_id: account_id.to_string(),
                    account_name: account_name.clone(),
                    contact_id: joined_ids(&contact_ids),
                    contact_name: joined_names(store, &contact_ids),
                    details: format!(
                        "Role '{}' bound to {} contacts with the same name.",
                        role,
                        contact_ids.len()
                    ),
                    message,
                    ..Default::default()
                }
                .with_context("account_name", account_name)
                .with_context("role", role)
                .with_context("contact_count", contact_ids.len().to_string()),
            );
        }
    }

    findings
}

/// One finding per relation whose parsed role list is empty. Relations are
/// not deduplicated per contact: two bare relations mean two findings.
pub fn missing_role(store: &RecordStore, tracker: &mut DedupeTracker) -> Vec<Finding> {
    let mut findings = Vec::new();

    for relation in store.relations() {
        if !relation.has_no_role() {
            continue;
        }
        if relation.account_id.is_empty() || relation.contact_id.is_empty() {
            continue;
        }
        if !tracker.first(&["missing_role", &relation.id]) {
            continue;
        }

        let account_name = store.account_name(&relation.account_id);
        let contact_name = store.contact_name(&relation.contact_id);
        findings.push(
            Finding {
                account_id: relation.account_id.clone(),
                account_name: account_name.clone(),
                contact_id: relation.contact_id.clone(),
                contact_name: contact_name.clone(),
                details: "Relation carries no role tokens.".to_string(),
                message: format!(
                    "Contact {} linked to account '{}' has no assigned role.",
                    contact_name, account_name
                ),
                ..Default::default()
            }
            .with_context("account_name", account_name)
            .with_context("relation_id", relation.id.clone()),
        );
    }

    findings
}

/// One contact name on one account bound under several distinct normalized
/// roles. Emits one finding per (account, name) group listing all roles.
pub fn same_name_different_role(
    store: &RecordStore,
    min_unique_roles: u32,
    tracker: &mut DedupeTracker,
) -> Vec<Finding> {
    let min_unique_roles = min_unique_roles.max(2) as usize;
    let mut findings = Vec::new();

    for account_id in store.related_account_ids() {
        let mut name_to_roles: HashMap<(String, String), HashSet<String>> = HashMap::new();
        let mut name_to_contacts: HashMap<(String, String), Vec<String>> = HashMap::new();
        for related in store.contacts_for_account(account_id) {
            let key = normalized_name(related.contact);
            for role in related.relation.parsed_roles() {
                let role = normalize(role);
                if role.is_empty() {
                    continue;
                }
                name_to_roles.entry(key.clone()).or_default().insert(role);
            }
            name_to_contacts
                .entry(key)
                .or_default()
                .push(related.contact.id.clone());
        }

        let mut groups: Vec<_> = name_to_roles.into_iter().collect();
        groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for ((first, last), roles) in groups {
            if roles.len() < min_unique_roles {
                continue;
            }
            if !tracker.first(&["same_name_different_role", account_id, &first, &last]) {
                continue;
            }

            let mut role_list: Vec<String> = roles.into_iter().collect();
            role_list.sort_unstable();
            let shown_roles = role_list
                .iter()
                .map(|role| title_case(role))
                .collect::<Vec<_>>()
                .join(", ");
            let mut contact_ids = name_to_contacts
                .remove(&(first.clone(), last.clone()))
                .unwrap_or_default();
            contact_ids.sort_unstable();
            contact_ids.dedup();

            let account_name = store.account_name(account_id);
            let shown_name = title_case(&format!("{} {}", first, last));
            findings.push(
                Finding {
                    account_id: account_id.to_string(),
                    account_name: account_name.clone(),
                    contact_id: joined_ids(&contact_ids),
                    contact_name: joined_names(store, &contact_ids),
                    details: format!(
                        "Name '{}' appears under {} distinct roles.",
                        shown_name,
                        role_list.len()
                    ),
                    message: format!(
                        "Account '{}' has contact {} listed with multiple roles: {}.",
                        account_name, shown_name, shown_roles
                    ),
                    ..Default::default()
                }
                .with_context("account_name", account_name)
                .with_context("roles", shown_roles),
            );
        }
    }

    findings
}

/// Repeated values among one individual's contact points for one channel.
/// Phone values compare digits-only; emails compare trimmed and lowercased.
pub fn duplicate_contact_point(
    store: &RecordStore,
    channel: Channel,
    min_count: u32,
    tracker: &mut DedupeTracker,
) -> Vec<Finding> {
    let min_count = min_count.max(2) as usize;
    let mut findings = Vec::new();

    for contact_id in store.contact_ids() {
        let values: Vec<String> = match channel {
            Channel::Phone => store
                .phones_for_contact(contact_id)
                .iter()
                .map(|point| normalize_phone(&point.telephone_number))
                .filter(|value| !value.is_empty())
                .collect(),
            Channel::Email => store
                .emails_for_contact(contact_id)
                .iter()
                .map(|point| normalize(&point.email_address))
                .filter(|value| !value.is_empty())
                .collect(),
        };

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in &values {
            *counts.entry(value.as_str()).or_default() += 1;
        }
        let duplicated: Vec<&str> = counts
            .iter()
            .filter(|(_, &count)| count >= min_count)
            .map(|(&value, _)| value)
            .collect();
        if duplicated.is_empty() {
            continue;
        }
        if !tracker.first(&["duplicate_contact_point", channel.as_str(), contact_id]) {
            continue;
        }

        let contact_name = store.contact_name(contact_id);
        let listed = duplicated.join(", ");
        findings.push(
            Finding {
                contact_id: contact_id.to_string(),
                contact_name: contact_name.clone(),
                details: format!("Duplicated {} values: {}.", channel, listed),
                message: format!(
                    "Contact {} has duplicate {} values: {}.",
                    contact_name, channel, listed
                ),
                ..Default::default()
            }
            .with_context("channel", channel.as_str())
            .with_context("values", listed),
        );
    }

    findings
}

const IDENTIFIER_FIELDS: [(&str, fn(&Contact) -> &str); 3] = [
    ("Fiscal code", |contact| &contact.fiscal_code),
    ("VAT number", |contact| &contact.vat_number),
    ("Email", |contact| &contact.email),
];

/// Contacts in one account sharing a non-empty normalized fiscal code, VAT
/// number or email. One finding per collision group (account, field, value).
pub fn duplicate_identifier(store: &RecordStore, tracker: &mut DedupeTracker) -> Vec<Finding> {
    let mut findings = Vec::new();

    for account_id in store.related_account_ids() {
        for (label, field) in IDENTIFIER_FIELDS {
            let mut buckets: HashMap<String, Vec<String>> = HashMap::new();
            for related in store.contacts_for_account(account_id) {
                let token = normalize(field(related.contact));
                if token.is_empty() {
                    continue;
                }
                buckets
                    .entry(token)
                    .or_default()
                    .push(related.contact.id.clone());
            }

            let mut groups: Vec<_> = buckets.into_iter().collect();
            groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            for (token, mut contact_ids) in groups {
                contact_ids.sort_unstable();
                contact_ids.dedup();
                if contact_ids.len() < 2 {
                    continue;
                }
                if !tracker.first(&["duplicate_identifier", account_id, label, &token]) {
                    continue;
                }

                let account_name = store.account_name(account_id);
                findings.push(
                    Finding {
                        account_id: account_id.to_string(),
                        account_name: account_name.clone(),
                        contact_id: joined_ids(&contact_ids),
                        contact_name: joined_names(store, &contact_ids),
                        details: format!(
                            "{} '{}' shared by {} contacts in the same account.",
                            label,
                            token,
                            contact_ids.len()
                        ),
                        message: format!(
                            "Account '{}' has {} contacts sharing the same {}.",
                            account_name,
                            contact_ids.len(),
                            label.to_lowercase()
                        ),
                        ..Default::default()
                    }
                    .with_context("account_name", account_name)
                    .with_context("identifier_label", label)
                    .with_context("identifier", token),
                );
            }
        }
    }

    findings
}

/// Values on the contact record compared against same-channel contact points
/// only. Flags one-sided data and populated-but-disjoint value sets.
pub fn contact_point_consistency(
    store: &RecordStore,
    channel: Channel,
    tracker: &mut DedupeTracker,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for contact_id in store.contact_ids() {
        let Some(contact) = store.contact(contact_id) else {
            continue;
        };

        let (record_values, point_values): (Vec<String>, Vec<String>) = match channel {
            Channel::Phone => (
                [&contact.phone, &contact.mobile_phone]
                    .iter()
                    .map(|value| normalize_phone(value))
                    .filter(|value| !value.is_empty())
                    .collect(),
                store
                    .phones_for_contact(contact_id)
                    .iter()
                    .map(|point| normalize_phone(&point.telephone_number))
                    .filter(|value| !value.is_empty())
                    .collect(),
            ),
            Channel::Email => (
                std::iter::once(normalize(&contact.email))
                    .filter(|value| !value.is_empty())
                    .collect(),
                store
                    .emails_for_contact(contact_id)
                    .iter()
                    .map(|point| normalize(&point.email_address))
                    .filter(|value| !value.is_empty())
                    .collect(),
            ),
        };

        if record_values.is_empty() && point_values.is_empty() {
            continue;
        }

        let details = if !record_values.is_empty() && point_values.is_empty() {
            format!(
                "{} values present on the contact record but no contact points.",
                title_case(channel.as_str())
            )
        } else if record_values.is_empty() && !point_values.is_empty() {
            format!(
                "{} contact points present but no value on the contact record.",
                title_case(channel.as_str())
            )
        } else if record_values
            .iter()
            .any(|value| point_values.contains(value))
        {
            continue;
        } else {
            format!(
                "{} values on the contact record never match its contact points.",
                title_case(channel.as_str())
            )
        };

        if !tracker.first(&["contact_point_consistency", channel.as_str(), contact_id]) {
            continue;
        }

        let contact_name = store.contact_name(contact_id);
        findings.push(
            Finding {
                contact_id: contact_id.to_string(),
                contact_name: contact_name.clone(),
                details,
                message: format!(
                    "Contact {} has inconsistent {} data between the record and its contact points.",
                    contact_name, channel
                ),
                ..Default::default()
            }
            .with_context("channel", channel.as_str())
            .with_context("record_values", record_values.join(", "))
            .with_context("point_values", point_values.join(", ")),
        );
    }

    findings
}

/// Contacts on an account with no phone, mobile or email on the record.
pub fn missing_contact_info(store: &RecordStore, tracker: &mut DedupeTracker) -> Vec<Finding> {
    let mut findings = Vec::new();

    for account_id in store.related_account_ids() {
        for related in store.contacts_for_account(account_id) {
            let contact = related.contact;
            let has_any = !contact.phone.trim().is_empty()
                || !contact.mobile_phone.trim().is_empty()
                || !contact.email.trim().is_empty();
            if has_any {
                continue;
            }
            if !tracker.first(&["missing_contact_info", account_id, &contact.id]) {
                continue;
            }

            let account_name = store.account_name(account_id);
            let contact_name = display_name(&contact.first_name, &contact.last_name, &contact.id);
            findings.push(
                Finding {
                    account_id: account_id.to_string(),
                    account_name: account_name.clone(),
                    contact_id: contact.id.clone(),
                    contact_name: contact_name.clone(),
                    details: "Contact has no phone, mobile or email available.".to_string(),
                    message: format!("Contact {} has no contact info available.", contact_name),
                    ..Default::default()
                }
                .with_context("account_name", account_name)
                .with_context(
                    "roles",
                    format_roles(related.relation.parsed_roles()),
                ),
            );
        }
    }

    findings
}

/// Holders of the referent role must own at least one email contact point of
/// the configured type with a non-blank address.
pub fn sol_referent_email(
    store: &RecordStore,
    role: &str,
    email_type: &str,
    tracker: &mut DedupeTracker,
) -> Vec<Finding> {
    let wanted_role = normalize(role);
    let wanted_type = normalize(email_type);
    let mut findings = Vec::new();

    for account_id in store.related_account_ids() {
        for related in store.contacts_for_account(account_id) {
            let holds_role = related
                .relation
                .parsed_roles()
                .iter()
                .any(|token| normalize(token) == wanted_role);
            if !holds_role {
                continue;
            }

            let points = store.emails_for_contact(&related.contact.id);
            let satisfied = points.iter().any(|point| {
                normalize(&point.point_type) == wanted_type
                    && !point.email_address.trim().is_empty()
            });
            if satisfied {
                continue;
            }
            if !tracker.first(&["sol_referent_email", account_id, &related.contact.id]) {
                continue;
            }

            let types_found = if points.is_empty() {
                "none".to_string()
            } else {
                points
                    .iter()
                    .map(|point| {
                        let token = normalize(&point.point_type);
                        if token.is_empty() {
                            "(blank)".to_string()
                        } else {
                            token
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            let account_name = store.account_name(account_id);
            let contact_name = store.contact_name(&related.contact.id);
            findings.push(
                Finding {
                    account_id: account_id.to_string(),
                    account_name: account_name.clone(),
                    contact_id: related.contact.id.clone(),
                    contact_name: contact_name.clone(),
                    details: format!(
                        "No '{}' contact point with a populated address. Types found: {}.",
                        email_type, types_found
                    ),
                    message: format!(
                        "Contact {} holds the '{}' role but has no usable '{}' contact point.",
                        contact_name, role, email_type
                    ),
                    ..Default::default()
                }
                .with_context("account_name", account_name)
                .with_context("required_type", email_type)
                .with_context("types_found", types_found),
            );
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Account, AccountContactRelation, Contact, EmailContactPoint, ImportPayload, Individual,
        PhoneContactPoint,
    };
    use crate::store::RecordStore;

    fn base_store() -> RecordStore {
        let mut store = RecordStore::new();
        store.bulk_replace(ImportPayload {
            accounts: Some(vec![Account {
                id: "A1".to_string(),
                name: "Acme".to_string(),
                customer_marking: String::new(),
            }]),
            contacts: Some(vec![
                Contact {
                    id: "C1".to_string(),
                    first_name: "Jo".to_string(),
                    last_name: "Doe".to_string(),
                    individual_id: Some("I1".to_string()),
                    email: "jo@acme.example".to_string(),
                    ..Default::default()
                },
                Contact {
                    id: "C2".to_string(),
                    first_name: " jo ".to_string(),
                    last_name: "DOE".to_string(),
                    email: "jo@acme.example".to_string(),
                    ..Default::default()
                },
            ]),
            individuals: Some(vec![Individual {
                id: "I1".to_string(),
                first_name: "Jo".to_string(),
                last_name: "Doe".to_string(),
            }]),
            account_contact_relations: Some(vec![
                AccountContactRelation {
                    id: "R1".to_string(),
                    account_id: "A1".to_string(),
                    contact_id: "C1".to_string(),
                    roles: "Billing".to_string(),
                },
                AccountContactRelation {
                    id: "R2".to_string(),
                    account_id: "A1".to_string(),
                    contact_id: "C2".to_string(),
                    roles: " billing ".to_string(),
                },
            ]),
            ..Default::default()
        });
        store
    }

    #[test]
    fn duplicate_role_groups_case_insensitively() {
        let store = base_store();
        let mut tracker = DedupeTracker::new();
        let findings = duplicate_role_same_name(&store, 2, &mut tracker);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.account_id, "A1");
        assert_eq!(finding.contact_id, "C1, C2");
        assert_eq!(finding.context["role"], "billing");
    }

    #[test]
    fn duplicate_role_ignores_empty_roles() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::AccountContactRelations(vec![
            AccountContactRelation {
                id: "R1".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C1".to_string(),
                roles: String::new(),
            },
            AccountContactRelation {
                id: "R2".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C2".to_string(),
                roles: String::new(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        assert!(duplicate_role_same_name(&store, 2, &mut tracker).is_empty());
    }

    #[test]
    fn duplicate_role_reported_once_per_group() {
        let store = base_store();
        let mut tracker = DedupeTracker::new();
        let first = duplicate_role_same_name(&store, 2, &mut tracker);
        let second = duplicate_role_same_name(&store, 2, &mut tracker);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty(), "tracker suppresses the repeat");
    }

    #[test]
    fn missing_role_emits_one_finding_per_relation() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::AccountContactRelations(vec![
            AccountContactRelation {
                id: "R1".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C1".to_string(),
                roles: " ; ".to_string(),
            },
            AccountContactRelation {
                id: "R2".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C1".to_string(),
                roles: String::new(),
            },
            AccountContactRelation {
                id: "R3".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C2".to_string(),
                roles: "Billing".to_string(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let findings = missing_role(&store, &mut tracker);
        assert_eq!(findings.len(), 2, "two bare relations, two findings");
    }

    #[test]
    fn same_name_different_role_lists_all_roles() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::AccountContactRelations(vec![
            AccountContactRelation {
                id: "R1".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C1".to_string(),
                roles: "Billing".to_string(),
            },
            AccountContactRelation {
                id: "R2".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C2".to_string(),
                roles: "Technical; Sales".to_string(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let findings = same_name_different_role(&store, 2, &mut tracker);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].context["roles"], "Billing, Sales, Technical");
    }

    #[test]
    fn duplicate_contact_point_counts_normalized_phones() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::ContactPointPhones(vec![
            PhoneContactPoint {
                id: "P1".to_string(),
                parent_id: "I1".to_string(),
                telephone_number: "+39 02 1234".to_string(),
            },
            PhoneContactPoint {
                id: "P2".to_string(),
                parent_id: "I1".to_string(),
                telephone_number: "3902-1234".to_string(),
            },
            PhoneContactPoint {
                id: "P3".to_string(),
                parent_id: "I1".to_string(),
                telephone_number: "555".to_string(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let findings = duplicate_contact_point(&store, Channel::Phone, 2, &mut tracker);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].contact_id, "C1");
        assert_eq!(findings[0].context["values"], "39021234");
    }

    #[test]
    fn duplicate_identifier_emits_one_finding_per_group() {
        let store = base_store();
        let mut tracker = DedupeTracker::new();
        let findings = duplicate_identifier(&store, &mut tracker);
        // C1 and C2 share an email inside A1; fiscal code and VAT are blank.
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].context["identifier_label"], "Email");
        assert_eq!(findings[0].contact_id, "C1, C2");
    }

    #[test]
    fn consistency_ignores_cross_channel_values() {
        let mut store = base_store();
        // C1 has an email on the record and a matching email point; its phone
        // channel is empty on both sides, so neither channel should flag C1.
        store.replace(crate::model::EntityBatch::ContactPointEmails(vec![
            EmailContactPoint {
                id: "E1".to_string(),
                parent_id: "I1".to_string(),
                email_address: "JO@acme.example ".to_string(),
                point_type: String::new(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let phone_findings = contact_point_consistency(&store, Channel::Phone, &mut tracker);
        assert!(phone_findings.iter().all(|f| f.contact_id != "C1"));
        let email_findings = contact_point_consistency(&store, Channel::Email, &mut tracker);
        assert!(email_findings.iter().all(|f| f.contact_id != "C1"));
        // C2 has an email on the record but no individual, hence no points.
        assert!(email_findings.iter().any(|f| f.contact_id == "C2"));
    }

    #[test]
    fn consistency_flags_disjoint_phone_sets() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::Contacts(vec![Contact {
            id: "C1".to_string(),
            first_name: "Jo".to_string(),
            last_name: "Doe".to_string(),
            individual_id: Some("I1".to_string()),
            phone: "02 9999".to_string(),
            ..Default::default()
        }]));
        store.replace(crate::model::EntityBatch::ContactPointPhones(vec![
            PhoneContactPoint {
                id: "P1".to_string(),
                parent_id: "I1".to_string(),
                telephone_number: "02 1234".to_string(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let findings = contact_point_consistency(&store, Channel::Phone, &mut tracker);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].contact_id, "C1");
        assert!(findings[0].details.contains("never match"));
    }

    #[test]
    fn missing_contact_info_flags_empty_contacts() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::Contacts(vec![
            Contact {
                id: "C1".to_string(),
                first_name: "Jo".to_string(),
                last_name: "Doe".to_string(),
                ..Default::default()
            },
            Contact {
                id: "C2".to_string(),
                first_name: "Al".to_string(),
                last_name: "Poe".to_string(),
                mobile_phone: "555".to_string(),
                ..Default::default()
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let findings = missing_contact_info(&store, &mut tracker);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].contact_id, "C1");
    }

    #[test]
    fn sol_referent_requires_typed_email_point() {
        let mut store = base_store();
        store.replace(crate::model::EntityBatch::AccountContactRelations(vec![
            AccountContactRelation {
                id: "R1".to_string(),
                account_id: "A1".to_string(),
                contact_id: "C1".to_string(),
                roles: "Referente SOL-APP".to_string(),
            },
        ]));
        let mut tracker = DedupeTracker::new();
        let findings =
            sol_referent_email(&store, "Referente SOL-APP", "E-mail SOL", &mut tracker);
        assert_eq!(findings.len(), 1, "no typed point yet");

        store.replace(crate::model::EntityBatch::ContactPointEmails(vec![
            EmailContactPoint {
                id: "E1".to_string(),
                parent_id: "I1".to_string(),
                email_address: "jo@sol.example".to_string(),
                point_type: "e-mail sol".to_string(),
            },
        ]));
        tracker.reset();
        let findings =
            sol_referent_email(&store, "Referente SOL-APP", "E-mail SOL", &mut tracker);
        assert!(findings.is_empty(), "typed point with address satisfies");
    }
}
