use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use relsentry::model::{
    Account, AccountContactRelation, Contact, EmailContactPoint, ImportPayload, Individual,
    PhoneContactPoint,
};

const ROLES: [&str; 4] = ["Billing", "Technical", "Sales", "Legal"];

/// A seeded snapshot with a known amount of seeded quality defects.
#[derive(Debug, Clone)]
pub struct GeneratedSnapshot {
    pub payload: ImportPayload,
    #[allow(dead_code)]
    pub duplicate_groups: usize,
    #[allow(dead_code)]
    pub bare_relations: usize,
}

/// Generate a snapshot of `account_count` accounts with two contacts each.
/// With probability `defect_probability` an account gets a same-name,
/// same-role contact pair and one relation without roles.
pub fn generate_snapshot(
    account_count: u32,
    defect_probability: f64,
    seed: u64,
) -> GeneratedSnapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut accounts = Vec::new();
    let mut contacts = Vec::new();
    let mut individuals = Vec::new();
    let mut relations = Vec::new();
    let mut phones = Vec::new();
    let mut emails = Vec::new();
    let mut duplicate_groups = 0;
    let mut bare_relations = 0;

    for account_index in 1..=account_count {
        let account_id = format!("A{:05}", account_index);
        accounts.push(Account {
            id: account_id.clone(),
            name: format!("Account {:05}", account_index),
            customer_marking: if rng.random_bool(0.2) {
                "D1".to_string()
            } else {
                String::new()
            },
        });

        let defective = rng.random_bool(defect_probability);
        let role = ROLES[rng.random_range(0..ROLES.len())];

        for contact_index in 0..2u32 {
            let contact_id = format!("C{:05}-{}", account_index, contact_index);
            let individual_id = format!("I{:05}-{}", account_index, contact_index);
            let (first, last) = if defective {
                ("Jo".to_string(), format!("Doe{:05}", account_index))
            } else {
                (
                    format!("First{:05}-{}", account_index, contact_index),
                    format!("Last{:05}-{}", account_index, contact_index),
                )
            };

            individuals.push(Individual {
                id: individual_id.clone(),
                first_name: first.clone(),
                last_name: last.clone(),
            });
            contacts.push(Contact {
                id: contact_id.clone(),
                first_name: first,
                last_name: last,
                individual_id: Some(individual_id.clone()),
                email: format!("c{:05}-{}@example.com", account_index, contact_index),
                ..Default::default()
            });
            phones.push(PhoneContactPoint {
                id: format!("P{:05}-{}", account_index, contact_index),
                parent_id: individual_id.clone(),
                telephone_number: format!("02 {:05}{}", account_index, contact_index),
            });
            emails.push(EmailContactPoint {
                id: format!("E{:05}-{}", account_index, contact_index),
                parent_id: individual_id,
                email_address: format!("c{:05}-{}@example.com", account_index, contact_index),
                point_type: String::new(),
            });

            let roles = if defective && contact_index == 1 {
                bare_relations += 1;
                String::new()
            } else {
                role.to_string()
            };
            relations.push(AccountContactRelation {
                id: format!("R{:05}-{}", account_index, contact_index),
                account_id: account_id.clone(),
                contact_id,
                roles,
            });
        }

        if defective {
            // A third contact sharing name and role with contact 0 completes
            // the duplicate group.
            let contact_id = format!("C{:05}-dup", account_index);
            contacts.push(Contact {
                id: contact_id.clone(),
                first_name: "Jo".to_string(),
                last_name: format!("Doe{:05}", account_index),
                email: format!("dup{:05}@example.com", account_index),
                ..Default::default()
            });
            relations.push(AccountContactRelation {
                id: format!("R{:05}-dup", account_index),
                account_id: account_id.clone(),
                contact_id,
                roles: role.to_string(),
            });
            duplicate_groups += 1;
        }
    }

    GeneratedSnapshot {
        payload: ImportPayload {
            accounts: Some(accounts),
            contacts: Some(contacts),
            individuals: Some(individuals),
            account_contact_relations: Some(relations),
            contact_point_phones: Some(phones),
            contact_point_emails: Some(emails),
        },
        duplicate_groups,
        bare_relations,
    }
}
