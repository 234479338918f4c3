//! # CSV Import Adapter
//!
//! Parses per-entity CSV extracts into typed records and feeds them to the
//! store as one snapshot. Directory imports are all-or-nothing: every file is
//! parsed before the first table is replaced, so a bad or missing file leaves
//! the store at its previous consistent snapshot.

use crate::model::{
    Account, AccountContactRelation, Contact, EmailContactPoint, EntityKind, ImportPayload,
    Individual, PhoneContactPoint,
};
use crate::store::RecordStore;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Import-time error. Both kinds abort the whole import call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    MissingSourceFile { path: PathBuf },
    Malformed { kind: EntityKind, message: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::MissingSourceFile { path } => {
                write!(f, "missing source file: {}", path.display())
            }
            ImportError::Malformed { kind, message } => {
                write!(f, "malformed {} extract: {}", kind, message)
            }
        }
    }
}

impl std::error::Error for ImportError {}

/// Per-kind counts of what an import installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub counts: Vec<(EntityKind, usize)>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// Declared columns per kind. Extra columns in the extract are ignored; the
/// contact phone column may be named either `Phone` or `HomePhone`.
fn required_columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Accounts => &["Id", "Name"],
        EntityKind::Contacts => &[
            "Id",
            "FirstName",
            "LastName",
            "IndividualId",
            "FiscalCode",
            "VATNumber",
            "MobilePhone",
            "Email",
        ],
        EntityKind::Individuals => &["Id", "FirstName", "LastName"],
        EntityKind::AccountContactRelations => &["Id", "AccountId", "ContactId", "Roles"],
        EntityKind::ContactPointPhones => &["Id", "ParentId", "TelephoneNumber"],
        EntityKind::ContactPointEmails => &["Id", "ParentId", "EmailAddress"],
    }
}

/// One parsed CSV table with by-name column access.
struct CsvTable {
    kind: EntityKind,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl CsvTable {
    fn parse(kind: EntityKind, text: &str) -> Result<Self, ImportError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|err| ImportError::Malformed {
                kind,
                message: format!("missing header row: {}", err),
            })?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if headers.is_empty() {
            return Err(ImportError::Malformed {
                kind,
                message: "missing header row".to_string(),
            });
        }

        let missing: Vec<&str> = required_columns(kind)
            .iter()
            .filter(|column| !headers.iter().any(|header| header == *column))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::Malformed {
                kind,
                message: format!("missing expected columns: {}", missing.join(", ")),
            });
        }
        if kind == EntityKind::Contacts
            && !headers.iter().any(|h| h == "Phone" || h == "HomePhone")
        {
            return Err(ImportError::Malformed {
                kind,
                message: "missing expected columns: Phone (or HomePhone)".to_string(),
            });
        }

        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|err| ImportError::Malformed {
                kind,
                message: err.to_string(),
            })?;
            rows.push(row);
        }

        Ok(Self {
            kind,
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    fn cell(&self, row: &csv::StringRecord, name: &str) -> String {
        self.column(name)
            .and_then(|index| row.get(index))
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

/// Parse one kind's CSV text into typed records.
pub fn read_csv_str(kind: EntityKind, text: &str) -> Result<ImportPayload, ImportError> {
    let table = CsvTable::parse(kind, text)?;
    let mut payload = ImportPayload::default();

    match table.kind {
        EntityKind::Accounts => {
            let records = table
                .rows
                .iter()
                .map(|row| Account {
                    id: table.cell(row, "Id"),
                    name: table.cell(row, "Name"),
                    customer_marking: table.cell(row, "CustomerMarking"),
                })
                .collect();
            payload.accounts = Some(records);
        }
        EntityKind::Contacts => {
            let records = table
                .rows
                .iter()
                .map(|row| {
                    let individual_id = table.cell(row, "IndividualId");
                    let phone = {
                        let direct = table.cell(row, "Phone");
                        if direct.is_empty() {
                            table.cell(row, "HomePhone")
                        } else {
                            direct
                        }
                    };
                    Contact {
                        id: table.cell(row, "Id"),
                        first_name: table.cell(row, "FirstName"),
                        last_name: table.cell(row, "LastName"),
                        individual_id: if individual_id.is_empty() {
                            None
                        } else {
                            Some(individual_id)
                        },
                        fiscal_code: table.cell(row, "FiscalCode"),
                        vat_number: table.cell(row, "VATNumber"),
                        mobile_phone: table.cell(row, "MobilePhone"),
                        phone,
                        email: table.cell(row, "Email"),
                    }
                })
                .collect();
            payload.contacts = Some(records);
        }
        EntityKind::Individuals => {
            let records = table
                .rows
                .iter()
                .map(|row| Individual {
                    id: table.cell(row, "Id"),
                    first_name: table.cell(row, "FirstName"),
                    last_name: table.cell(row, "LastName"),
                })
                .collect();
            payload.individuals = Some(records);
        }
        EntityKind::AccountContactRelations => {
            let records = table
                .rows
                .iter()
                .map(|row| AccountContactRelation {
                    id: table.cell(row, "Id"),
                    account_id: table.cell(row, "AccountId"),
                    contact_id: table.cell(row, "ContactId"),
                    roles: table.cell(row, "Roles"),
                })
                .collect();
            payload.account_contact_relations = Some(records);
        }
        EntityKind::ContactPointPhones => {
            let records = table
                .rows
                .iter()
                .map(|row| PhoneContactPoint {
                    id: table.cell(row, "Id"),
                    parent_id: table.cell(row, "ParentId"),
                    telephone_number: table.cell(row, "TelephoneNumber"),
                })
                .collect();
            payload.contact_point_phones = Some(records);
        }
        EntityKind::ContactPointEmails => {
            let records = table
                .rows
                .iter()
                .map(|row| EmailContactPoint {
                    id: table.cell(row, "Id"),
                    parent_id: table.cell(row, "ParentId"),
                    email_address: table.cell(row, "EmailAddress"),
                    point_type: table.cell(row, "Type"),
                })
                .collect();
            payload.contact_point_emails = Some(records);
        }
    }

    Ok(payload)
}

fn merge(into: &mut ImportPayload, from: ImportPayload) {
    if from.accounts.is_some() {
        into.accounts = from.accounts;
    }
    if from.contacts.is_some() {
        into.contacts = from.contacts;
    }
    if from.individuals.is_some() {
        into.individuals = from.individuals;
    }
    if from.account_contact_relations.is_some() {
        into.account_contact_relations = from.account_contact_relations;
    }
    if from.contact_point_phones.is_some() {
        into.contact_point_phones = from.contact_point_phones;
    }
    if from.contact_point_emails.is_some() {
        into.contact_point_emails = from.contact_point_emails;
    }
}

/// Import a directory holding one `<kind>.csv` per entity kind. Every file is
/// required and fully parsed before any table is replaced.
pub fn import_dir(store: &mut RecordStore, dir: impl AsRef<Path>) -> Result<ImportSummary, ImportError> {
    let dir = dir.as_ref();

    let mut texts = Vec::new();
    for kind in EntityKind::ALL {
        let path = dir.join(format!("{}.csv", kind));
        if !path.is_file() {
            return Err(ImportError::MissingSourceFile { path });
        }
        let text = std::fs::read_to_string(&path).map_err(|err| ImportError::Malformed {
            kind,
            message: format!("{}: {}", path.display(), err),
        })?;
        texts.push((kind, text));
    }

    let mut payload = ImportPayload::default();
    for (kind, text) in texts {
        merge(&mut payload, read_csv_str(kind, &text)?);
    }

    Ok(install(store, payload))
}

/// Replace the tables present in an already-parsed payload.
pub fn import_payload(store: &mut RecordStore, payload: ImportPayload) -> ImportSummary {
    install(store, payload)
}

fn install(store: &mut RecordStore, payload: ImportPayload) -> ImportSummary {
    let kinds: Vec<EntityKind> = [
        payload.accounts.as_ref().map(|_| EntityKind::Accounts),
        payload.contacts.as_ref().map(|_| EntityKind::Contacts),
        payload.individuals.as_ref().map(|_| EntityKind::Individuals),
        payload
            .account_contact_relations
            .as_ref()
            .map(|_| EntityKind::AccountContactRelations),
        payload
            .contact_point_phones
            .as_ref()
            .map(|_| EntityKind::ContactPointPhones),
        payload
            .contact_point_emails
            .as_ref()
            .map(|_| EntityKind::ContactPointEmails),
    ]
    .into_iter()
    .flatten()
    .collect();

    store.bulk_replace(payload);

    let summary = ImportSummary {
        counts: kinds
            .into_iter()
            .map(|kind| (kind, store.count_for(kind)))
            .collect(),
    };
    info!(records = summary.total(), "import installed");
    summary
}
