//! # Rule Definitions
//!
//! Durable configuration of which data-quality rules run and with what
//! parameters, independent of the fixed catalog implementations. Rule logic is
//! a closed tagged union: unknown types are rejected at write time, never
//! interpreted or executed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Contact-point channel a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Phone,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Phone => "phone",
            Channel::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_min_count() -> u32 {
    2
}

fn default_sol_role() -> String {
    "Referente SOL-APP".to_string()
}

fn default_sol_email_type() -> String {
    "E-mail SOL".to_string()
}

fn default_enabled() -> bool {
    true
}

/// The closed set of rule algorithms, with their typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum RuleLogic {
    /// Contacts on one account sharing name and a non-empty role.
    DuplicateRoleSameName {
        #[serde(default = "default_min_count")]
        min_count: u32,
    },
    /// Relations whose parsed role list is empty.
    MissingRole,
    /// One name on one account bound under several distinct roles.
    SameNameDifferentRole {
        #[serde(default = "default_min_count")]
        min_unique_roles: u32,
    },
    /// Repeated values among one individual's contact points.
    DuplicateContactPoint {
        channel: Channel,
        #[serde(default = "default_min_count")]
        min_count: u32,
    },
    /// Contacts in one account sharing a fiscal code, VAT number or email.
    DuplicateIdentifier,
    /// Contact record values disagreeing with same-channel contact points.
    ContactPointConsistency { channel: Channel },
    /// Contacts with no phone, mobile or email on the record.
    MissingContactInfo,
    /// Holders of the referent role lacking a typed email contact point.
    SolReferentEmail {
        #[serde(default = "default_sol_role")]
        role: String,
        #[serde(default = "default_sol_email_type")]
        email_type: String,
    },
}

impl RuleLogic {
    /// Stable identifier of the algorithm, matching the serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleLogic::DuplicateRoleSameName { .. } => "duplicate_role_same_name",
            RuleLogic::MissingRole => "missing_role",
            RuleLogic::SameNameDifferentRole { .. } => "same_name_different_role",
            RuleLogic::DuplicateContactPoint { .. } => "duplicate_contact_point",
            RuleLogic::DuplicateIdentifier => "duplicate_identifier",
            RuleLogic::ContactPointConsistency { .. } => "contact_point_consistency",
            RuleLogic::MissingContactInfo => "missing_contact_info",
            RuleLogic::SolReferentEmail { .. } => "sol_referent_email",
        }
    }

    /// Parameter sanity, checked at definition-write time and again by the
    /// engine before dispatch.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        match self {
            RuleLogic::DuplicateRoleSameName { min_count } => {
                if *min_count < 2 {
                    return Err(DefinitionError::InvalidParameters {
                        kind: self.kind(),
                        reason: "min_count must be at least 2".to_string(),
                    });
                }
            }
            RuleLogic::SameNameDifferentRole { min_unique_roles } => {
                if *min_unique_roles < 2 {
                    return Err(DefinitionError::InvalidParameters {
                        kind: self.kind(),
                        reason: "min_unique_roles must be at least 2".to_string(),
                    });
                }
            }
            RuleLogic::DuplicateContactPoint { min_count, .. } => {
                if *min_count < 2 {
                    return Err(DefinitionError::InvalidParameters {
                        kind: self.kind(),
                        reason: "min_count must be at least 2".to_string(),
                    });
                }
            }
            RuleLogic::SolReferentEmail { role, email_type } => {
                if role.trim().is_empty() {
                    return Err(DefinitionError::InvalidParameters {
                        kind: self.kind(),
                        reason: "role must not be blank".to_string(),
                    });
                }
                if email_type.trim().is_empty() {
                    return Err(DefinitionError::InvalidParameters {
                        kind: self.kind(),
                        reason: "email_type must not be blank".to_string(),
                    });
                }
            }
            RuleLogic::MissingRole
            | RuleLogic::DuplicateIdentifier
            | RuleLogic::ContactPointConsistency { .. }
            | RuleLogic::MissingContactInfo => {}
        }
        Ok(())
    }
}

/// One configured rule: identity, presentation, switch and logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Optional message override; `{field}` placeholders are filled from the
    /// finding's context map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
    pub logic: RuleLogic,
}

impl RuleDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, logic: RuleLogic) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            enabled: true,
            message_template: None,
            logic,
        }
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::MissingId);
        }
        if self.label.trim().is_empty() {
            return Err(DefinitionError::MissingLabel {
                id: self.id.clone(),
            });
        }
        self.logic.validate()
    }
}

/// Definition-store error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    MissingId,
    MissingLabel { id: String },
    InvalidParameters { kind: &'static str, reason: String },
    NotFound { id: String },
    Storage { message: String },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::MissingId => write!(f, "rule definition requires a non-empty id"),
            DefinitionError::MissingLabel { id } => {
                write!(f, "rule definition '{}' requires a non-empty label", id)
            }
            DefinitionError::InvalidParameters { kind, reason } => {
                write!(f, "invalid parameters for rule '{}': {}", kind, reason)
            }
            DefinitionError::NotFound { id } => {
                write!(f, "rule definition '{}' was not found", id)
            }
            DefinitionError::Storage { message } => {
                write!(f, "definition storage error: {}", message)
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

/// In-memory list of rule definitions with optional JSON file persistence:
/// load-all on open, save-all after every mutation.
#[derive(Debug, Clone, Default)]
pub struct RuleDefinitionStore {
    definitions: Vec<RuleDefinition>,
    path: Option<PathBuf>,
}

impl RuleDefinitionStore {
    /// Create an empty, unpersisted store.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create an unpersisted store preloaded with the shipped defaults.
    pub fn with_defaults() -> Self {
        Self {
            definitions: default_definitions(),
            path: None,
        }
    }

    /// Open a file-backed store. A missing or empty file yields an empty
    /// store; a present file must parse as a JSON list of definitions.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let mut store = Self {
            definitions: Vec::new(),
            path: Some(path.to_path_buf()),
        };
        if !path.exists() {
            return Ok(store);
        }
        let content = std::fs::read_to_string(path).map_err(|err| DefinitionError::Storage {
            message: err.to_string(),
        })?;
        if content.trim().is_empty() {
            return Ok(store);
        }
        store.definitions =
            serde_json::from_str(&content).map_err(|err| DefinitionError::Storage {
                message: format!("failed to parse rule definitions: {}", err),
            })?;
        Ok(store)
    }

    fn save(&self) -> Result<(), DefinitionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| DefinitionError::Storage {
                message: err.to_string(),
            })?;
        }
        let mut payload =
            serde_json::to_string_pretty(&self.definitions).map_err(|err| {
                DefinitionError::Storage {
                    message: err.to_string(),
                }
            })?;
        payload.push('\n');
        std::fs::write(path, payload).map_err(|err| DefinitionError::Storage {
            message: err.to_string(),
        })
    }

    pub fn list_definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    /// Enabled definitions, in stored order.
    pub fn enabled_definitions(&self) -> Vec<&RuleDefinition> {
        self.definitions.iter().filter(|def| def.enabled).collect()
    }

    pub fn get_definition(&self, id: &str) -> Option<&RuleDefinition> {
        self.definitions.iter().find(|def| def.id == id)
    }

    /// Insert or replace by id after validating.
    pub fn upsert_definition(
        &mut self,
        definition: RuleDefinition,
    ) -> Result<(), DefinitionError> {
        definition.validate()?;
        match self
            .definitions
            .iter_mut()
            .find(|existing| existing.id == definition.id)
        {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
        self.save()
    }

    /// Remove by id; absent ids are an error.
    pub fn delete_definition(&mut self, id: &str) -> Result<(), DefinitionError> {
        let before = self.definitions.len();
        self.definitions.retain(|def| def.id != id);
        if self.definitions.len() == before {
            return Err(DefinitionError::NotFound { id: id.to_string() });
        }
        self.save()
    }

    /// Swap in a whole new definition list after validating every entry.
    pub fn replace_all(
        &mut self,
        definitions: Vec<RuleDefinition>,
    ) -> Result<(), DefinitionError> {
        for definition in &definitions {
            definition.validate()?;
        }
        self.definitions = definitions;
        self.save()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// One enabled definition per catalog rule, mirroring what a fresh deployment
/// starts from.
pub fn default_definitions() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            description: "Flags accounts with multiple contacts sharing both name and role."
                .to_string(),
            ..RuleDefinition::new(
                "duplicate-role-same-name",
                "Duplicate role for contact name",
                RuleLogic::DuplicateRoleSameName { min_count: 2 },
            )
        },
        RuleDefinition {
            description: "Detects account-contact relations that do not specify a role."
                .to_string(),
            ..RuleDefinition::new("missing-role", "Missing contact role", RuleLogic::MissingRole)
        },
        RuleDefinition {
            description: "Highlights one contact name listed with several roles on one account."
                .to_string(),
            ..RuleDefinition::new(
                "same-name-different-role",
                "Same contact name with different roles",
                RuleLogic::SameNameDifferentRole {
                    min_unique_roles: 2,
                },
            )
        },
        RuleDefinition {
            description: "Finds duplicate phone numbers stored for a contact.".to_string(),
            ..RuleDefinition::new(
                "duplicate-phone",
                "Duplicate phone contact point",
                RuleLogic::DuplicateContactPoint {
                    channel: Channel::Phone,
                    min_count: 2,
                },
            )
        },
        RuleDefinition {
            description: "Finds duplicate email addresses stored for a contact.".to_string(),
            ..RuleDefinition::new(
                "duplicate-email",
                "Duplicate email contact point",
                RuleLogic::DuplicateContactPoint {
                    channel: Channel::Email,
                    min_count: 2,
                },
            )
        },
        RuleDefinition {
            description: "Contacts in one account sharing a fiscal code, VAT number or email."
                .to_string(),
            ..RuleDefinition::new(
                "duplicate-identifier",
                "Duplicate contact identifiers",
                RuleLogic::DuplicateIdentifier,
            )
        },
        RuleDefinition {
            description: "Phone numbers on the contact record disagreeing with its contact points."
                .to_string(),
            ..RuleDefinition::new(
                "phone-consistency",
                "Inconsistent phone data",
                RuleLogic::ContactPointConsistency {
                    channel: Channel::Phone,
                },
            )
        },
        RuleDefinition {
            description: "Contacts with no phone, mobile or email available.".to_string(),
            ..RuleDefinition::new(
                "missing-contact-info",
                "Contact without contact info",
                RuleLogic::MissingContactInfo,
            )
        },
        RuleDefinition {
            description: "SOL referents lacking a dedicated SOL email contact point.".to_string(),
            ..RuleDefinition::new(
                "sol-referent-email",
                "SOL referent without SOL email",
                RuleLogic::SolReferentEmail {
                    role: default_sol_role(),
                    email_type: default_sol_email_type(),
                },
            )
        },
    ]
}
