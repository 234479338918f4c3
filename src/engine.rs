//! # Alert Engine
//!
//! Orchestrates one evaluation pass: resets dedupe state, walks the enabled
//! rule definitions, dispatches each to its catalog handler and merges the
//! findings. One rule's failure never aborts the pass; it becomes a single
//! synthetic "Rule error" finding and evaluation continues.

use crate::definitions::{RuleDefinition, RuleDefinitionStore, RuleLogic};
use crate::rules::{self, DedupeTracker, Finding};
use crate::store::RecordStore;
use hashbrown::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cooperative cancellation flag, checked between rule dispatches. The
/// default behavior without a token is unchanged: run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Options for one engine pass.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restrict the pass to these accounts (and their related contacts).
    pub account_ids: Option<Vec<String>>,
    /// Cooperative cancellation; `None` means run to completion.
    pub cancel: Option<CancelToken>,
}

/// Outcome of one engine pass.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub findings: Vec<Finding>,
    pub rules_evaluated: usize,
    pub rules_failed: usize,
    pub cancelled: bool,
}

/// Restricts findings to a selected account subset. Contact-level findings
/// (no account id) pass when the contact relates to a selected account.
struct AccountFilter {
    accounts: HashSet<String>,
    contacts: HashSet<String>,
}

impl AccountFilter {
    fn build(store: &RecordStore, account_ids: &[String]) -> Self {
        let mut accounts = HashSet::new();
        let mut contacts = HashSet::new();
        for account_id in account_ids {
            accounts.insert(account_id.clone());
            for related in store.contacts_for_account(account_id) {
                contacts.insert(related.contact.id.clone());
            }
        }
        Self { accounts, contacts }
    }

    fn allows(&self, finding: &Finding) -> bool {
        if !finding.account_id.is_empty() {
            return self.accounts.contains(&finding.account_id);
        }
        finding
            .contact_ids()
            .iter()
            .any(|id| self.contacts.contains(*id))
    }
}

/// Runs enabled rule definitions against a record store snapshot.
pub struct AlertEngine<'a> {
    store: &'a RecordStore,
    definitions: &'a RuleDefinitionStore,
}

impl<'a> AlertEngine<'a> {
    pub fn new(store: &'a RecordStore, definitions: &'a RuleDefinitionStore) -> Self {
        Self { store, definitions }
    }

    /// Evaluate every enabled definition over the full snapshot.
    pub fn run(&self) -> RunReport {
        self.run_with(RunOptions::default())
    }

    /// Evaluate with an account subset and/or a cancellation token.
    pub fn run_with(&self, options: RunOptions) -> RunReport {
        let mut tracker = DedupeTracker::new();
        tracker.reset();

        let filter = options
            .account_ids
            .as_deref()
            .map(|ids| AccountFilter::build(self.store, ids));
        let mut report = RunReport::default();

        for definition in self.definitions.enabled_definitions() {
            if let Some(cancel) = &options.cancel {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
            }

            match self.dispatch(definition, &mut tracker) {
                Ok(mut findings) => {
                    if let Some(filter) = &filter {
                        findings.retain(|finding| filter.allows(finding));
                    }
                    for finding in &mut findings {
                        stamp(finding, definition);
                    }
                    debug!(
                        rule = %definition.id,
                        findings = findings.len(),
                        "rule evaluated"
                    );
                    report.rules_evaluated += 1;
                    report.findings.extend(findings);
                }
                Err(err) => {
                    warn!(rule = %definition.id, error = %err, "rule evaluation failed");
                    report.rules_failed += 1;
                    report.findings.push(error_finding(definition, &err));
                }
            }
        }

        report
    }

    fn dispatch(
        &self,
        definition: &RuleDefinition,
        tracker: &mut DedupeTracker,
    ) -> anyhow::Result<Vec<Finding>> {
        definition.logic.validate()?;
        let findings = match &definition.logic {
            RuleLogic::DuplicateRoleSameName { min_count } => {
                rules::duplicate_role_same_name(self.store, *min_count, tracker)
            }
            RuleLogic::MissingRole => rules::missing_role(self.store, tracker),
            RuleLogic::SameNameDifferentRole { min_unique_roles } => {
                rules::same_name_different_role(self.store, *min_unique_roles, tracker)
            }
            RuleLogic::DuplicateContactPoint { channel, min_count } => {
                rules::duplicate_contact_point(self.store, *channel, *min_count, tracker)
            }
            RuleLogic::DuplicateIdentifier => rules::duplicate_identifier(self.store, tracker),
            RuleLogic::ContactPointConsistency { channel } => {
                rules::contact_point_consistency(self.store, *channel, tracker)
            }
            RuleLogic::MissingContactInfo => rules::missing_contact_info(self.store, tracker),
            RuleLogic::SolReferentEmail { role, email_type } => {
                rules::sol_referent_email(self.store, role, email_type, tracker)
            }
        };
        Ok(findings)
    }
}

/// Stamp a finding with its definition identity and apply the optional
/// message template.
fn stamp(finding: &mut Finding, definition: &RuleDefinition) {
    finding.alert_type = definition.label.clone();
    finding.definition_id = definition.id.clone();
    if let Some(template) = &definition.message_template {
        let rendered = render_template(template, finding);
        finding.message = rendered;
    }
}

/// Fill `{placeholder}` slots from the finding's context map and its
/// standard fields. Unknown placeholders are left as-is.
fn render_template(template: &str, finding: &Finding) -> String {
    let mut rendered = template.to_string();
    for (key, value) in &finding.context {
        rendered = rendered.replace(&format!("{{{}}}", key), value);
    }
    for (key, value) in [
        ("account_id", finding.account_id.as_str()),
        ("account_name", finding.account_name.as_str()),
        ("contact_id", finding.contact_id.as_str()),
        ("contact_name", finding.contact_name.as_str()),
        ("details", finding.details.as_str()),
    ] {
        rendered = rendered.replace(&format!("{{{}}}", key), value);
    }
    rendered
}

/// A rule failure collapses into one finding so the rest of the pass can
/// still report.
fn error_finding(definition: &RuleDefinition, err: &anyhow::Error) -> Finding {
    let mut finding = Finding {
        alert_type: "Rule error".to_string(),
        definition_id: definition.id.clone(),
        details: format!("Rule '{}' failed to evaluate.", definition.label),
        message: format!("Rule '{}' failed: {}", definition.label, err),
        ..Default::default()
    };
    finding
        .context
        .insert("rule_kind".to_string(), definition.logic.kind().to_string());
    finding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{RuleDefinition, RuleLogic};
    use crate::model::{Account, AccountContactRelation, Contact, ImportPayload};

    fn store_with_duplicates() -> RecordStore {
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
                    email: "jo@acme.example".to_string(),
                    ..Default::default()
                },
                Contact {
                    id: "C2".to_string(),
                    first_name: "Jo".to_string(),
                    last_name: "Doe".to_string(),
                    email: "jo@acme.example".to_string(),
                    ..Default::default()
                },
            ]),
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
                    roles: "Billing".to_string(),
                },
                AccountContactRelation {
                    id: "R3".to_string(),
                    account_id: "A1".to_string(),
                    contact_id: "C2".to_string(),
                    roles: String::new(),
                },
            ]),
            ..Default::default()
        });
        store
    }

    fn definitions() -> RuleDefinitionStore {
        let mut store = RuleDefinitionStore::in_memory();
        store
            .upsert_definition(RuleDefinition::new(
                "dup-role",
                "Duplicate role",
                RuleLogic::DuplicateRoleSameName { min_count: 2 },
            ))
            .unwrap();
        store
            .upsert_definition(RuleDefinition::new(
                "no-role",
                "Missing role",
                RuleLogic::MissingRole,
            ))
            .unwrap();
        store
    }

    #[test]
    fn run_merges_findings_from_all_enabled_rules() {
        let store = store_with_duplicates();
        let definitions = definitions();
        let report = AlertEngine::new(&store, &definitions).run();

        assert_eq!(report.rules_evaluated, 2);
        assert_eq!(report.rules_failed, 0);
        assert!(!report.cancelled);
        assert_eq!(report.findings.len(), 2);
        assert!(report
            .findings
            .iter()
            .any(|f| f.alert_type == "Duplicate role" && f.definition_id == "dup-role"));
        assert!(report
            .findings
            .iter()
            .any(|f| f.alert_type == "Missing role" && f.definition_id == "no-role"));
    }

    #[test]
    fn disabled_definitions_are_skipped() {
        let store = store_with_duplicates();
        let mut definitions = definitions();
        let mut disabled = definitions.get_definition("no-role").unwrap().clone();
        disabled.enabled = false;
        definitions.upsert_definition(disabled).unwrap();

        let report = AlertEngine::new(&store, &definitions).run();
        assert_eq!(report.rules_evaluated, 1);
        assert!(report
            .findings
            .iter()
            .all(|f| f.definition_id == "dup-role"));
    }

    #[test]
    fn consecutive_runs_yield_identical_content() {
        let store = store_with_duplicates();
        let definitions = definitions();
        let engine = AlertEngine::new(&store, &definitions);

        let first = engine.run();
        let second = engine.run();
        assert_eq!(first.findings, second.findings);
        assert_eq!(first.rules_evaluated, second.rules_evaluated);
    }

    #[test]
    fn message_template_overrides_the_default_message() {
        let store = store_with_duplicates();
        let mut definitions = RuleDefinitionStore::in_memory();
        let mut definition = RuleDefinition::new(
            "dup-role",
            "Duplicate role",
            RuleLogic::DuplicateRoleSameName { min_count: 2 },
        );
        definition.message_template =
            Some("{contact_count}x '{role}' on {account_name}".to_string());
        definitions.upsert_definition(definition).unwrap();

        let report = AlertEngine::new(&store, &definitions).run();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].message, "2x 'billing' on Acme");
    }

    #[test]
    fn account_filter_restricts_findings() {
        let store = store_with_duplicates();
        let definitions = definitions();
        let engine = AlertEngine::new(&store, &definitions);

        let report = engine.run_with(RunOptions {
            account_ids: Some(vec!["A-other".to_string()]),
            cancel: None,
        });
        assert!(report.findings.is_empty());

        let report = engine.run_with(RunOptions {
            account_ids: Some(vec!["A1".to_string()]),
            cancel: None,
        });
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn cancelled_token_stops_before_the_first_rule() {
        let store = store_with_duplicates();
        let definitions = definitions();
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = AlertEngine::new(&store, &definitions).run_with(RunOptions {
            account_ids: None,
            cancel: Some(cancel),
        });
        assert!(report.cancelled);
        assert_eq!(report.rules_evaluated, 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn a_failing_rule_becomes_one_error_finding() {
        let store = store_with_duplicates();
        // File-loaded definitions skip write-time validation, so bad
        // parameters reach the engine and must be isolated there.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.json");
        std::fs::write(
            &path,
            r#"[
                {
                    "id": "bad",
                    "label": "Broken rule",
                    "enabled": true,
                    "logic": {"type": "duplicate_role_same_name", "parameters": {"min_count": 0}}
                },
                {
                    "id": "no-role",
                    "label": "Missing role",
                    "enabled": true,
                    "logic": {"type": "missing_role"}
                }
            ]"#,
        )
        .unwrap();
        let definitions = RuleDefinitionStore::open(&path).unwrap();

        let report = AlertEngine::new(&store, &definitions).run();
        assert_eq!(report.rules_failed, 1);
        assert_eq!(report.rules_evaluated, 1);

        let errors: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.alert_type == "Rule error")
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].definition_id, "bad");
        assert!(errors[0].message.contains("min_count"));
        // The healthy rule still reported.
        assert!(report
            .findings
            .iter()
            .any(|f| f.definition_id == "no-role"));
    }
}
