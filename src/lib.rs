//! # Relsentry
//!
//! A CRM relationship data-quality engine.
//!
//! Relsentry ingests tabular CRM snapshots (accounts, contacts, individuals,
//! account-contact relations, contact points), keeps a normalized in-memory
//! relational view with derived indices, and evaluates a configurable set of
//! data-quality rules over that view, producing deduplicated findings and
//! summary statistics.

pub mod config;
pub mod definitions;
pub mod engine;
pub mod export;
pub mod import;
pub mod model;
pub mod rules;
pub mod store;
pub mod summary;

// Re-export main types for convenience
pub use config::{ConfigOverrides, SentryConfig};
pub use definitions::{
    default_definitions, Channel, DefinitionError, RuleDefinition, RuleDefinitionStore, RuleLogic,
};
pub use engine::{AlertEngine, CancelToken, RunOptions, RunReport};
pub use import::{ImportError, ImportSummary};
pub use model::{
    Account, AccountContactRelation, Contact, EmailContactPoint, EntityBatch, EntityKind,
    ImportPayload, Individual, PhoneContactPoint, UnknownEntityKind,
};
pub use rules::Finding;
pub use store::{RecordStore, RelatedContact};
pub use summary::AlertStatistics;

/// Main API: owns one snapshot store and one definition store.
///
/// Imports take `&mut self` and runs take `&self`, so a replace can never
/// race a pass over the same instance.
pub struct Relsentry {
    store: RecordStore,
    definitions: RuleDefinitionStore,
    config: SentryConfig,
}

impl Relsentry {
    /// Create an instance with the shipped default rule definitions, without
    /// touching the filesystem.
    pub fn new(config: SentryConfig) -> Self {
        Self {
            store: RecordStore::new(),
            definitions: RuleDefinitionStore::with_defaults(),
            config,
        }
    }

    /// Create an instance with a file-backed definition store at the
    /// configured path. A missing or empty file is seeded with the defaults.
    pub fn open(config: SentryConfig) -> anyhow::Result<Self> {
        let mut definitions = RuleDefinitionStore::open(&config.definitions_path)?;
        if definitions.is_empty() {
            definitions.replace_all(default_definitions())?;
        }
        Ok(Self {
            store: RecordStore::new(),
            definitions,
            config,
        })
    }

    /// Assemble an instance from already-built parts.
    pub fn with_parts(
        store: RecordStore,
        definitions: RuleDefinitionStore,
        config: SentryConfig,
    ) -> Self {
        Self {
            store,
            definitions,
            config,
        }
    }

    /// Replace the tables present in the payload.
    pub fn ingest(&mut self, payload: ImportPayload) -> ImportSummary {
        import::import_payload(&mut self.store, payload)
    }

    /// Import a directory of per-entity CSV extracts; all-or-nothing.
    pub fn import_dir(&mut self, dir: impl AsRef<std::path::Path>) -> Result<ImportSummary, ImportError> {
        import::import_dir(&mut self.store, dir)
    }

    /// Replace one table from CSV text, with the kind named the way upload
    /// adapters address it (e.g. "accounts"). Unknown kinds are rejected
    /// before anything is parsed or replaced.
    pub fn ingest_csv(&mut self, kind: &str, text: &str) -> anyhow::Result<ImportSummary> {
        let kind: EntityKind = kind.parse()?;
        let payload = import::read_csv_str(kind, text)?;
        Ok(self.ingest(payload))
    }

    /// Evaluate every enabled rule over the current snapshot.
    pub fn run_alerts(&self) -> RunReport {
        AlertEngine::new(&self.store, &self.definitions).run()
    }

    /// Evaluate with an account subset and/or a cancellation token.
    pub fn run_alerts_with(&self, options: RunOptions) -> RunReport {
        AlertEngine::new(&self.store, &self.definitions).run_with(options)
    }

    /// Aggregate a run's findings against the current snapshot size.
    pub fn statistics(&self, findings: &[Finding]) -> AlertStatistics {
        AlertStatistics::from_findings_with_top(
            findings,
            self.store.account_count(),
            self.config.report.top_accounts,
        )
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn definitions(&self) -> &RuleDefinitionStore {
        &self.definitions
    }

    pub fn definitions_mut(&mut self) -> &mut RuleDefinitionStore {
        &mut self.definitions
    }

    pub fn config(&self) -> &SentryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_runs_end_to_end() {
        let mut sentry = Relsentry::new(SentryConfig::default());
        sentry.ingest(ImportPayload {
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
            ]),
            ..Default::default()
        });

        let report = sentry.run_alerts();
        assert!(report.rules_evaluated > 0);
        assert!(report
            .findings
            .iter()
            .any(|finding| finding.definition_id == "duplicate-role-same-name"));

        let statistics = sentry.statistics(&report.findings);
        assert_eq!(statistics.totals.total_accounts, 1);
        assert!(statistics.totals.total_findings >= 1);
    }

    #[test]
    fn ingest_csv_rejects_unknown_kinds() {
        let mut sentry = Relsentry::new(SentryConfig::default());
        let err = sentry.ingest_csv("invoices", "Id\nX1\n").unwrap_err();
        assert!(err.to_string().contains("unknown entity kind"));

        let summary = sentry
            .ingest_csv("accounts", "Id,Name\nA1,Acme\n")
            .unwrap();
        assert_eq!(summary.total(), 1);
        assert_eq!(sentry.store().account_name("A1"), "Acme");
    }
}
