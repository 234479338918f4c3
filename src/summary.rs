//! # Result Aggregation
//!
//! Turns the flat finding list of one run into a statistics view: totals,
//! per-rule-type breakdowns and a top-N account ranking.

use crate::rules::Finding;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_TOP_ACCOUNTS: usize = 5;

/// Headline counters over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_findings: usize,
    /// Accounts in the evaluated snapshot, not just those with findings.
    pub total_accounts: usize,
    pub accounts_with_findings: usize,
    pub unique_contacts: usize,
    pub unique_rule_types: usize,
    pub findings_without_contact: usize,
    /// Findings divided by accounts-with-findings; 0.0 when no account has
    /// findings.
    pub average_findings_per_account: f64,
}

/// Counters for one alert type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub alert_type: String,
    pub findings: usize,
    pub unique_accounts: usize,
    pub unique_contacts: usize,
    pub without_contact: usize,
}

/// One ranked account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRank {
    pub account_id: String,
    pub account_name: String,
    pub findings: usize,
}

/// The statistics view exported to report adapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub totals: Totals,
    pub per_type: Vec<TypeBreakdown>,
    pub top_accounts: Vec<AccountRank>,
}

impl AlertStatistics {
    /// Aggregate one run. `total_accounts` is the snapshot's account count,
    /// supplied by the caller since findings alone cannot know it.
    pub fn from_findings(findings: &[Finding], total_accounts: usize) -> Self {
        Self::from_findings_with_top(findings, total_accounts, DEFAULT_TOP_ACCOUNTS)
    }

    /// Aggregate with an explicit top-N limit.
    pub fn from_findings_with_top(
        findings: &[Finding],
        total_accounts: usize,
        top_limit: usize,
    ) -> Self {
        let mut accounts: BTreeSet<&str> = BTreeSet::new();
        let mut contacts: BTreeSet<&str> = BTreeSet::new();
        let mut without_contact = 0usize;
        let mut account_counts: HashMap<&str, (usize, &str)> = HashMap::new();
        let mut per_type: HashMap<&str, TypeAccumulator> = HashMap::new();

        for finding in findings {
            let contact_ids = finding.contact_ids();
            if contact_ids.is_empty() {
                without_contact += 1;
            }
            for id in &contact_ids {
                contacts.insert(id);
            }
            if !finding.account_id.is_empty() {
                accounts.insert(&finding.account_id);
                let entry = account_counts
                    .entry(&finding.account_id)
                    .or_insert((0, &finding.account_name));
                entry.0 += 1;
            }

            let acc = per_type.entry(&finding.alert_type).or_default();
            acc.findings += 1;
            if contact_ids.is_empty() {
                acc.without_contact += 1;
            }
            if !finding.account_id.is_empty() {
                acc.accounts.insert(finding.account_id.clone());
            }
            for id in contact_ids {
                acc.contacts.insert(id.to_string());
            }
        }

        let accounts_with_findings = accounts.len();
        let average = if accounts_with_findings > 0 {
            findings.len() as f64 / accounts_with_findings as f64
        } else {
            0.0
        };

        let mut per_type: Vec<TypeBreakdown> = per_type
            .into_iter()
            .map(|(alert_type, acc)| TypeBreakdown {
                alert_type: alert_type.to_string(),
                findings: acc.findings,
                unique_accounts: acc.accounts.len(),
                unique_contacts: acc.contacts.len(),
                without_contact: acc.without_contact,
            })
            .collect();
        per_type.sort_unstable_by(|a, b| {
            b.findings
                .cmp(&a.findings)
                .then_with(|| a.alert_type.cmp(&b.alert_type))
        });

        let mut top_accounts: Vec<AccountRank> = account_counts
            .into_iter()
            .map(|(account_id, (findings, account_name))| AccountRank {
                account_id: account_id.to_string(),
                account_name: account_name.to_string(),
                findings,
            })
            .collect();
        top_accounts.sort_unstable_by(|a, b| {
            b.findings
                .cmp(&a.findings)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        top_accounts.truncate(top_limit);

        Self {
            totals: Totals {
                total_findings: findings.len(),
                total_accounts,
                accounts_with_findings,
                unique_contacts: contacts.len(),
                unique_rule_types: per_type.len(),
                findings_without_contact: without_contact,
                average_findings_per_account: average,
            },
            per_type,
            top_accounts,
        }
    }
}

#[derive(Default)]
struct TypeAccumulator {
    findings: usize,
    without_contact: usize,
    accounts: BTreeSet<String>,
    contacts: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(alert_type: &str, account: &str, contacts: &str) -> Finding {
        Finding {
            alert_type: alert_type.to_string(),
            account_id: account.to_string(),
            account_name: if account.is_empty() {
                String::new()
            } else {
                format!("Name of {}", account)
            },
            contact_id: contacts.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_yields_zeroed_statistics() {
        let stats = AlertStatistics::from_findings(&[], 0);
        assert_eq!(stats.totals.total_findings, 0);
        assert_eq!(stats.totals.accounts_with_findings, 0);
        assert_eq!(stats.totals.average_findings_per_account, 0.0);
        assert!(stats.per_type.is_empty());
        assert!(stats.top_accounts.is_empty());
    }

    #[test]
    fn test_totals_count_unique_entities() {
        let findings = vec![
            finding("Duplicate role", "A1", "C1, C2"),
            finding("Duplicate role", "A2", "C2"),
            finding("Missing role", "A1", "C1"),
            finding("Duplicate contact point", "", ""),
        ];
        let stats = AlertStatistics::from_findings(&findings, 10);

        assert_eq!(stats.totals.total_findings, 4);
        assert_eq!(stats.totals.total_accounts, 10);
        assert_eq!(stats.totals.accounts_with_findings, 2);
        assert_eq!(stats.totals.unique_contacts, 2);
        assert_eq!(stats.totals.unique_rule_types, 3);
        assert_eq!(stats.totals.findings_without_contact, 1);
        assert!((stats.totals.average_findings_per_account - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_type_sorted_by_count_then_name() {
        let findings = vec![
            finding("B rule", "A1", "C1"),
            finding("A rule", "A1", "C1"),
            finding("B rule", "A2", ""),
        ];
        let stats = AlertStatistics::from_findings(&findings, 2);
        assert_eq!(stats.per_type[0].alert_type, "B rule");
        assert_eq!(stats.per_type[0].findings, 2);
        assert_eq!(stats.per_type[0].unique_accounts, 2);
        assert_eq!(stats.per_type[0].without_contact, 1);
        assert_eq!(stats.per_type[1].alert_type, "A rule");
    }

    #[test]
    fn test_top_accounts_ranked_and_truncated() {
        let mut findings = Vec::new();
        for _ in 0..3 {
            findings.push(finding("T", "A1", ""));
        }
        for _ in 0..5 {
            findings.push(finding("T", "A2", ""));
        }
        findings.push(finding("T", "A3", ""));

        let stats = AlertStatistics::from_findings_with_top(&findings, 3, 2);
        assert_eq!(stats.top_accounts.len(), 2);
        assert_eq!(stats.top_accounts[0].account_id, "A2");
        assert_eq!(stats.top_accounts[0].findings, 5);
        assert_eq!(stats.top_accounts[1].account_id, "A1");
    }
}
