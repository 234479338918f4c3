//! # Export Adapters
//!
//! Renders a run's findings and statistics for external consumers: a CSV
//! extract of the findings and a markdown operational report.

use crate::rules::Finding;
use crate::summary::AlertStatistics;
use anyhow::Result;

const CSV_COLUMNS: [&str; 8] = [
    "alert_type",
    "account_id",
    "account_name",
    "contact_id",
    "contact_name",
    "details",
    "message",
    "definition_id",
];

/// Serialize findings as CSV bytes with a fixed column order.
pub fn findings_to_csv(findings: &[Finding]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;
    for finding in findings {
        writer.write_record([
            finding.alert_type.as_str(),
            finding.account_id.as_str(),
            finding.account_name.as_str(),
            finding.contact_id.as_str(),
            finding.contact_name.as_str(),
            finding.details.as_str(),
            finding.message.as_str(),
            finding.definition_id.as_str(),
        ])?;
    }
    Ok(writer.into_inner()?)
}

/// Render a markdown report over one run's statistics and findings.
pub fn render_report(statistics: &AlertStatistics, findings: &[Finding]) -> String {
    let mut report = String::new();

    report.push_str("# Data Quality Report\n\n");
    report.push_str("## Summary\n\n");
    let totals = &statistics.totals;
    report.push_str(&format!("- **Total findings**: {}\n", totals.total_findings));
    report.push_str(&format!("- **Total accounts**: {}\n", totals.total_accounts));
    report.push_str(&format!(
        "- **Accounts with findings**: {}\n",
        totals.accounts_with_findings
    ));
    report.push_str(&format!(
        "- **Unique contacts involved**: {}\n",
        totals.unique_contacts
    ));
    report.push_str(&format!(
        "- **Rule types triggered**: {}\n",
        totals.unique_rule_types
    ));
    report.push_str(&format!(
        "- **Findings without a contact**: {}\n",
        totals.findings_without_contact
    ));
    report.push_str(&format!(
        "- **Average findings per account**: {:.2}\n",
        totals.average_findings_per_account
    ));

    report.push_str("\n## Findings by Type\n\n");
    if statistics.per_type.is_empty() {
        report.push_str("- No findings\n");
    } else {
        report.push_str("| Type | Findings | Accounts | Contacts | Without contact |\n");
        report.push_str("|---|---|---|---|---|\n");
        for breakdown in &statistics.per_type {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                breakdown.alert_type,
                breakdown.findings,
                breakdown.unique_accounts,
                breakdown.unique_contacts,
                breakdown.without_contact
            ));
        }
    }

    report.push_str("\n## Top Accounts by Finding Count\n\n");
    if statistics.top_accounts.is_empty() {
        report.push_str("- No accounts with findings\n");
    } else {
        for rank in &statistics.top_accounts {
            report.push_str(&format!(
                "- {} ({}): {} findings\n",
                rank.account_name, rank.account_id, rank.findings
            ));
        }
    }

    report.push_str("\n## Findings\n\n");
    if findings.is_empty() {
        report.push_str("- None\n");
    } else {
        for finding in findings {
            report.push_str(&format!("- **{}** — {}\n", finding.alert_type, finding.message));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::AlertStatistics;

    fn sample_findings() -> Vec<Finding> {
        vec![Finding {
            alert_type: "Duplicate role".to_string(),
            account_id: "A1".to_string(),
            account_name: "Acme".to_string(),
            contact_id: "C1, C2".to_string(),
            contact_name: "Jo Doe, Jo Doe".to_string(),
            details: "Role 'billing' bound to 2 contacts with the same name.".to_string(),
            message: "Account 'Acme' has 2 contacts named Jo Doe with the role 'billing'."
                .to_string(),
            definition_id: "dup-role".to_string(),
            ..Default::default()
        }]
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_finding() {
        let bytes = findings_to_csv(&sample_findings()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alert_type,account_id"));
        assert!(lines[1].contains("\"C1, C2\""));
    }

    #[test]
    fn test_report_covers_all_sections() {
        let findings = sample_findings();
        let statistics = AlertStatistics::from_findings(&findings, 3);
        let report = render_report(&statistics, &findings);

        assert!(report.contains("# Data Quality Report"));
        assert!(report.contains("- **Total findings**: 1"));
        assert!(report.contains("| Duplicate role | 1 | 1 | 2 | 0 |"));
        assert!(report.contains("- Acme (A1): 1 findings"));
    }

    #[test]
    fn test_report_tolerates_empty_run() {
        let statistics = AlertStatistics::from_findings(&[], 0);
        let report = render_report(&statistics, &[]);
        assert!(report.contains("- No findings"));
        assert!(report.contains("- No accounts with findings"));
    }
}
