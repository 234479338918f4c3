use relsentry::{
    Account, AccountContactRelation, Contact, ImportPayload, Relsentry, SentryConfig,
};

fn payload() -> ImportPayload {
    ImportPayload {
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
                ..Default::default()
            },
            Contact {
                id: "C2".to_string(),
                first_name: "Jo".to_string(),
                last_name: "Doe".to_string(),
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
    }
}

#[test]
fn duplicate_role_round_trip() {
    let mut sentry = Relsentry::new(SentryConfig::default());
    sentry.ingest(payload());

    let report = sentry.run_alerts();
    let duplicates: Vec<_> = report
        .findings
        .iter()
        .filter(|finding| finding.definition_id == "duplicate-role-same-name")
        .collect();

    assert_eq!(duplicates.len(), 1, "exactly one finding for the group");
    let finding = duplicates[0];
    assert_eq!(finding.account_id, "A1");
    assert_eq!(finding.account_name, "Acme");
    assert_eq!(finding.context["role"], "billing");
    let ids = finding.contact_ids();
    assert!(ids.contains(&"C1") && ids.contains(&"C2"));
}

#[test]
fn duplicate_role_is_order_independent() {
    let mut forward = Relsentry::new(SentryConfig::default());
    forward.ingest(payload());

    let mut reversed_payload = payload();
    reversed_payload
        .account_contact_relations
        .as_mut()
        .unwrap()
        .reverse();
    reversed_payload.contacts.as_mut().unwrap().reverse();
    let mut backward = Relsentry::new(SentryConfig::default());
    backward.ingest(reversed_payload);

    let duplicate_group = |sentry: &Relsentry| {
        sentry
            .run_alerts()
            .findings
            .into_iter()
            .filter(|finding| finding.definition_id == "duplicate-role-same-name")
            .collect::<Vec<_>>()
    };
    assert_eq!(duplicate_group(&forward), duplicate_group(&backward));
}

#[test]
fn two_runs_over_an_unchanged_store_are_identical() {
    let mut sentry = Relsentry::new(SentryConfig::default());
    sentry.ingest(payload());

    let first = sentry.run_alerts();
    let second = sentry.run_alerts();

    assert_eq!(first.findings, second.findings);
    assert_eq!(
        sentry.statistics(&first.findings),
        sentry.statistics(&second.findings)
    );
}

#[test]
fn replace_removes_every_trace_of_the_old_snapshot() {
    let mut sentry = Relsentry::new(SentryConfig::default());
    sentry.ingest(payload());
    assert!(!sentry.run_alerts().findings.is_empty());

    // Re-import with clean data: same account, distinct names and roles.
    sentry.ingest(ImportPayload {
        accounts: Some(vec![Account {
            id: "A1".to_string(),
            name: "Acme".to_string(),
            customer_marking: String::new(),
        }]),
        contacts: Some(vec![Contact {
            id: "C9".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            individual_id: Some("I9".to_string()),
            email: "ann@acme.example".to_string(),
            mobile_phone: "555".to_string(),
            ..Default::default()
        }]),
        individuals: Some(vec![relsentry::Individual {
            id: "I9".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
        }]),
        account_contact_relations: Some(vec![AccountContactRelation {
            id: "R9".to_string(),
            account_id: "A1".to_string(),
            contact_id: "C9".to_string(),
            roles: "Billing".to_string(),
        }]),
        contact_point_phones: Some(vec![relsentry::PhoneContactPoint {
            id: "P9".to_string(),
            parent_id: "I9".to_string(),
            telephone_number: "555".to_string(),
        }]),
        ..Default::default()
    });

    let report = sentry.run_alerts();
    assert!(
        report.findings.is_empty(),
        "clean snapshot must produce no findings, got {:?}",
        report.findings
    );
    assert!(sentry.store().contact("C1").is_none());
}
