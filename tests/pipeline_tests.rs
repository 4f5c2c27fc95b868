//! End-to-end tests for the rule pipeline against on-disk SQLite databases

use tempfile::TempDir;

use subdomain_rules::{
    AnalysisError, DomainAnalyzer, PrefixBoundPolicy, ProjectId, RuleMatcher, RulePipeline,
    RuleStore, SqliteRuleStore,
};

fn seeded_database(temp: &TempDir, rows: &[(&str, &str)]) -> std::path::PathBuf {
    let db_path = temp.path().join("domains.db");
    let store = SqliteRuleStore::open(&db_path).unwrap();
    store.init_schema().unwrap();
    for (project, name) in rows {
        store.add_domain(&ProjectId::from(*project), name).unwrap();
    }
    db_path
}

#[test]
fn rules_are_durable_after_the_store_is_closed() {
    let temp = TempDir::new().unwrap();
    let db_path = seeded_database(
        &temp,
        &[
            ("alpha", "sub1.foo.example.com"),
            ("alpha", "sub22.foo.example.com"),
            ("beta", "www.other.net"),
            ("beta", "  api.other.net  "),
        ],
    );

    {
        let mut store = SqliteRuleStore::open(&db_path).unwrap();
        let summary = RulePipeline::new(&mut store, DomainAnalyzer::new())
            .run()
            .unwrap();
        assert!(summary.is_success());
    }

    let mut store = SqliteRuleStore::open(&db_path).unwrap();
    let rules = store.list_rules().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].project_id, ProjectId::from("alpha"));
    assert_eq!(
        rules[0].regexp,
        r"^(?!.*\..*\..*\..*\..*\..*)[a-zA-Z0-9.-]{1,7}\.example\.com"
    );
    assert_eq!(
        rules[1].regexp,
        r"^(?!.*\..*\..*\..*\..*\..*)[a-zA-Z0-9.-]{1,2}\.other\.net"
    );
}

#[test]
fn rerunning_appends_duplicate_rules() {
    let temp = TempDir::new().unwrap();
    let db_path = seeded_database(&temp, &[("alpha", "www.example.com")]);
    let mut store = SqliteRuleStore::open(&db_path).unwrap();

    for _ in 0..2 {
        RulePipeline::new(&mut store, DomainAnalyzer::new())
            .run()
            .unwrap();
    }

    let rules = store.list_rules().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0], rules[1]);
}

#[test]
fn failing_projects_do_not_block_the_rest() {
    let temp = TempDir::new().unwrap();
    let db_path = seeded_database(
        &temp,
        &[
            ("flat", "example.com"),
            ("single", "localhost"),
            ("good", "cdn.example.com"),
        ],
    );
    let mut store = SqliteRuleStore::open(&db_path).unwrap();

    let summary = RulePipeline::new(&mut store, DomainAnalyzer::new())
        .run()
        .unwrap();

    let causes: Vec<_> = summary.failures.iter().map(|f| f.cause.clone()).collect();
    assert_eq!(
        causes,
        vec![
            AnalysisError::NonPositivePrefixBound { bound: -1 },
            AnalysisError::DegenerateBaseDomain {
                base_domain: "localhost".to_string()
            },
        ]
    );

    let rules = store.list_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].project_id, ProjectId::from("good"));
}

#[test]
fn clamped_rules_classify_hostnames() {
    let temp = TempDir::new().unwrap();
    let db_path = seeded_database(
        &temp,
        &[("flat", "example.com"), ("deep", "a.b.other.net")],
    );
    let mut store = SqliteRuleStore::open(&db_path).unwrap();

    RulePipeline::new(
        &mut store,
        DomainAnalyzer::with_policy(PrefixBoundPolicy::Clamp),
    )
    .run()
    .unwrap();

    let matcher = RuleMatcher::new(&store.list_rules().unwrap()).unwrap();
    assert_eq!(
        matcher.matching_projects("x.example.com").unwrap(),
        vec![ProjectId::from("flat")]
    );
    assert!(matcher.matching_projects("xy.example.com").unwrap().is_empty());
    assert_eq!(
        matcher.matching_projects("cd.other.net").unwrap(),
        vec![ProjectId::from("deep")]
    );
}

#[test]
fn dry_run_leaves_rules_table_empty() {
    let temp = TempDir::new().unwrap();
    let db_path = seeded_database(&temp, &[("alpha", "www.example.com")]);
    let mut store = SqliteRuleStore::open(&db_path).unwrap();

    let summary = RulePipeline::new(&mut store, DomainAnalyzer::new())
        .dry_run(true)
        .run()
        .unwrap();

    assert_eq!(summary.rules.len(), 1);
    assert!(store.list_rules().unwrap().is_empty());
}

#[test]
fn rows_without_project_id_do_not_abort_the_run() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("domains.db");
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE domains (project_id, name);
         CREATE TABLE rules (project_id, regexp);
         INSERT INTO domains VALUES (NULL, 'x.example.com');
         INSERT INTO domains VALUES ('alpha', 'www.example.com');",
    )
    .unwrap();
    let mut store = SqliteRuleStore::from_connection(conn);

    let summary = RulePipeline::new(&mut store, DomainAnalyzer::new())
        .run()
        .unwrap();

    assert_eq!(summary.projects_seen, 1);
    let rules = store.list_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].project_id, ProjectId::from("alpha"));
}
