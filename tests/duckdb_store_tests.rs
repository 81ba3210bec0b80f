use reimbursement_backend::codes::{Payments, ProcedureCode};
use reimbursement_backend::error::StoreError;
use reimbursement_backend::seed::builtin_records;
use reimbursement_backend::store::{
    CodeRepository, DuckDbCodeRepository, InMemoryCodeRepository, SearchQuery,
};
use tempfile::TempDir;

fn seeded_file_store() -> (TempDir, DuckDbCodeRepository) {
    let dir = TempDir::new().unwrap();
    let repo = DuckDbCodeRepository::open(&dir.path().join("codes.duckdb")).unwrap();
    repo.replace_all(&builtin_records().unwrap()).unwrap();
    (dir, repo)
}

fn q(s: &str) -> SearchQuery {
    SearchQuery::parse(s).unwrap()
}

#[test]
fn duckdb_and_memory_agree() {
    let (_dir, db) = seeded_file_store();
    let mem = InMemoryCodeRepository::new(builtin_records().unwrap()).unwrap();

    assert_eq!(db.list().unwrap(), mem.list().unwrap());
    for query in ["stent", "DIALYSIS", "369", "(tavr)", "%", "_", "nothing-here", "Ö"] {
        assert_eq!(
            db.search(&q(query)).unwrap(),
            mem.search(&q(query)).unwrap(),
            "query {query:?}"
        );
    }
    for code in ["36903", "33361", "27447", "INVALID", "3690"] {
        assert_eq!(db.get_by_code(code).unwrap(), mem.get_by_code(code).unwrap());
    }
}

#[test]
fn duckdb_and_memory_fold_non_ascii_case_alike() {
    let records = vec![
        ProcedureCode::new("G1", "ΟΔΟΣ procedure", "Greek", Payments::new(1.0, 1.0, 1.0, 1.0)),
        ProcedureCode::new("T1", "İSTANBUL clinic", "Turkish", Payments::new(1.0, 1.0, 1.0, 1.0)),
    ];
    let db = DuckDbCodeRepository::open_in_memory().unwrap();
    db.replace_all(&records).unwrap();
    let mem = InMemoryCodeRepository::new(records).unwrap();

    let codes = |repo: &dyn CodeRepository, s: &str| -> Vec<String> {
        repo.search(&q(s)).unwrap().into_iter().map(|c| c.code).collect()
    };
    for (query, expected) in [
        ("Σ", vec!["G1"]),
        ("οδοσ", vec!["G1"]),
        ("ΟΔΟΣ", vec!["G1"]),
        ("istanbul", vec!["T1"]),
        ("İstanbul", vec!["T1"]),
        ("i\u{307}stanbul", vec![]),
    ] {
        assert_eq!(codes(&db, query), expected, "duckdb query {query:?}");
        assert_eq!(codes(&mem, query), expected, "memory query {query:?}");
    }
}

#[test]
fn records_survive_reopen() {
    let (dir, repo) = seeded_file_store();
    drop(repo);

    let reopened = DuckDbCodeRepository::open(&dir.path().join("codes.duckdb")).unwrap();
    assert_eq!(reopened.count().unwrap(), 6);
    let knee = reopened.get_by_code("27447").unwrap().unwrap();
    assert_eq!(knee.payments().obl, 0.0);
    assert_eq!(knee.drg(), Some("470"));
    assert_eq!(knee.apc(), None);
}

#[test]
fn like_wildcards_are_literal() {
    let repo = DuckDbCodeRepository::open_in_memory().unwrap();
    repo.replace_all(&[
        ProcedureCode::new("A_1", "Fifty% coinsurance", "Test", Payments::new(1.0, 1.0, 1.0, 1.0)),
        ProcedureCode::new("AB1", "Full coinsurance", "Test", Payments::new(1.0, 1.0, 1.0, 1.0)),
    ])
    .unwrap();

    let codes = |s: &str| -> Vec<String> {
        repo.search(&q(s)).unwrap().into_iter().map(|c| c.code).collect()
    };
    assert_eq!(codes("a_"), vec!["A_1"]);
    assert_eq!(codes("%"), vec!["A_1"]);
    assert_eq!(codes("coinsurance"), vec!["AB1", "A_1"]);
}

#[test]
fn lookup_is_case_sensitive() {
    let repo = DuckDbCodeRepository::open_in_memory().unwrap();
    repo.replace_all(&[ProcedureCode::new(
        "C1725",
        "Catheter",
        "Devices",
        Payments::new(0.0, 640.0, 0.0, 0.0),
    )])
    .unwrap();
    assert!(repo.get_by_code("C1725").unwrap().is_some());
    assert!(repo.get_by_code("c1725").unwrap().is_none());
}

#[test]
fn replace_all_rejects_duplicates_and_keeps_previous_rows() {
    let (_dir, repo) = seeded_file_store();
    let dup = ProcedureCode::new("X", "x", "x", Payments::new(0.0, 0.0, 0.0, 0.0));
    let err = repo.replace_all(&[dup.clone(), dup]).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateCode(c) if c == "X"));
    assert_eq!(repo.count().unwrap(), 6);
}

#[test]
fn empty_store_lists_nothing() {
    let repo = DuckDbCodeRepository::open_in_memory().unwrap();
    assert!(repo.list().unwrap().is_empty());
    assert!(repo.search(&q("stent")).unwrap().is_empty());
    assert!(repo.get_by_code("36903").unwrap().is_none());
}
