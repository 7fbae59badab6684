// Integration tests for tracked entity operations against SQLite.
// Covers create, update, destroy, history queries, constrained storage,
// the schema collaborator and actor attribution.

use revtrail_core::{ActorId, Operation, PaperTrail, TrailConfig};
use revtrail_store::{define_models, MutationOptions, RevisionRepo, Tracked, TrackedEntity};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
    #[serde(default)]
    age: Option<i64>,
}

impl TrackedEntity for User {
    const MODEL: &'static str = "User";
    const TABLE: &'static str = "users";

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

fn user(name: &str) -> User {
    User {
        id: "u1".to_string(),
        name: name.to_string(),
        age: None,
    }
}

fn setup(config: TrailConfig) -> (Connection, Tracked<User>) {
    let trail = Arc::new(PaperTrail::new(config).unwrap());
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    Tracked::<User>::define_table(&conn, &trail).unwrap();
    let users = Tracked::new(&conn, trail).unwrap();
    (conn, users)
}

fn with_changes() -> TrailConfig {
    TrailConfig {
        enable_revision_changes: true,
        ..TrailConfig::default()
    }
}

// ---------------------------------------------------------------------------
// create / update
// ---------------------------------------------------------------------------

#[test]
fn test_identical_update_writes_no_revision() {
    // Given: Bob stored at revision 1
    let (mut conn, users) = setup(TrailConfig::default());
    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("Bob"), &MutationOptions::new()).unwrap();

    // When: Bob is saved unchanged
    let saved = users.update(&tx, &user("Bob"), &MutationOptions::new()).unwrap();
    tx.commit().unwrap();

    // Then: no new revision, counter unchanged
    assert_eq!(saved.revision, 1);
    assert_eq!(saved.revision_id, None);
    let repo = RevisionRepo::new(&conn, users.trail().config());
    assert_eq!(repo.count("User").unwrap(), 1);
}

#[test]
fn test_rename_records_revision_and_change() {
    // Given: Bob stored and at revision 1
    let (mut conn, users) = setup(with_changes());
    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("Bob"), &MutationOptions::new()).unwrap();

    // When: renamed to Bill by an explicit actor
    let saved = users
        .update(&tx, &user("Bill"), &MutationOptions::new().actor("admin"))
        .unwrap();
    tx.commit().unwrap();

    // Then: revision 2 holds the filtered snapshot and one change record
    assert_eq!(saved.revision, 2);
    let repo = RevisionRepo::new(&conn, users.trail().config());
    let revision = repo.get("User", "u1", 2).unwrap().unwrap();
    assert_eq!(Some(revision.id), saved.revision_id);
    assert_eq!(revision.operation, Operation::Update);
    assert_eq!(revision.document, json!({"name": "Bill", "age": null}));
    assert_eq!(revision.actor_id, Some(ActorId::from("admin")));

    let changes = repo.changes_for(revision.id).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "name");
    assert_eq!(
        changes[0].document,
        json!({"kind": "E", "path": ["name"], "lhs": "Bob", "rhs": "Bill"})
    );
    assert_eq!(
        changes[0].diff,
        json!([
            {"op": "equal", "text": "B"},
            {"op": "delete", "text": "ob"},
            {"op": "insert", "text": "ill"}
        ])
    );
}

#[test]
fn test_history_is_ascending() {
    let (mut conn, users) = setup(TrailConfig::default());
    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("a"), &MutationOptions::new()).unwrap();
    users.update(&tx, &user("b"), &MutationOptions::new()).unwrap();
    users.update(&tx, &user("c"), &MutationOptions::new()).unwrap();
    tx.commit().unwrap();

    let history = users.history(&conn, "u1").unwrap();
    let numbers: Vec<i64> = history.iter().map(|r| r.revision).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(history[0].operation, Operation::Create);
    assert_eq!(history[2].document, json!({"name": "c", "age": null}));
}

// ---------------------------------------------------------------------------
// destroy
// ---------------------------------------------------------------------------

#[test]
fn test_destroy_records_final_revision() {
    // Given: a user at revision 2
    let (mut conn, users) = setup(TrailConfig::default());
    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("Bob"), &MutationOptions::new()).unwrap();
    users.update(&tx, &user("Bill"), &MutationOptions::new()).unwrap();

    // When: destroyed without changes
    let destroyed = users.destroy(&tx, "u1", &MutationOptions::new()).unwrap();
    tx.commit().unwrap();

    // Then: revision 3 is a destroy and the row is gone
    assert_eq!(destroyed.revision, 3);
    assert_eq!(destroyed.entity.name, "Bill");
    assert!(users.get(&conn, "u1").unwrap().is_none());

    let repo = RevisionRepo::new(&conn, users.trail().config());
    let last = repo.get("User", "u1", 3).unwrap().unwrap();
    assert_eq!(last.operation, Operation::Destroy);
}

// ---------------------------------------------------------------------------
// configuration variants
// ---------------------------------------------------------------------------

#[test]
fn test_constrained_storage_round_trips() {
    let (mut conn, users) = setup(TrailConfig {
        constrained_storage: true,
        enable_revision_changes: true,
        ..TrailConfig::default()
    });
    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("Bob"), &MutationOptions::new()).unwrap();
    users.update(&tx, &user("Bill"), &MutationOptions::new()).unwrap();
    tx.commit().unwrap();

    let declared: String = conn
        .query_row(
            "SELECT type FROM pragma_table_info('revisions') WHERE name = 'document'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(declared, "TEXT");

    let repo = RevisionRepo::new(&conn, users.trail().config());
    let revision = repo.get("User", "u1", 2).unwrap().unwrap();
    assert_eq!(revision.document, json!({"name": "Bill", "age": null}));
    assert_eq!(repo.changes_for(revision.id).unwrap().len(), 1);
}

#[test]
fn test_lenient_diff_ignores_coercible_changes() {
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Counter {
        id: String,
        value: serde_json::Value,
    }
    impl TrackedEntity for Counter {
        const MODEL: &'static str = "Counter";
        const TABLE: &'static str = "counters";
        fn document_id(&self) -> String {
            self.id.clone()
        }
    }

    let trail = Arc::new(
        PaperTrail::new(TrailConfig {
            strict_diff: false,
            ..TrailConfig::default()
        })
        .unwrap(),
    );
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    Tracked::<Counter>::define_table(&conn, &trail).unwrap();
    let counters = Tracked::<Counter>::new(&conn, trail).unwrap();

    let tx = conn.transaction().unwrap();
    let make = |value| Counter {
        id: "c1".to_string(),
        value,
    };
    counters.create(&tx, &make(json!(3)), &MutationOptions::new()).unwrap();
    let same = counters.update(&tx, &make(json!("3")), &MutationOptions::new()).unwrap();
    let changed = counters.update(&tx, &make(json!("4")), &MutationOptions::new()).unwrap();

    assert_eq!(same.revision, 1);
    assert_eq!(changed.revision, 2);
}

#[test]
fn test_compression_compares_named_fields_only() {
    let (mut conn, users) = setup(TrailConfig {
        enable_compression: true,
        ..TrailConfig::default()
    });
    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("Bob"), &MutationOptions::new()).unwrap();

    let mut older = user("Bob");
    older.age = Some(30);
    let saved = users
        .update(&tx, &older, &MutationOptions::new().fields(["name"]))
        .unwrap();

    assert_eq!(saved.revision, 1);
    assert_eq!(users.get(&tx, "u1").unwrap().unwrap().entity.age, Some(30));
}

#[test]
fn test_auto_schema_adds_counter_to_legacy_table() {
    // Given: a host table without the counter column
    let trail = Arc::new(
        PaperTrail::new(TrailConfig {
            auto_schema: true,
            ..TrailConfig::default()
        })
        .unwrap(),
    );
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    conn.execute(
        "CREATE TABLE users (id TEXT PRIMARY KEY, document TEXT NOT NULL)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO users (id, document) VALUES ('u1', '{\"id\":\"u1\",\"name\":\"Bob\"}')",
        [],
    )
    .unwrap();

    // When: the wrapper is constructed
    let users = Tracked::<User>::new(&conn, trail).unwrap();

    // Then: existing rows start at zero and advance normally
    let tx = conn.transaction().unwrap();
    assert_eq!(users.get(&tx, "u1").unwrap().unwrap().revision, 0);
    let saved = users.update(&tx, &user("Bill"), &MutationOptions::new()).unwrap();
    assert_eq!(saved.revision, 1);
}

#[test]
fn test_missing_counter_column_without_auto_schema_fails() {
    let trail = Arc::new(PaperTrail::new(TrailConfig::default()).unwrap());
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    conn.execute(
        "CREATE TABLE users (id TEXT PRIMARY KEY, document TEXT NOT NULL)",
        [],
    )
    .unwrap();

    let users = Tracked::<User>::new(&conn, trail).unwrap();
    let tx = conn.transaction().unwrap();
    let err = users
        .create(&tx, &user("Bob"), &MutationOptions::new())
        .unwrap_err();
    assert_eq!(err.code(), "ERR_PERSISTENCE");
}

#[test]
fn test_fail_hard_without_actor_aborts() {
    let (mut conn, users) = setup(TrailConfig {
        fail_hard: true,
        ..TrailConfig::default()
    });
    {
        let tx = conn.transaction().unwrap();
        let err = users
            .create(&tx, &user("Bob"), &MutationOptions::new())
            .unwrap_err();
        assert_eq!(err.code(), "ERR_MISSING_ACTOR");
        // dropped without commit: the entity insert rolls back
    }

    let tx = conn.transaction().unwrap();
    let created = users
        .create(&tx, &user("Bob"), &MutationOptions::new().actor("ops"))
        .unwrap();
    assert_eq!(created.revision, 1);
}

#[test]
fn test_resolver_attributes_revisions() {
    let trail = Arc::new(
        PaperTrail::builder(TrailConfig::default())
            .actor_resolver(|| Some(ActorId::from("session-user")))
            .build()
            .unwrap(),
    );
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    Tracked::<User>::define_table(&conn, &trail).unwrap();
    let users = Tracked::<User>::new(&conn, trail).unwrap();

    let tx = conn.transaction().unwrap();
    users.create(&tx, &user("Bob"), &MutationOptions::new()).unwrap();
    users
        .update(&tx, &user("Bill"), &MutationOptions::new().actor("override"))
        .unwrap();
    tx.commit().unwrap();

    let actors: Vec<Option<String>> = users
        .history(&conn, "u1")
        .unwrap()
        .into_iter()
        .map(|r| r.actor_id.map(ActorId::into_inner))
        .collect();
    assert_eq!(
        actors,
        vec![Some("session-user".to_string()), Some("override".to_string())]
    );
}

// ---------------------------------------------------------------------------
// renamed counter / timestamp-shaped text
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Doc {
    id: String,
    body: String,
    version: i64,
}

impl TrackedEntity for Doc {
    const MODEL: &'static str = "Doc";
    const TABLE: &'static str = "docs";

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: String,
    stamp: String,
}

impl TrackedEntity for Note {
    const MODEL: &'static str = "Note";
    const TABLE: &'static str = "notes";

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

fn setup_entity<E: TrackedEntity>(config: TrailConfig) -> (Connection, Tracked<E>) {
    let trail = Arc::new(PaperTrail::new(config).unwrap());
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    Tracked::<E>::define_table(&conn, &trail).unwrap();
    let tracked = Tracked::new(&conn, trail).unwrap();
    (conn, tracked)
}

#[test]
fn test_renamed_counter_ignores_stale_in_flight_value() {
    // Given: a doc tracked under a "version" counter, stored at version 1
    let (mut conn, docs) = setup_entity::<Doc>(TrailConfig {
        revision_attribute: "version".to_string(),
        ..TrailConfig::default()
    });
    let doc = |version| Doc {
        id: "d1".to_string(),
        body: "x".to_string(),
        version,
    };
    let tx = conn.transaction().unwrap();
    let created = docs.create(&tx, &doc(0), &MutationOptions::new()).unwrap();

    // When: saved unchanged with a stale counter
    let saved = docs.update(&tx, &doc(0), &MutationOptions::new()).unwrap();
    tx.commit().unwrap();

    // Then: no revision, the committed counter wins, and the counter is not stored
    assert_eq!(created.revision, 1);
    assert_eq!(saved.revision, 1);
    assert_eq!(saved.revision_id, None);
    assert_eq!(saved.entity.version, 1);

    let history = docs.history(&conn, "d1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].document, json!({"body": "x"}));
}

#[test]
fn test_timestamp_shaped_text_is_stored_verbatim_and_diffed_strictly() {
    // Given: a note whose text happens to look like a timestamp
    let (mut conn, notes) = setup_entity::<Note>(TrailConfig::default());
    let note = |stamp: &str| Note {
        id: "n1".to_string(),
        stamp: stamp.to_string(),
    };
    let tx = conn.transaction().unwrap();
    notes
        .create(&tx, &note("2024-03-01T10:00:00Z"), &MutationOptions::new())
        .unwrap();

    // When: rewritten as another spelling of the same instant
    let saved = notes
        .update(&tx, &note("2024-03-01T12:00:00+02:00"), &MutationOptions::new())
        .unwrap();
    tx.commit().unwrap();

    // Then: the edit is a revision and both documents keep the exact text
    assert_eq!(saved.revision, 2);
    assert!(saved.revision_id.is_some());
    let history = notes.history(&conn, "n1").unwrap();
    let documents: Vec<_> = history.iter().map(|r| r.document.clone()).collect();
    assert_eq!(
        documents,
        vec![
            json!({"stamp": "2024-03-01T10:00:00Z"}),
            json!({"stamp": "2024-03-01T12:00:00+02:00"}),
        ]
    );
}
