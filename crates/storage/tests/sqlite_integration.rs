use quiz_core::model::{HistoryEntry, QuestionId, SessionStats, UserId};
use quiz_core::time::fixed_now;
use storage::repository::{ProgressRepository, SheetBackend, SheetGateway, Storage, StorageError};
use storage::sqlite::SqliteRepository;
use storage::{PersistedRecord, SheetRow};

fn uid(raw: &str) -> UserId {
    UserId::parse(raw).unwrap()
}

fn sample_record() -> PersistedRecord {
    let mut record = PersistedRecord::default();
    record
        .history
        .insert(QuestionId::new(0), HistoryEntry { correct: false, attempts: 3 });
    record.history.insert(QuestionId::new(4), HistoryEntry::first(true));
    record.marked = [2, 4].into_iter().map(QuestionId::new).collect();
    record.stats = SessionStats::new(1, 3);
    record.last_question_index = QuestionId::new(4);
    record.updated_at = Some(fixed_now());
    record
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn missing_worksheet_is_not_found() {
    let repo = connect("memdb_missing").await;
    assert!(matches!(
        repo.read_table("UserData").await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn empty_write_creates_the_worksheet() {
    let repo = connect("memdb_empty_write").await;
    repo.write_table("UserData", &[]).await.unwrap();
    assert!(repo.read_table("UserData").await.unwrap().is_empty());
}

#[tokio::test]
async fn write_table_replaces_rows_in_order() {
    let repo = connect("memdb_replace").await;
    let row = |user: &str, last: i64| SheetRow {
        user_id: user.into(),
        history: None,
        marked: Some("[]".into()),
        stats: None,
        last_question_index: Some(last),
        updated_at: None,
    };

    repo.write_table("UserData", &[row("a", 1), row("b", 2), row("c", 3)])
        .await
        .unwrap();
    repo.write_table("UserData", &[row("c", 9), row("a", 1)])
        .await
        .unwrap();

    let rows = repo.read_table("UserData").await.unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, ["c", "a"]);
    assert_eq!(rows[0].last_question_index, Some(9));
    assert_eq!(rows[0].marked.as_deref(), Some("[]"));
    assert!(rows[0].history.is_none());
}

#[tokio::test]
async fn gateway_round_trips_through_sqlite() {
    let repo = connect("memdb_gateway").await;
    let gateway = SheetGateway::new(repo.clone());

    assert!(gateway.load(&uid("abc123def456")).await.unwrap().is_none());

    let record = sample_record();
    gateway.save(&uid("abc123def456"), &record).await.unwrap();
    gateway.save(&uid("other"), &PersistedRecord::default()).await.unwrap();

    let loaded = gateway.load(&uid("abc123def456")).await.unwrap();
    assert_eq!(loaded, Some(record));
    assert_eq!(repo.read_table("UserData").await.unwrap().len(), 2);
}

#[tokio::test]
async fn worksheets_do_not_share_rows() {
    let repo = connect("memdb_worksheets").await;
    let a = SheetGateway::with_worksheet(repo.clone(), "A");
    let b = SheetGateway::with_worksheet(repo.clone(), "B");

    a.save(&uid("u1"), &sample_record()).await.unwrap();
    assert!(b.load(&uid("u1")).await.unwrap().is_none());
    assert!(a.load(&uid("u1")).await.unwrap().is_some());
}

#[tokio::test]
async fn storage_sqlite_constructor_migrates() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared", "UserData")
        .await
        .expect("storage");
    storage
        .progress
        .save(&uid("u1"), &sample_record())
        .await
        .unwrap();
    assert!(storage.progress.load(&uid("u1")).await.unwrap().is_some());
}
