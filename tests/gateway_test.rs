use achot::gateway::{GatewayError, GatewayOp, JsonFileGateway, MemoryGateway, ReportGateway};
use achot::row::{Field, ReportRow};
use chrono::NaiveDate;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_rows() -> Vec<ReportRow> {
    vec![
        ReportRow::with_label("Un").set_amount(Field::Tovar, 1000).set_amount(Field::Ok, 400),
        ReportRow::with_label("Shakar").set_amount(Field::Pul, 0),
    ]
}

async fn exercise(gateway: &impl ReportGateway) {
    let older = gateway.create_group("Yanvar", date(2024, 1, 31), "ali").await.unwrap();
    let newer = gateway.create_group("Fevral", date(2024, 2, 29), "ali").await.unwrap();

    let groups = gateway.list_groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id, newer.id);
    assert_eq!(groups[1].id, older.id);

    gateway.upsert_rows(&newer.id, "ali", &sample_rows()).await.unwrap();
    let rows = gateway.list_rows(&newer.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.id.is_some()));
    assert_eq!(rows[0].value(Field::Tovar), 1000);
    assert!(!rows[1].pul.is_set());

    gateway
        .update_group(&newer.id, "Fevral oxiri", date(2024, 2, 28))
        .await
        .unwrap();
    let groups = gateway.list_groups().await.unwrap();
    assert!(groups.iter().any(|g| g.name == "Fevral oxiri"));

    gateway.delete_rows(&newer.id).await.unwrap();
    assert!(gateway.list_rows(&newer.id).await.unwrap().is_empty());

    gateway.upsert_rows(&newer.id, "ali", &sample_rows()).await.unwrap();
    gateway.delete_group(&newer.id).await.unwrap();
    assert!(matches!(
        gateway.list_rows(&newer.id).await,
        Err(GatewayError::NotFound(_))
    ));
    assert_eq!(gateway.list_groups().await.unwrap().len(), 1);
}

#[tokio::test]
async fn memory_gateway_crud() {
    exercise(&MemoryGateway::new()).await;
}

#[tokio::test]
async fn json_file_gateway_crud() {
    let dir = tempdir().unwrap();
    exercise(&JsonFileGateway::open(dir.path()).unwrap()).await;
}

#[tokio::test]
async fn json_file_gateway_persists_between_opens() {
    let dir = tempdir().unwrap();
    let id = {
        let gateway = JsonFileGateway::open(dir.path()).unwrap();
        let group = gateway.create_group("Mart", date(2024, 3, 1), "ali").await.unwrap();
        gateway.upsert_rows(&group.id, "ali", &sample_rows()).await.unwrap();
        group.id
    };
    let gateway = JsonFileGateway::open(dir.path()).unwrap();
    assert_eq!(gateway.list_rows(&id).await.unwrap().len(), 2);
}

#[test]
fn empty_database_path_is_not_configured() {
    assert!(matches!(
        JsonFileGateway::open(""),
        Err(GatewayError::NotConfigured)
    ));
}

#[tokio::test]
async fn upsert_keeps_existing_ids() {
    let gateway = MemoryGateway::new();
    let group = gateway.create_group("Aprel", date(2024, 4, 1), "ali").await.unwrap();
    gateway.upsert_rows(&group.id, "ali", &sample_rows()).await.unwrap();

    let mut rows = gateway.list_rows(&group.id).await.unwrap();
    rows[0] = rows[0].clone().set_amount(Field::Tovar, 2000);
    gateway.upsert_rows(&group.id, "ali", &rows).await.unwrap();

    let again = gateway.list_rows(&group.id).await.unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(again[0].id, rows[0].id);
    assert_eq!(again[0].value(Field::Tovar), 2000);
}

#[tokio::test]
async fn unknown_group_is_not_found() {
    let gateway = MemoryGateway::new();
    assert!(matches!(
        gateway.update_group("nope", "x", date(2024, 1, 1)).await,
        Err(GatewayError::NotFound(_))
    ));
    assert!(matches!(
        gateway.delete_group("nope").await,
        Err(GatewayError::NotFound(_))
    ));
}

#[tokio::test]
async fn blank_group_name_is_rejected() {
    let gateway = MemoryGateway::new();
    assert!(matches!(
        gateway.create_group("  ", date(2024, 1, 1), "ali").await,
        Err(GatewayError::Rejected(_))
    ));
}

#[tokio::test]
async fn injected_failure_hits_once() {
    let gateway = MemoryGateway::new();
    gateway.fail_on(GatewayOp::ListGroups);
    assert!(matches!(
        gateway.list_groups().await,
        Err(GatewayError::Unavailable(_))
    ));
    assert!(gateway.list_groups().await.is_ok());
}

#[tokio::test]
async fn upsert_never_touches_rows_of_another_group() {
    let gateway = MemoryGateway::new();
    let first = gateway.create_group("Aprel", date(2024, 4, 1), "ali").await.unwrap();
    let second = gateway.create_group("May", date(2024, 5, 1), "ali").await.unwrap();
    gateway.upsert_rows(&first.id, "ali", &sample_rows()).await.unwrap();

    let mut copied = gateway.list_rows(&first.id).await.unwrap();
    copied[0] = copied[0].clone().set_amount(Field::Tovar, 9000);
    gateway.upsert_rows(&second.id, "ali", &copied).await.unwrap();

    let original = gateway.list_rows(&first.id).await.unwrap();
    assert_eq!(original.len(), 2);
    assert_eq!(original[0].value(Field::Tovar), 1000);

    let moved = gateway.list_rows(&second.id).await.unwrap();
    assert_eq!(moved.len(), 2);
    assert_eq!(moved[0].value(Field::Tovar), 9000);
    assert!(moved.iter().all(|r| original.iter().all(|o| o.id != r.id)));
}
