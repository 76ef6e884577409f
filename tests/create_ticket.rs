mod common;

use artisan_tickets::service::Error;

use common::{category, create_ticket_data, tag, FakeTaxonomy, Harness};

fn taxonomy() -> FakeTaxonomy {
    FakeTaxonomy {
        categories: vec![category(1, "furniture")],
        tags: vec![tag(7, "oak"), tag(8, "varnished")],
        ..FakeTaxonomy::default()
    }
}

#[tokio::test]
async fn creates_ticket_and_returns_generated_id() {
    let harness = Harness::new(taxonomy());

    let mut data = create_ticket_data(10, 1, "bench", "garden bench");
    data.tag_ids = vec![7.into(), 8.into()];
    data.attachments = vec!["s3://a".into(), "s3://b".into()];

    let id = harness.service.create_ticket(data).await.unwrap();
    assert_eq!(id, 1.into());

    let created = harness.tickets.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].tag_ids, [7.into(), 8.into()]);
    assert_eq!(created[0].attachments, ["s3://a", "s3://b"]);
}

#[tokio::test]
async fn duplicate_tag_ids_are_collapsed_before_insert() {
    let harness = Harness::new(taxonomy());

    let mut data = create_ticket_data(10, 1, "bench", "garden bench");
    data.tag_ids = vec![7.into(), 8.into(), 7.into()];

    harness.service.create_ticket(data).await.unwrap();

    let created = harness.tickets.created.lock().unwrap();
    assert_eq!(created[0].tag_ids, [7.into(), 8.into()]);
}

#[tokio::test]
async fn unknown_category_is_rejected_without_writes() {
    let harness = Harness::new(taxonomy());

    let data = create_ticket_data(10, 99, "bench", "garden bench");
    let err = harness.service.create_ticket(data).await.unwrap_err();

    assert!(matches!(err, Error::CategoryNotFound(id) if id == 99.into()));
    assert!(harness.tickets.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn first_unknown_tag_is_named_in_the_error() {
    let harness = Harness::new(taxonomy());

    let mut data = create_ticket_data(10, 1, "bench", "garden bench");
    data.tag_ids = vec![7.into(), 42.into(), 43.into()];
    let err = harness.service.create_ticket(data).await.unwrap_err();

    assert!(matches!(err, Error::TagNotFound(id) if id == 42.into()));
    assert!(harness.tickets.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn matching_name_category_and_description_is_a_duplicate() {
    let harness = Harness::new(taxonomy());
    harness
        .tickets
        .tickets
        .lock()
        .unwrap()
        .push(common::ticket(5, 10, 1, "bench", "garden bench"));

    let data = create_ticket_data(10, 1, "bench", "garden bench");
    let err = harness.service.create_ticket(data).await.unwrap_err();

    assert!(matches!(err, Error::TicketAlreadyExists));
    assert!(harness.tickets.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn same_shape_for_another_user_is_not_a_duplicate() {
    let harness = Harness::new(taxonomy());
    harness
        .tickets
        .tickets
        .lock()
        .unwrap()
        .push(common::ticket(5, 11, 1, "bench", "garden bench"));

    let data = create_ticket_data(10, 1, "bench", "garden bench");
    harness.service.create_ticket(data).await.unwrap();
}

#[tokio::test]
async fn differing_description_is_not_a_duplicate() {
    let harness = Harness::new(taxonomy());
    harness
        .tickets
        .tickets
        .lock()
        .unwrap()
        .push(common::ticket(5, 10, 1, "bench", "garden bench"));

    let data = create_ticket_data(10, 1, "bench", "painted garden bench");
    harness.service.create_ticket(data).await.unwrap();
}
