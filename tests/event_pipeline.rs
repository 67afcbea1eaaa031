use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use snapcal::components::events::{EventStoreHandle, EventUpdate, RawDetection};
use snapcal::error::Error;
use snapcal::utils::time::FixedClock;
use std::sync::Arc;

fn reference() -> DateTime<Tz> {
    // Wednesday
    chrono_tz::UTC.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> DateTime<Tz> {
    chrono_tz::UTC.with_ymd_and_hms(2024, 5, d, h, m, 0).unwrap()
}

fn store() -> EventStoreHandle {
    EventStoreHandle::new(Arc::new(FixedClock::new(reference())))
}

#[tokio::test]
async fn test_duplicate_in_one_batch_creates_one_event() {
    let store = store();
    let batch = vec![
        RawDetection::new("Standup", "2024-05-02 09:00"),
        RawDetection::new("Standup", "2024-05-02 09:00"),
    ];

    let report = store.ingest(batch, reference()).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.duplicates, 1);

    let events = store.list().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Standup");
    assert_eq!(events[0].start, at(2, 9, 0));
    assert_eq!(events[0].end, at(2, 10, 0));
    assert_eq!(events[0].description, "Standup on 2024-05-02 09:00");
}

#[tokio::test]
async fn test_later_batches_are_deduplicated_too() {
    let store = store();
    let batch = vec![RawDetection::new("Lunch", "tomorrow at noon")];
    store.ingest(batch.clone(), reference()).await.unwrap();
    let report = store.ingest(batch, reference()).await.unwrap();

    assert!(report.created.is_empty());
    assert_eq!(report.duplicates, 1);
    assert_eq!(store.list().await.unwrap()[0].start, at(2, 12, 0));
}

#[tokio::test]
async fn test_bad_candidates_do_not_abort_the_batch() {
    let store = store();
    let batch = vec![
        RawDetection::new("Buy milk", "someday"),
        RawDetection::new("Dentist", "May 3 at 2pm"),
        RawDetection::new("Party", "Feb 30 2025"),
    ];

    let report = store.ingest(batch, reference()).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].title, "Dentist");
    assert_eq!(report.created[0].start, at(3, 14, 0));
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].text, "Buy milk on someday");
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_candidate_keeps_the_store_alive() {
    let store = store();
    let batch = vec![
        RawDetection::new("Standup", "2024-05-02 09:00"),
        RawDetection::new("Launch", "in 9999999999 days"),
        RawDetection::new("Retro", "tomorrow at 6pm for 9999999999 hours"),
        RawDetection::new("Dentist", "May 3 at 2pm"),
    ];

    let report = store.ingest(batch, reference()).await.unwrap();
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].text, "Launch on in 9999999999 days");

    let events = store.list().await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].title, "Dentist");
}

#[tokio::test]
async fn test_created_event_carries_encoded_body() {
    let store = store();
    let report = store
        .ingest(vec![RawDetection::new("Standup", "2024-05-02 09:00")], reference())
        .await
        .unwrap();
    let event = &report.created[0];

    assert!(event.encoded_body.contains(&format!("UID:{}", event.id)));
    assert!(event.encoded_body.contains("SUMMARY:Standup"));
    assert!(event.encoded_body.contains("DTSTART:20240502T090000"));
    assert!(event.encoded_body.contains("DTEND:20240502T100000"));
}

#[tokio::test]
async fn test_edit_regenerates_body() {
    let store = store();
    let report = store
        .ingest(vec![RawDetection::new("Standup", "2024-05-02 09:00")], reference())
        .await
        .unwrap();
    let id = report.created[0].id.clone();

    let update = EventUpdate {
        title: "Standup moved".to_string(),
        start: at(2, 10, 0),
        end: at(2, 10, 30),
    };
    let edited = store.edit(&id, update).await.unwrap();

    assert_eq!(edited.id, id);
    assert_eq!(edited.title, "Standup moved");
    assert_eq!(edited.description, "Standup on 2024-05-02 09:00");
    assert!(edited.encoded_body.contains(&format!("UID:{}", id)));
    assert!(edited.encoded_body.contains("SUMMARY:Standup moved"));
    assert!(edited.encoded_body.contains("DTSTART:20240502T100000"));
    assert!(edited.encoded_body.contains("DTEND:20240502T103000"));
    assert_eq!(store.get(&id).await.unwrap(), edited);
}

#[tokio::test]
async fn test_failed_edit_keeps_previous_state() {
    let store = store();
    let report = store
        .ingest(vec![RawDetection::new("Standup", "2024-05-02 09:00")], reference())
        .await
        .unwrap();
    let original = report.created[0].clone();

    let backwards = EventUpdate {
        title: "Standup".to_string(),
        start: at(2, 10, 0),
        end: at(2, 10, 0) - Duration::minutes(30),
    };
    let err = store.edit(&original.id, backwards).await.unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));

    let blank = EventUpdate {
        title: "   ".to_string(),
        start: at(2, 10, 0),
        end: at(2, 11, 0),
    };
    assert!(store.edit(&original.id, blank).await.is_err());

    assert_eq!(store.get(&original.id).await.unwrap(), original);
}

#[tokio::test]
async fn test_delete_and_unknown_ids() {
    let store = store();
    let report = store
        .ingest(
            vec![
                RawDetection::new("Standup", "2024-05-02 09:00"),
                RawDetection::new("Retro", "Friday at 3pm"),
            ],
            reference(),
        )
        .await
        .unwrap();
    let id = report.created[0].id.clone();

    let deleted = store.delete(&id).await.unwrap();
    assert_eq!(deleted.title, "Standup");

    let remaining = store.list().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Retro");
    assert_eq!(remaining[0].start, at(3, 15, 0));

    assert!(matches!(
        store.delete(&id).await.unwrap_err(),
        Error::EventNotFound(_)
    ));
    let update = EventUpdate {
        title: "Ghost".to_string(),
        start: at(2, 10, 0),
        end: at(2, 11, 0),
    };
    assert!(matches!(
        store.edit(&id, update).await.unwrap_err(),
        Error::EventNotFound(_)
    ));

    // A deleted event can be created again
    let report = store
        .ingest(vec![RawDetection::new("Standup", "2024-05-02 09:00")], reference())
        .await
        .unwrap();
    assert_eq!(report.created.len(), 1);
}
