//! Relocation into dated archives and the fatal fallback

use super::*;
use crate::handler::{ArchiveTarget, Handler, Outcome, Relocation};

#[test]
fn test_two_files_into_same_new_bucket() {
    let inbox = TestInbox::new();
    let archiver = create_test_archiver();
    let first = inbox.drop_file("SALIDAS", "a.csv", "A;P1;1;W\n");
    let second = inbox.drop_file("SALIDAS", "b.csv", "B;P1;1;W\n");

    let bucket = inbox.archived("processed", "SALIDAS", "a.csv");
    assert!(!bucket.parent().unwrap().exists());

    assert!(!archiver.archive(&first, ArchiveTarget::Processed).is_fatal());
    assert!(!archiver.archive(&second, ArchiveTarget::Processed).is_fatal());

    assert!(inbox.archived("processed", "SALIDAS", "a.csv").exists());
    assert!(inbox.archived("processed", "SALIDAS", "b.csv").exists());
}

#[test]
fn test_existing_destination_triggers_in_place_rename() {
    let inbox = TestInbox::new();
    let request = inbox.drop_file("SALIDAS", "orders.csv", "A;P1;1;W1\n");

    let occupied = inbox.archived("processed", "SALIDAS", "orders.csv");
    std::fs::create_dir_all(occupied.parent().unwrap()).unwrap();
    std::fs::write(&occupied, "earlier file").unwrap();

    let test = create_default_handler();
    let report = test.handler.handle(&request);

    // The data itself was fine
    assert_eq!(report.outcome, Outcome::Processed { records: 1 });

    let quarantined = inbox
        .inbox()
        .join("SALIDAS")
        .join("20240315-0905-AlreadyExists-orders.csv.error");
    match &report.relocation {
        Relocation::Quarantined { path, cause } => {
            assert_eq!(path, &quarantined);
            assert!(cause.contains("Failed to archive"));
        }
        other => panic!("unexpected relocation {:?}", other),
    }
    assert!(quarantined.exists());
    assert!(!request.path().exists());
    assert_eq!(std::fs::read_to_string(&occupied).unwrap(), "earlier file");
}

#[test]
fn test_in_place_rename_replaces_previous_error_file() {
    let inbox = TestInbox::new();
    let archiver = create_test_archiver();
    let request = inbox.drop_file("", "orders.csv", "new");

    let occupied = inbox.archived("errors", "", "orders.csv");
    std::fs::create_dir_all(occupied.parent().unwrap()).unwrap();
    std::fs::write(&occupied, "old").unwrap();

    let stale = inbox
        .inbox()
        .join("20240315-0905-AlreadyExists-orders.csv.error");
    std::fs::write(&stale, "stale").unwrap();

    let relocation = archiver.archive(&request, ArchiveTarget::Errors);

    assert!(matches!(relocation, Relocation::Quarantined { ref path, .. } if *path == stale));
    assert_eq!(std::fs::read_to_string(&stale).unwrap(), "new");
    assert_eq!(std::fs::read_to_string(&occupied).unwrap(), "old");
}

#[test]
fn test_missing_source_is_stranded() {
    let inbox = TestInbox::new();
    let archiver = create_test_archiver();
    let request = FileRequest::new(inbox.inbox().join("gone.csv"), inbox.inbox(), CLIENT);

    let relocation = archiver.archive(&request, ArchiveTarget::Errors);

    match relocation {
        Relocation::Stranded { cause } => assert!(cause.contains("in-place rename failed")),
        other => panic!("unexpected relocation {:?}", other),
    }
}
