use keepsake::models::{Attachment, Record, RecordDetails, RecordKind, User};
use keepsake::store::{Database, RecordSort, StoreError};

fn test_db() -> Database {
    Database::open_in_memory().expect("in-memory database should open")
}

fn add_user(db: &Database, username: &str) -> User {
    let user = User::new(username, &format!("{}@example.com", username), "hash");
    db.user_repo().insert(&user).expect("user insert");
    user
}

fn add_payment(db: &Database, owner: &User, name: &str) -> Record {
    let record = Record::new(
        &owner.id,
        name,
        "",
        RecordDetails::empty_for(RecordKind::Payment),
    );
    db.record_repo().insert(&record).expect("record insert");
    record
}

fn attach_file(db: &Database, owner: &User, record: &Record, file_name: &str) -> Attachment {
    let attachment = Attachment::new(
        &owner.id,
        &record.id,
        file_name,
        &format!("{}/{}.pdf", owner.id, file_name),
        "application/pdf",
        1024,
        "",
    );
    db.attachment_repo()
        .insert(&attachment, &owner.id)
        .expect("attachment insert");
    attachment
}

#[test]
fn owner_reads_their_own_record() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let record = add_payment(&db, &anna, "Rent");

    let fetched = db
        .record_repo()
        .fetch_readable(&record.id, &anna.id)
        .expect("owner read");
    assert_eq!(fetched.name, "Rent");
    assert_eq!(fetched.kind, RecordKind::Payment);
}

#[test]
fn stranger_without_grant_is_forbidden() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let record = add_payment(&db, &anna, "Rent");

    let err = db
        .record_repo()
        .fetch_readable(&record.id, &piotr.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));
}

#[test]
fn grant_then_revoke_toggles_read_access() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let record = add_payment(&db, &anna, "Rent");

    db.share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .expect("grant");
    assert!(db.share_repo().has_grant(&record.id, &piotr.id).unwrap());
    db.record_repo()
        .fetch_readable(&record.id, &piotr.id)
        .expect("grantee read");

    let grants = db
        .share_repo()
        .grants_for_record(&record.id, &anna.id)
        .expect("grant listing");
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].grantee_username, "piotrkowalski");

    db.share_repo()
        .revoke(&grants[0].id, &anna.id)
        .expect("revoke");
    let err = db
        .record_repo()
        .fetch_readable(&record.id, &piotr.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));
}

#[test]
fn grant_never_confers_write_access() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let mut record = add_payment(&db, &anna, "Rent");
    db.share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .expect("grant");

    record.name = "Hijacked".into();
    let err = db.record_repo().update(&record, &piotr.id).unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    let err = db.record_repo().delete(&record.id, &piotr.id).unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    // The record is untouched.
    let fetched = db.record_repo().fetch_readable(&record.id, &anna.id).unwrap();
    assert_eq!(fetched.name, "Rent");
}

#[test]
fn only_the_owner_may_grant_or_revoke() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let marta = add_user(&db, "martawisniewska");
    let record = add_payment(&db, &anna, "Rent");

    let err = db
        .share_repo()
        .grant(&record.id, &piotr.id, &marta.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    db.share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .expect("grant");
    let grants = db
        .share_repo()
        .grants_for_record(&record.id, &anna.id)
        .unwrap();
    let err = db.share_repo().revoke(&grants[0].id, &piotr.id).unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));
}

#[test]
fn sharing_with_yourself_is_rejected() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let record = add_payment(&db, &anna, "Rent");

    let err = db
        .share_repo()
        .grant(&record.id, &anna.id, &anna.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn duplicate_grant_is_a_conflict() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let record = add_payment(&db, &anna, "Rent");

    db.share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .expect("grant");
    let err = db
        .share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn deleting_a_record_cascades_to_attachments_and_grants() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let record = add_payment(&db, &anna, "Rent");
    let attachment = attach_file(&db, &anna, &record, "invoice");
    db.share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .expect("grant");

    db.record_repo().delete(&record.id, &anna.id).expect("delete");

    let err = db
        .attachment_repo()
        .fetch_owned(&attachment.id, &anna.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    assert!(!db.share_repo().has_grant(&record.id, &piotr.id).unwrap());
    assert!(db.record_repo().list_shared_with(&piotr.id).unwrap().is_empty());
}

#[test]
fn deleting_a_user_cascades_to_their_records() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let record = add_payment(&db, &anna, "Rent");
    db.share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .expect("grant");

    db.user_repo().delete(&anna.id).expect("user delete");

    let err = db
        .record_repo()
        .fetch_readable(&record.id, &piotr.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    assert!(db.record_repo().list_shared_with(&piotr.id).unwrap().is_empty());
}

#[test]
fn duplicate_username_is_a_conflict() {
    let db = test_db();
    add_user(&db, "annanowak1");
    let again = User::new("annanowak1", "other@example.com", "hash");
    let err = db.user_repo().insert(&again).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn duplicate_email_is_a_conflict() {
    let db = test_db();
    add_user(&db, "annanowak1");
    let again = User::new("someoneelse1", "annanowak1@example.com", "hash");
    let err = db.user_repo().insert(&again).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn list_for_owner_filters_by_kind_and_sorts_by_name() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    add_payment(&db, &anna, "Rent");
    add_payment(&db, &anna, "Electricity");
    let trip = Record::new(&anna.id, "Lisbon", "", RecordDetails::empty_for(RecordKind::Trip));
    db.record_repo().insert(&trip).expect("trip insert");

    let payments = db
        .record_repo()
        .list_for_owner(&anna.id, Some(RecordKind::Payment), RecordSort::NameAsc)
        .unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].name, "Electricity");
    assert_eq!(payments[1].name, "Rent");

    let all = db
        .record_repo()
        .list_for_owner(&anna.id, None, RecordSort::default())
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn shared_listing_is_grouped_by_owner_username() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let marta = add_user(&db, "martawisniewska");
    let piotr = add_user(&db, "piotrkowalski");

    let rent = add_payment(&db, &anna, "Rent");
    let lisbon = Record::new(&marta.id, "Lisbon", "", RecordDetails::empty_for(RecordKind::Trip));
    db.record_repo().insert(&lisbon).expect("trip insert");

    db.share_repo().grant(&rent.id, &anna.id, &piotr.id).unwrap();
    db.share_repo().grant(&lisbon.id, &marta.id, &piotr.id).unwrap();

    let shared = db.record_repo().list_shared_with(&piotr.id).unwrap();
    assert_eq!(shared.len(), 2);
    assert_eq!(shared[0].owner_username, "annanowak1");
    assert_eq!(shared[1].owner_username, "martawisniewska");
}

#[test]
fn attachment_read_follows_the_record_grant() {
    let db = test_db();
    let anna = add_user(&db, "annanowak1");
    let piotr = add_user(&db, "piotrkowalski");
    let record = add_payment(&db, &anna, "Rent");
    let attachment = attach_file(&db, &anna, &record, "invoice");

    let err = db
        .attachment_repo()
        .fetch_readable(&attachment.id, &piotr.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));

    db.share_repo().grant(&record.id, &anna.id, &piotr.id).unwrap();
    db.attachment_repo()
        .fetch_readable(&attachment.id, &piotr.id)
        .expect("grantee download");

    // Read access never lets a grantee remove the file.
    let err = db
        .attachment_repo()
        .delete(&attachment.id, &piotr.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden));
}
