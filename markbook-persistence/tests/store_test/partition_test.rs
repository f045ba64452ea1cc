use markbook_entity::PartitionId;
use markbook_persistence::PersistenceError;

use super::util::{make_test_book, make_test_note, notebook_db};

#[test]
fn partitions_are_invisible_to_each_other() {
  let test = notebook_db();
  let u1 = PartitionId::from("u1");
  let u2 = PartitionId::from("u2");

  let book = test
    .db
    .insert_book(&u1, make_test_book("b1", "Work"))
    .unwrap();
  test
    .db
    .insert_note(&u1, make_test_note("n1", "b1", "# Hi"))
    .unwrap();

  let snapshot = test.db.get_all(&u2).unwrap();
  assert!(snapshot.books.is_empty());
  assert!(snapshot.notes.is_empty());
  assert!(test.db.get_book_by_id(&u2, &book.id).unwrap().is_none());
  assert!(test.db.get_note_by_id(&u2, "n1").unwrap().is_none());

  let snapshot = test.db.get_all(&u1).unwrap();
  assert_eq!(snapshot.books.len(), 1);
  assert_eq!(snapshot.notes.len(), 1);
}

#[test]
fn delete_book_scenario_leaves_partition_empty() {
  let test = notebook_db();
  let u1 = PartitionId::from("u1");
  let u2 = PartitionId::from("u2");

  test
    .db
    .insert_book(&u1, make_test_book("b1", "Work"))
    .unwrap();
  test
    .db
    .insert_note(&u1, make_test_note("n1", "b1", "# Hi"))
    .unwrap();

  let snapshot = test.db.get_all(&u2).unwrap();
  assert!(snapshot.books.is_empty() && snapshot.notes.is_empty());

  test.db.delete_book(&u1, "b1").unwrap();
  let snapshot = test.db.get_all(&u1).unwrap();
  assert!(snapshot.books.is_empty() && snapshot.notes.is_empty());
}

#[test]
fn update_of_foreign_record_rejects() {
  let test = notebook_db();
  let u1 = PartitionId::from("u1");
  let u2 = PartitionId::from("u2");

  let book = test
    .db
    .insert_book(&u1, make_test_book("b1", "Work"))
    .unwrap();

  let mut stolen = book.clone();
  stolen.name = "Mine now".to_string();
  let err = test.db.update_book(&u2, stolen).unwrap_err();
  assert!(matches!(err, PersistenceError::RecordNotFound));

  // Unchanged for the owner.
  let fetched = test.db.get_book_by_id(&u1, &book.id).unwrap().unwrap();
  assert_eq!(fetched.name, "Work");
}

#[test]
fn clear_partition_spares_other_partitions() {
  let test = notebook_db();
  let u1 = PartitionId::from("u1");
  let u2 = PartitionId::from("u2");

  test
    .db
    .insert_book(&u1, make_test_book("b1", "Work"))
    .unwrap();
  test
    .db
    .insert_note(&u1, make_test_note("n1", "b1", "# Hi"))
    .unwrap();
  test
    .db
    .insert_book(&u2, make_test_book("b2", "Home"))
    .unwrap();

  test.db.clear_partition(&u1).unwrap();

  let snapshot = test.db.get_all(&u1).unwrap();
  assert!(snapshot.books.is_empty() && snapshot.notes.is_empty());
  let snapshot = test.db.get_all(&u2).unwrap();
  assert_eq!(snapshot.books.len(), 1);
}

#[test]
fn initialized_flag_lifecycle() {
  let test = notebook_db();
  let uid = PartitionId::from("u1");

  assert!(!test.db.is_initialized(&uid).unwrap());

  // An empty save is not a seed.
  test.db.save_all(&uid, vec![], vec![]).unwrap();
  assert!(!test.db.is_initialized(&uid).unwrap());

  test
    .db
    .save_all(&uid, vec![make_test_book("b1", "Work")], vec![])
    .unwrap();
  assert!(test.db.is_initialized(&uid).unwrap());

  // Clearing the data afterwards keeps the flag: "seeded but empty" is
  // not the same as "never seeded".
  test.db.clear_partition(&uid).unwrap();
  assert!(test.db.is_initialized(&uid).unwrap());
  let snapshot = test.db.get_all(&uid).unwrap();
  assert!(snapshot.books.is_empty());
}

#[test]
fn initialized_flag_is_per_partition() {
  let test = notebook_db();
  let u1 = PartitionId::from("u1");
  let u2 = PartitionId::from("u2");

  test
    .db
    .save_all(&u1, vec![make_test_book("b1", "Work")], vec![])
    .unwrap();
  assert!(test.db.is_initialized(&u1).unwrap());
  assert!(!test.db.is_initialized(&u2).unwrap());
}

#[test]
fn anonymous_is_a_partition_like_any_other() {
  let test = notebook_db();
  let anon = PartitionId::anonymous();
  let u1 = PartitionId::from("u1");

  test
    .db
    .insert_book(&anon, make_test_book("b1", "Scratch"))
    .unwrap();
  assert!(test.db.get_book_by_id(&u1, "b1").unwrap().is_none());
  assert_eq!(test.db.get_all(&anon).unwrap().books.len(), 1);
}
