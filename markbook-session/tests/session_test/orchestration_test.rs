use markbook_entity::{Book, BookUpdate};
use markbook_session::error::SessionError;
use markbook_session::StateChange;

use super::util::{session_over, session_with_uid};

#[tokio::test]
async fn mutations_land_in_cache_after_store_confirms() {
  let test = session_with_uid("u1");

  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  let note = test.session.add_note(&book.id, "# Hi").await.unwrap();

  let state = test.session.state();
  assert_eq!(state.books.len(), 1);
  assert_eq!(state.notes.len(), 1);
  assert_eq!(state.notes_in_book(&book.id), vec![&note]);

  // A fresh session over the same store sees the durable copy.
  let reloaded = session_over(test.db.clone(), "u1");
  reloaded.load_all().await.unwrap();
  let state = reloaded.state();
  assert_eq!(state.books.len(), 1);
  assert_eq!(state.notes.len(), 1);
}

#[tokio::test]
async fn failed_store_call_leaves_cache_untouched() {
  let test = session_with_uid("u1");
  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  let before = test.session.state();

  // Unknown target book: rejected before anything is written.
  let err = test.session.add_note("missing", "# nope").await.unwrap_err();
  assert!(matches!(err, SessionError::UnknownBook(_)));
  assert_eq!(test.session.state(), before);

  // Duplicate id: the store rejects, the cache must not double the book.
  let err = test.session.add_book(book.clone()).await.unwrap_err();
  assert!(matches!(err, SessionError::Persistence(_)));
  assert_eq!(test.session.state(), before);

  let err = test
    .session
    .update_book("missing", BookUpdate::default().name("Ghost"))
    .await
    .unwrap_err();
  assert!(matches!(err, SessionError::UnknownBook(_)));
  assert_eq!(test.session.state(), before);
}

#[tokio::test]
async fn update_flows_through_store_then_cache() {
  let test = session_with_uid("u1");
  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  let note = test.session.add_note(&book.id, "# Hi").await.unwrap();

  let updated = test
    .session
    .update_note(&note.id, "# Hi, edited")
    .await
    .unwrap();
  assert!(updated.updated_at > note.updated_at);

  let state = test.session.state();
  let cached = state.note(&note.id).unwrap();
  assert_eq!(cached.content, "# Hi, edited");
  assert_eq!(cached.updated_at, updated.updated_at);

  let renamed = test
    .session
    .update_book(&book.id, BookUpdate::default().name("Work journal"))
    .await
    .unwrap();
  assert_eq!(test.session.state().book(&book.id).unwrap().name, "Work journal");
  assert!(renamed.updated_at > book.updated_at);
}

#[tokio::test]
async fn move_note_updates_cache_and_store() {
  let test = session_with_uid("u1");
  let work = test.session.add_book(Book::new("Work")).await.unwrap();
  let home = test.session.add_book(Book::new("Home")).await.unwrap();
  let note = test.session.add_note(&work.id, "# Hi").await.unwrap();

  let moved = test.session.move_note(&note.id, &home.id).await.unwrap();
  assert_eq!(moved.book_id, home.id);
  assert_eq!(test.session.state().notes_in_book(&home.id).len(), 1);
  assert!(test.session.state().notes_in_book(&work.id).is_empty());

  // Move to a missing book fails with the cache untouched.
  let before = test.session.state();
  assert!(test.session.move_note(&note.id, "missing").await.is_err());
  assert_eq!(test.session.state(), before);
}

#[tokio::test]
async fn delete_book_relies_on_durable_cascade() {
  let test = session_with_uid("u1");
  let work = test.session.add_book(Book::new("Work")).await.unwrap();
  test.session.add_note(&work.id, "# one").await.unwrap();
  test.session.add_note(&work.id, "# two").await.unwrap();

  test.session.delete_book(&work.id).await.unwrap();

  // The cache drops the book immediately; its notes dangle until the
  // next load and every per-book read filters them out.
  let state = test.session.state();
  assert!(state.book(&work.id).is_none());
  assert_eq!(state.notes.len(), 2);

  test.session.load_all().await.unwrap();
  assert!(test.session.state().notes.is_empty());
}

#[tokio::test]
async fn selection_is_immediate_and_skips_the_store() {
  let test = session_with_uid("u1");
  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  let note = test.session.add_note(&book.id, "# Hi").await.unwrap();

  test.session.select_book(Some(book.id.clone()));
  test.session.select_note(Some(note.id.clone()));
  let state = test.session.state();
  assert_eq!(state.selected_book().unwrap().id, book.id);
  assert_eq!(state.selected_note().unwrap().id, note.id);

  test.session.delete_note(&note.id).await.unwrap();
  assert!(test.session.state().selected_note().is_none());
}

#[tokio::test]
async fn change_broadcast_follows_confirmed_mutations() {
  let test = session_with_uid("u1");
  let mut rx = test.session.subscribe();

  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  match rx.try_recv().unwrap() {
    StateChange::DidAddBook { book: changed } => assert_eq!(changed.id, book.id),
    other => panic!("unexpected change: {:?}", other),
  }

  // A failed mutation must not notify anyone.
  assert!(test.session.add_note("missing", "# nope").await.is_err());
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn clear_all_empties_cache_and_store() {
  let test = session_with_uid("u1");
  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  test.session.add_note(&book.id, "# Hi").await.unwrap();
  test.session.select_book(Some(book.id.clone()));

  test.session.clear_all().await.unwrap();

  let state = test.session.state();
  assert!(state.books.is_empty() && state.notes.is_empty());
  assert!(state.selected_book_id.is_none() && state.selected_note_id.is_none());

  let reloaded = session_over(test.db.clone(), "u1");
  reloaded.load_all().await.unwrap();
  assert!(reloaded.state().books.is_empty());
}

#[tokio::test]
async fn partitions_do_not_bleed_between_sessions() {
  let test = session_with_uid("u1");
  let book = test.session.add_book(Book::new("Work")).await.unwrap();
  test.session.add_note(&book.id, "# Hi").await.unwrap();

  let other = session_over(test.db.clone(), "u2");
  other.load_all().await.unwrap();
  let state = other.state();
  assert!(state.books.is_empty() && state.notes.is_empty());
}
