//! Undo/redo over sequences of recorded edits
//!
//! This tests:
//! - Group replay order
//! - Coalescing of raw history items
//! - Undo-all/redo-all symmetry over random edit sequences, including
//!   locks and coalesced drags

use anyhow::Result;
use guide_editor::{
    props, ComponentDescriptor, ComponentId, ComponentType, Data, EditSession, EditorConfig, GroupOptions,
    HistoryItem, InteractionDetail, InteractionEvent, InteractionKind, ManualClock, PagePosition,
};
use proptest::prelude::*;
use serde_json::json;
use std::rc::Rc;

fn guide() -> ComponentDescriptor {
    ComponentDescriptor::new(ComponentType::SCENARIO).with_id("s1").with_child(
        ComponentDescriptor::new(ComponentType::BLOCK)
            .with_id("b1")
            .with_child(
                ComponentDescriptor::new(ComponentType::PAGE)
                    .with_id("p1")
                    .with(props::START_TIME, 0.0)
                    .with(props::END_TIME, 100.0)
                    .with_child(ComponentDescriptor::new(ComponentType::TEXT).with_id("t1"))
                    .with_child(ComponentDescriptor::new(ComponentType::IMAGE).with_id("i1")),
            ),
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn session() -> Result<(EditSession, Rc<ManualClock>)> {
    init_tracing();
    let clock = Rc::new(ManualClock::default());
    let mut session = EditSession::with_clock(EditorConfig::default(), clock.clone());
    session.load(&guide())?;
    Ok((session, clock))
}

fn data(value: serde_json::Value) -> Data {
    value.as_object().cloned().unwrap_or_default()
}

fn name_of(session: &EditSession, id: &str) -> serde_json::Value {
    session.store().component(&id.into()).unwrap().get(props::NAME).cloned().unwrap()
}

/// Push a raw item renaming `id` from `old` to `new`
fn push_rename(session: &mut EditSession, id: &str, old: &str, new: &str, coalesce_id: Option<&str>) -> Result<()> {
    session
        .store_mut()
        .update_component(&id.into(), data(json!({ "name": new })))?;

    let (undo_id, redo_id) = (ComponentId::new(id), ComponentId::new(id));
    let (old, new) = (old.to_string(), new.to_string());
    let mut item = HistoryItem::new(
        move |s: &mut EditSession| s.store_mut().update_component(&undo_id, data(json!({ "name": old }))).map(drop),
        move |s: &mut EditSession| s.store_mut().update_component(&redo_id, data(json!({ "name": new }))).map(drop),
    );
    if let Some(coalesce_id) = coalesce_id {
        item = item.with_coalesce_id(coalesce_id);
    }
    session.history_mut().push(item);
    Ok(())
}

#[test]
fn test_coalescing_keeps_first_undo() -> Result<()> {
    let (mut session, _) = session()?;

    push_rename(&mut session, "t1", "", "a", Some("rename:t1"))?;
    push_rename(&mut session, "t1", "a", "ab", Some("rename:t1"))?;
    push_rename(&mut session, "t1", "ab", "abc", Some("rename:t1"))?;
    assert_eq!(session.history().len(), 1);

    session.undo()?;
    assert_eq!(name_of(&session, "t1"), json!(""));

    session.redo()?;
    assert_eq!(name_of(&session, "t1"), json!("abc"));
    Ok(())
}

#[test]
fn test_coalescing_requires_matching_id_and_window() -> Result<()> {
    let (mut session, clock) = session()?;

    push_rename(&mut session, "t1", "", "a", Some("rename:t1"))?;
    push_rename(&mut session, "i1", "", "b", Some("rename:i1"))?;
    clock.advance_ms(751);
    push_rename(&mut session, "i1", "b", "c", Some("rename:i1"))?;
    push_rename(&mut session, "i1", "c", "d", None)?;

    assert_eq!(session.history().len(), 4);
    Ok(())
}

#[test]
fn test_group_replays_in_reverse() -> Result<()> {
    let (mut session, _) = session()?;

    session.history_mut().start_group(GroupOptions::default());
    push_rename(&mut session, "t1", "", "one", None)?;
    push_rename(&mut session, "t1", "one", "two", None)?;
    push_rename(&mut session, "i1", "", "three", None)?;
    session.history_mut().end_group(false);
    assert_eq!(session.history().len(), 1);

    session.undo()?;
    assert_eq!(name_of(&session, "t1"), json!(""));
    assert_eq!(name_of(&session, "i1"), json!(""));

    session.redo()?;
    assert_eq!(name_of(&session, "t1"), json!("two"));
    assert_eq!(name_of(&session, "i1"), json!("three"));
    Ok(())
}

#[test]
fn test_discarded_group_is_not_recorded() -> Result<()> {
    let (mut session, _) = session()?;

    session.history_mut().start_group(GroupOptions::coalescing("gesture"));
    push_rename(&mut session, "t1", "", "tmp", None)?;
    session.history_mut().end_group(true);

    assert!(!session.history().can_undo());
    Ok(())
}

#[test]
fn test_push_after_undo_drops_redo_tail() -> Result<()> {
    let (mut session, _) = session()?;

    push_rename(&mut session, "t1", "", "a", None)?;
    push_rename(&mut session, "t1", "a", "b", None)?;
    session.undo()?;
    assert!(session.history().can_redo());

    push_rename(&mut session, "t1", "a", "c", None)?;
    assert!(!session.history().can_redo());
    assert_eq!(session.history().len(), 2);
    Ok(())
}

#[test]
fn test_history_max_levels_trims_oldest() -> Result<()> {
    let clock = Rc::new(ManualClock::default());
    let config = EditorConfig {
        history_max_levels: 3,
        ..EditorConfig::default()
    };
    let mut session = EditSession::with_clock(config, clock);
    session.load(&guide())?;

    for x in 1..=5 {
        session.update_component(&"t1".into(), data(json!({ "x": x })))?;
    }
    assert_eq!(session.history().len(), 3);

    while session.undo()? {}
    let x = session.store().component(&"t1".into()).unwrap().get(props::X).cloned();
    assert_eq!(x, Some(json!(2)));
    Ok(())
}

#[derive(Debug, Clone)]
enum Edit {
    AddText { page: usize },
    MoveX { target: usize, x: i16 },
    Rename { target: usize, name: String },
    Delete { target: usize },
    Reparent { target: usize, page: usize, index: usize },
    SplitPage { page: usize, time: u8, after: bool },
    RetimePage { page: usize, start: u8 },
    Lock { target: usize },
    Unlock { target: usize },
    Drag { target: usize, x: i16, y: i16, pause_ms: u16 },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..4usize).prop_map(|page| Edit::AddText { page }),
        (0..8usize, -500i16..500).prop_map(|(target, x)| Edit::MoveX { target, x }),
        (0..8usize, "[a-z]{1,6}").prop_map(|(target, name)| Edit::Rename { target, name }),
        (0..8usize).prop_map(|target| Edit::Delete { target }),
        (0..8usize, 0..4usize, 0..4usize).prop_map(|(target, page, index)| Edit::Reparent { target, page, index }),
        (0..4usize, 0..100u8, any::<bool>()).prop_map(|(page, time, after)| Edit::SplitPage { page, time, after }),
        (0..4usize, 0..100u8).prop_map(|(page, start)| Edit::RetimePage { page, start }),
        (0..8usize).prop_map(|target| Edit::Lock { target }),
        (0..8usize).prop_map(|target| Edit::Unlock { target }),
        (0..8usize, -50i16..50, -50i16..50, 0..1500u16)
            .prop_map(|(target, x, y, pause_ms)| Edit::Drag { target, x, y, pause_ms }),
    ]
}

fn attached_of(session: &EditSession, kinds: &[ComponentType]) -> Vec<ComponentId> {
    let store = session.store();
    store
        .subtree(&"s1".into())
        .into_iter()
        .filter(|id| store.component(id).is_some_and(|c| kinds.contains(c.kind())))
        .collect()
}

fn pick(ids: &[ComponentId], index: usize) -> Option<ComponentId> {
    (!ids.is_empty()).then(|| ids[index % ids.len()].clone())
}

fn drag(session: &mut EditSession, id: &ComponentId, x: f64, y: f64) -> guide_editor::EditorResult<()> {
    let start = InteractionEvent::new(id.clone(), InteractionKind::DragStart, InteractionDetail::default());
    if session.handle_interaction(&start)? {
        let end = InteractionEvent::new(id.clone(), InteractionKind::DragEnd, InteractionDetail::position(x, y));
        session.handle_interaction(&end)?;
    }
    Ok(())
}

/// Apply an edit; rejected edits are part of the exercise
fn apply(session: &mut EditSession, clock: &ManualClock, edit: &Edit) {
    let pages = attached_of(session, &[ComponentType::PAGE]);
    let elements = attached_of(session, &[ComponentType::TEXT, ComponentType::IMAGE]);

    let _ = match edit {
        Edit::AddText { page } => match pick(&pages, *page) {
            Some(page) => session
                .add_component(&ComponentDescriptor::new(ComponentType::TEXT), &page, None)
                .map(drop),
            None => Ok(()),
        },
        Edit::MoveX { target, x } => match pick(&elements, *target) {
            Some(id) => session.update_component(&id, data(json!({ "x": x }))).map(drop),
            None => Ok(()),
        },
        Edit::Rename { target, name } => match pick(&elements, *target) {
            Some(id) => session.update_component(&id, data(json!({ "name": name }))).map(drop),
            None => Ok(()),
        },
        Edit::Delete { target } => {
            let candidates: Vec<ComponentId> = pages.iter().chain(elements.iter()).cloned().collect();
            match pick(&candidates, *target) {
                Some(id) => session.delete_components(&[id]).map(drop),
                None => Ok(()),
            }
        }
        Edit::Reparent { target, page, index } => match (pick(&elements, *target), pick(&pages, *page)) {
            (Some(id), Some(page)) => session.move_component(&id, &page, Some(*index)),
            _ => Ok(()),
        },
        Edit::SplitPage { page, time, after } => match pick(&pages, *page) {
            Some(page) => {
                session.set_media_time(f64::from(*time));
                let position = if *after { PagePosition::After } else { PagePosition::Before };
                session.add_sibling_page(&page, position).map(drop)
            }
            None => Ok(()),
        },
        Edit::RetimePage { page, start } => match pick(&pages, *page) {
            Some(page) => session
                .update_component(&page, data(json!({ "start-time": f64::from(*start) })))
                .map(drop),
            None => Ok(()),
        },
        Edit::Lock { target } => match pick(&elements, *target) {
            Some(id) => session.lock_component(&id),
            None => Ok(()),
        },
        Edit::Unlock { target } => {
            if let Some(id) = pick(&elements, *target) {
                session.unlock_component(&id);
            }
            Ok(())
        }
        Edit::Drag { target, x, y, pause_ms } => {
            clock.advance_ms(i64::from(*pause_ms));
            match pick(&elements, *target) {
                Some(id) => drag(session, &id, f64::from(*x), f64::from(*y)),
                None => Ok(()),
            }
        }
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_all_then_redo_all_is_symmetric(edits in prop::collection::vec(edit_strategy(), 1..30)) {
        let (mut session, clock) = session().unwrap();
        let initial = session.serialize().unwrap();

        for edit in &edits {
            apply(&mut session, &clock, edit);
        }
        let edited = session.serialize().unwrap();
        let steps = session.history().len();

        for _ in 0..steps {
            prop_assert!(session.undo().unwrap());
        }
        prop_assert!(!session.history().can_undo());
        prop_assert_eq!(session.serialize().unwrap(), initial);

        for _ in 0..steps {
            prop_assert!(session.redo().unwrap());
        }
        prop_assert!(!session.history().can_redo());
        prop_assert_eq!(session.serialize().unwrap(), edited);
    }
}
