//! Copy, cut and paste across the component tree

use anyhow::Result;
use guide_editor::{
    props, ComponentDescriptor, ComponentId, ComponentType, Data, EditSession, EditorConfig, ManualClock,
    COMPONENT_FORMAT,
};
use serde_json::json;
use std::collections::HashSet;
use std::rc::Rc;

fn session() -> Result<EditSession> {
    let mut session = EditSession::with_clock(EditorConfig::default(), Rc::new(ManualClock::default()));
    let doc = ComponentDescriptor::new(ComponentType::SCENARIO).with_id("s1").with_child(
        ComponentDescriptor::new(ComponentType::BLOCK)
            .with_id("b1")
            .with(props::SYNCHED, false)
            .with_child(
                ComponentDescriptor::new(ComponentType::PAGE)
                    .with_id("p1")
                    .with_child(
                        ComponentDescriptor::new(ComponentType::TEXT)
                            .with_id("t1")
                            .with("text", "first")
                            .with(props::X, 10.0)
                            .with(props::Y, 20.0),
                    )
                    .with_child(ComponentDescriptor::new(ComponentType::TEXT).with_id("t2").with("text", "second")),
            )
            .with_child(ComponentDescriptor::new(ComponentType::PAGE).with_id("p2")),
    );
    session.load(&doc)?;
    Ok(session)
}

fn without_position(mut data: Data) -> Data {
    data.remove(props::X);
    data.remove(props::Y);
    data
}

#[test]
fn test_copy_paste_round_trip() -> Result<()> {
    let mut session = session()?;
    let t1 = ComponentId::new("t1");
    let existing: HashSet<ComponentId> = session.store().subtree(&"s1".into()).into_iter().collect();

    session.copy_components(&[t1.clone()])?;
    let pasted = session.paste_components(&"p2".into())?;

    assert_eq!(pasted.len(), 1);
    let copy = session.store().component(&pasted[0]).unwrap();
    let original = session.store().component(&t1).unwrap();
    assert!(!existing.contains(copy.id()));
    assert_eq!(copy.parent(), Some(&ComponentId::new("p2")));
    assert_eq!(without_position(copy.data().clone()), without_position(original.data().clone()));
    assert_eq!(copy.get(props::X), Some(&json!(15.0)));
    assert_eq!(copy.get(props::Y), Some(&json!(25.0)));
    assert_eq!(session.selected_ids(), pasted);
    Ok(())
}

#[test]
fn test_copy_keeps_sibling_order() -> Result<()> {
    let mut session = session()?;

    session.copy_components(&["t2".into(), "t1".into()])?;
    let pasted = session.paste_components(&"p2".into())?;

    let texts: Vec<_> = pasted
        .iter()
        .map(|id| session.store().component(id).unwrap().get("text").cloned().unwrap())
        .collect();
    assert_eq!(texts, vec![json!("first"), json!("second")]);
    Ok(())
}

#[test]
fn test_copy_across_parents_follows_document_order() -> Result<()> {
    let mut session = session()?;
    let third = session.add_component(
        &ComponentDescriptor::new(ComponentType::TEXT).with("text", "third"),
        &"p2".into(),
        None,
    )?;

    session.copy_components(&[third, "t2".into()])?;
    let pasted = session.paste_components(&"p1".into())?;

    let texts: Vec<_> = pasted
        .iter()
        .map(|id| session.store().component(id).unwrap().get("text").cloned().unwrap())
        .collect();
    assert_eq!(texts, vec![json!("second"), json!("third")]);
    Ok(())
}

#[test]
fn test_paste_walks_up_to_valid_target() -> Result<()> {
    let mut session = session()?;

    session.copy_components(&["p2".into()])?;
    let pasted = session.paste_components(&"t1".into())?;

    // Text and Page reject pages; the block accepts them
    assert_eq!(pasted.len(), 1);
    assert_eq!(session.store().get_component_parent(&pasted[0]).unwrap().id().as_str(), "b1");
    Ok(())
}

#[test]
fn test_paste_without_valid_target_is_noop() -> Result<()> {
    let mut session = session()?;
    session.copy_components(&["b1".into()])?;

    // A detached page has no ancestor that accepts blocks
    session.store_mut().remove_component(&"p2".into())?;
    let before = session.serialize()?;
    let pasted = session.paste_components(&"p2".into())?;

    assert!(pasted.is_empty());
    assert_eq!(session.serialize()?, before);
    assert!(!session.history().can_undo());
    Ok(())
}

#[test]
fn test_paste_of_nested_subtree_gets_fresh_ids() -> Result<()> {
    let mut session = session()?;

    session.copy_components(&["p1".into()])?;
    let payload = session.clipboard().get_data(COMPONENT_FORMAT).cloned().unwrap();
    assert!(!payload.to_string().contains("\"t1\""));

    let pasted = session.paste_components(&"b1".into())?;
    let subtree = session.store().subtree(&pasted[0]);
    assert_eq!(subtree.len(), 3);
    for id in &subtree {
        assert!(!["p1", "t1", "t2"].contains(&id.as_str()));
    }
    Ok(())
}

#[test]
fn test_cut_is_one_undo_step() -> Result<()> {
    let mut session = session()?;

    session.cut_components(&["t1".into(), "t2".into()])?;
    assert!(session.store().get_component_children(&"p1".into()).is_empty());
    assert_eq!(session.history().len(), 1);

    session.undo()?;
    assert_eq!(session.store().get_component_children(&"p1".into()).len(), 2);

    // The clipboard survives the undo
    let pasted = session.paste_components(&"p2".into())?;
    assert_eq!(pasted.len(), 2);
    Ok(())
}

#[test]
fn test_paste_is_one_undo_step() -> Result<()> {
    let mut session = session()?;
    session.copy_components(&["t1".into(), "t2".into()])?;

    let pasted = session.paste_components(&"p2".into())?;
    assert_eq!(session.history().len(), 1);

    session.undo()?;
    for id in &pasted {
        assert!(!session.store().is_attached(id));
    }
    assert!(session.get_selected_components().is_empty());
    Ok(())
}

#[test]
fn test_paste_page_into_synched_block_keeps_timeline_contiguous() -> Result<()> {
    let mut session = EditSession::with_clock(EditorConfig::default(), Rc::new(ManualClock::default()));
    let doc = ComponentDescriptor::new(ComponentType::SCENARIO).with_id("s1").with_child(
        ComponentDescriptor::new(ComponentType::BLOCK)
            .with_id("b1")
            .with(props::SYNCHED, true)
            .with_child(
                ComponentDescriptor::new(ComponentType::PAGE)
                    .with_id("p1")
                    .with(props::START_TIME, 0.0)
                    .with(props::END_TIME, 5.0)
                    .with_child(ComponentDescriptor::new(ComponentType::TEXT).with_id("t1")),
            )
            .with_child(
                ComponentDescriptor::new(ComponentType::PAGE)
                    .with_id("p2")
                    .with(props::START_TIME, 5.0)
                    .with(props::END_TIME, 10.0),
            ),
    );
    session.load(&doc)?;

    session.copy_components(&["p2".into()])?;
    let pasted = session.paste_components(&"t1".into())?;

    assert_eq!(pasted.len(), 1);
    assert_eq!(session.store().get_component_index(&pasted[0]), Some(1));
    let times: Vec<_> = session
        .store()
        .get_component_children(&"b1".into())
        .into_iter()
        .map(|page| (page.get(props::START_TIME).cloned(), page.get(props::END_TIME).cloned()))
        .collect();
    assert_eq!(
        times,
        vec![
            (Some(json!(0.0)), Some(json!(5.0))),
            (Some(json!(5.0)), Some(json!(5.0))),
            (Some(json!(5.0)), Some(json!(10.0))),
        ]
    );

    session.undo()?;
    assert_eq!(session.store().get_component_children(&"b1".into()).len(), 2);
    Ok(())
}
