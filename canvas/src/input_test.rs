use super::*;

// =============================================================
// Modifiers / Button / Key
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift && !m.ctrl && !m.alt && !m.meta);
    assert!(!m.relation_chord());
}

#[test]
fn relation_chord_accepts_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Modifiers::default() }.relation_chord());
    assert!(Modifiers { meta: true, ..Modifiers::default() }.relation_chord());
    assert!(!Modifiers { shift: true, alt: true, ..Modifiers::default() }.relation_chord());
}

#[test]
fn button_from_dom_codes() {
    assert_eq!(Button::from_dom(0), Button::Primary);
    assert_eq!(Button::from_dom(1), Button::Middle);
    assert_eq!(Button::from_dom(2), Button::Secondary);
    assert_eq!(Button::from_dom(7), Button::Primary);
}

#[test]
fn escape_key_names() {
    assert!(Key("Escape".into()).is_escape());
    assert!(Key("Esc".into()).is_escape());
    assert!(!Key("Enter".into()).is_escape());
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert_eq!(InputState::default(), InputState::Idle);
}

#[test]
fn placing_states_are_relation_mode() {
    let from = PersonId(1);
    assert!(InputState::PlacingRelationFrom.is_placing_relation());
    assert!(InputState::PlacingRelationTo { from }.is_placing_relation());
    assert!(InputState::AwaitingLabel { from, to: PersonId(2) }.is_placing_relation());
    assert!(!InputState::Idle.is_placing_relation());
    assert!(!InputState::Pinching { last_distance: 10.0 }.is_placing_relation());
}

#[test]
fn drag_states_are_dragging() {
    let node = InputState::DraggingNode { id: PersonId(1), grab_dx: 0.0, grab_dy: 0.0, moved: false };
    let label = InputState::DraggingLabel { id: RelationshipId(1), grab_dx: 0.0, grab_dy: 0.0, moved: true };
    let pan = InputState::Panning { last_screen: Point::new(0.0, 0.0) };
    assert!(node.is_dragging() && label.is_dragging() && pan.is_dragging());
    assert!(!InputState::PlacingRelationFrom.is_dragging());
}

#[test]
fn relation_highlight_tracks_chosen_ends() {
    assert_eq!(InputState::Idle.relation_highlight(), (None, None));
    assert_eq!(InputState::PlacingRelationFrom.relation_highlight(), (None, None));
    assert_eq!(
        InputState::PlacingRelationTo { from: PersonId(3) }.relation_highlight(),
        (Some(PersonId(3)), None)
    );
    assert_eq!(
        InputState::AwaitingLabel { from: PersonId(3), to: PersonId(4) }.relation_highlight(),
        (Some(PersonId(3)), Some(PersonId(4)))
    );
}
