//! Transform algebra and derived view tests.

use proptest::prelude::*;

use tile_rules::core::{KindCounts, RuleId};
use tile_rules::rules::{
    Attribute, ButtonArg, CommandType, Coord, Direction, MoveArg, Rule, RuleType, RuleView,
    Symmetry, Transform,
};

const KINDS: KindCounts = KindCounts::new(2, 3);

fn coord() -> impl Strategy<Value = Coord> {
    (0u8..5, 0u8..5).prop_map(|(col, row)| Coord::new(col, row))
}

fn direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_mirrors_are_involutions(c in coord(), d in direction()) {
        for t in [Transform::HorzMirror, Transform::VertMirror, Transform::DoubleRotate] {
            prop_assert_eq!(t.apply_coord(t.apply_coord(c)), c);
            prop_assert_eq!(t.apply_direction(t.apply_direction(d)), d);
        }
    }

    #[test]
    fn prop_inverse_undoes(c in coord(), d in direction()) {
        for t in Transform::ALL {
            prop_assert_eq!(t.inverse().apply_coord(t.apply_coord(c)), c);
            prop_assert_eq!(t.inverse().apply_direction(t.apply_direction(d)), d);
        }
    }

    #[test]
    fn prop_quarter_turns_compose(c in coord(), d in direction()) {
        let left = Transform::LeftRotate;
        let right = Transform::RightRotate;
        let double = Transform::DoubleRotate;

        prop_assert_eq!(right.apply_coord(left.apply_coord(c)), c);
        prop_assert_eq!(left.apply_coord(left.apply_coord(c)), double.apply_coord(c));
        prop_assert_eq!(right.apply_coord(right.apply_coord(c)), double.apply_coord(c));
        prop_assert_eq!(
            left.apply_direction(left.apply_direction(d)),
            double.apply_direction(d)
        );
    }

    #[test]
    fn prop_transforms_keep_distance(c in coord()) {
        for t in Transform::ALL {
            prop_assert_eq!(t.apply_coord(c).distance(), c.distance());
        }
    }
}

#[test]
fn test_non_cardinal_directions_are_fixed() {
    for t in Transform::ALL {
        for d in [Direction::Resting, Direction::Moving, Direction::AnyDir] {
            assert_eq!(t.apply_direction(d), d);
        }
        assert_eq!(t.apply_coord(Coord::CENTER), Coord::CENTER);
        assert_eq!(t.apply_button(ButtonArg::A), ButtonArg::A);
        assert_eq!(t.apply_move_arg(MoveArg::UTurn), MoveArg::UTurn);
    }
}

#[test]
fn test_derived_view_counts() {
    let expected = [
        (Symmetry::None, 0),
        (Symmetry::HorzMirror, 1),
        (Symmetry::VertMirror, 1),
        (Symmetry::LeftRotate, 1),
        (Symmetry::DoubleRotate, 1),
        (Symmetry::RightRotate, 1),
        (Symmetry::Rotate3Way, 3),
    ];
    for (symmetry, count) in expected {
        let rule = Rule::new(RuleType::ContextChange, 0).with_symmetry(symmetry);
        let view = RuleView::new(&rule, RuleId(7), KINDS);
        assert_eq!(view.derived_views().len(), count, "{symmetry:?}");
        assert_eq!(view.all_views().len(), count + 1);
    }
}

/// One stored entry, three rotated projections, no duplicated data.
#[test]
fn test_rotate_three_way_projections() {
    let mut rule = Rule::new(RuleType::ContextChange, 0).with_symmetry(Symmetry::Rotate3Way);
    {
        let mut editor = RuleView::new(&mut rule, RuleId(0), KINDS);
        let wd = editor.make_when_do(3, 2).unwrap();
        editor.set_witness_direction(wd, Direction::Right);
        editor.set_sprite_attr(wd, 1, Attribute::Include);
    }
    assert_eq!(rule.when_dos.len(), 1);

    let base = RuleView::new(&rule, RuleId(0), KINDS);
    let views = base.derived_views();
    let expected = [((2, 1), Direction::Up), ((1, 2), Direction::Left), ((2, 3), Direction::Down)];

    for (view, ((col, row), dir)) in views.iter().zip(expected) {
        let wd = view.when_do(col, row).unwrap();
        assert_eq!(wd, 0);
        assert_eq!(view.witness_direction(wd), Some(dir));
        assert_eq!(view.when_do_coord(wd), Some(Coord::new(col, row)));
        assert_eq!(view.sprite_attr(wd, 1), Some(Attribute::Include));
        assert_eq!(view.when_do(3, 2), None);
        assert_eq!(view.source_id(), Some(RuleId(0)));
        assert_eq!(view.rule_id(), None);
    }
}

#[test]
fn test_mirrored_button_rule() {
    let mut rule = Rule::new(RuleType::ButtonPress, ButtonArg::Left.bits())
        .with_symmetry(Symmetry::HorzMirror);
    {
        let mut editor = RuleView::new(&mut rule, RuleId(1), KINDS);
        let wd = editor.make_when_do(2, 2).unwrap();
        editor.set_command_inst(wd, 0, CommandType::Move);
        editor.set_command_arg(wd, 0, MoveArg::Left.bits());
        editor.set_command_inst(wd, 1, CommandType::Move);
        editor.set_command_arg(wd, 1, MoveArg::Stop.bits());
    }

    let base = RuleView::new(&rule, RuleId(1), KINDS);
    let mirrored = base.derived_views()[0];
    assert_eq!(mirrored.button(), Some(ButtonArg::Right));
    assert_eq!(mirrored.dir_from_rule(), Direction::Right);

    let wd = mirrored.when_do(2, 2).unwrap();
    assert_eq!(mirrored.command(wd, 0).map(|c| c.arg), Some(MoveArg::Right.bits()));
    assert_eq!(mirrored.command(wd, 1).map(|c| c.arg), Some(MoveArg::Stop.bits()));
}

/// Editing through a transformed view lands on the stored entry it shows.
#[test]
fn test_write_through_transformed_view() {
    let mut rule = Rule::new(RuleType::ButtonPress, ButtonArg::Up.bits());
    {
        let mut view = RuleView::transformed(&mut rule, Transform::RightRotate, KINDS);
        let wd = view.make_when_do(2, 3).unwrap();
        view.set_witness_direction(wd, Direction::Down);
        view.set_command_inst(wd, 0, CommandType::Move);
        view.set_command_arg(wd, 0, MoveArg::Down.bits());
        view.set_rule_arg(ButtonArg::Right.bits());

        assert_eq!(view.witness_direction(wd), Some(Direction::Down));
        assert_eq!(view.command(wd, 0).map(|c| c.arg), Some(MoveArg::Down.bits()));
        assert_eq!(view.button(), Some(ButtonArg::Right));
    }

    let stored = &rule.when_dos[0];
    assert_eq!(stored.coord, Coord::new(3, 2));
    assert_eq!(stored.direction, Direction::Right);
    assert_eq!(stored.commands[0].arg, MoveArg::Right.bits());
    assert_eq!(rule.rule_arg, ButtonArg::Up.bits());
}
