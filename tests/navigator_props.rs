//! Property tests for slide navigation and progress arithmetic.

use proptest::prelude::*;
use std::collections::BTreeMap;

use termsession::model::{AnswerState, OptionId, QuestionId};
use termsession::navigator::SlideNavigator;
use termsession::progress::{Progress, ProgressTracker};

#[derive(Debug, Clone, Copy)]
enum Command {
    Next,
    Prev,
    First,
    Last,
    Show(usize),
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Next),
        Just(Command::Prev),
        Just(Command::First),
        Just(Command::Last),
        (0usize..200).prop_map(Command::Show),
    ]
}

proptest! {
    #[test]
    fn position_stays_in_range(len in 0usize..50, commands in prop::collection::vec(arb_command(), 0..64)) {
        let mut nav = SlideNavigator::new(len);
        for command in commands {
            let pos = match command {
                Command::Next => nav.next(),
                Command::Prev => nav.prev(),
                Command::First => nav.first(),
                Command::Last => nav.last(),
                Command::Show(i) => nav.show(i),
            };
            prop_assert_eq!(pos, nav.position());
            if len == 0 {
                prop_assert_eq!(pos, 0);
                prop_assert!(!nav.is_active(0));
            } else {
                prop_assert!(pos < len);
                prop_assert!(nav.is_active(pos));
            }
            prop_assert_eq!(nav.can_prev(), pos > 0);
            prop_assert_eq!(nav.can_next(), pos + 1 < len);
        }
    }

    #[test]
    fn next_then_prev_returns_from_interior(len in 3usize..50, start in 1usize..48) {
        prop_assume!(start + 1 < len);
        let mut nav = SlideNavigator::new(len);
        nav.show(start);
        nav.next();
        prop_assert_eq!(nav.prev(), start);
    }

    #[test]
    fn answered_never_exceeds_total(total in 0usize..40, picks in prop::collection::vec((0u64..60, 0u64..4), 0..80)) {
        let mut map = BTreeMap::new();
        for (q, o) in picks {
            map.insert(QuestionId(q), OptionId(o));
        }
        let distinct = map.len();
        let mut tracker = ProgressTracker::new(total, Vec::new());
        let progress = tracker.recompute(&AnswerState::Choice(map));

        prop_assert_eq!(progress.answered, distinct.min(total));
        prop_assert!(progress.percent() <= 100);
        prop_assert!((0.0..=1.0).contains(&progress.ratio()));
    }

    #[test]
    fn percent_is_within_half_a_point(total in 1usize..500, answered in 0usize..500) {
        let answered = answered.min(total);
        let p = Progress { answered, total };
        let exact = answered as f64 * 100.0 / total as f64;
        prop_assert!((p.percent() as f64 - exact).abs() <= 0.5 + 1e-9);
    }
}
