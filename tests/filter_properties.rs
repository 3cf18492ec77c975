//! Randomized mutation sequences against an observed filtered view.

use proptest::prelude::*;
use reactive_data::{Data, DataSource, FilterData, ListData, Observable, Recorder, datas};
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Push(u8),
    Insert(usize, u8),
    Set(usize, u8),
    Remove(usize),
    RemoveRange(usize, usize),
    Move(usize, usize, usize),
    ReplaceAll(Vec<u8>),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Push),
        (any::<usize>(), any::<u8>()).prop_map(|(at, value)| Op::Insert(at, value)),
        (any::<usize>(), any::<u8>()).prop_map(|(at, value)| Op::Set(at, value)),
        any::<usize>().prop_map(Op::Remove),
        (any::<usize>(), 0usize..4).prop_map(|(at, count)| Op::RemoveRange(at, count)),
        (any::<usize>(), any::<usize>(), 1usize..4)
            .prop_map(|(from, to, count)| Op::Move(from, to, count)),
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Op::ReplaceAll),
    ]
}

/// Apply `op` with positions folded into range; ops that cannot apply are skipped
fn apply(list: &ListData<u8>, op: &Op) {
    let len = list.size();
    let result = match *op {
        Op::Push(value) => {
            list.push(value);
            Ok(())
        }
        Op::Insert(at, value) => list.insert(at % (len + 1), value),
        Op::Set(at, value) if len > 0 => list.set(at % len, value).map(drop),
        Op::Remove(at) if len > 0 => list.remove(at % len).map(drop),
        Op::RemoveRange(at, count) => {
            let start = at % (len + 1);
            list.remove_range(start, count.min(len - start)).map(drop)
        }
        Op::Move(from, to, count) if len > 0 => {
            let count = count.min(len);
            let span = len - count + 1;
            list.move_range(from % span, to % span, count)
        }
        Op::ReplaceAll(ref elements) => {
            list.replace_all(elements.iter().copied());
            Ok(())
        }
        _ => Ok(()),
    };
    assert!(result.is_ok(), "{:?} failed on length {}", op, len);
}

fn is_even(value: &u8) -> bool {
    value % 2 == 0
}

fn even_view(list: &Rc<ListData<u8>>) -> Rc<FilterData<u8>> {
    let source: Rc<dyn Data<u8>> = list.clone();
    datas::filter(source, is_even)
}

fn is_small(value: &u8) -> bool {
    *value < 100
}

proptest! {
    /// The view always equals the source filtered from scratch.
    #[test]
    fn prop_view_matches_filtered_source(
        initial in prop::collection::vec(any::<u8>(), 0..20),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let list = ListData::from_vec(initial);
        let view = even_view(&list);
        let recorder = Recorder::new();
        view.register_data_observer(recorder.clone());

        for op in &ops {
            apply(&list, op);
            let expected: Vec<u8> = list.to_vec().into_iter().filter(is_even).collect();
            prop_assert_eq!(datas::to_vec(&*view), expected, "after {:?}", op);
        }
    }

    /// Between full changes, replaying the emitted events reproduces the view size.
    #[test]
    fn prop_events_track_view_size(
        initial in prop::collection::vec(any::<u8>(), 0..20),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let list = ListData::from_vec(initial);
        let view = even_view(&list);
        let recorder = Recorder::new();
        view.register_data_observer(recorder.clone());
        let mut start = view.size();

        for op in &ops {
            if let Op::ReplaceAll(_) = op {
                prop_assert_eq!(recorder.shadow_size(start), Some(view.size()));
                apply(&list, op);
                recorder.clear();
                start = view.size();
            } else {
                apply(&list, op);
            }
        }

        prop_assert_eq!(recorder.shadow_size(start), Some(view.size()));
    }

    /// A filter over a filter matches both predicates applied from scratch.
    #[test]
    fn prop_nested_views_match_source(
        initial in prop::collection::vec(any::<u8>(), 0..20),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let list = ListData::from_vec(initial);
        let evens: Rc<dyn Data<u8>> = even_view(&list);
        let small = datas::filter(evens, is_small);
        let recorder = Recorder::new();
        small.register_data_observer(recorder.clone());

        for op in &ops {
            apply(&list, op);
            let expected: Vec<u8> = list
                .to_vec()
                .into_iter()
                .filter(is_even)
                .filter(is_small)
                .collect();
            prop_assert_eq!(datas::to_vec(&*small), expected, "after {:?}", op);
        }
    }
}
