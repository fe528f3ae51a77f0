//! Properties which must hold after any sequence of edits.

use std::collections::HashSet;

use chart_timeline::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Add { tick: i32, button: usize, chain: bool },
    RemoveAt(usize),
    Move { index: usize, tick: i32 },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (0..200i32, 0..6usize, any::<bool>())
            .prop_map(|(tick, button, chain)| Edit::Add { tick, button, chain }),
        1 => (0..64usize).prop_map(Edit::RemoveAt),
        1 => (0..64usize, 0..200i32).prop_map(|(index, tick)| Edit::Move { index, tick }),
    ]
}

fn apply(list: &mut SortedTargetList, edit: &Edit) {
    match *edit {
        Edit::Add { tick, button, chain } => {
            let mut target = TimelineTarget::new(BeatTick::from_ticks(tick), ButtonType::ALL[button]);
            target.flags.set_is_chain(chain);
            list.add(target);
        }
        Edit::RemoveAt(index) => {
            list.remove_at(index);
        }
        Edit::Move { index, tick } => {
            let mut guard = list.edit_range(index..index + 1);
            if let Some(target) = guard.first_mut() {
                target.tick = BeatTick::from_ticks(tick);
            }
        }
    }
}

fn tempo_map_from(changes: &[(i32, f32)]) -> SortedTempoMap {
    SortedTempoMap::from(
        changes
            .iter()
            .map(|&(tick, bpm)| {
                TempoChange::new(
                    BeatTick::from_ticks(tick),
                    Tempo::new(bpm),
                    FlyingTimeFactor::DEFAULT,
                    TimeSignature::DEFAULT,
                )
            })
            .collect::<Vec<_>>(),
    )
}

fn tempo_changes() -> impl Strategy<Value = Vec<(i32, f32)>> {
    prop::collection::vec((0..2000i32, 30.0f32..400.0), 1..8)
}

proptest! {
    #[test]
    fn sorted_after_every_edit(edits in prop::collection::vec(edit(), 1..60)) {
        let mut list = SortedTargetList::new();
        for edit in &edits {
            apply(&mut list, edit);
            let keys: Vec<_> = list.iter().map(TimelineTarget::sort_key).collect();
            prop_assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn ids_map_to_their_indices(edits in prop::collection::vec(edit(), 1..60)) {
        let mut list = SortedTargetList::new();
        for edit in &edits {
            apply(&mut list, edit);
        }
        let mut seen = HashSet::new();
        for (index, target) in list.iter().enumerate() {
            let id = target.id();
            prop_assert!(id.is_some());
            prop_assert!(seen.insert(id));
            prop_assert_eq!(id.and_then(|id| list.find_index_by_id(id)), Some(index));
        }
        prop_assert_eq!(list.validate(), Ok(()));
    }

    #[test]
    fn sync_pairs_partition_the_list(edits in prop::collection::vec(edit(), 1..60)) {
        let mut list = SortedTargetList::new();
        for edit in &edits {
            apply(&mut list, edit);
        }
        let mut total = 0;
        for run in list.as_slice().chunk_by(|a, b| a.tick == b.tick) {
            let count = run.first().map_or(0, |target| target.flags.sync_pair_count());
            prop_assert!(run.iter().all(|target| target.flags.sync_pair_count() == count));
            prop_assert_eq!(usize::from(count), run.len().min(15));
            total += run.len();
        }
        prop_assert_eq!(total, list.len());
    }

    #[test]
    fn chain_bounds_close_every_run(edits in prop::collection::vec(edit(), 1..60)) {
        let mut list = SortedTargetList::new();
        for edit in &edits {
            apply(&mut list, edit);
        }
        for direction in [ButtonType::SlideL, ButtonType::SlideR] {
            let slides: Vec<_> = list.iter().filter(|target| target.button_type == direction).collect();
            for (position, slide) in slides.iter().enumerate() {
                let linked = |other: Option<&&TimelineTarget>| {
                    other.is_some_and(|other| {
                        other.flags.is_chain()
                            && (slide.tick - other.tick).ticks().abs() <= CHAIN_FRAGMENT_MAX_GAP.ticks()
                    })
                };
                let previous = position.checked_sub(1).and_then(|p| slides.get(p));
                let next = slides.get(position + 1);
                if slide.flags.is_chain() {
                    prop_assert_eq!(slide.flags.is_chain_start(), !linked(previous));
                    prop_assert_eq!(slide.flags.is_chain_end(), !linked(next));
                } else {
                    prop_assert!(!slide.flags.is_chain_start() && !slide.flags.is_chain_end());
                }
            }
        }
        prop_assert!(
            list.iter()
                .filter(|target| !target.button_type.is_slide())
                .all(|target| !target.flags.is_chain_start() && !target.flags.is_chain_end())
        );
    }

    #[test]
    fn tick_to_time_is_monotonic(changes in tempo_changes(), ticks in prop::collection::vec(-500..3000i32, 2..40)) {
        let map = tempo_map_from(&changes);
        let mut ticks = ticks;
        ticks.sort_unstable();
        let times: Vec<_> = ticks.iter().map(|&tick| map.tick_to_time(BeatTick::from_ticks(tick))).collect();
        prop_assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn time_to_tick_round_trips(changes in tempo_changes(), tick in 0..2000i32) {
        let map = tempo_map_from(&changes);
        let tick = BeatTick::from_ticks(tick);
        let back = map.time_to_tick(map.tick_to_time(tick));
        prop_assert!((back - tick).ticks().abs() <= 1, "{tick:?} came back as {back:?}");
    }

    #[test]
    fn extrapolation_is_continuous(changes in tempo_changes()) {
        let map = tempo_map_from(&changes);
        let structure = map.acceleration_structure();
        let last = structure.last_tabulated_tick();
        let one = BeatTick::from_ticks(1);

        let step = map.tick_to_time(last + one) - map.tick_to_time(last);
        let expected = structure.last_tempo().tick_duration();
        prop_assert!((step - expected).abs() <= TimeSpan::NANOSECOND, "{step} against {expected}");

        let step = map.tick_to_time(BeatTick::zero()) - map.tick_to_time(-one);
        let expected = structure.first_tempo().tick_duration();
        prop_assert!((step - expected).abs() <= TimeSpan::NANOSECOND, "{step} against {expected}");
    }

    #[test]
    fn tempo_map_is_never_empty(changes in tempo_changes(), removals in prop::collection::vec(0..2000i32, 0..10)) {
        let mut map = tempo_map_from(&changes);
        for (tick, _) in &changes {
            map.remove_tempo_change(BeatTick::from_ticks(*tick));
        }
        for tick in removals {
            map.remove_tempo_change(BeatTick::from_ticks(tick));
        }
        prop_assert_eq!(map.tempo_change_count(), 1);
        prop_assert_eq!(map.first().tick, BeatTick::zero());
        prop_assert_eq!(map.first().tempo, Tempo::DEFAULT);
    }
}
