//! End-to-end scenarios of editing a chart timeline.

use chart_timeline::prelude::*;
use pretty_assertions::assert_eq;

fn target(tick: i32, button_type: ButtonType) -> TimelineTarget {
    TimelineTarget::new(BeatTick::from_ticks(tick), button_type)
}

#[track_caller]
fn assert_seconds(actual: TimeSpan, expected: f64) {
    let diff = (actual.as_secs_f64() - expected).abs();
    assert!(diff < 2e-9, "expected {expected}s, got {actual}");
}

#[test]
fn sync_pairs_and_same_type_stacks() {
    let mut targets = SortedTargetList::new();
    for (tick, button_type) in [
        (0, ButtonType::Triangle),
        (0, ButtonType::Circle),
        (48, ButtonType::Square),
        (48, ButtonType::Square),
        (48, ButtonType::Cross),
    ] {
        targets.add(target(tick, button_type));
    }

    let summary: Vec<_> = targets
        .iter()
        .map(|target| {
            (
                target.button_type,
                target.flags.sync_pair_count(),
                target.flags.same_type_sync_index(),
                target.flags.same_type_sync_count(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (ButtonType::Triangle, 2, 0, 1),
            (ButtonType::Circle, 2, 0, 1),
            (ButtonType::Square, 3, 0, 2),
            (ButtonType::Square, 3, 1, 2),
            (ButtonType::Cross, 3, 0, 1),
        ]
    );
    assert!(targets.iter().all(|target| target.flags.is_sync()));
    assert_eq!(targets.validate(), Ok(()));
}

#[test]
fn distant_chain_slides() {
    let mut targets = SortedTargetList::new();
    for tick in [0, 40, 90] {
        let mut slide = target(tick, ButtonType::SlideL);
        slide.flags.set_is_chain(true);
        targets.add(slide);
    }
    assert!(
        targets
            .iter()
            .all(|target| target.flags.is_chain_start() && target.flags.is_chain_end())
    );
}

#[test]
fn single_tempo_conversion() {
    let mut tempo_map = SortedTempoMap::from(vec![TempoChange::new(
        BeatTick::zero(),
        Tempo::new(120.0),
        FlyingTimeFactor::DEFAULT,
        TimeSignature::new(4, 4),
    )]);
    tempo_map.rebuild_acceleration_structure();
    assert_seconds(tempo_map.tick_to_time(BeatTick::from_beats(4)), 2.0);
}

#[test]
fn removed_target_is_not_found() {
    let mut targets = SortedTargetList::new();
    targets.add(target(100, ButtonType::Circle));
    let removed = targets.remove(&target(100, ButtonType::Circle));
    assert_eq!(removed.map(|target| target.tick), Some(BeatTick::from_ticks(100)));
    assert_eq!(
        targets.find_index_of(BeatTick::from_ticks(100), ButtonType::Circle),
        None
    );
}

#[test]
fn tempo_change_is_continuous_and_steeper() {
    let mut tempo_map = SortedTempoMap::new();
    tempo_map.set_tempo_change(BeatTick::zero(), Tempo::new(160.0), TimeSignature::DEFAULT);
    tempo_map.set_tempo_change(BeatTick::from_bars(4), Tempo::new(200.0), TimeSignature::DEFAULT);
    tempo_map.rebuild_acceleration_structure();

    let boundary = BeatTick::from_bars(4);
    let one = BeatTick::from_ticks(1);
    let before = tempo_map.tick_to_time(boundary) - tempo_map.tick_to_time(boundary - one);
    let after = tempo_map.tick_to_time(boundary + one) - tempo_map.tick_to_time(boundary);
    assert_seconds(before, Tempo::new(160.0).seconds_per_tick());
    assert_seconds(after, Tempo::new(200.0).seconds_per_tick());
    assert!(after < before);
    // 16 beats at 160 BPM.
    assert_seconds(tempo_map.tick_to_time(boundary), 6.0);
}

#[test]
fn removing_last_tempo_change_restores_default() {
    let mut tempo_map = SortedTempoMap::new();
    tempo_map.remove_tempo_change(BeatTick::zero());
    assert_eq!(tempo_map.as_slice(), &[TempoChange::DEFAULT]);
    assert_eq!(tempo_map.first().tempo, Tempo::DEFAULT);
    assert_eq!(tempo_map.first().signature, TimeSignature::DEFAULT);
}

#[test]
fn undo_redo_keeps_ids() {
    let mut targets = SortedTargetList::new();
    let id = targets.add(target(48, ButtonType::Cross));
    targets.add(target(48, ButtonType::Circle));

    let index = targets.find_index_by_id(id).expect("target was added");
    let removed = targets.remove_at(index).expect("index is in bounds");
    assert!(!targets[0].flags.is_sync());

    assert_eq!(targets.add(removed), id);
    assert_eq!(targets.find_index_by_id(id), Some(0));
    assert!(targets[0].flags.is_sync());
    assert_eq!(targets.validate(), Ok(()));
}

#[test]
fn moving_selected_targets() {
    let mut targets: SortedTargetList = (0..8)
        .map(|beat| target(beat * 48, ButtonType::ALL[beat as usize % 4]))
        .collect();
    for index in [1, 2] {
        let id = targets[index].id();
        let mut edit = targets.edit_range(index..index + 1);
        edit[0].is_selected = true;
        drop(edit);
        assert_eq!(targets[index].id(), id);
    }

    {
        let mut edit = targets.edit_all();
        for target in edit.iter_mut().filter(|target| target.is_selected) {
            target.tick += BeatTick::from_beats(4);
        }
    }
    let ticks: Vec<_> = targets.iter().map(|target| target.tick.ticks()).collect();
    assert_eq!(ticks, vec![0, 144, 192, 240, 240, 288, 288, 336]);
    assert_eq!(targets[3].flags.sync_pair_count(), 2);
    assert_eq!(targets.validate(), Ok(()));
}

#[test]
fn spawn_times_follow_tempo() {
    let mut tempo_map = SortedTempoMap::new();
    tempo_map.set_tempo_change(BeatTick::zero(), Tempo::new(120.0), TimeSignature::DEFAULT);
    tempo_map.rebuild_acceleration_structure();
    let times = tempo_map.target_spawn_times(BeatTick::from_bars(1));
    assert_seconds(times.button_time, 2.0);
    assert_seconds(times.flying_time, 2.0);
    assert_seconds(times.spawn_time, 0.0);
}
