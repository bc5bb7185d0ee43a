use std::sync::Arc;
use std::time::{Duration, Instant};

use chordloop_types::{
    NoteSet, Pattern, PatternTarget, Pitch, PlaybackSettings, SelectionState, SequenceEntry,
    SequenceStore, SourceKind, Subdivision,
};

use super::backend::{SharedTestBackend, TestBackend, TestOp};
use super::scale_run::{ScaleRun, SCALE_LEAD_IN};
use super::{EngineConfig, PatternEngine};
use crate::snapshot::SelectionSnapshot;

const STEP: Duration = Duration::from_millis(125);

fn p(n: u8) -> Pitch {
    Pitch::new(n)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn engine_with(config: EngineConfig, settings: PlaybackSettings) -> (PatternEngine, Arc<TestBackend>) {
    let backend = Arc::new(TestBackend::new());
    let engine = PatternEngine::new(
        Box::new(SharedTestBackend(Arc::clone(&backend))),
        &config,
        settings,
        Pattern::default_global(),
    );
    (engine, backend)
}

fn engine() -> (PatternEngine, Arc<TestBackend>) {
    engine_with(EngineConfig::default(), PlaybackSettings::default())
}

fn chords() -> SequenceStore {
    let mut s = SequenceStore::new();
    s.add(SequenceEntry::new("C", NoteSet::from_midi(&[60, 64, 67]), "C", "Major"));
    s.add(SequenceEntry::new("F", NoteSet::from_midi(&[65, 69, 72]), "C", "Major"));
    s.add(SequenceEntry::new("G", NoteSet::from_midi(&[67, 71, 74]), "C", "Major"));
    s
}

fn view(selected: Option<usize>, preview: Option<&[u8]>) -> SelectionSnapshot {
    let mut sequence = chords();
    sequence.select(selected).unwrap();
    let selection = SelectionState { temporary_preview: preview.map(NoteSet::from_midi) };
    SelectionSnapshot::new(selection, sequence)
}

#[test]
fn test_start_fires_step_zero_immediately() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    assert!(e.start(t0));
    assert_eq!(b.triggers(), vec![p(60)]);
    assert_eq!(e.current_step(), 1);
    // the held note's release comes before the next tick
    let next = e.next_deadline().unwrap();
    assert!(next > t0 && next < t0 + STEP);
}

#[test]
fn test_start_is_noop_when_running() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    assert!(!e.start(t0 + ms(10)));
    assert_eq!(b.triggers().len(), 1);
    assert_eq!(e.current_step(), 1);
}

#[test]
fn test_toggle_follows_running_flag() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    assert!(e.toggle(t0));
    assert!(!e.toggle(t0 + ms(1)));
    assert!(!e.is_running());
    assert!(b.outstanding().is_empty());
    assert!(e.toggle(t0 + ms(2)));
    assert_eq!(b.triggers(), vec![p(60), p(60)]);
}

#[test]
fn test_three_triggers_over_four_step_loop() {
    // 3-note chord with the default `1 2 3 4` pattern: step 4 is skipped.
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    for k in 1..4 {
        e.poll(t0 + STEP * k);
    }
    assert_eq!(b.triggers(), vec![p(60), p(64), p(67)]);
    assert_eq!(e.current_step(), 4);
    assert_eq!(e.snapshot().active_step, Some(3));
}

#[test]
fn test_stop_leaves_nothing_outstanding() {
    let (mut e, b) = engine_with(EngineConfig::default(), {
        let mut s = PlaybackSettings::default();
        s.set_sustain(true);
        s
    });
    e.update_snapshot(view(Some(0), None));
    e.set_pattern_for_target(PatternTarget::Global, Some(Pattern::parse("* 1 x 3").unwrap()));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + ms(50));
    assert!(!b.outstanding().is_empty());

    e.stop();
    assert!(b.outstanding().is_empty());
    assert_eq!(b.operations().last(), Some(&TestOp::ReleaseAll));
    assert_eq!(e.next_deadline(), None);
    assert!(!e.is_running());
    assert_eq!(e.current_step(), 0);

    let before = b.operations().len();
    assert_eq!(e.poll(t0 + ms(5000)), 0);
    assert_eq!(b.operations().len(), before);
}

#[test]
fn test_stop_is_idempotent() {
    let (mut e, b) = engine();
    e.stop();
    e.stop();
    assert_eq!(b.release_all_count(), 2);
    assert!(b.triggers().is_empty());
    assert!(!e.is_running());
}

#[test]
fn test_stop_after_random_edits_never_leaks() {
    let (mut e, b) = engine();
    let t0 = Instant::now();
    let patterns = ["1 2 3", "* x", "1&3 2+", "3 2 1 x x"];
    for round in 0..8u64 {
        let start = t0 + ms(round * 1000);
        e.update_snapshot(view(Some((round % 3) as usize), None));
        e.start(start);
        e.set_pattern_for_target(
            PatternTarget::Global,
            Some(Pattern::parse(patterns[round as usize % patterns.len()]).unwrap()),
        );
        e.poll(start + STEP * (round as u32 % 4));
        e.stop();
        assert!(b.outstanding().is_empty(), "round {}", round);
        assert_eq!(e.next_deadline(), None);
    }
}

#[test]
fn test_tempo_change_applies_after_queued_tick() {
    let (mut e, _b) = engine();
    let t0 = Instant::now();
    e.start(t0);
    assert_eq!(e.next_deadline(), Some(t0 + STEP));

    assert_eq!(e.set_tempo(60.0), 60.0);
    assert_eq!(e.next_deadline(), Some(t0 + STEP));

    e.poll(t0 + STEP);
    assert_eq!(e.next_deadline(), Some(t0 + STEP + ms(250)));
}

#[test]
fn test_tempo_clamps_and_ignores_nan() {
    let (mut e, _b) = engine();
    assert_eq!(e.set_tempo(5.0), 20.0);
    assert_eq!(e.set_tempo(5000.0), 300.0);
    assert_eq!(e.set_tempo(f32::NAN), 300.0);
    assert_eq!(e.set_tempo(e.bpm()), 300.0);
}

#[test]
fn test_each_step_cuts_previous_notes_without_sustain() {
    let mut settings = PlaybackSettings::default();
    settings.set_note_duration(1.0);
    let (mut e, b) = engine_with(EngineConfig::default(), settings);
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + STEP);
    assert_eq!(
        b.operations(),
        vec![
            TestOp::Trigger { pitch: p(60), velocity: 0.8 },
            TestOp::Release(p(60)),
            TestOp::Trigger { pitch: p(64), velocity: 0.8 },
        ]
    );
}

#[test]
fn test_preview_then_unpreview_resolves_to_selection() {
    let (mut e, b) = engine();
    let preview: &[u8] = &[62, 65, 69];
    e.update_snapshot(view(Some(2), Some(preview)));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + STEP);
    assert_eq!(b.triggers(), vec![p(62), p(65)]);
    assert_eq!(e.snapshot().source, SourceKind::Preview);

    e.update_snapshot(view(Some(2), None));
    b.clear();
    e.poll(t0 + STEP * 2);
    e.poll(t0 + STEP * 3);
    assert_eq!(b.triggers(), vec![p(74)], "step 2 of `1 2 3 4`, then step 3 is out of range");
    assert!(b.triggers().iter().all(|t| !preview.contains(&t.get())));
    assert_eq!(e.snapshot().source, SourceKind::Saved(2));
}

#[test]
fn test_target_switch_releases_before_next_trigger() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + ms(50));
    assert_eq!(b.outstanding(), vec![p(60)]);

    e.update_snapshot(view(Some(1), None));
    assert_eq!(b.operations().last(), Some(&TestOp::Release(p(60))));
    assert!(b.outstanding().is_empty());

    e.poll(t0 + STEP);
    assert_eq!(b.triggers(), vec![p(60), p(69)]);
}

#[test]
fn test_target_switch_with_sustain_keeps_scheduled_release() {
    let mut settings = PlaybackSettings::default();
    settings.set_sustain(true);
    let (mut e, b) = engine_with(EngineConfig::default(), settings);
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    e.update_snapshot(view(Some(1), None));
    assert!(b.releases().is_empty());
    e.poll(t0 + ms(110));
    assert_eq!(b.releases(), vec![p(60)]);
}

#[test]
fn test_index_shift_is_not_a_switch() {
    let (mut e, b) = engine();
    let mut v = view(Some(2), None);
    e.update_snapshot(v.clone());
    let t0 = Instant::now();
    e.start(t0);
    v.sequence.remove_at(0).unwrap();
    assert_eq!(v.sequence.selected_index(), Some(1));
    e.update_snapshot(v);
    assert!(b.releases().is_empty());
}

#[test]
fn test_out_of_range_index_skipped_others_fire() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    e.set_pattern_for_target(PatternTarget::Global, Some(Pattern::parse("1&5&3").unwrap()));
    e.start(Instant::now());
    assert_eq!(b.triggers(), vec![p(60), p(67)]);
}

#[test]
fn test_duplicate_pitch_in_step_triggers_once() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    e.set_pattern_for_target(PatternTarget::Global, Some(Pattern::parse("1&1").unwrap()));
    e.start(Instant::now());
    assert_eq!(b.triggers(), vec![p(60)]);
}

#[test]
fn test_empty_note_set_still_advances() {
    let (mut e, b) = engine();
    e.update_snapshot(view(None, None));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + STEP);
    e.poll(t0 + STEP * 2);
    assert!(b.triggers().is_empty());
    assert_eq!(e.current_step(), 3);
    assert!(e.is_running());
}

#[test]
fn test_octave_shift_and_offset() {
    let mut settings = PlaybackSettings::default();
    settings.set_octave_offset(1);
    let (mut e, b) = engine_with(EngineConfig::default(), settings);
    e.update_snapshot(view(Some(0), None));
    e.set_pattern_for_target(PatternTarget::Global, Some(Pattern::parse("1+ 1'").unwrap()));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + STEP);
    assert_eq!(b.triggers(), vec![p(84), p(60)]);
}

#[test]
fn test_entry_override_keeps_phase() {
    let (mut e, b) = engine();
    let v = view(Some(1), None);
    let id = v.sequence.id_at(1).unwrap();
    e.update_snapshot(v);
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + STEP);
    assert_eq!(e.current_step(), 2);

    e.set_pattern_for_target(PatternTarget::Entry(id), Some(Pattern::parse("3 2 1").unwrap()));
    assert_eq!(e.current_step(), 2);
    e.poll(t0 + STEP * 2);
    // counter 2 -> step 2 of `3 2 1`
    assert_eq!(b.triggers(), vec![p(65), p(69), p(65)]);

    e.set_pattern_for_target(PatternTarget::Entry(id), None);
    e.poll(t0 + STEP * 3);
    assert_eq!(b.triggers().len(), 3, "counter 3 of `1 2 3 4` is out of range for a triad");
}

#[test]
fn test_removed_entry_override_is_pruned() {
    let (mut e, _b) = engine();
    let mut v = view(Some(0), None);
    let id = v.sequence.id_at(2).unwrap();
    e.update_snapshot(v.clone());
    e.set_pattern_for_target(PatternTarget::Entry(id), Some(Pattern::block()));
    assert_eq!(e.bindings().override_count(), 1);
    v.sequence.remove_at(2).unwrap();
    e.update_snapshot(v);
    assert_eq!(e.bindings().override_count(), 0);
}

#[test]
fn test_swing_alternates_step_lengths() {
    let config = EngineConfig { swing: 0.5, ..EngineConfig::default() };
    let (mut e, _b) = engine_with(config, PlaybackSettings::default());
    let t0 = Instant::now();
    e.start(t0);
    let long = STEP.mul_f64(1.5);
    let short = STEP.mul_f64(0.5);
    assert_eq!(e.next_deadline(), Some(t0 + long));
    e.poll(t0 + long);
    assert_eq!(e.next_deadline(), Some(t0 + long + short));
}

#[test]
fn test_quarter_subdivision_interval() {
    let config = EngineConfig { subdivision: Subdivision::Quarter, ..EngineConfig::default() };
    let (mut e, _b) = engine_with(config, PlaybackSettings::default());
    let t0 = Instant::now();
    e.start(t0);
    assert_eq!(e.next_deadline(), Some(t0 + ms(500)));
}

#[test]
fn test_late_poll_reanchors_instead_of_bursting() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    let late = t0 + ms(400);
    e.poll(late);
    assert_eq!(b.triggers(), vec![p(60), p(64)]);
    assert_eq!(e.current_step(), 2);
    assert_eq!(e.next_deadline(), Some(late + STEP));
    assert!(b.outstanding().is_empty());
}

#[test]
fn test_release_fires_before_tick_due_at_same_time() {
    let mut settings = PlaybackSettings::default();
    settings.set_sustain(true);
    settings.set_note_duration(1.0);
    let (mut e, b) = engine_with(EngineConfig::default(), settings);
    e.update_snapshot(view(Some(0), None));
    e.set_pattern_for_target(PatternTarget::Global, Some(Pattern::parse("1").unwrap()));
    let t0 = Instant::now();
    e.start(t0);
    e.poll(t0 + STEP);
    assert_eq!(
        b.operations(),
        vec![
            TestOp::Trigger { pitch: p(60), velocity: 0.8 },
            TestOp::Release(p(60)),
            TestOp::Trigger { pitch: p(60), velocity: 0.8 },
        ]
    );
}

#[test]
fn test_manual_note_uses_offset_and_cuts_held() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    let mut settings = e.settings().clone();
    settings.set_octave_offset(1);
    e.set_settings(settings);

    e.note_on(p(62));
    let ops = b.operations();
    assert_eq!(ops[1], TestOp::Release(p(60)));
    assert_eq!(ops[2], TestOp::Trigger { pitch: p(74), velocity: 0.8 });

    let mut settings = e.settings().clone();
    settings.set_octave_offset(-1);
    e.set_settings(settings);
    e.note_off(p(62));
    assert_eq!(b.operations().last(), Some(&TestOp::Release(p(74))));
}

#[test]
fn test_manual_note_with_sustain_leaves_engine_notes() {
    let mut settings = PlaybackSettings::default();
    settings.set_sustain(true);
    let (mut e, b) = engine_with(EngineConfig::default(), settings);
    e.update_snapshot(view(Some(0), None));
    e.start(Instant::now());
    e.note_on(p(72));
    assert!(b.releases().is_empty());
    assert_eq!(b.triggers(), vec![p(60), p(72)]);
}

#[test]
fn test_scale_run_stops_and_resumes_transport() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    let scale = NoteSet::from_midi(&[60, 62, 64]);
    let t1 = t0 + ms(10);
    assert!(e.play_scale(&scale, t1));
    assert!(!e.is_running());
    assert!(e.is_scale_running());
    assert_eq!(b.operations().last(), Some(&TestOp::ReleaseAll));
    b.clear();

    let len = ScaleRun::note_len_for(e.bpm());
    let first = t1 + SCALE_LEAD_IN;
    assert_eq!(e.next_deadline(), Some(first));
    e.poll(first);
    e.poll(first + len);
    e.poll(first + len * 2);
    assert_eq!(b.triggers(), vec![p(60), p(62), p(64)]);
    assert_eq!(b.releases(), vec![p(60), p(62)]);

    let end = first + len * 3;
    e.poll(end);
    assert!(!e.is_scale_running());
    assert!(e.is_running());
    // last scale note released, then step 0 of the resumed transport
    assert_eq!(b.releases(), vec![p(60), p(62), p(64)]);
    assert_eq!(b.triggers().last(), Some(&p(60)));
    assert_eq!(e.current_step(), 1);
}

#[test]
fn test_scale_run_without_transport_does_not_start_it() {
    let (mut e, b) = engine();
    let t0 = Instant::now();
    e.play_scale(&NoteSet::from_midi(&[67]), t0);
    e.poll(t0 + ms(5000));
    assert!(!e.is_running());
    assert!(!e.is_scale_running());
    assert_eq!(b.triggers(), vec![p(67)]);
    assert!(b.outstanding().is_empty());
}

#[test]
fn test_second_scale_request_cancels_run() {
    let (mut e, b) = engine();
    let t0 = Instant::now();
    let scale = NoteSet::from_midi(&[60, 62, 64]);
    e.play_scale(&scale, t0);
    e.poll(t0 + SCALE_LEAD_IN);
    assert!(!e.play_scale(&scale, t0 + ms(200)));
    assert!(!e.is_scale_running());
    assert!(b.outstanding().is_empty());
    e.poll(t0 + ms(5000));
    assert_eq!(b.triggers(), vec![p(60)]);
}

#[test]
fn test_toggle_scale_starts_then_cancels() {
    let (mut e, b) = engine();
    let t0 = Instant::now();
    let scale = NoteSet::from_midi(&[60, 62, 64]);
    assert!(e.toggle_scale(&scale, t0));
    e.poll(t0 + SCALE_LEAD_IN);
    assert!(!e.toggle_scale(&scale, t0 + ms(200)));
    assert!(!e.is_scale_running());
    assert!(e.toggle_scale(&scale, t0 + ms(300)));
    assert!(e.is_scale_running());
    assert!(b.outstanding().is_empty());
    assert_eq!(b.triggers(), vec![p(60)]);
}

#[test]
fn test_stop_cancels_scale_without_restart() {
    let (mut e, b) = engine();
    e.update_snapshot(view(Some(0), None));
    let t0 = Instant::now();
    e.start(t0);
    e.play_scale(&NoteSet::from_midi(&[60, 62]), t0 + ms(1));
    e.poll(t0 + ms(200));
    e.stop();
    e.poll(t0 + ms(5000));
    assert!(!e.is_running());
    assert!(!e.is_scale_running());
    assert!(b.outstanding().is_empty());
}

#[test]
fn test_empty_scale_is_ignored() {
    let (mut e, _b) = engine();
    assert!(!e.play_scale(&NoteSet::empty(), Instant::now()));
    assert!(!e.is_scale_running());
}

#[test]
fn test_failed_trigger_is_skipped() {
    let (mut e, b) = engine();
    b.fail_on(p(64));
    e.update_snapshot(view(Some(0), None));
    e.set_pattern_for_target(PatternTarget::Global, Some(Pattern::block()));
    let t0 = Instant::now();
    e.start(t0);
    assert_eq!(b.triggers(), vec![p(60), p(67)]);
    assert_eq!(e.snapshot().sounding, vec![p(60), p(67)]);
    e.poll(t0 + STEP);
    assert!(e.is_running());
}

#[test]
fn test_snapshot_reports_transport() {
    let (mut e, _b) = engine();
    e.update_snapshot(view(Some(1), None));
    let t0 = Instant::now();
    e.start(t0);
    let snap = e.snapshot();
    assert!(snap.running);
    assert_eq!(snap.bpm, 120.0);
    assert_eq!(snap.current_step, 1);
    assert_eq!(snap.pattern_len, 4);
    assert_eq!(snap.active_step, Some(0));
    assert_eq!(snap.source, SourceKind::Saved(1));
    assert_eq!(snap.sounding, vec![p(65)]);

    e.shutdown();
    let snap = e.snapshot();
    assert!(!snap.running);
    assert!(snap.sounding.is_empty());
}
