// Interpolation rewrites: STOP <-> duplicate color and frame-eject
// clustering, exercised the way authored patterns produce them.

use stitchwise::prelude::*;

fn red() -> EmbThread {
    EmbThread::from_string("red").unwrap()
}

fn blue() -> EmbThread {
    EmbThread::from_string("blue").unwrap()
}

fn diagonal(pattern: &mut EmbPattern) {
    pattern.stitch_abs(0.0, 0.0);
    pattern.stitch_abs(100.0, 100.0);
}

fn anti_diagonal(pattern: &mut EmbPattern) {
    pattern.stitch_abs(100.0, 0.0);
    pattern.stitch_abs(0.0, 100.0);
}

#[test]
fn duplicate_color_becomes_stop() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.add_thread_break(red());
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    pattern.interpolate_duplicate_color_as_stop();
    assert_eq!(pattern.count_stitch_commands(STOP), 1);
}

#[test]
fn multiple_duplicates_become_multiple_stops() {
    let mut pattern = EmbPattern::new();
    for _ in 0..4 {
        pattern.add_thread_break(red());
        diagonal(&mut pattern);
    }

    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    pattern.interpolate_duplicate_color_as_stop();
    assert_eq!(pattern.count_stitch_commands(STOP), 3);
}

#[test]
fn interleaved_colors_do_not_become_stops() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.add_thread_break(blue());
    anti_diagonal(&mut pattern);
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.add_thread_break(blue());
    anti_diagonal(&mut pattern);

    pattern.interpolate_duplicate_color_as_stop();
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
}

#[test]
fn mismatched_threadlist_converts_where_it_can() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread(red());
    pattern.add_thread(red());
    pattern.add_thread(red());
    diagonal(&mut pattern);
    pattern.color_change(0.0, 0.0);
    anti_diagonal(&mut pattern);
    pattern.color_change(0.0, 0.0);
    diagonal(&mut pattern);
    pattern.color_change(0.0, 0.0);
    anti_diagonal(&mut pattern);

    pattern.interpolate_duplicate_color_as_stop();
    assert_eq!(pattern.count_stitch_commands(STOP), 2);
    assert_eq!(pattern.count_stitch_commands(COLOR_CHANGE), 1);
}

#[test]
fn stop_without_threads_is_a_noop() {
    let mut pattern = EmbPattern::new();
    diagonal(&mut pattern);
    pattern.stop();
    anti_diagonal(&mut pattern);
    pattern.stop();
    diagonal(&mut pattern);
    pattern.stop();
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(STOP), 3);
    pattern.interpolate_stop_as_duplicate_color();
    assert_eq!(pattern.count_stitch_commands(STOP), 3);
}

#[test]
fn intermixed_duplicates_become_intermixed_stops() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.add_thread_break(red());
    anti_diagonal(&mut pattern);
    pattern.add_thread_break(blue());
    diagonal(&mut pattern);
    pattern.add_thread_break(blue());
    anti_diagonal(&mut pattern);

    pattern.interpolate_duplicate_color_as_stop();
    assert_eq!(pattern.count_stitch_commands(STOP), 2);
}

#[test]
fn intermixed_stops_become_intermixed_duplicates() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.stop();
    anti_diagonal(&mut pattern);
    pattern.add_thread_break(blue());
    diagonal(&mut pattern);
    pattern.stop();
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(STOP), 2);
    pattern.interpolate_stop_as_duplicate_color();
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    let threads = pattern.threads();
    assert_eq!(threads.len(), 4);
    assert_eq!(threads[0], threads[1]);
    assert_ne!(threads[1], threads[2]);
    assert_eq!(threads[2], threads[3]);
}

#[test]
fn stop_runs_duplicate_repeatedly() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    for _ in 0..4 {
        pattern.stop();
    }
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(STOP), 4);
    pattern.interpolate_stop_as_duplicate_color();
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    assert_eq!(pattern.count_threads(), 5);
}

#[test]
fn stop_run_straddling_a_color_boundary() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.stop();
    pattern.stop();
    pattern.add_thread_break(blue());
    pattern.stop();
    pattern.stop();
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(STOP), 4);
    pattern.interpolate_stop_as_duplicate_color();
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    let threads = pattern.threads();
    assert_eq!(threads.len(), 6);
    assert_eq!(threads[0], threads[1]);
    assert_eq!(threads[1], threads[2]);
    assert_ne!(threads[2], threads[3]);
    assert_eq!(threads[3], threads[4]);
    assert_eq!(threads[4], threads[5]);
}

#[test]
fn stop_and_duplicate_rewrites_invert() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.stop();
    anti_diagonal(&mut pattern);
    pattern.fix_color_count();
    let snapshot = pattern.clone();

    assert_eq!(pattern.count_stitch_commands(STOP), 1);
    pattern.interpolate_stop_as_duplicate_color();
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    pattern.interpolate_duplicate_color_as_stop();
    assert_eq!(pattern.count_stitch_commands(STOP), 1);

    assert_eq!(pattern, snapshot);
}

#[test]
fn frame_eject_single_jump() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.move_abs(200.0, 0.0);
    pattern.stop();
    pattern.move_abs(100.0, 100.0);
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(FRAME_EJECT), 0);
    assert_eq!(pattern.count_stitch_commands(STOP), 1);
    pattern.interpolate_frame_eject();
    assert_eq!(pattern.count_stitch_commands(FRAME_EJECT), 1);
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
}

#[test]
fn frame_eject_multiple_jumps() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.move_abs(100.0, 0.0);
    pattern.move_abs(200.0, 0.0);
    pattern.stop();
    pattern.move_abs(100.0, 0.0);
    pattern.move_abs(101.0, 0.0);
    pattern.move_abs(100.0, 100.0);
    anti_diagonal(&mut pattern);

    assert_eq!(pattern.count_stitch_commands(JUMP), 5);
    assert_eq!(pattern.count_stitch_commands(STOP), 1);
    pattern.interpolate_frame_eject();
    assert_eq!(pattern.count_stitch_commands(JUMP), 0);
    assert_eq!(pattern.count_stitch_commands(FRAME_EJECT), 1);
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
    // The eject holds the STOP's position.
    let eject = pattern
        .stitches()
        .iter()
        .find(|s| s.command & COMMAND_MASK == FRAME_EJECT)
        .unwrap();
    assert_eq!((eject.x, eject.y), (200.0, 0.0));
}

#[test]
fn frame_eject_cluster_at_end_of_pattern() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.move_abs(200.0, 0.0);
    pattern.stop();

    pattern.interpolate_frame_eject();
    assert_eq!(pattern.count_stitch_commands(FRAME_EJECT), 1);
    assert_eq!(pattern.count_stitch_commands(STOP), 0);
}

#[test]
fn frame_eject_is_idempotent() {
    let mut pattern = EmbPattern::new();
    pattern.add_thread_break(red());
    diagonal(&mut pattern);
    pattern.move_abs(200.0, 0.0);
    pattern.stop();
    pattern.move_abs(100.0, 100.0);
    anti_diagonal(&mut pattern);

    pattern.interpolate_frame_eject();
    let once = pattern.clone();
    pattern.interpolate_frame_eject();
    assert_eq!(pattern, once);
}
