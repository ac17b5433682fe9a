//! Pattern encoding and transcoding
//!
//! The `Transcoder` rewrites a loosely-authored command stream into the
//! machine-valid form a destination format requires: matrix transforms are
//! folded into coordinates, color breaks become concrete thread-change
//! commands, over-long stitches split per the destination's limits, and
//! tie/trim/jump lowering is applied. The input pattern is never mutated; a
//! fresh pattern is returned.

use crate::core::constants::*;
use crate::core::matrix::EmbMatrix;
use crate::core::pattern::EmbPattern;
use crate::utils::functions::encode_thread_change;

/// Longest segment a tie stitch may span, in pattern units
const MAX_TIE_LENGTH: f64 = 10.0;

/// Destination profile for the transcoder
///
/// Every option the encoder honors lives here; codec writers expose their
/// profile through a `default_settings()` constructor.
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    /// Maximum stitch length per axis; longer stitches trigger the
    /// long-stitch contingency
    pub max_stitch: f64,

    /// Maximum jump length per axis; longer jumps split into a chain
    pub max_jump: f64,

    /// Split jumps consume the full max_jump per step instead of dividing
    /// the travel evenly
    pub full_jump: bool,

    /// Round coordinates to the nearest integer after transformation
    pub round: bool,

    /// Needle count for NEEDLE_SET emission (modulo)
    pub needle_count: u8,

    /// Command representing "change thread here": COLOR_CHANGE, STOP or
    /// NEEDLE_SET
    pub thread_change_command: u32,

    /// Pre-translation applied to every coordinate
    pub translate: (f64, f64),

    /// Tie-on contingency at section starts
    pub tie_on_contingency: u32,

    /// Tie-off contingency at section ends
    pub tie_off_contingency: u32,

    /// Emit an explicit TRIM before each thread change
    pub explicit_trim: bool,

    /// Drop SEQUIN_* commands outright, overriding the sequin contingency
    pub strip_sequins: bool,

    /// Sequin handling policy
    pub sequin_contingency: u32,

    /// Over-long stitch policy
    pub long_stitch_contingency: u32,

    /// Keep SLOW/FAST commands
    pub writes_speeds: bool,

    /// Keep FRAME_EJECT commands; otherwise lower to jump/stop/jump
    pub writes_frame_eject: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            max_stitch: f64::INFINITY,
            max_jump: f64::INFINITY,
            full_jump: false,
            round: false,
            needle_count: 5,
            thread_change_command: COLOR_CHANGE,
            translate: (0.0, 0.0),
            tie_on_contingency: CONTINGENCY_TIE_ON_NONE,
            tie_off_contingency: CONTINGENCY_TIE_OFF_NONE,
            explicit_trim: false,
            strip_sequins: false,
            sequin_contingency: CONTINGENCY_SEQUIN_JUMP,
            long_stitch_contingency: CONTINGENCY_LONG_STITCH_JUMP_NEEDLE,
            writes_speeds: true,
            writes_frame_eject: false,
        }
    }
}

/// Normalizing encoder
pub struct Transcoder {
    settings: EncoderSettings,
}

impl Transcoder {
    /// Create a transcoder with default settings
    pub fn new() -> Self {
        Self {
            settings: EncoderSettings::default(),
        }
    }

    /// Create a transcoder with the given settings
    pub fn with_settings(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    /// Reference to the settings
    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Mutable reference to the settings
    pub fn settings_mut(&mut self) -> &mut EncoderSettings {
        &mut self.settings
    }

    /// Transcode a pattern into a fresh, normalized pattern
    pub fn transcode(&self, source: &EmbPattern) -> EmbPattern {
        let mut state = EncoderState::new(&self.settings, source);
        state.run();
        state.finish()
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk state for a single transcode pass
struct EncoderState<'a> {
    settings: &'a EncoderSettings,
    source: &'a EmbPattern,
    out: EmbPattern,

    matrix: EmbMatrix,
    /// Authored position, pre-matrix; pivot for MATRIX_SCALE/MATRIX_ROTATE
    raw_x: f64,
    raw_y: f64,
    /// Last emitted absolute position
    x: f64,
    y: f64,
    /// Position of the stitch before the last one, for tie-off direction
    anchor: Option<(f64, f64)>,

    has_stitched: bool,
    pending_boundaries: usize,
    pending_tie_on: bool,
    section_index: usize,

    tie_on: u32,
    tie_off: u32,
    sequin_mode_out: bool,
}

impl<'a> EncoderState<'a> {
    fn new(settings: &'a EncoderSettings, source: &'a EmbPattern) -> Self {
        let mut out = EmbPattern::new();
        for (key, value) in source.extras() {
            out.set_metadata(key.clone(), value.clone());
        }
        Self {
            settings,
            source,
            out,
            matrix: EmbMatrix::new(),
            raw_x: 0.0,
            raw_y: 0.0,
            x: 0.0,
            y: 0.0,
            anchor: None,
            has_stitched: false,
            pending_boundaries: 0,
            pending_tie_on: false,
            section_index: 0,
            tie_on: settings.tie_on_contingency,
            tie_off: settings.tie_off_contingency,
            sequin_mode_out: false,
        }
    }

    fn run(&mut self) {
        let stitches = self.source.stitches();
        for i in 0..stitches.len() {
            let stitch = stitches[i];
            let cmd = stitch.command & COMMAND_MASK;
            match cmd {
                MATRIX_TRANSLATE | TRANSLATE => {
                    self.matrix.post_translate(stitch.x, stitch.y);
                },
                MATRIX_SCALE_ORIGIN => {
                    self.matrix.post_scale(stitch.x, Some(stitch.y), 0.0, 0.0);
                },
                MATRIX_ROTATE_ORIGIN => {
                    self.matrix.post_rotate(stitch.x, 0.0, 0.0);
                },
                MATRIX_SCALE => {
                    self.matrix
                        .post_scale(stitch.x, Some(stitch.y), self.raw_x, self.raw_y);
                },
                MATRIX_ROTATE => {
                    self.matrix.post_rotate(stitch.x, self.raw_x, self.raw_y);
                },
                MATRIX_RESET => self.matrix.reset(),
                ENABLE_TIE_ON => self.tie_on = CONTINGENCY_TIE_ON_THREE_SMALL,
                ENABLE_TIE_OFF => self.tie_off = CONTINGENCY_TIE_OFF_THREE_SMALL,
                DISABLE_TIE_ON => self.tie_on = CONTINGENCY_TIE_ON_NONE,
                DISABLE_TIE_OFF => self.tie_off = CONTINGENCY_TIE_OFF_NONE,
                COLOR_BREAK | COLOR_CHANGE | NEEDLE_SET => {
                    // Boundaries before the first stitch are authoring
                    // bookends; they open no section and emit nothing.
                    if self.has_stitched {
                        self.pending_boundaries += 1;
                    }
                },
                STITCH | ALTERNATING_STITCH => {
                    let (tx, ty) = self.project(stitch.x, stitch.y);
                    self.begin_sewing(i, tx, ty, true);
                    self.stitch_to(tx, ty, self.settings.long_stitch_contingency);
                    self.set_raw(stitch.x, stitch.y);
                },
                SEW_TO => {
                    let (tx, ty) = self.project(stitch.x, stitch.y);
                    self.begin_sewing(i, tx, ty, true);
                    self.stitch_to(tx, ty, CONTINGENCY_LONG_STITCH_SEW_TO);
                    self.set_raw(stitch.x, stitch.y);
                },
                NEEDLE_AT => {
                    let (tx, ty) = self.project(stitch.x, stitch.y);
                    self.begin_sewing(i, tx, ty, true);
                    self.stitch_to(tx, ty, CONTINGENCY_LONG_STITCH_JUMP_NEEDLE);
                    self.set_raw(stitch.x, stitch.y);
                },
                LONG_STITCH => {
                    let (tx, ty) = self.project(stitch.x, stitch.y);
                    self.begin_sewing(i, tx, ty, true);
                    self.stitch_to(tx, ty, CONTINGENCY_LONG_STITCH_NONE);
                    self.set_raw(stitch.x, stitch.y);
                },
                JUMP => {
                    let (tx, ty) = self.project(stitch.x, stitch.y);
                    self.begin_sewing(i, tx, ty, false);
                    self.jump_to(tx, ty);
                    self.set_raw(stitch.x, stitch.y);
                },
                SEQUIN_MODE => {
                    if self.sequin_contingency() == CONTINGENCY_SEQUIN_UTILIZE {
                        self.out.add_command(SEQUIN_MODE, self.x, self.y);
                        self.sequin_mode_out = !self.sequin_mode_out;
                    }
                },
                SEQUIN_EJECT => {
                    let (tx, ty) = self.project(stitch.x, stitch.y);
                    match self.sequin_contingency() {
                        CONTINGENCY_SEQUIN_REMOVE => {},
                        CONTINGENCY_SEQUIN_STITCH => {
                            self.begin_sewing(i, tx, ty, true);
                            self.stitch_to(tx, ty, self.settings.long_stitch_contingency);
                            self.set_raw(stitch.x, stitch.y);
                        },
                        CONTINGENCY_SEQUIN_JUMP => {
                            self.begin_sewing(i, tx, ty, false);
                            self.jump_to(tx, ty);
                            self.set_raw(stitch.x, stitch.y);
                        },
                        _ => {
                            self.begin_sewing(i, tx, ty, true);
                            if !self.sequin_mode_out {
                                self.out.add_command(SEQUIN_MODE, self.x, self.y);
                                self.sequin_mode_out = true;
                            }
                            self.travel_to(tx, ty, SEQUIN_EJECT);
                            self.set_raw(stitch.x, stitch.y);
                        },
                    }
                },
                STOP => {
                    self.out.add_stitch_absolute(STOP, self.x, self.y);
                },
                FRAME_EJECT => {
                    let (fx, fy) = self.project(stitch.x, stitch.y);
                    if self.settings.writes_frame_eject {
                        self.out.add_stitch_absolute(FRAME_EJECT, fx, fy);
                        self.x = fx;
                        self.y = fy;
                    } else {
                        let (rx, ry) = (self.x, self.y);
                        self.jump_to(fx, fy);
                        self.out.add_stitch_absolute(STOP, fx, fy);
                        self.jump_to(rx, ry);
                    }
                    self.set_raw(stitch.x, stitch.y);
                },
                TRIM => {
                    self.out.add_stitch_absolute(TRIM, self.x, self.y);
                },
                TIE_ON => {
                    let next = self.next_position(i + 1).unwrap_or((self.x, self.y));
                    self.lock_stitches(self.x, self.y, next.0, next.1);
                },
                TIE_OFF => {
                    let (ax, ay) = self.anchor.unwrap_or((self.x, self.y));
                    self.lock_stitches(self.x, self.y, ax, ay);
                },
                SLOW | FAST => {
                    if self.settings.writes_speeds {
                        self.out.add_command(cmd, self.x, self.y);
                    }
                },
                END => {},
                _ => {},
            }
        }
    }

    fn finish(mut self) -> EmbPattern {
        // Pending boundaries with no stitches after them are trailing
        // bookends and are dropped on the floor here.
        if self.section_index > 0 && self.tie_off == CONTINGENCY_TIE_OFF_ALL {
            let (ax, ay) = self.anchor.unwrap_or((self.x, self.y));
            self.lock_stitches(self.x, self.y, ax, ay);
        }
        self.out.add_stitch_absolute(END, self.x, self.y);
        self.out
    }

    /// Sequin policy with the strip override applied
    fn sequin_contingency(&self) -> u32 {
        if self.settings.strip_sequins {
            CONTINGENCY_SEQUIN_REMOVE
        } else {
            self.settings.sequin_contingency
        }
    }

    /// Project an authored coordinate into output space
    fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let (mut tx, mut ty) = self.matrix.point_in_matrix_space(x, y);
        tx += self.settings.translate.0;
        ty += self.settings.translate.1;
        if self.settings.round {
            (tx.round(), ty.round())
        } else {
            (tx, ty)
        }
    }

    fn set_raw(&mut self, x: f64, y: f64) {
        self.raw_x = x;
        self.raw_y = y;
        self.has_stitched = true;
    }

    /// Open the first section or materialize queued color boundaries
    ///
    /// Queued boundaries become: tie-off of the old section, optional TRIM,
    /// one thread-change command each, then a queued tie-on for the new
    /// section.
    fn begin_sewing(&mut self, index: usize, tx: f64, ty: f64, sewing: bool) {
        if self.section_index == 0 {
            self.push_section_thread();
            if self.settings.thread_change_command & COMMAND_MASK == NEEDLE_SET {
                self.emit_needle_set();
            }
            self.section_index = 1;
            if self.tie_on == CONTINGENCY_TIE_ON_ALL {
                self.pending_tie_on = true;
            }
        } else if self.pending_boundaries > 0 {
            if self.tie_off != CONTINGENCY_TIE_OFF_NONE {
                let (ax, ay) = self.anchor.unwrap_or((self.x, self.y));
                self.lock_stitches(self.x, self.y, ax, ay);
            }
            if self.settings.explicit_trim {
                self.out.add_stitch_absolute(TRIM, self.x, self.y);
            }
            for _ in 0..self.pending_boundaries {
                self.push_section_thread();
                match self.settings.thread_change_command & COMMAND_MASK {
                    NEEDLE_SET => self.emit_needle_set(),
                    STOP => self.out.add_stitch_absolute(STOP, self.x, self.y),
                    _ => self
                        .out
                        .add_stitch_absolute(COLOR_CHANGE, self.x, self.y),
                }
                self.section_index += 1;
            }
            self.pending_boundaries = 0;
            if self.tie_on != CONTINGENCY_TIE_ON_NONE {
                self.pending_tie_on = true;
            }
        }

        // Tie-on waits for a sewing command; a jump opening the section
        // travels first.
        if self.pending_tie_on && sewing {
            self.pending_tie_on = false;
            let next = self.next_position(index + 1).unwrap_or((tx, ty));
            self.lock_stitches(tx, ty, next.0, next.1);
        }
    }

    fn push_section_thread(&mut self) {
        let thread = self.source.get_thread_or_filler(self.section_index);
        self.out.add_thread(thread);
    }

    fn emit_needle_set(&mut self) {
        let needle = (self.section_index % self.settings.needle_count.max(1) as usize) as u8 + 1;
        let command = encode_thread_change(NEEDLE_SET, None, Some(needle), None);
        self.out.add_stitch_absolute(command, self.x, self.y);
    }

    /// Transformed position of the next coordinate-bearing source command
    fn next_position(&self, from: usize) -> Option<(f64, f64)> {
        for stitch in &self.source.stitches()[from..] {
            match stitch.command & COMMAND_MASK {
                STITCH | JUMP | SEQUIN_EJECT | SEW_TO | NEEDLE_AT | LONG_STITCH
                | ALTERNATING_STITCH => {
                    return Some(self.project(stitch.x, stitch.y));
                },
                COLOR_CHANGE | COLOR_BREAK | NEEDLE_SET | STOP | TRIM | END => return None,
                _ => {},
            }
        }
        None
    }

    /// Three small anchoring stitches along the segment toward the anchor
    fn lock_stitches(&mut self, x: f64, y: f64, anchor_x: f64, anchor_y: f64) {
        let mut dx = anchor_x - x;
        let mut dy = anchor_y - y;
        let length = dx.abs().max(dy.abs());
        if length > MAX_TIE_LENGTH && length > 0.0 {
            let scale = MAX_TIE_LENGTH / length;
            dx *= scale;
            dy *= scale;
        }
        for amount in [1.0 / 3.0, 2.0 / 3.0, 1.0 / 3.0] {
            let sx = x + dx * amount;
            let sy = y + dy * amount;
            let (sx, sy) = if self.settings.round {
                (sx.round(), sy.round())
            } else {
                (sx, sy)
            };
            self.out.add_stitch_absolute(STITCH, sx, sy);
        }
        self.x = x;
        self.y = y;
    }

    /// Emit a stitch, splitting when it exceeds the profile limit
    fn stitch_to(&mut self, tx: f64, ty: f64, contingency: u32) {
        let dx = tx - self.x;
        let dy = ty - self.y;
        let amax = dx.abs().max(dy.abs());

        if !amax.is_finite() {
            self.place(STITCH, tx, ty);
            return;
        }

        if amax > self.settings.max_stitch {
            match contingency {
                CONTINGENCY_LONG_STITCH_SEW_TO => {
                    let steps = (amax / self.settings.max_stitch).ceil() as usize;
                    let steps = steps.clamp(1, 100_000);
                    let (sx, sy) = (self.x, self.y);
                    for i in 1..=steps {
                        let px = sx + dx * i as f64 / steps as f64;
                        let py = sy + dy * i as f64 / steps as f64;
                        let (px, py) = if self.settings.round {
                            (px.round(), py.round())
                        } else {
                            (px, py)
                        };
                        self.place(STITCH, px, py);
                    }
                },
                CONTINGENCY_LONG_STITCH_NONE => {
                    self.place(STITCH, tx, ty);
                },
                _ => {
                    self.jump_to(tx, ty);
                    self.place(STITCH, tx, ty);
                },
            }
        } else {
            self.place(STITCH, tx, ty);
        }
    }

    /// Emit a jump, splitting when it exceeds the profile limit
    fn jump_to(&mut self, tx: f64, ty: f64) {
        self.travel_to(tx, ty, JUMP);
    }

    /// Travel to a target with intermediate jumps, ending with `final_cmd`
    fn travel_to(&mut self, tx: f64, ty: f64, final_cmd: u32) {
        let max_jump = self.settings.max_jump;
        let dx = tx - self.x;
        let dy = ty - self.y;
        let amax = dx.abs().max(dy.abs());

        if !amax.is_finite() || amax <= max_jump {
            self.place(final_cmd, tx, ty);
            return;
        }

        if self.settings.full_jump {
            // Each step travels the full max_jump per axis, remainder last.
            let mut guard = 100_000;
            while (tx - self.x).abs().max((ty - self.y).abs()) > max_jump && guard > 0 {
                let sx = self.x + (tx - self.x).clamp(-max_jump, max_jump);
                let sy = self.y + (ty - self.y).clamp(-max_jump, max_jump);
                let (sx, sy) = if self.settings.round {
                    (sx.round(), sy.round())
                } else {
                    (sx, sy)
                };
                self.place(JUMP, sx, sy);
                guard -= 1;
            }
            self.place(final_cmd, tx, ty);
        } else {
            let steps = ((amax / max_jump).ceil() as usize).clamp(1, 100_000);
            let (sx, sy) = (self.x, self.y);
            for i in 1..steps {
                let px = sx + dx * i as f64 / steps as f64;
                let py = sy + dy * i as f64 / steps as f64;
                let (px, py) = if self.settings.round {
                    (px.round(), py.round())
                } else {
                    (px, py)
                };
                self.place(JUMP, px, py);
            }
            self.place(final_cmd, tx, ty);
        }
    }

    /// Emit one coordinate command and advance the position state
    fn place(&mut self, command: u32, x: f64, y: f64) {
        self.anchor = Some((self.x, self.y));
        self.out.add_stitch_absolute(command, x, y);
        self.x = x;
        self.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::thread::EmbThread;
    use approx::assert_abs_diff_eq;

    fn square(pattern: &mut EmbPattern) {
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(0.0, 100.0);
        pattern.stitch_abs(100.0, 100.0);
        pattern.stitch_abs(100.0, 0.0);
        pattern.stitch_abs(0.0, 0.0);
    }

    #[test]
    fn test_bookend_color_breaks_absorbed() {
        let mut pattern = EmbPattern::new();
        for _ in 0..4 {
            pattern.color_break();
        }
        square(&mut pattern);
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        for _ in 0..4 {
            pattern.color_break();
        }
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_threads(), 1);
        assert_eq!(normalized.count_stitch_commands(COLOR_CHANGE), 0);
    }

    #[test]
    fn test_multiple_internal_breaks() {
        let mut pattern = EmbPattern::new();
        pattern.color_break();
        square(&mut pattern);
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        for _ in 0..4 {
            pattern.color_break();
        }
        square(&mut pattern);
        pattern.add_thread(EmbThread::from_string("green").unwrap());
        pattern.color_break();
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_stitch_commands(COLOR_CHANGE), 4);
        assert_eq!(normalized.count_threads(), 5);
    }

    #[test]
    fn test_color_thread_accord() {
        let mut pattern = EmbPattern::new();
        for color in ["red", "green", "blue"] {
            pattern.color_break();
            square(&mut pattern);
            pattern.add_thread(EmbThread::from_string(color).unwrap());
        }
        pattern.color_break();
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(
            normalized.count_stitch_commands(COLOR_CHANGE) + 1,
            normalized.count_threads()
        );
    }

    #[test]
    fn test_needle_set_per_section() {
        let mut pattern = EmbPattern::new();
        for color in ["red", "green", "blue"] {
            pattern.color_break();
            square(&mut pattern);
            pattern.add_thread(EmbThread::from_string(color).unwrap());
        }
        pattern.color_break();
        let settings = EncoderSettings {
            thread_change_command: NEEDLE_SET,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert_eq!(
            normalized.count_stitch_commands(NEEDLE_SET),
            normalized.count_threads()
        );
        assert_eq!(normalized.count_stitch_commands(NEEDLE_SET), 3);
    }

    #[test]
    fn test_transcode_to_self_idempotent() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        square(&mut pattern);
        pattern.color_break();
        pattern.add_thread(EmbThread::from_string("blue").unwrap());
        square(&mut pattern);

        let once = pattern.get_normalized_pattern();
        assert!(!once.stitches().is_empty());
        let twice = once.get_normalized_pattern();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_matrix_rotate_blocks_compose() {
        let block = [
            (10.0, 10.0),
            (10.0, 110.0),
            (110.0, 110.0),
            (110.0, 10.0),
            (10.0, 10.0),
        ];
        let mut pattern = EmbPattern::new();
        pattern.add_block(&block, EmbThread::from_string("red").unwrap());
        pattern.add_command(MATRIX_ROTATE, 45.0, 0.0);
        pattern.add_block(&block, EmbThread::from_string("blue").unwrap());
        pattern.add_command(MATRIX_ROTATE, 45.0, 0.0);
        pattern.add_block(&block, EmbThread::from_string("aqua").unwrap());
        let normalized = pattern.get_normalized_pattern();
        let stitches = normalized.stitches();
        assert_abs_diff_eq!(stitches[4].x, stitches[6].x, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[4].y, stitches[6].y, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[10].x, stitches[12].x, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[10].y, stitches[12].y, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[4].x, stitches[12].x, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[4].y, stitches[12].y, epsilon = 1e-7);
    }

    #[test]
    fn test_matrix_translate_blocks() {
        let block = [
            (10.0, 10.0),
            (10.0, 110.0),
            (110.0, 110.0),
            (110.0, 10.0),
            (10.0, 10.0),
        ];
        let mut pattern = EmbPattern::new();
        pattern.add_block(&block, EmbThread::from_string("red").unwrap());
        pattern.add_command(MATRIX_TRANSLATE, 20.0, 40.0);
        pattern.add_block(&block, EmbThread::from_string("blue").unwrap());
        pattern.add_command(MATRIX_TRANSLATE, -20.0, -40.0);
        pattern.add_block(&block, EmbThread::from_string("aqua").unwrap());
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_stitch_commands(MATRIX_TRANSLATE), 0);
        let stitches = normalized.stitches();
        assert_abs_diff_eq!(stitches[4].x, stitches[12].x, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[4].y, stitches[12].y, epsilon = 1e-7);
    }

    #[test]
    fn test_matrix_translate_then_rotate() {
        let block = [
            (0.0, 0.0),
            (0.0, 100.0),
            (100.0, 100.0),
            (100.0, 0.0),
            (0.0, 0.0),
        ];
        let mut pattern = EmbPattern::new();
        pattern.add_block(&block, EmbThread::from_string("red").unwrap());
        pattern.add_command(MATRIX_TRANSLATE, 20.0, 40.0);
        pattern.add_block(&block, EmbThread::from_string("blue").unwrap());
        pattern.add_command(MATRIX_ROTATE, -90.0, 0.0);
        pattern.add_block(&block, EmbThread::from_string("aqua").unwrap());
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_stitch_commands(MATRIX_ROTATE), 0);
        let stitches = normalized.stitches();
        assert_abs_diff_eq!(stitches[14].x, 140.0, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[14].y, -120.0, epsilon = 1e-7);
    }

    #[test]
    fn test_matrix_translate_then_scale() {
        let block = [
            (10.0, 10.0),
            (10.0, 110.0),
            (110.0, 110.0),
            (110.0, 10.0),
            (10.0, 10.0),
        ];
        let mut pattern = EmbPattern::new();
        pattern.add_block(&block, EmbThread::from_string("red").unwrap());
        pattern.add_command(MATRIX_TRANSLATE, 20.0, 40.0);
        pattern.add_block(&block, EmbThread::from_string("blue").unwrap());
        pattern.add_command(MATRIX_SCALE, 2.0, 2.0);
        pattern.add_block(&block, EmbThread::from_string("aqua").unwrap());
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_stitch_commands(MATRIX_SCALE), 0);
        let stitches = normalized.stitches();
        assert_abs_diff_eq!(stitches[13].x, 50.0, epsilon = 1e-7);
        assert_abs_diff_eq!(stitches[13].y, 290.0, epsilon = 1e-7);
    }

    #[test]
    fn test_long_stitch_jump_needle() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(500.0, 0.0);
        let settings = EncoderSettings {
            max_stitch: 120.0,
            max_jump: 120.0,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert!(normalized.count_stitch_commands(JUMP) >= 4);
        // No emitted delta may exceed the limit
        let mut px = 0.0;
        let mut py = 0.0;
        for s in normalized.stitches() {
            let cmd = s.command & COMMAND_MASK;
            if cmd == STITCH || cmd == JUMP {
                assert!((s.x - px).abs() <= 120.0 + 1e-9);
                assert!((s.y - py).abs() <= 120.0 + 1e-9);
            }
            px = s.x;
            py = s.y;
        }
    }

    #[test]
    fn test_long_stitch_sew_to() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(300.0, 0.0);
        let settings = EncoderSettings {
            max_stitch: 100.0,
            long_stitch_contingency: CONTINGENCY_LONG_STITCH_SEW_TO,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert_eq!(normalized.count_stitch_commands(JUMP), 0);
        assert_eq!(normalized.count_stitch_commands(STITCH), 4);
    }

    #[test]
    fn test_translate_option() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(10.0, 10.0);
        let settings = EncoderSettings {
            translate: (5.0, -5.0),
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert_eq!(normalized.stitches()[0].x, 15.0);
        assert_eq!(normalized.stitches()[0].y, 5.0);
    }

    #[test]
    fn test_frame_eject_lowering() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(10.0, 10.0);
        pattern.add_stitch_absolute(FRAME_EJECT, 200.0, 0.0);
        pattern.stitch_abs(20.0, 20.0);
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_stitch_commands(FRAME_EJECT), 0);
        assert_eq!(normalized.count_stitch_commands(STOP), 1);
        assert_eq!(normalized.count_stitch_commands(JUMP), 2);
    }

    #[test]
    fn test_frame_eject_passthrough() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.add_stitch_absolute(FRAME_EJECT, 200.0, 0.0);
        let settings = EncoderSettings {
            writes_frame_eject: true,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert_eq!(normalized.count_stitch_commands(FRAME_EJECT), 1);
        assert_eq!(normalized.count_stitch_commands(STOP), 0);
    }

    #[test]
    fn test_tie_on_three_small() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.stitch_abs(50.0, 0.0);
        pattern.color_break();
        pattern.add_thread(EmbThread::from_string("blue").unwrap());
        pattern.stitch_abs(50.0, 50.0);
        pattern.stitch_abs(100.0, 50.0);
        let settings = EncoderSettings {
            tie_on_contingency: CONTINGENCY_TIE_ON_THREE_SMALL,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        // Second section gains three anchoring stitches.
        assert_eq!(normalized.count_stitch_commands(STITCH), 4 + 3);
        assert_eq!(normalized.count_stitch_commands(COLOR_CHANGE), 1);
    }

    #[test]
    fn test_stops_pass_through() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.stop();
        pattern.stitch_abs(10.0, 0.0);
        let normalized = pattern.get_normalized_pattern();
        assert_eq!(normalized.count_stitch_commands(STOP), 1);
        assert_eq!(normalized.count_threads(), 1);
    }

    #[test]
    fn test_sequin_strip() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(0.0, 0.0);
        pattern.add_stitch_relative(0.0, 0.0, SEQUIN_MODE);
        pattern.add_stitch_absolute(SEQUIN_EJECT, 10.0, 0.0);
        pattern.add_stitch_relative(0.0, 0.0, SEQUIN_MODE);
        let settings = EncoderSettings {
            sequin_contingency: CONTINGENCY_SEQUIN_REMOVE,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert_eq!(normalized.count_stitch_commands(SEQUIN_MODE), 0);
        assert_eq!(normalized.count_stitch_commands(SEQUIN_EJECT), 0);
    }

    #[test]
    fn test_rounding() {
        let mut pattern = EmbPattern::new();
        pattern.add_thread(EmbThread::from_string("red").unwrap());
        pattern.stitch_abs(10.4, 10.6);
        let settings = EncoderSettings {
            round: true,
            ..Default::default()
        };
        let normalized = pattern.get_normalized_pattern_with(settings);
        assert_eq!(normalized.stitches()[0].x, 10.0);
        assert_eq!(normalized.stitches()[0].y, 11.0);
    }
}
