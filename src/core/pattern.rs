//! Embroidery pattern structure and manipulation
//!
//! The core `EmbPattern` type stores stitches, threads and metadata for an
//! embroidery design. The authored stream may freely mix stitch commands,
//! color breaks and matrix transforms; `get_normalized_pattern` runs the
//! encoder to produce a machine-valid stream.

use crate::core::constants::*;
use crate::core::encoder::{EncoderSettings, Transcoder};
use crate::core::thread::EmbThread;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single stitch: a command with a position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stitch {
    /// X coordinate (0.1mm units)
    pub x: f64,
    /// Y coordinate (0.1mm units)
    pub y: f64,
    /// Command (STITCH, JUMP, TRIM, ...), payload in the high bits
    pub command: u32,
}

impl Stitch {
    /// Create a new stitch
    pub const fn new(x: f64, y: f64, command: u32) -> Self {
        Self { x, y, command }
    }

    /// The core command with payload bits stripped
    #[inline]
    pub fn base_command(&self) -> u32 {
        self.command & COMMAND_MASK
    }
}

impl std::fmt::Display for Stitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Stitch({:.2}, {:.2}, {})",
            self.x,
            self.y,
            command_name(self.command)
        )
    }
}

/// Main embroidery pattern structure
///
/// # Example
///
/// ```
/// use stitchwise::prelude::*;
///
/// let mut pattern = EmbPattern::new();
/// pattern.add_thread(EmbThread::from_string("red").unwrap());
/// pattern.stitch_abs(0.0, 0.0);
/// pattern.stitch_abs(100.0, 100.0);
/// let normalized = pattern.get_normalized_pattern();
/// assert_eq!(normalized.count_stitch_commands(STITCH), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbPattern {
    stitches: Vec<Stitch>,
    thread_list: Vec<EmbThread>,
    extras: HashMap<String, String>,
    previous_x: f64,
    previous_y: f64,
}

impl EmbPattern {
    /// Create a new empty pattern
    pub fn new() -> Self {
        Self {
            stitches: Vec::new(),
            thread_list: Vec::new(),
            extras: HashMap::new(),
            previous_x: 0.0,
            previous_y: 0.0,
        }
    }

    /// Create a pattern from existing stitches and threads
    pub fn from_stitches(stitches: Vec<Stitch>, threads: Vec<EmbThread>) -> Self {
        let (previous_x, previous_y) = stitches.last().map_or((0.0, 0.0), |s| (s.x, s.y));
        Self {
            stitches,
            thread_list: threads,
            extras: HashMap::new(),
            previous_x,
            previous_y,
        }
    }

    /// Reference to the stitch stream
    pub fn stitches(&self) -> &[Stitch] {
        &self.stitches
    }

    /// Reference to the threadlist
    pub fn threads(&self) -> &[EmbThread] {
        &self.thread_list
    }

    /// Reference to the metadata map
    pub fn extras(&self) -> &HashMap<String, String> {
        &self.extras
    }

    /// Add a stitch at an absolute position, updating the current position
    pub fn add_stitch_absolute(&mut self, command: u32, x: f64, y: f64) {
        self.stitches.push(Stitch::new(x, y, command));
        self.previous_x = x;
        self.previous_y = y;
    }

    /// Add a stitch relative to the current position
    pub fn add_stitch_relative(&mut self, dx: f64, dy: f64, command: u32) {
        let x = self.previous_x + dx;
        let y = self.previous_y + dy;
        self.add_stitch_absolute(command, x, y);
    }

    /// Append a command without updating the current position
    ///
    /// Control commands (matrix transforms, breaks) carry their payload in
    /// the coordinate slots, so they must not move the needle.
    pub fn add_command(&mut self, command: u32, x: f64, y: f64) {
        self.stitches.push(Stitch::new(x, y, command));
    }

    /// Add a thread to the threadlist
    pub fn add_thread(&mut self, thread: EmbThread) {
        self.thread_list.push(thread);
    }

    /// Declare a thread by color string, marking a color break if stitches
    /// were sewn since the last break
    ///
    /// This mirrors the authoring shorthand of appending a color name to a
    /// pattern: the thread lands in the threadlist and, when the current
    /// section already has stitches, a `COLOR_BREAK` is appended.
    pub fn add_thread_break(&mut self, thread: EmbThread) {
        self.add_thread(thread);
        for stitch in self.stitches.iter().rev() {
            match stitch.command & COMMAND_MASK {
                STITCH | SEW_TO | NEEDLE_AT | LONG_STITCH | ALTERNATING_STITCH => {
                    self.add_command(COLOR_BREAK, 0.0, 0.0);
                    return;
                },
                COLOR_BREAK => return,
                _ => {},
            }
        }
    }

    /// Set a metadata value
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extras.insert(key.into(), value.into());
    }

    /// Alias of [`EmbPattern::set_metadata`]
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_metadata(key, value);
    }

    /// Get a metadata value
    pub fn get_metadata(&self, key: &str) -> Option<&String> {
        self.extras.get(key)
    }

    /// Convenience: relative stitch
    pub fn stitch(&mut self, dx: f64, dy: f64) {
        self.add_stitch_relative(dx, dy, STITCH);
    }

    /// Convenience: absolute stitch
    pub fn stitch_abs(&mut self, x: f64, y: f64) {
        self.add_stitch_absolute(STITCH, x, y);
    }

    /// Convenience: relative jump
    pub fn jump(&mut self, dx: f64, dy: f64) {
        self.add_stitch_relative(dx, dy, JUMP);
    }

    /// Convenience: absolute jump
    pub fn jump_abs(&mut self, x: f64, y: f64) {
        self.add_stitch_absolute(JUMP, x, y);
    }

    /// Convenience: relative needle-up move
    pub fn move_rel(&mut self, dx: f64, dy: f64) {
        self.add_stitch_relative(dx, dy, MOVE);
    }

    /// Convenience: absolute needle-up move
    pub fn move_abs(&mut self, x: f64, y: f64) {
        self.add_stitch_absolute(MOVE, x, y);
    }

    /// Convenience: trim at the current position
    pub fn trim(&mut self) {
        self.add_stitch_relative(0.0, 0.0, TRIM);
    }

    /// Convenience: stop at the current position
    pub fn stop(&mut self) {
        self.add_stitch_relative(0.0, 0.0, STOP);
    }

    /// Convenience: end of pattern
    pub fn end(&mut self) {
        self.add_stitch_relative(0.0, 0.0, END);
    }

    /// Convenience: color change
    pub fn color_change(&mut self, dx: f64, dy: f64) {
        self.add_stitch_relative(dx, dy, COLOR_CHANGE);
    }

    /// Convenience: color break marker
    pub fn color_break(&mut self) {
        self.add_command(COLOR_BREAK, 0.0, 0.0);
    }

    /// Convenience: explicit needle selection
    pub fn needle_set(&mut self, needle: u8) {
        let cmd = crate::utils::functions::encode_thread_change(
            NEEDLE_SET,
            None,
            Some(needle),
            None,
        );
        self.add_stitch_relative(0.0, 0.0, cmd);
    }

    /// Add a block of absolute stitches followed by a color break
    ///
    /// # Example
    ///
    /// ```
    /// use stitchwise::prelude::*;
    ///
    /// let mut pattern = EmbPattern::new();
    /// let square = [(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)];
    /// pattern.add_block(&square, EmbThread::from_string("red").unwrap());
    /// assert_eq!(pattern.count_stitch_commands(COLOR_BREAK), 1);
    /// ```
    pub fn add_block(&mut self, points: &[(f64, f64)], thread: EmbThread) {
        self.add_thread(thread);
        for &(x, y) in points {
            self.stitch_abs(x, y);
        }
        self.add_command(COLOR_BREAK, 0.0, 0.0);
    }

    /// Count stream commands matching the given tag
    pub fn count_stitch_commands(&self, command: u32) -> usize {
        let target = command & COMMAND_MASK;
        self.stitches
            .iter()
            .filter(|s| s.command & COMMAND_MASK == target)
            .count()
    }

    /// Number of threads in the threadlist
    pub fn count_threads(&self) -> usize {
        self.thread_list.len()
    }

    /// Count transitions between distinct color blocks
    ///
    /// Runs of consecutive `COLOR_BREAK` markers collapse into a single
    /// boundary; a boundary between two RGB-equal threads does not count.
    /// Boundaries before the first stitch are authoring bookends and are
    /// ignored.
    pub fn count_color_changes(&self) -> usize {
        let mut count = 0;
        let mut thread_index = 0usize;
        let mut has_stitched = false;
        let mut in_break_run = false;

        for stitch in &self.stitches {
            match stitch.command & COMMAND_MASK {
                STITCH | SEW_TO | NEEDLE_AT | LONG_STITCH | ALTERNATING_STITCH => {
                    has_stitched = true;
                    in_break_run = false;
                },
                COLOR_BREAK => {
                    if has_stitched && !in_break_run {
                        if self.threads_differ(thread_index, thread_index + 1) {
                            count += 1;
                        }
                        thread_index += 1;
                        in_break_run = true;
                    }
                },
                COLOR_CHANGE | NEEDLE_SET => {
                    if has_stitched {
                        if self.threads_differ(thread_index, thread_index + 1) {
                            count += 1;
                        }
                        thread_index += 1;
                        in_break_run = true;
                    }
                },
                _ => {},
            }
        }
        count
    }

    fn threads_differ(&self, a: usize, b: usize) -> bool {
        match (self.thread_list.get(a), self.thread_list.get(b)) {
            (Some(ta), Some(tb)) => ta != tb,
            _ => true,
        }
    }

    /// Pattern bounds as (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for stitch in &self.stitches {
            if !stitch.x.is_finite() || !stitch.y.is_finite() {
                continue;
            }
            min_x = min_x.min(stitch.x);
            max_x = max_x.max(stitch.x);
            min_y = min_y.min(stitch.y);
            max_y = max_y.max(stitch.y);
        }

        if !min_x.is_finite() {
            return (0.0, 0.0, 0.0, 0.0);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Translate the whole pattern by the given offset
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        for stitch in &mut self.stitches {
            stitch.x += dx;
            stitch.y += dy;
        }
        self.previous_x += dx;
        self.previous_y += dy;
    }

    /// Get the thread at the given index, or a deterministic filler
    pub fn get_thread_or_filler(&self, index: usize) -> EmbThread {
        self.thread_list.get(index).cloned().unwrap_or_else(|| {
            let r = ((index * 37) % 256) as u8;
            let g = ((index * 91) % 256) as u8;
            let b = ((index * 173) % 256) as u8;
            EmbThread::from_rgb(r, g, b)
        })
    }

    /// Normalize with default encoder settings, returning a fresh pattern
    pub fn get_normalized_pattern(&self) -> EmbPattern {
        self.get_normalized_pattern_with(EncoderSettings::default())
    }

    /// Normalize with the given encoder settings, returning a fresh pattern
    pub fn get_normalized_pattern_with(&self, settings: EncoderSettings) -> EmbPattern {
        Transcoder::with_settings(settings).transcode(self)
    }

    // ---- In-place interpolation rewrites ----

    /// Ensure the threadlist matches the number of color sections
    ///
    /// Pads with random threads when short, truncates when long.
    pub fn fix_color_count(&mut self) {
        let mut thread_index = 0usize;
        let mut init_color = true;

        for stitch in &self.stitches {
            match stitch.command & COMMAND_MASK {
                STITCH | SEW_TO | NEEDLE_AT | LONG_STITCH | ALTERNATING_STITCH => {
                    if init_color {
                        thread_index += 1;
                        init_color = false;
                    }
                },
                COLOR_CHANGE | COLOR_BREAK | NEEDLE_SET => {
                    init_color = true;
                },
                _ => {},
            }
        }

        while self.thread_list.len() < thread_index {
            self.thread_list.push(EmbThread::random());
        }
        if thread_index > 0 {
            self.thread_list.truncate(thread_index);
        }
    }

    /// Replace color boundaries between RGB-equal threads with STOP
    ///
    /// Where two consecutive threadlist entries are equal, the
    /// `COLOR_CHANGE` (or `COLOR_BREAK`) between their sections becomes a
    /// `STOP` and the duplicate thread entry is removed. Interleaved
    /// distinct colors are preserved. Inverse of
    /// [`EmbPattern::interpolate_stop_as_duplicate_color`].
    pub fn interpolate_duplicate_color_as_stop(&mut self) {
        let mut thread_index = 0usize;
        let mut has_stitched = false;

        for i in 0..self.stitches.len() {
            match self.stitches[i].command & COMMAND_MASK {
                STITCH | SEW_TO | NEEDLE_AT | LONG_STITCH | ALTERNATING_STITCH => {
                    has_stitched = true;
                },
                COLOR_CHANGE | COLOR_BREAK => {
                    if !has_stitched {
                        continue;
                    }
                    let equal = matches!(
                        (
                            self.thread_list.get(thread_index),
                            self.thread_list.get(thread_index + 1),
                        ),
                        (Some(a), Some(b)) if a == b
                    );
                    if equal {
                        let stitch = &mut self.stitches[i];
                        stitch.command = (stitch.command & !COMMAND_MASK) | STOP;
                        self.thread_list.remove(thread_index + 1);
                    } else {
                        thread_index += 1;
                    }
                },
                _ => {},
            }
        }
    }

    /// Replace every STOP with a color change to a duplicated thread
    ///
    /// The threadlist grows by duplicating the stopped section's thread; a
    /// STOP that follows a color boundary duplicates the next declared
    /// thread instead. No-op when the threadlist is empty.
    pub fn interpolate_stop_as_duplicate_color(&mut self) {
        if self.thread_list.is_empty() {
            return;
        }

        let mut thread_index = 0usize;
        let mut init_color = true;

        for i in 0..self.stitches.len() {
            match self.stitches[i].command & COMMAND_MASK {
                STITCH | SEW_TO | NEEDLE_AT | LONG_STITCH | ALTERNATING_STITCH => {
                    if init_color {
                        thread_index += 1;
                        init_color = false;
                    }
                },
                COLOR_CHANGE | COLOR_BREAK | NEEDLE_SET => {
                    init_color = true;
                },
                STOP => {
                    let duplicate = if init_color {
                        self.get_thread_or_filler(thread_index)
                    } else {
                        self.get_thread_or_filler(thread_index.saturating_sub(1))
                    };
                    let at = thread_index.min(self.thread_list.len());
                    self.thread_list.insert(at, duplicate);
                    thread_index += 1;
                    let stitch = &mut self.stitches[i];
                    stitch.command = (stitch.command & !COMMAND_MASK) | COLOR_CHANGE;
                },
                _ => {},
            }
        }
    }

    /// Collapse `(JUMP* STOP JUMP*)` clusters into single FRAME_EJECTs
    ///
    /// The frame eject lands at the STOP's coordinates; the surrounding
    /// jumps vanish. Handles a trailing cluster at the end of the pattern.
    pub fn interpolate_frame_eject(&mut self) {
        let stitches = std::mem::take(&mut self.stitches);
        let mut result = Vec::with_capacity(stitches.len());
        let mut i = 0;

        while i < stitches.len() {
            if stitches[i].command & COMMAND_MASK == JUMP {
                let run_start = i;
                while i < stitches.len() && stitches[i].command & COMMAND_MASK == JUMP {
                    i += 1;
                }
                if i < stitches.len() && stitches[i].command & COMMAND_MASK == STOP {
                    let stop = stitches[i];
                    i += 1;
                    while i < stitches.len() && stitches[i].command & COMMAND_MASK == JUMP {
                        i += 1;
                    }
                    result.push(Stitch::new(stop.x, stop.y, FRAME_EJECT));
                } else {
                    result.extend_from_slice(&stitches[run_start..i]);
                }
            } else {
                result.push(stitches[i]);
                i += 1;
            }
        }

        self.stitches = result;
    }

    /// Insert TRIM commands where runs of jumps indicate travel
    ///
    /// A run of at least `trim_at` jumps is prefixed by a trim; when
    /// `trim_distance` is given, only runs that travel at least that far
    /// qualify.
    pub fn interpolate_trims(&mut self, trim_at: usize, trim_distance: Option<f64>) {
        if self.stitches.is_empty() || trim_at == 0 {
            return;
        }

        let stitches = std::mem::take(&mut self.stitches);
        let mut result: Vec<Stitch> = Vec::with_capacity(stitches.len());
        let mut i = 0;

        while i < stitches.len() {
            if stitches[i].command & COMMAND_MASK == JUMP {
                let run_start = i;
                while i < stitches.len() && stitches[i].command & COMMAND_MASK == JUMP {
                    i += 1;
                }
                let run = &stitches[run_start..i];
                let qualified = run.len() >= trim_at
                    && trim_distance.map_or(true, |dist| {
                        let (sx, sy) = result
                            .last()
                            .map_or((0.0, 0.0), |s: &Stitch| (s.x, s.y));
                        let last = run[run.len() - 1];
                        let dx = last.x - sx;
                        let dy = last.y - sy;
                        (dx * dx + dy * dy).sqrt() >= dist
                    });
                if qualified {
                    let (tx, ty) = result.last().map_or((0.0, 0.0), |s| (s.x, s.y));
                    result.push(Stitch::new(tx, ty, TRIM));
                }
                result.extend_from_slice(run);
            } else {
                result.push(stitches[i]);
                i += 1;
            }
        }

        self.stitches = result;
    }
}

impl Default for EmbPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EmbPattern {
    /// Equality by stitches, threadlist and metadata; the transient
    /// relative-position cursor is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.stitches == other.stitches
            && self.thread_list == other.thread_list
            && self.extras == other.extras
    }
}

impl std::ops::Index<usize> for EmbPattern {
    type Output = Stitch;

    fn index(&self, index: usize) -> &Stitch {
        &self.stitches[index]
    }
}

impl std::ops::AddAssign<&EmbPattern> for EmbPattern {
    /// Merge another pattern onto this one
    ///
    /// A trailing END on the left side is stripped, a `COLOR_BREAK` marks
    /// the junction when the left tail is not already a break, then
    /// stitches and threadlists concatenate.
    fn add_assign(&mut self, other: &EmbPattern) {
        if let Some(last) = self.stitches.last() {
            if last.command & COMMAND_MASK == END {
                self.stitches.pop();
            }
        }
        if let Some(last) = self.stitches.last() {
            if last.command & COMMAND_MASK != COLOR_BREAK {
                self.add_command(COLOR_BREAK, 0.0, 0.0);
            }
        }
        self.stitches.extend_from_slice(&other.stitches);
        self.thread_list.extend(other.thread_list.iter().cloned());
        if let Some(last) = self.stitches.last() {
            self.previous_x = last.x;
            self.previous_y = last.y;
        }
    }
}

impl std::ops::AddAssign<EmbPattern> for EmbPattern {
    fn add_assign(&mut self, other: EmbPattern) {
        *self += &other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift_pattern() -> EmbPattern {
        let mut pattern = EmbPattern::new();
        for shift in 0..3 {
            let mut points = Vec::new();
            for i in 0..4 {
                let y = (i * 10 + shift * 40) as f64;
                points.push((0.0, y));
                points.push((100.0, y));
            }
            pattern.add_block(&points, EmbThread::from_string("blue").unwrap());
        }
        pattern
    }

    #[test]
    fn test_pattern_equal() {
        let shift0 = shift_pattern();
        let shift1 = shift_pattern();
        assert_eq!(shift0, shift1);
    }

    #[test]
    fn test_pattern_metadata_breaks_equality() {
        let shift0 = shift_pattern();
        let mut shift1 = shift_pattern();
        shift1.set_metadata("name", "shifty");
        assert_ne!(shift0, shift1);
    }

    #[test]
    fn test_pattern_merge_strips_end() {
        let mut shift0 = shift_pattern();
        let shift1 = shift_pattern();
        shift0.add_command(END, 0.0, 0.0);
        let last_pos = shift0.stitches().len() - 1;
        assert_eq!(shift0[last_pos].command & COMMAND_MASK, END);
        shift0 += &shift1;
        assert_ne!(shift0[last_pos].command & COMMAND_MASK, END);

        let mut shift2 = shift_pattern();
        shift2 += shift_pattern();
        assert_eq!(shift0, shift2);
    }

    #[test]
    fn test_pattern_merge_color_counts() {
        let mut p0 = EmbPattern::new();
        p0.add_thread_break(EmbThread::from_string("blue").unwrap());
        p0.stitch_abs(0.0, 0.0);
        p0.stitch_abs(1.0, 1.0);
        p0.stitch_abs(2.0, 2.0);
        p0.add_thread_break(EmbThread::from_string("red").unwrap());
        p0.stitch_abs(4.0, 4.0);

        let mut p1 = EmbPattern::new();
        p1.add_thread_break(EmbThread::from_string("red").unwrap());
        for _ in 0..10 {
            p1.stitch_abs(0.0, 0.0);
            p1.stitch_abs(1.0, 1.0);
            p1.stitch_abs(2.0, 2.0);
        }
        p1.add_thread_break(EmbThread::from_string("yellow").unwrap());
        p1.stitch_abs(4.0, 4.0);

        p0 += &p1;
        assert_eq!(p0.count_color_changes(), 2);
    }

    #[test]
    fn test_pattern_merge_color_counts_with_leading_breaks() {
        let mut p0 = EmbPattern::new();
        p0.color_break();
        p0.add_thread_break(EmbThread::from_string("blue").unwrap());
        p0.stitch_abs(0.0, 0.0);
        p0.stitch_abs(1.0, 1.0);
        p0.stitch_abs(2.0, 2.0);
        p0.add_thread_break(EmbThread::from_string("red").unwrap());
        p0.stitch_abs(4.0, 4.0);

        let mut p1 = EmbPattern::new();
        p1.color_break();
        p1.add_thread_break(EmbThread::from_string("red").unwrap());
        p1.stitch_abs(0.0, 0.0);
        p1.stitch_abs(1.0, 1.0);
        p1.stitch_abs(2.0, 2.0);
        p1.add_thread_break(EmbThread::from_string("yellow").unwrap());
        p1.stitch_abs(4.0, 4.0);

        p0 += &p1;
        assert_eq!(p0.count_color_changes(), 2);
    }

    #[test]
    fn test_relative_and_absolute_positions() {
        let mut pattern = EmbPattern::new();
        pattern.stitch_abs(10.0, 10.0);
        pattern.stitch(5.0, -5.0);
        assert_eq!(pattern[1].x, 15.0);
        assert_eq!(pattern[1].y, 5.0);
    }

    #[test]
    fn test_bounds() {
        let mut pattern = EmbPattern::new();
        pattern.stitch_abs(-10.0, -20.0);
        pattern.stitch_abs(30.0, 40.0);
        assert_eq!(pattern.bounds(), (-10.0, -20.0, 30.0, 40.0));
    }

    #[test]
    fn test_count_stitch_commands_masks_payload() {
        let mut pattern = EmbPattern::new();
        pattern.needle_set(4);
        pattern.needle_set(5);
        assert_eq!(pattern.count_stitch_commands(NEEDLE_SET), 2);
    }

    #[test]
    fn test_fix_color_count_pads() {
        let mut pattern = EmbPattern::new();
        pattern.stitch_abs(0.0, 0.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(10.0, 10.0);
        pattern.color_change(0.0, 0.0);
        pattern.stitch_abs(20.0, 20.0);
        pattern.fix_color_count();
        assert_eq!(pattern.count_threads(), 3);
    }
}
