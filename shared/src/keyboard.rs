//! Text-to-keypress macro playback for the PET keyboard matrix.

use crate::simulator::{KeyPosition, Simulator};

/// Shift-lock key. It is momentary in the matrix, so it is re-pressed every
/// tick while the lock is engaged.
pub const SHIFT_LOCK_KEY: KeyPosition = KeyPosition::new(8, 0);
pub const SHIFT_LOCK_ELEMENT_ID: &str = "key_8_0_lock";

/// Matrix position of the key producing `ch`, if there is one.
pub fn ascii_to_matrix(ch: char) -> Option<KeyPosition> {
    let (row, column) = match ch.to_ascii_lowercase() {
        '!' => (0, 0),
        '#' => (0, 1),
        '%' => (0, 2),
        '&' => (0, 3),
        '(' => (0, 4),
        '"' => (1, 0),
        '$' => (1, 1),
        '\'' => (1, 2),
        '\\' => (1, 3),
        ')' => (1, 4),

        'q' => (2, 0),
        'e' => (2, 1),
        't' => (2, 2),
        'u' => (2, 3),
        'o' => (2, 4),
        '7' => (2, 6),
        '9' => (2, 7),

        'w' => (3, 0),
        'r' => (3, 1),
        'y' => (3, 2),
        'i' => (3, 3),
        'p' => (3, 4),
        '8' => (3, 6),
        '/' => (3, 7),

        'a' => (4, 0),
        'd' => (4, 1),
        'g' => (4, 2),
        'j' => (4, 3),
        'l' => (4, 4),
        '4' => (4, 6),
        '6' => (4, 7),

        's' => (5, 0),
        'f' => (5, 1),
        'h' => (5, 2),
        'k' => (5, 3),
        ':' => (5, 4),
        '5' => (5, 6),
        '*' => (5, 7),

        'z' => (6, 0),
        'c' => (6, 1),
        'b' => (6, 2),
        'm' => (6, 3),
        ';' => (6, 4),
        '\n' => (6, 5),
        '1' => (6, 6),
        '3' => (6, 7),

        'x' => (7, 0),
        'v' => (7, 1),
        'n' => (7, 2),
        ',' => (7, 3),
        '?' => (7, 4),
        '2' => (7, 6),
        '+' => (7, 7),

        '@' => (8, 1),
        ']' => (8, 2),
        '>' => (8, 4),
        '0' => (8, 6),
        '-' => (8, 7),

        '[' => (9, 1),
        ' ' => (9, 2),
        '<' => (9, 4),
        '.' => (9, 6),
        '=' => (9, 7),
        _ => return None,
    };
    Some(KeyPosition::new(row, column))
}

#[derive(Debug, Clone)]
pub struct KeyboardMacroPlayer {
    queue: Vec<char>,
    cursor: usize,
    delay: i64,
    spacing: u32,
    shift_locked: bool,
}

impl KeyboardMacroPlayer {
    pub fn new(spacing_ticks: u32) -> Self {
        Self {
            queue: Vec::new(),
            cursor: 0,
            delay: 0,
            spacing: spacing_ticks,
            shift_locked: false,
        }
    }

    /// Replaces any pending playback with `text`, terminated by one newline.
    pub fn submit(&mut self, text: &str) {
        let mut queue: Vec<char> = text.trim_end_matches(['\n', '\r']).chars().collect();
        queue.push('\n');
        log::debug!("queued keyboard macro of {} characters", queue.len());
        self.queue = queue;
        self.cursor = 0;
        self.delay = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.cursor < self.queue.len()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.cursor)
    }

    pub fn shift_locked(&self) -> bool {
        self.shift_locked
    }

    pub fn toggle_shift_lock(&mut self) -> bool {
        self.shift_locked = !self.shift_locked;
        self.shift_locked
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.cursor = 0;
        self.delay = 0;
        self.shift_locked = false;
    }

    /// Advances playback by one refresh tick.
    pub fn tick(&mut self, simulator: &mut impl Simulator) {
        if self.shift_locked {
            simulator.key_pressed(SHIFT_LOCK_KEY);
        }
        if !self.is_playing() {
            return;
        }
        match simulator.num_keys_down() {
            Ok(0) => {}
            Ok(_) => return,
            Err(err) => {
                log::warn!("keyboard macro paused: {err}");
                return;
            }
        }
        self.delay -= 1;
        if self.delay >= 0 {
            return;
        }
        if let Some(key) = ascii_to_matrix(self.queue[self.cursor]) {
            simulator.key_pressed(key);
            self.delay = i64::from(self.spacing);
        }
        self.cursor += 1;
    }
}
