pub const DIGIT_HEIGHT: usize = 5;
pub const DIGIT_WIDTH: usize = 6;
pub const DIGIT_SPACING: usize = 2;

const COLON_WIDTH: usize = 2;

/// Width of an `MM:SS` countdown plus one column of padding each side.
pub const COUNTDOWN_MIN_WIDTH: u16 =
    (4 * DIGIT_WIDTH + COLON_WIDTH + 4 * DIGIT_SPACING + 2) as u16;

/// Largest countdown the block digits can show.
const MAX_DISPLAY_SECS: u64 = 99 * 60 + 59;

const DIGITS: [[&str; 5]; 10] = [
    // 0
    [
        "██████",
        "██  ██",
        "██  ██",
        "██  ██",
        "██████",
    ],
    // 1
    [
        "  ██  ",
        "  ██  ",
        "  ██  ",
        "  ██  ",
        "  ██  ",
    ],
    // 2
    [
        "██████",
        "    ██",
        "██████",
        "██    ",
        "██████",
    ],
    // 3
    [
        "██████",
        "    ██",
        "██████",
        "    ██",
        "██████",
    ],
    // 4
    [
        "██  ██",
        "██  ██",
        "██████",
        "    ██",
        "    ██",
    ],
    // 5
    [
        "██████",
        "██    ",
        "██████",
        "    ██",
        "██████",
    ],
    // 6
    [
        "██████",
        "██    ",
        "██████",
        "██  ██",
        "██████",
    ],
    // 7
    [
        "██████",
        "    ██",
        "    ██",
        "    ██",
        "    ██",
    ],
    // 8
    [
        "██████",
        "██  ██",
        "██████",
        "██  ██",
        "██████",
    ],
    // 9
    [
        "██████",
        "██  ██",
        "██████",
        "    ██",
        "██████",
    ],
];

const COLON: [&str; 5] = [
    "  ",
    "██",
    "  ",
    "██",
    "  ",
];

fn glyph(c: char) -> [&'static str; DIGIT_HEIGHT] {
    match c.to_digit(10) {
        Some(d) => DIGITS[d as usize],
        None => COLON,
    }
}

/// Render seconds as block-digit `MM:SS` rows, saturating at 99:59.
pub fn render_countdown(total_secs: u64) -> Vec<String> {
    let total_secs = total_secs.min(MAX_DISPLAY_SECS);
    let text = format!("{:02}:{:02}", total_secs / 60, total_secs % 60);
    let spacing = " ".repeat(DIGIT_SPACING);

    (0..DIGIT_HEIGHT)
        .map(|row| {
            text.chars()
                .map(|c| glyph(c)[row])
                .collect::<Vec<_>>()
                .join(&spacing)
        })
        .collect()
}

/// Five dots with one enlarged, or all small when `position` is `None`.
pub fn render_wave(position: Option<usize>) -> String {
    const LARGE: &str = "●";
    const SMALL: &str = "·";

    (0..5)
        .map(|i| if Some(i) == position { LARGE } else { SMALL })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bounce 0,1,2,3,4,3,2,1 so one sweep takes 8 ticks.
pub fn wave_position(tick_count: u32) -> usize {
    let tick = (tick_count % 8) as usize;
    if tick < 5 {
        tick
    } else {
        8 - tick
    }
}
