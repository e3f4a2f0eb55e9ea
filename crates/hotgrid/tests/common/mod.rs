#![allow(dead_code)]

use hotgrid::{Document, DocumentOptions, Glyph, PageLayout};

pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;

/// Horizontal advance of the monospaced test font.
pub const ADVANCE: f64 = 6.0;
pub const GLYPH_WIDTH: f64 = 5.5;

/// Lines of the resume fixture: text, left edge, bottom edge, analyzer run.
pub const RESUME: &[(&str, f64, f64, &str)] = &[
    ("JANE SMITH", 72.0, 740.0, "line-0"),
    ("SOFTWARE ENGINEER", 72.0, 720.0, "line-1"),
    ("EDUCATION", 72.0, 680.0, "line-2"),
    ("DEGREE", 72.0, 660.0, "line-3"),
    ("BACHELOR OF SCIENCE", 300.0, 660.0, "line-4"),
    ("UNIVERSITY OF TORONTO", 72.0, 640.0, "line-5"),
    ("EXPERIENCE", 72.0, 600.0, "line-6"),
    ("SOFTWARE ENGINEER AT ACME CORP", 72.0, 580.0, "line-7"),
    ("VOLUNTEER EXPERIENCE OR LEADERSHIP", 72.0, 540.0, "line-8"),
    ("SKILLS", 72.0, 500.0, "line-9"),
    ("RUST PYTHON SQL", 72.0, 480.0, "line-10"),
];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Push one run of text. Words are separated by a synthetic space and an
/// empty slot, the way the analyzer reports inter-word gaps.
pub fn push_line(layout: &mut PageLayout, text: &str, x: f64, y0: f64, run: &str) {
    let mut cursor = x;
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            layout.push(Glyph::synthetic_space(run));
            cursor += ADVANCE;
        }
        for ch in word.chars() {
            layout.push(Glyph::new(ch.to_string(), cursor, cursor + GLYPH_WIDTH, y0).in_run(run));
            cursor += ADVANCE;
        }
    }
}

pub fn resume_layout() -> PageLayout {
    let mut layout = PageLayout::new(PAGE_WIDTH, PAGE_HEIGHT);
    for &(text, x, y0, run) in RESUME {
        push_line(&mut layout, text, x, y0, run);
    }
    layout
}

pub fn resume() -> Document {
    init_logger();
    Document::from_layouts(&[resume_layout()], DocumentOptions::default())
        .expect("default options are valid")
}

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("cannot read {path}: {err}"))
}

/// Concatenated text of one match.
pub fn text_of(group: &[&hotgrid::CharRecord]) -> String {
    group.iter().map(|c| c.value.as_str()).collect()
}
