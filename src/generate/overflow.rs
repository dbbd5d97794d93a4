/// Overflow enforcement.
///
/// After binding, every text box in the deck is measured against the
/// capacity estimator. Content that does not fit is split at a wrapped-line
/// boundary and carried onto continuation slides, never truncated. The wrap
/// tracks byte offsets into the original string, so a split is
/// reconstruction-exact: `text[..boundary]` stays, `text[boundary..]`
/// carries over, and their concatenation is the original text.
use crate::capacity::{self, Capacity};
use crate::error::{Error, Result};
use crate::generate::binder::GeneratedSlide;
use crate::template::model::{Layout, Placeholder};
use crate::template::role::Role;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::ops::Range;

/// Bound on continuation slides per original slide.
pub const MAX_CONTINUATIONS: u32 = 5;
/// Character budget for label boxes and continuation titles.
pub const TITLE_BUDGET: usize = 60;

/// Label-box heuristic: large font with almost no vertical room.
const LABEL_FONT_PT: f32 = 24.0;
const LABEL_MAX_LINES: usize = 2;

const CONT_SUFFIX: &str = " (cont.)";

/// Measurement of one split box, kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BoxMeasure {
    pub placeholder_index: usize,
    pub original_chars: usize,
    pub fitted_chars: usize,
    pub retained: String,
    pub lost: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlideOverflow {
    /// Ordinal of the originating slide spec.
    pub origin: usize,
    pub boxes: Vec<BoxMeasure>,
    /// Carry-over text that never found a box.
    pub unplaced: Vec<String>,
}

/// Structured report surfaced when the continuation bound is exceeded.
#[derive(Debug, Clone, Serialize)]
pub struct OverflowReport {
    pub affected_slides: usize,
    pub slides: Vec<SlideOverflow>,
}

impl fmt::Display for OverflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slide(s) affected", self.affected_slides)?;
        for slide in &self.slides {
            write!(f, "; slide {}", slide.origin)?;
            for b in &slide.boxes {
                write!(
                    f,
                    ": box {} kept {} of {} chars",
                    b.placeholder_index, b.fitted_chars, b.original_chars
                )?;
            }
            let pending: usize = slide.unplaced.iter().map(|t| t.chars().count()).sum();
            if pending > 0 {
                write!(f, " ({pending} chars unplaced)")?;
            }
        }
        Ok(())
    }
}

/// Byte ranges of word-wrapped lines. Ranges are contiguous and cover the
/// whole string; each range carries its trailing separator, so the start of
/// range `k` is a lossless split point. Words longer than `chars_per_line`
/// occupy a line alone and are never broken.
pub fn wrap_spans(text: &str, chars_per_line: usize) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    if text.is_empty() {
        return spans;
    }

    let mut pos = 0;
    for line in text.split('\n') {
        let end = pos + line.len();
        // Trailing separator byte, when one follows.
        let sep_end = if end < text.len() { end + 1 } else { end };
        if line.is_empty() || chars_per_line == 0 {
            spans.push(pos..sep_end);
        } else {
            wrap_hard_line(line, pos, sep_end, chars_per_line, &mut spans);
        }
        pos = sep_end;
    }
    spans
}

fn wrap_hard_line(
    line: &str,
    base: usize,
    sep_end: usize,
    chars_per_line: usize,
    spans: &mut Vec<Range<usize>>,
) {
    let mut line_start = 0usize;
    let mut count = 0usize;
    let mut prev_end = 0usize;

    for (word_start, word_end) in words(line) {
        if count == 0 {
            // Leading separators render too and count against the line.
            count = line[line_start..word_end].chars().count();
        } else {
            let added = line[prev_end..word_end].chars().count();
            if count + added <= chars_per_line {
                count += added;
            } else {
                spans.push(base + line_start..base + word_start);
                line_start = word_start;
                count = line[word_start..word_end].chars().count();
            }
        }
        prev_end = word_end;
    }
    spans.push(base + line_start..sep_end);
}

/// Byte offsets of whitespace-separated words.
fn words(line: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut iter = line.char_indices().peekable();
    std::iter::from_fn(move || {
        // Skip separators.
        while let Some(&(_, c)) = iter.peek() {
            if c.is_whitespace() {
                iter.next();
            } else {
                break;
            }
        }
        let (start, _) = *iter.peek()?;
        let mut end = line.len();
        while let Some(&(i, c)) = iter.peek() {
            if c.is_whitespace() {
                end = i;
                break;
            }
            iter.next();
        }
        Some((start, end))
    })
}

/// Where carry-over starts, or `None` when the text fits.
///
/// Label boxes are never line-split against estimated capacity; the
/// conservative width constant makes short headlines measure as
/// overflowing, and splitting them would feed title fragments into the
/// content stream. A label is cut back to the character budget at a word
/// boundary instead, so it splits at most once.
fn fit_boundary(text: &str, cap: Capacity, is_label: bool) -> Option<usize> {
    if text.is_empty() {
        return None;
    }

    if is_label {
        if text.chars().count() > TITLE_BUDGET {
            let spans = wrap_spans(text, TITLE_BUDGET);
            if spans.len() > 1 {
                return Some(spans[1].start);
            }
        }
        return None;
    }

    if cap.is_zero() {
        return Some(0);
    }
    let spans = wrap_spans(text, cap.chars_per_line);
    if spans.len() > cap.lines_available {
        return Some(spans[cap.lines_available].start);
    }
    None
}

/// Run enforcement over the bound deck. Returns the slides in final order,
/// with continuation slides inserted directly after their origin.
pub fn enforce(
    slides: Vec<GeneratedSlide>,
    layouts: &[Layout],
    slide_area: i64,
) -> Result<Vec<GeneratedSlide>> {
    let cont_layout = continuation_layout(layouts, slide_area);
    let mut out = Vec::with_capacity(slides.len());

    for mut slide in slides {
        let origin = slide.origin;
        let origin_title = title_text(&slide, layouts);
        let mut measures = Vec::new();
        let mut carries = split_boxes(&mut slide, layouts, &mut measures);
        out.push(slide);

        let mut cont_no = 0u32;
        while !carries.is_empty() {
            cont_no += 1;
            if cont_no > MAX_CONTINUATIONS {
                let report = OverflowReport {
                    affected_slides: 1,
                    slides: vec![SlideOverflow {
                        origin,
                        boxes: measures,
                        unplaced: carries.into_iter().collect(),
                    }],
                };
                return Err(Error::OverflowBoundExceeded {
                    report: Box::new(report),
                });
            }

            let layout_index = cont_layout.ok_or(Error::NoContinuationLayout)?;
            let layout = &layouts[layout_index];

            let mut texts = BTreeMap::new();
            if let Some(title) = layout.title_placeholder() {
                texts.insert(
                    title.index,
                    continuation_title(&origin_title, title_budget(title)),
                );
            }
            for ph in layout.content_placeholders() {
                texts.insert(ph.index, carries.pop_front().unwrap_or_default());
            }

            let mut cont = GeneratedSlide {
                layout_index,
                texts,
                images: BTreeMap::new(),
                origin,
                continuation: cont_no,
            };
            let mut rest = split_boxes(&mut cont, layouts, &mut measures);
            // Remainders re-enter the queue ahead of still-unplaced text so
            // each box's stream stays in order.
            while let Some(carry) = rest.pop_back() {
                carries.push_front(carry);
            }
            out.push(cont);
        }

        if cont_no > 0 {
            debug!("slide {origin}: added {cont_no} continuation slide(s)");
        }
    }

    Ok(out)
}

/// Split every overflowing text box of one slide in place; returns the
/// carried-over text in placeholder-index order.
fn split_boxes(
    slide: &mut GeneratedSlide,
    layouts: &[Layout],
    measures: &mut Vec<BoxMeasure>,
) -> VecDeque<String> {
    let layout = &layouts[slide.layout_index];
    let title_index = layout.title_placeholder().map(|ph| ph.index);
    let mut carries = VecDeque::new();

    let indices: Vec<usize> = slide.texts.keys().copied().collect();
    for index in indices {
        // A continuation slide's title is derived and already capped
        // against its box; measuring it again would feed it back into the
        // carry queue and the queue would never drain.
        if slide.continuation > 0 && Some(index) == title_index {
            continue;
        }
        let Some(ph) = layout.placeholder(index) else {
            continue;
        };
        let Some(style) = &ph.text_style else {
            continue;
        };
        let cap = capacity::estimate(
            &ph.geometry,
            style.font_size_pt,
            style.line_spacing,
            &style.margins,
        );
        let is_label = style.role == Role::Title
            || (style.font_size_pt >= LABEL_FONT_PT && cap.lines_available <= LABEL_MAX_LINES);

        let text = slide.texts[&index].clone();
        if let Some(boundary) = fit_boundary(&text, cap, is_label) {
            let (prefix, carry) = text.split_at(boundary);
            measures.push(BoxMeasure {
                placeholder_index: index,
                original_chars: text.chars().count(),
                fitted_chars: prefix.chars().count(),
                retained: prefix.to_string(),
                lost: carry.to_string(),
            });
            slide.texts.insert(index, prefix.to_string());
            carries.push_back(carry.to_string());
        }
    }

    carries
}

/// The designated continuation layout: text-only, at least one non-title
/// box, lowest negative-space ratio. `None` when no layout qualifies.
fn continuation_layout(layouts: &[Layout], slide_area: i64) -> Option<usize> {
    layouts
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_text_only() && l.content_placeholders().next().is_some())
        .min_by(|(_, a), (_, b)| {
            let ra = a.negative_space_ratio(slide_area);
            let rb = b.negative_space_ratio(slide_area);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(index, _)| index)
}

/// The primary slide's title text, captured before any splitting.
fn title_text(slide: &GeneratedSlide, layouts: &[Layout]) -> String {
    let layout = &layouts[slide.layout_index];
    layout
        .title_placeholder()
        .and_then(|ph| slide.texts.get(&ph.index))
        .cloned()
        .unwrap_or_default()
}

/// Character budget for one continuation layout's title box: the global
/// cap, tightened by the box's own estimated capacity where smaller.
fn title_budget(ph: &Placeholder) -> usize {
    let Some(style) = &ph.text_style else {
        return TITLE_BUDGET;
    };
    let cap = capacity::estimate(
        &ph.geometry,
        style.font_size_pt,
        style.line_spacing,
        &style.margins,
    );
    match cap.max_chars() {
        0 => TITLE_BUDGET,
        n => n.min(TITLE_BUDGET),
    }
}

/// `"<original title> (cont.)"`, hard-capped at `budget` characters.
fn continuation_title(original: &str, budget: usize) -> String {
    let original = original.trim();
    let suffix_len = CONT_SUFFIX.chars().count();
    if original.is_empty() || budget <= suffix_len {
        return CONT_SUFFIX.trim_start().to_string();
    }
    let mut title: String = original.chars().take(budget - suffix_len).collect();
    let title_trimmed = title.trim_end().len();
    title.truncate(title_trimmed);
    title.push_str(CONT_SUFFIX);
    title
}
