//! Line-based merge machinery
//!
//! Both sides are diffed against the shared base; edits to disjoint base
//! regions combine, edits to overlapping regions conflict unless they
//! produce identical text. When three-way merging conflicts, the
//! remote's edits can instead be applied as a context patch onto the
//! local text, and as a last resort the conflicting regions can be
//! rendered with conflict markers.

use similar::{DiffOp, TextDiff};

/// One contiguous edit relative to the base line sequence: replace base
/// lines `[start, end)` with `lines`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hunk {
    start: usize,
    end: usize,
    lines: Vec<String>,
}

/// Context lines anchored on each side of a patched hunk.
const PATCH_CONTEXT: usize = 2;

/// Merge both sides' edits against `base`. `None` when the sides edit
/// overlapping regions differently.
pub fn three_way_merge(base: &str, local: &str, remote: &str) -> Option<String> {
    merge_impl(base, local, remote, OnConflict::Fail)
}

/// Like [`three_way_merge`] but conflicting regions are rendered as a
/// marker document instead of failing.
pub fn merge_with_markers(base: &str, local: &str, remote: &str) -> String {
    merge_impl(base, local, remote, OnConflict::Markers)
        .unwrap_or_default()
}

/// Re-apply the base→remote edits onto `local` as a context patch.
///
/// Each hunk is located in the local text by its surrounding base
/// context, preferring the occurrence nearest its expected position.
/// `None` when any hunk's context cannot be found.
pub fn apply_remote_patch(base: &str, local: &str, remote: &str) -> Option<String> {
    let base_lines = split_lines(base);
    let local_lines = split_lines(local);
    let remote_lines = split_lines(remote);
    let hunks = hunks_between(&base_lines, &remote_lines);

    let mut result: Vec<String> = local_lines.iter().map(|s| s.to_string()).collect();
    let mut offset: isize = 0;
    for hunk in &hunks {
        let pre_start = hunk.start.saturating_sub(PATCH_CONTEXT);
        let post_end = (hunk.end + PATCH_CONTEXT).min(base_lines.len());
        let pattern = &base_lines[pre_start..post_end];
        let expected = pre_start as isize + offset;
        let pos = find_nearest(&result, pattern, expected)?;

        let replace_at = pos + (hunk.start - pre_start);
        let old_len = hunk.end - hunk.start;
        result.splice(replace_at..replace_at + old_len, hunk.lines.iter().cloned());
        offset += hunk.lines.len() as isize - old_len as isize;
    }
    Some(result.concat())
}

/// Index of the occurrence of `pattern` in `lines` nearest to
/// `expected`; `None` when the pattern does not occur at all.
fn find_nearest(lines: &[String], pattern: &[&str], expected: isize) -> Option<usize> {
    if pattern.is_empty() {
        // A pure insertion with no surrounding context lands at its
        // expected position, clamped into the current text.
        return Some(expected.clamp(0, lines.len() as isize) as usize);
    }
    if pattern.len() > lines.len() {
        return None;
    }
    (0..=lines.len() - pattern.len())
        .filter(|&i| {
            lines[i..i + pattern.len()]
                .iter()
                .map(String::as_str)
                .eq(pattern.iter().copied())
        })
        .min_by_key(|&i| (i as isize - expected).abs())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OnConflict {
    Fail,
    Markers,
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Edits turning `old` into `new`, as ordered non-overlapping hunks.
fn hunks_between(old: &[&str], new: &[&str]) -> Vec<Hunk> {
    let diff = TextDiff::from_slices(old, new);
    let mut hunks = Vec::new();
    for op in diff.ops() {
        let (start, end, new_range) = match *op {
            DiffOp::Equal { .. } => continue,
            DiffOp::Delete {
                old_index, old_len, ..
            } => (old_index, old_index + old_len, 0..0),
            DiffOp::Insert {
                old_index,
                new_index,
                new_len,
            } => (old_index, old_index, new_index..new_index + new_len),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => (old_index, old_index + old_len, new_index..new_index + new_len),
        };
        hunks.push(Hunk {
            start,
            end,
            lines: new[new_range].iter().map(|s| s.to_string()).collect(),
        });
    }
    hunks
}

/// Two hunks touch the same base region. Insertions at the same point
/// also count; an insertion exactly at another hunk's end does not.
fn conflicts(a: &Hunk, b: &Hunk) -> bool {
    (a.start < b.end && b.start < a.end) || a.start == b.start
}

/// Base lines `[start, end)` with the given hunks applied.
fn apply_region(base: &[&str], hunks: &[Hunk], start: usize, end: usize) -> String {
    let mut out = String::new();
    let mut cursor = start;
    for hunk in hunks {
        out.push_str(&base[cursor..hunk.start].concat());
        for line in &hunk.lines {
            out.push_str(line);
        }
        cursor = hunk.end;
    }
    out.push_str(&base[cursor..end].concat());
    out
}

fn push_block(out: &mut String, block: &str) {
    out.push_str(block);
    if !block.is_empty() && !block.ends_with('\n') {
        out.push('\n');
    }
}

fn merge_impl(base: &str, local: &str, remote: &str, policy: OnConflict) -> Option<String> {
    let base_lines = split_lines(base);
    let a = hunks_between(&base_lines, &split_lines(local));
    let b = hunks_between(&base_lines, &split_lines(remote));

    let mut out = String::new();
    let mut cursor = 0;
    let (mut ai, mut bi) = (0, 0);
    loop {
        if let (Some(x), Some(y)) = (a.get(ai), b.get(bi))
            && conflicts(x, y)
        {
            let region_start = x.start.min(y.start);
            let mut region_end = x.end.max(y.end);
            let (a_from, b_from) = (ai, bi);
            ai += 1;
            bi += 1;
            // Chain every further hunk that reaches into the region.
            loop {
                let mut grew = false;
                while let Some(h) = a.get(ai)
                    && h.start < region_end
                {
                    region_end = region_end.max(h.end);
                    ai += 1;
                    grew = true;
                }
                while let Some(h) = b.get(bi)
                    && h.start < region_end
                {
                    region_end = region_end.max(h.end);
                    bi += 1;
                    grew = true;
                }
                if !grew {
                    break;
                }
            }

            let ours = apply_region(&base_lines, &a[a_from..ai], region_start, region_end);
            let theirs = apply_region(&base_lines, &b[b_from..bi], region_start, region_end);
            out.push_str(&base_lines[cursor..region_start].concat());
            cursor = region_end;

            if ours == theirs {
                out.push_str(&ours);
            } else {
                match policy {
                    OnConflict::Fail => return None,
                    OnConflict::Markers => {
                        push_block(&mut out, "<<<<<<< local\n");
                        push_block(&mut out, &ours);
                        push_block(&mut out, "=======\n");
                        push_block(&mut out, &theirs);
                        push_block(&mut out, ">>>>>>> remote\n");
                    }
                }
            }
            continue;
        }

        // Disjoint: take whichever side edits the earlier base region.
        let hunk = match (a.get(ai), b.get(bi)) {
            (None, None) => break,
            (Some(x), Some(y)) if x.start <= y.start => {
                ai += 1;
                x
            }
            (Some(x), None) => {
                ai += 1;
                x
            }
            (_, Some(y)) => {
                bi += 1;
                y
            }
        };
        out.push_str(&base_lines[cursor..hunk.start].concat());
        for line in &hunk.lines {
            out.push_str(line);
        }
        cursor = hunk.end;
    }
    out.push_str(&base_lines[cursor..].concat());
    Some(out)
}
