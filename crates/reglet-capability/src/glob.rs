//! A small shell-style glob matcher for `fs` and `exec` capability patterns.
//!
//! `*` matches any run of characters within a single `/`-delimited segment;
//! `**` matches any number of segments (including zero). There is no external
//! glob dependency in this workspace; this hand-rolled matcher covers the
//! full pattern grammar directly.

pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pat_segments: Vec<&str> = pattern.split('/').collect();
    let text_segments: Vec<&str> = text.split('/').collect();
    match_segments(&pat_segments, &text_segments)
}

fn match_segments(pattern: &[&str], text: &[&str]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(&"**") => {
            if match_segments(&pattern[1..], text) {
                return true;
            }
            if !text.is_empty() && match_segments(pattern, &text[1..]) {
                return true;
            }
            false
        }
        Some(&seg) => {
            if let Some((&first, rest)) = text.split_first() {
                match_segment(seg, first) && match_segments(&pattern[1..], rest)
            } else {
                false
            }
        }
    }
}

/// Matches a single `/`-free segment, where `*` stands for any run of
/// characters (possibly empty) within the segment.
fn match_segment(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    match_segment_chars(&pat, &txt)
}

fn match_segment_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(&'*') => {
            for i in 0..=text.len() {
                if match_segment_chars(&pattern[1..], &text[i..]) {
                    return true;
                }
            }
            false
        }
        Some(&c) => text.first() == Some(&c) && match_segment_chars(&pattern[1..], &text[1..]),
    }
}
