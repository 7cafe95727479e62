//! Reference Rewriter - 本文中のローカル handle を永続 URL に置き換える
//!
//! # マッチングの規則
//! - handle はパターンではなく文字列リテラルとして扱う
//! - 「トークン境界」で区切られた出現だけを置換する
//!   （`handle` は `handle-2` の先頭にマッチしない）
//! - 左から 1 回だけ走査し、同じ位置では長い handle を優先する
//! - 置換後の URL は再走査しない
//!
//! Orphan Detector も同じ規則で URL の出現を判定します。

use crate::domain::HandleMapping;

/// Characters that continue a token on either side of an occurrence.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Is `content[start..end]` (an occurrence of `needle`) delimited on both sides?
///
/// A side only needs a boundary when the needle itself starts/ends with a
/// token character, the same way `\b` behaves.
fn is_delimited(content: &str, needle: &str, start: usize, end: usize) -> bool {
    let head_ok = match (needle.chars().next(), content[..start].chars().next_back()) {
        (Some(first), Some(prev)) => !(is_token_char(first) && is_token_char(prev)),
        _ => true,
    };
    let tail_ok = match (needle.chars().next_back(), content[end..].chars().next()) {
        (Some(last), Some(next)) => !(is_token_char(last) && is_token_char(next)),
        _ => true,
    };
    head_ok && tail_ok
}

/// Does `needle` occur in `content` as a whole token?
pub fn contains_exact(content: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    // Overlapping occurrences count: "ab.a" in "ab.ab.a" fails at 0, matches at 3.
    let mut from = 0;
    while let Some(offset) = content[from..].find(needle) {
        let start = from + offset;
        if is_delimited(content, needle, start, start + needle.len()) {
            return true;
        }
        let Some(first) = content[start..].chars().next() else {
            break;
        };
        from = start + first.len_utf8();
    }
    false
}

/// Substitute every exact occurrence of each mapped handle with its URL.
///
/// Handles missing from `mapping` stay in the content untouched.
pub fn rewrite(content: &str, mapping: &HandleMapping) -> String {
    let mut needles: Vec<(&str, &str)> = mapping
        .iter()
        .map(|(handle, url)| (handle.as_str(), url.as_str()))
        .filter(|(handle, _)| !handle.is_empty() && content.contains(handle))
        .collect();
    if needles.is_empty() {
        return content.to_string();
    }
    needles.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(content.len());
    let mut pos = 0;
    'scan: while pos < content.len() {
        let rest = &content[pos..];
        for (handle, url) in &needles {
            let end = pos + handle.len();
            if rest.starts_with(handle) && is_delimited(content, handle, pos, end) {
                out.push_str(url);
                pos = end;
                continue 'scan;
            }
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        pos += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LocalHandle, RemoteUrl};
    use rstest::rstest;

    fn mapping(pairs: &[(&str, &str)]) -> HandleMapping {
        pairs
            .iter()
            .map(|(h, u)| (LocalHandle::from(*h), RemoteUrl::from(*u)))
            .collect()
    }

    #[test]
    fn replaces_every_occurrence() {
        let m = mapping(&[("H1", "U1")]);
        let out = rewrite("<img src='H1'><a href='H1'>H1</a>", &m);
        assert_eq!(out, "<img src='U1'><a href='U1'>U1</a>");
    }

    #[test]
    fn unmapped_handles_are_left_alone() {
        let m = mapping(&[("H1", "U1")]);
        let out = rewrite("<img src='H1'><img src='H2'>", &m);
        assert_eq!(out, "<img src='U1'><img src='H2'>");
    }

    #[test]
    fn prefix_handle_does_not_match_longer_token() {
        let m = mapping(&[("handle", "U")]);
        let out = rewrite("<img src='handle'><img src='handle-2'>", &m);
        assert_eq!(out, "<img src='U'><img src='handle-2'>");
    }

    #[test]
    fn handles_that_prefix_each_other_map_independently() {
        let m = mapping(&[("handle", "U1"), ("handle-2", "U2"), ("handle-20", "U20")]);
        let out = rewrite("handle handle-2 handle-20 handle-200", &m);
        assert_eq!(out, "U1 U2 U20 handle-200");
    }

    #[test]
    fn pattern_metacharacters_are_literal() {
        let m = mapping(&[("blob:x/a.b*(c)", "U")]);
        let out = rewrite("src='blob:x/a.b*(c)' src='blob:x/aXb*(c)'", &m);
        assert_eq!(out, "src='U' src='blob:x/aXb*(c)'");
    }

    #[test]
    fn replaced_urls_are_not_rescanned() {
        let m = mapping(&[("A", "B"), ("B", "C")]);
        assert_eq!(rewrite("A B", &m), "B C");
    }

    #[test]
    fn multibyte_content_is_preserved() {
        let m = mapping(&[("H1", "U1")]);
        assert_eq!(rewrite("画像: H1 です", &m), "画像: U1 です");
    }

    #[test]
    fn empty_mapping_returns_content_unchanged() {
        let content = "<p>no media</p>";
        assert_eq!(rewrite(content, &HandleMapping::new()), content);
    }

    #[rstest]
    #[case::quoted("src='H1'", true)]
    #[case::bare("H1", true)]
    #[case::suffix_digit("H10", false)]
    #[case::suffix_dash("H1-b", false)]
    #[case::prefix_letter("XH1", false)]
    #[case::slash_delimited("/H1/", true)]
    #[case::absent("H2", false)]
    #[case::cjk_neighbours("画像H1です", true)]
    fn contains_exact_respects_token_boundaries(#[case] content: &str, #[case] expected: bool) {
        assert_eq!(contains_exact(content, "H1"), expected);
    }

    #[rstest]
    #[case::later_overlap_is_delimited("ab.ab.a", "ab.a", true)]
    #[case::every_overlap_glued("ab.ab.ax", "ab.a", false)]
    #[case::repeated_prefix("x-x-x", "x-x", false)]
    fn overlapping_occurrences_are_all_checked(
        #[case] content: &str,
        #[case] needle: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(contains_exact(content, needle), expected);
    }

    #[test]
    fn url_ending_in_separator_needs_no_tail_boundary() {
        assert!(contains_exact("https://cdn/x/?v=1", "https://cdn/x/"));
        assert!(!contains_exact("anything", ""));
    }
}
