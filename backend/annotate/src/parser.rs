//! Grounding-tag parser for DeepSeek-OCR responses.
//!
//! The model embeds detections in its prose as
//! `<|ref|>NAME<|/ref|><|det|>[[x1,y1,x2,y2], ...]<|/det|>`. Extraction is
//! best-effort by construction: the scan simply finds no match at malformed
//! positions, so `parse` never fails and garbled output degrades to plain
//! text.

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::Detection;

/// One `<|ref|>…<|det|>…` group. The name span is lazy with dot-matches-
/// newline; close markers are accepted with or without the slash, since
/// DeepSeek checkpoints have emitted both forms.
static GROUP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<\|ref\|>(.*?)<\|/?ref\|>\s*<\|det\|>(.*?)<\|/?det\|>").unwrap()
});

/// A single `[x1,y1,x2,y2]` quadruple. The det payload is scanned for these
/// independently; the outer bracket/comma structure around multiple boxes is
/// deliberately not validated.
static BOX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\]").unwrap());

/// A det block with no preceding ref, only relevant when stripping tags.
static BARE_DET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<\|det\|>(.*?)<\|/?det\|>").unwrap());

/// A ref block with no following det payload, also only for stripping.
static BARE_REF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<\|ref\|>(.*?)<\|/?ref\|>").unwrap());

/// Extract every detection from `text`, in left-to-right textual order.
///
/// A group contributes one [`Detection`] per quadruple in its payload, all
/// sharing the group's trimmed name (the same label detected in several
/// places). Coordinates are kept exactly as written, unordered; quadruples
/// that do not fit in a `u32` are skipped like any other malformed text.
pub fn parse(text: &str) -> Vec<Detection> {
    let mut detections = Vec::new();
    for group in GROUP_PATTERN.captures_iter(text) {
        let name = group[1].trim();
        for quad in BOX_PATTERN.captures_iter(&group[2]) {
            let (Ok(x1), Ok(y1), Ok(x2), Ok(y2)) = (
                quad[1].parse(),
                quad[2].parse(),
                quad[3].parse(),
                quad[4].parse(),
            ) else {
                continue;
            };
            detections.push(Detection::new(name, x1, y1, x2, y2));
        }
    }
    detections
}

/// Remove all grounding markup from `text`, keeping each group's trimmed
/// name in place and dropping the coordinate payloads, so the plain-text
/// endpoint returns clean prose.
pub fn strip_tags(text: &str) -> String {
    let without_groups =
        GROUP_PATTERN.replace_all(text, |caps: &regex::Captures| caps[1].trim().to_string());
    let without_dets = BARE_DET_PATTERN.replace_all(&without_groups, "");
    BARE_REF_PATTERN
        .replace_all(&without_dets, |caps: &regex::Captures| {
            caps[1].trim().to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_yields_nothing() {
        assert!(parse("The invoice total is 42.50 EUR.").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn single_group_single_box() {
        let text = "<|ref|>cat<|/ref|><|det|>[[100,100,300,300]]<|/det|>";
        let detections = parse(text);
        assert_eq!(detections, vec![Detection::new("cat", 100, 100, 300, 300)]);
    }

    #[test]
    fn multiple_boxes_share_the_group_name() {
        let text = "<|ref|>stamp<|/ref|><|det|>[[1,2,3,4], [5,6,7,8], [9,10,11,12]]<|/det|>";
        let detections = parse(text);
        assert_eq!(detections.len(), 3);
        assert!(detections.iter().all(|d| d.name == "stamp"));
        assert_eq!(detections[1], Detection::new("stamp", 5, 6, 7, 8));
    }

    #[test]
    fn groups_emit_in_textual_order() {
        let text = "intro <|ref|>a<|/ref|><|det|>[[1,1,2,2]]<|/det|> middle \
                    <|ref|>b<|/ref|><|det|>[[3,3,4,4],[5,5,6,6]]<|/det|> outro";
        let names: Vec<_> = parse(text).into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["a", "b", "b"]);
    }

    #[test]
    fn coordinates_are_kept_verbatim_without_reordering() {
        // x1 > x2 and y1 > y2 stay that way; ordering is a render concern.
        let detections = parse("<|ref|>t<|/ref|><|det|>[[300,400,100,200]]<|/det|>");
        assert_eq!(detections, vec![Detection::new("t", 300, 400, 100, 200)]);
    }

    #[test]
    fn name_spans_newlines_and_is_trimmed() {
        let text = "<|ref|>  two\nlines \n<|/ref|><|det|>[[1,2,3,4]]<|/det|>";
        assert_eq!(parse(text)[0].name, "two\nlines");
    }

    #[test]
    fn empty_name_is_retained() {
        let detections = parse("<|ref|>   <|/ref|><|det|>[[1,2,3,4]]<|/det|>");
        assert_eq!(detections[0].name, "");
    }

    #[test]
    fn whitespace_inside_quadruples_is_tolerated() {
        let text = "<|ref|>x<|/ref|><|det|>[[ 10 , 20 ,30,  40 ]]<|/det|>";
        assert_eq!(parse(text), vec![Detection::new("x", 10, 20, 30, 40)]);
    }

    #[test]
    fn unslashed_close_markers_are_accepted() {
        let text = "<|ref|>cat<|ref|><|det|>[[100,100,300,300]]<|det|>";
        assert_eq!(parse(text), vec![Detection::new("cat", 100, 100, 300, 300)]);
    }

    #[test]
    fn malformed_groups_are_skipped_silently() {
        // Missing det close marker: no group match, no detection.
        assert!(parse("<|ref|>a<|/ref|><|det|>[[1,2,3,4]]").is_empty());
        // Non-numeric payload: group matches but holds no quadruple.
        assert!(parse("<|ref|>a<|/ref|><|det|>[[one,2,3,4]]<|/det|>").is_empty());
        // Triples are not quadruples.
        assert!(parse("<|ref|>a<|/ref|><|det|>[[1,2,3]]<|/det|>").is_empty());
    }

    #[test]
    fn oversized_coordinates_are_skipped() {
        let text = "<|ref|>a<|/ref|><|det|>[[99999999999,2,3,4]] [[1,2,3,4]]<|/det|>";
        assert_eq!(parse(text), vec![Detection::new("a", 1, 2, 3, 4)]);
    }

    #[test]
    fn group_count_times_box_count_detections() {
        let mut text = String::new();
        for i in 0..4 {
            text.push_str(&format!(
                "<|ref|>item{i}<|/ref|><|det|>[[1,1,2,2],[3,3,4,4]]<|/det|>\n"
            ));
        }
        assert_eq!(parse(&text).len(), 8);
    }

    #[test]
    fn strip_tags_keeps_names_in_place() {
        let text = "Seen: <|ref|>cat<|/ref|><|det|>[[1,2,3,4]]<|/det|> on the mat.";
        assert_eq!(strip_tags(text), "Seen: cat on the mat.");
    }

    #[test]
    fn strip_tags_drops_bare_det_blocks() {
        let text = "before <|det|>[[1,2,3,4]]<|/det|> after";
        assert_eq!(strip_tags(text), "before  after");
    }

    #[test]
    fn strip_tags_keeps_names_of_bare_ref_blocks() {
        let text = "found <|ref|> section title <|/ref|> with no coordinates";
        assert_eq!(strip_tags(text), "found section title with no coordinates");
    }

    #[test]
    fn strip_tags_passes_plain_text_through() {
        assert_eq!(strip_tags("no tags here"), "no tags here");
    }
}
