//! Model output cleanup
//!
//! Sequence-to-sequence models tend to emit a netlist as one run-on line with
//! tokenizer markers mixed in. This pass restores one component per line
//! before the text reaches [`crate::parser::parse`].

use crate::parser::netlist::looks_like_node;

const SPECIAL_TOKENS: &[&str] = &["<pad>", "</s>", "<s>", "<unk>"];

/// Letters that open a component line in generated output.
const REFERENCE_LETTERS: &[char] = &['R', 'C', 'L', 'V', 'I', 'D', 'Q', 'M', 'S', 'X', 'W'];

/// Doubled prefixes the model is known to produce.
const UNIT_FIXES: &[(&str, &str)] = &[("mmH", "mH"), ("uuF", "uF"), ("kkΩ", "kΩ")];

/// Clean raw model output into line-oriented netlist text.
///
/// Strips tokenizer markers, splits glued components and `.end`, re-attaches
/// part numbers that landed on their own line and drops numeric debris lines.
pub fn clean_model_output(raw: &str) -> String {
    let mut text = raw.to_string();
    for token in SPECIAL_TOKENS {
        text = text.replace(token, " ");
    }

    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        for segment in split_components(line) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let first = segment.split_whitespace().next().unwrap_or_default();

            if is_part_number(first) {
                if let Some(previous) = lines.last_mut() {
                    previous.push(' ');
                    previous.push_str(segment);
                    continue;
                }
            }

            if first.starts_with(|c: char| c.is_ascii_digit()) && first != "0" {
                tracing::debug!("Dropping numeric line from model output: {}", segment);
                continue;
            }

            let mut fixed = segment.to_string();
            for (from, to) in UNIT_FIXES {
                fixed = fixed.replace(from, to);
            }
            lines.push(fixed);
        }
    }

    lines.join("\n")
}

/// Split one physical line into component segments.
fn split_components(line: &str) -> Vec<String> {
    let tokens: Vec<String> = line
        .split_whitespace()
        .flat_map(split_glued_end)
        .collect();

    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let next = tokens.get(index + 1).map(String::as_str);
        // Only split once the current line holds a reference and two nodes.
        let starts_component =
            current.len() >= 3 && is_reference(token) && next.map_or(false, looks_like_node);
        let starts_directive = token.starts_with('.');

        if !current.is_empty() && (starts_component || starts_directive) {
            segments.push(current.join(" "));
            current.clear();
        }
        current.push(token);
    }
    if !current.is_empty() {
        segments.push(current.join(" "));
    }
    segments
}

/// `10u.end` becomes `10u` and `.end`.
fn split_glued_end(token: &str) -> Vec<String> {
    let lower = token.to_ascii_lowercase();
    match lower.find(".end") {
        Some(pos) if pos > 0 && token.is_char_boundary(pos) => {
            vec![token[..pos].to_string(), token[pos..].to_string()]
        }
        _ => vec![token.to_string()],
    }
}

/// `R12`, `V1`, `Q3`; not `D1N4148`.
fn is_reference(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !REFERENCE_LETTERS.contains(&first) {
        return false;
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// Semiconductor part numbers such as `D1N4148`, `1N4148` or `Q2N2222`.
fn is_part_number(token: &str) -> bool {
    let body = token.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    digits_end > 0
        && body[digits_end..].starts_with('N')
        && body[digits_end + 1..].starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_special_tokens() {
        assert_eq!(clean_model_output("<pad> V1 1 0 9</s>"), "V1 1 0 9");
    }

    #[test]
    fn test_splits_run_on_output() {
        let cleaned = clean_model_output("V1 1 0 9 R1 1 2 1k C1 2 0 10u");
        assert_eq!(cleaned, "V1 1 0 9\nR1 1 2 1k\nC1 2 0 10u");
    }

    #[test]
    fn test_keeps_part_numbers_on_their_line() {
        let cleaned = clean_model_output("V1 1 0 5 D1 1 2 D1N4148 R1 2 0 220");
        assert_eq!(cleaned, "V1 1 0 5\nD1 1 2 D1N4148\nR1 2 0 220");
    }

    #[test]
    fn test_reattaches_orphan_part_number() {
        let cleaned = clean_model_output("D1 1 2\nD1N4148\nR1 2 0 1k");
        assert_eq!(cleaned, "D1 1 2 D1N4148\nR1 2 0 1k");
    }

    #[test]
    fn test_splits_trailing_directive() {
        let cleaned = clean_model_output("V1 1 0 9V R1 1 0 1k .end");
        assert_eq!(cleaned, "V1 1 0 9V\nR1 1 0 1k\n.end");
    }

    #[test]
    fn test_short_line_is_not_split() {
        assert_eq!(clean_model_output("R1 R2 1 0"), "R1 R2 1 0");
    }

    #[test]
    fn test_splits_glued_end() {
        let cleaned = clean_model_output("V1 1 0 9 C1 1 0 10u.end");
        assert_eq!(cleaned, "V1 1 0 9\nC1 1 0 10u\n.end");
    }

    #[test]
    fn test_drops_numeric_debris() {
        let cleaned = clean_model_output("V1 1 0 9\n12\nR1 1 0 1k");
        assert_eq!(cleaned, "V1 1 0 9\nR1 1 0 1k");
    }

    #[test]
    fn test_fixes_doubled_prefixes() {
        let cleaned = clean_model_output("L1 1 2 10mmH C1 2 0 4.7uuF");
        assert_eq!(cleaned, "L1 1 2 10mH\nC1 2 0 4.7uF");
    }

    #[test]
    fn test_reference_detection() {
        assert!(is_reference("R1"));
        assert!(is_reference("Q12"));
        assert!(!is_reference("D1N4148"));
        assert!(!is_reference("R"));
        assert!(!is_reference("r1"));
        assert!(is_part_number("D1N4148"));
        assert!(is_part_number("1N4001"));
        assert!(is_part_number("Q2N2222"));
        assert!(!is_part_number("NMOS"));
        assert!(!is_part_number("R1"));
    }

    #[test]
    fn test_clean_text_passes_through() {
        let text = "V1 1 0 9\nR1 1 0 1k";
        assert_eq!(clean_model_output(text), text);
    }
}
