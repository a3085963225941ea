//! Bug injection for the Bug Hunt mode.
//!
//! Each rule rewrites a single line and applies only when it actually
//! changes the text; otherwise the pass retries on a different line or
//! rule. Passes are bounded, so trivially short code may end with zero
//! bugs rather than looping forever.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use colosseum_common::Language;

type BugRule = fn(&str) -> String;

/// Maximum passes over the code before giving up on the bug target
const MAX_PASSES: usize = 10;

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("//")
}

// --- Python rules -----------------------------------------------------

fn py_widen_range(line: &str) -> String {
    if line.contains("range(") && !line.contains("range(1,") && !line.contains("range(0") {
        line.replacen("range(", "range(1, ", 1)
    } else {
        line.to_string()
    }
}

fn py_drop_colon(line: &str) -> String {
    const KEYWORDS: [&str; 8] = [
        "if ", "for ", "while ", "def ", "class ", "elif ", "else:", "try:",
    ];
    let trimmed = line.trim_end();
    if trimmed.ends_with(':') && KEYWORDS.iter().any(|kw| line.contains(kw)) {
        trimmed[..trimmed.len() - 1].to_string()
    } else {
        line.to_string()
    }
}

fn py_eq_to_assign(line: &str) -> String {
    if line.contains("==") && !line.contains("def ") && !line.contains('#') {
        line.replacen("==", "=", 1)
    } else {
        line.to_string()
    }
}

fn py_dedent(line: &str) -> String {
    if line.starts_with("    ") && !line.trim_start().starts_with('#') {
        line[1..].to_string()
    } else {
        line.to_string()
    }
}

fn py_drop_return(line: &str) -> String {
    if line.contains("return ") && !line.trim_start().starts_with('#') {
        format!("# {line}")
    } else {
        line.to_string()
    }
}

fn py_plus_to_times(line: &str) -> String {
    if line.contains(" + ") && !line.contains("def ") && !line.contains('#') {
        line.replacen(" + ", " * ", 1)
    } else {
        line.to_string()
    }
}

fn py_shift_index(line: &str) -> String {
    if line.contains("[0]") {
        line.replacen("[0]", "[1]", 1)
    } else if line.contains("[-1]") {
        line.replacen("[-1]", "[-2]", 1)
    } else {
        line.to_string()
    }
}

fn py_swap_loop_var(line: &str) -> String {
    if line.contains("for i in") && line.contains("i]") {
        line.replacen("for i in", "for j in", 1)
    } else {
        line.to_string()
    }
}

fn py_flip_bool_op(line: &str) -> String {
    if line.contains(" and ") {
        line.replacen(" and ", " or ", 1)
    } else if line.contains(" or ") {
        line.replacen(" or ", " and ", 1)
    } else {
        line.to_string()
    }
}

fn py_double_step(line: &str) -> String {
    if line.contains("i += 1") {
        line.replacen("i += 1", "i += 2", 1)
    } else if line.contains("count += 1") {
        line.replacen("count += 1", "count += 2", 1)
    } else {
        line.to_string()
    }
}

fn py_append_to_extend(line: &str) -> String {
    if line.contains(".append(") {
        line.replacen(".append(", ".extend(", 1)
    } else {
        line.to_string()
    }
}

fn py_flip_comparison(line: &str) -> String {
    if line.contains(" < ") {
        line.replacen(" < ", " <= ", 1)
    } else if line.contains(" > ") {
        line.replacen(" > ", " >= ", 1)
    } else {
        line.to_string()
    }
}

const PYTHON_RULES: [BugRule; 12] = [
    py_widen_range,
    py_drop_colon,
    py_eq_to_assign,
    py_dedent,
    py_drop_return,
    py_plus_to_times,
    py_shift_index,
    py_swap_loop_var,
    py_flip_bool_op,
    py_double_step,
    py_append_to_extend,
    py_flip_comparison,
];

// --- JavaScript rules -------------------------------------------------

fn js_drop_semicolon(line: &str) -> String {
    let trimmed = line.trim_end();
    if trimmed.ends_with(';') && !line.trim_start().starts_with("for") {
        trimmed[..trimmed.len() - 1].to_string()
    } else {
        line.to_string()
    }
}

fn js_loosen_equality(line: &str) -> String {
    if line.contains("===") {
        line.replacen("===", "==", 1)
    } else {
        line.to_string()
    }
}

fn js_drop_return(line: &str) -> String {
    if line.contains("return ") && !line.trim_start().starts_with("//") {
        format!("// {line}")
    } else {
        line.to_string()
    }
}

fn js_push_to_pop(line: &str) -> String {
    if line.contains(".push(") {
        line.replacen(".push(", ".pop(", 1)
    } else {
        line.to_string()
    }
}

fn js_off_by_one(line: &str) -> String {
    if line.contains("< length") {
        line.replacen("< length", "<= length", 1)
    } else {
        line.to_string()
    }
}

fn js_plus_to_minus(line: &str) -> String {
    if line.contains(" + ") && !line.contains("//") {
        line.replacen(" + ", " - ", 1)
    } else {
        line.to_string()
    }
}

fn js_strip_declaration(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with("let ") {
        line.replacen("let ", "", 1)
    } else if trimmed.starts_with("const ") {
        line.replacen("const ", "", 1)
    } else {
        line.to_string()
    }
}

fn js_flip_increment(line: &str) -> String {
    if line.contains("++") {
        line.replacen("++", "--", 1)
    } else {
        line.to_string()
    }
}

const JAVASCRIPT_RULES: [BugRule; 8] = [
    js_drop_semicolon,
    js_loosen_equality,
    js_drop_return,
    js_push_to_pop,
    js_off_by_one,
    js_plus_to_minus,
    js_strip_declaration,
    js_flip_increment,
];

fn rules_for(language: Language) -> &'static [BugRule] {
    match language {
        Language::Python => &PYTHON_RULES,
        Language::Javascript => &JAVASCRIPT_RULES,
        Language::Cpp | Language::Java => &[],
    }
}

/// Introduce 1-3 subtle bugs into correct source.
///
/// Bug count target is `clamp(non_empty_non_comment_lines / 3, 1, 3)`.
/// Line order and all non-mutated lines stay unchanged. Languages without
/// a rule catalog return the source unmodified.
pub fn inject_bugs<R: Rng + ?Sized>(code: &str, language: Language, rng: &mut R) -> String {
    if code.is_empty() {
        return String::new();
    }
    let rules = rules_for(language);
    if rules.is_empty() {
        tracing::warn!(%language, "No bug catalog for language; returning code unchanged");
        return code.to_string();
    }

    let mut lines: Vec<String> = code.split('\n').map(String::from).collect();
    let significant = lines
        .iter()
        .filter(|l| !l.trim().is_empty() && !is_comment(l))
        .count();
    let max_bugs = (significant / 3).clamp(1, 3);

    let mut bugs_introduced = 0usize;
    let mut pass = 0usize;
    while bugs_introduced < max_bugs && pass < MAX_PASSES {
        pass += 1;
        let mut indices: Vec<usize> = (0..lines.len()).collect();
        indices.shuffle(rng);

        for idx in indices {
            if bugs_introduced >= max_bugs {
                break;
            }
            let line = &lines[idx];
            if line.trim().is_empty() || is_comment(line) {
                continue;
            }
            let rule = rules.choose(rng).expect("catalog is non-empty");
            let mutated = rule(line);
            if mutated != *line {
                tracing::debug!(
                    line = idx + 1,
                    before = %line.trim(),
                    after = %mutated.trim(),
                    "Injected bug"
                );
                lines[idx] = mutated;
                bugs_introduced += 1;
            }
        }
    }

    if bugs_introduced == 0 {
        tracing::warn!(passes = pass, "No bugs introduced");
    }

    lines.join("\n")
}

/// Production entry point drawing fresh randomness
pub fn generate_buggy_code(code: &str, language: Language) -> String {
    inject_bugs(code, language, &mut rand::rng())
}
