use coda_patcher::{apply_changes, apply_changes_with_report, DIVIDER, REPLACE_END, SEARCH_START};
use proptest::prelude::*;

fn block(search: &str, replace: &str) -> String {
    format!("{SEARCH_START}{search}\n{DIVIDER}{replace}\n{REPLACE_END}\n")
}

/// A line that is exactly the divider cannot be carried inside a block.
fn has_divider_line(text: &str) -> bool {
    text.lines().any(|l| format!("{l}\n") == DIVIDER)
}

proptest! {
    #[test]
    fn no_instructions_is_identity(base in any::<String>()) {
        prop_assert_eq!(apply_changes(&base, ""), base);
    }

    #[test]
    fn prose_without_markers_is_identity(base in any::<String>(), prose in "[a-zA-Z .,\n]{0,80}") {
        prop_assert_eq!(apply_changes(&base, &prose), base);
    }

    #[test]
    fn matching_block_replaces_first_occurrence(
        base in "[a-z ;()=<>\n]{1,80}",
        start in 0usize..80,
        len in 1usize..20,
        replace in "[a-z0-9_]{0,12}",
    ) {
        let start = start % base.len();
        let end = (start + len).min(base.len());
        let search = base[start..end].trim_end();
        prop_assume!(!search.trim().is_empty());
        prop_assume!(!has_divider_line(search));

        let out = apply_changes(&base, &block(search, &replace));
        prop_assert_eq!(out, base.replacen(search, &replace, 1));
    }

    #[test]
    fn empty_search_prepends(base in any::<String>(), replace in "[a-z]{1,10}") {
        let resp = format!("{SEARCH_START}{DIVIDER}{replace}\n{REPLACE_END}");
        prop_assert_eq!(apply_changes(&base, &resp), format!("{replace}\n{base}"));
    }

    #[test]
    fn marker_like_runs_stay_inside_the_block(
        prefix in "[a-z =<>\n]{0,30}",
        search in "[a-z ]{0,4}[=<>]{5,12}[a-z ]{0,4}(\n[a-z =<>]{1,16}){0,2}",
        replace in "[=<>]{0,10}[a-z ;]{0,8}[=<>]{0,10}(\n[a-z =<>]{0,16}){0,2}",
        suffix in "[a-z =<>\n]{0,30}",
    ) {
        let search = search.trim_end();
        prop_assume!(!search.trim().is_empty());
        prop_assume!(!has_divider_line(search) && !has_divider_line(&replace));

        let base = format!("{prefix}{search}{suffix}");
        let out = apply_changes(&base, &block(search, &replace));
        prop_assert_eq!(out, base.replacen(search, replace.trim_end(), 1));
    }

    #[test]
    fn report_text_matches_plain_apply(base in "[a-c\n]{0,40}", s in "[a-c]{1,3}", r in "[x-z]{0,3}") {
        let resp = format!("{}{}", block(&s, &r), block(&r, &s));
        let report = apply_changes_with_report(&base, &resp);
        prop_assert_eq!(&report.text, &apply_changes(&base, &resp));
        prop_assert_eq!(report.outcomes.len(), 2);
    }
}

#[test]
fn one_matching_one_missing() {
    let base = "const x = 1;\nconsole.log(x);";
    let resp = format!(
        "{}{}",
        block("console.log(y);", "console.error(y);"),
        block("const x = 1;", "const x = 2;")
    );
    assert_eq!(apply_changes(base, &resp), "const x = 2;\nconsole.log(x);");
}

#[test]
fn comment_banners_survive_an_edit() {
    let base = "// ==========\nfn a() {}\n// <<<<<<<< end >>>>>>>>\n";
    let resp = block(
        "// ==========\nfn a() {}",
        "// ==========\nfn a() -> u8 { 1 }\n// =======",
    );
    assert_eq!(
        apply_changes(base, &resp),
        "// ==========\nfn a() -> u8 { 1 }\n// =======\n// <<<<<<<< end >>>>>>>>\n"
    );
}

#[test]
fn report_serializes_outcome_kinds() {
    let report = apply_changes_with_report("a", &block("a", "b"));
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["text"], "b");
    assert_eq!(v["outcomes"][0]["kind"], "replaced");
    assert_eq!(v["outcomes"][0]["at"], 0);
    assert_eq!(v["malformed"], 0);
}
