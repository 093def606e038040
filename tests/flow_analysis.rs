//! End-to-end flow analysis over parsed source
//!
//! Each test goes through the full pipeline: parse, lower, analyze a
//! function body (or a statement range inside it), inspect the summary.

use jsflow::{analyze_function, analyze_selection, AccessMode, FlowSummary, VariableRole};
use std::path::Path;
use test_case::test_case;

fn summarize(code: &str, function: &str) -> FlowSummary {
    analyze_function(code, Path::new("test.js"), function).expect("analysis succeeds")
}

fn summarize_ts(code: &str, function: &str) -> FlowSummary {
    analyze_function(code, Path::new("test.ts"), function).expect("analysis succeeds")
}

fn mode_of(summary: &FlowSummary, name: &str) -> Option<AccessMode> {
    summary
        .variables
        .iter()
        .find(|v| v.name == name)
        .map(|v| v.mode)
}

#[test_case("function f(c) { return 1; }", true ; "single return")]
#[test_case("function f(c) { if (c) { return 1; } else { return 2; } }", true ; "both arms return")]
#[test_case("function f(c) { if (c) { return 1; } }", false ; "then arm only")]
#[test_case("function f(c) { while (c) { return 1; } }", false ; "loop body may not run")]
#[test_case("function f(c) { do { return 1; } while (c); }", true ; "do while runs once")]
#[test_case("function f(c) { throw new Error(c); }", false ; "throw is not a return")]
fn test_always_returns(code: &str, expected: bool) {
    let summary = summarize(code, "f");
    assert_eq!(summary.always_returns, expected);
}

#[test]
fn test_branching_return_classifies_inputs_and_outputs() {
    let code = "function f(a, b) { if (a) { return b; } b = compute(); return b; }";
    let summary = summarize(code, "f");

    assert!(summary.always_returns);
    assert!(summary.returns_value);
    assert!(!summary.partial_return);
    assert_eq!(mode_of(&summary, "a"), Some(AccessMode::Read));
    // b is read on one path before the unconditional write on the other.
    assert!(summary.variables.iter().any(|v| v.name == "b"));
}

#[test]
fn test_switch_without_default_is_partial() {
    let code = r#"
        function f(kind) {
            switch (kind) {
                case "a": return 1;
                case "b": return 2;
            }
        }
    "#;
    let summary = summarize(code, "f");
    assert!(!summary.always_returns);
    assert!(summary.partial_return);
}

#[test]
fn test_switch_fall_through_shares_region() {
    let code = r#"
        function f(kind, out) {
            switch (kind) {
                case "a":
                case "b": out = 1; break;
                default: out = 2;
            }
            return out;
        }
    "#;
    let summary = summarize(code, "f");
    assert!(summary.always_returns);
    assert_eq!(mode_of(&summary, "kind"), Some(AccessMode::Read));
    assert_eq!(mode_of(&summary, "out"), Some(AccessMode::Write));
}

#[test]
fn test_loop_accumulator_declared_inside_is_internal() {
    let code = r#"
        function sum(items) {
            let total = 0;
            for (const item of items) { total += item; }
            return total;
        }
    "#;
    let summary = summarize(code, "sum");
    assert!(summary.always_returns);
    assert_eq!(mode_of(&summary, "items"), Some(AccessMode::Read));
    let total = summary.variables.iter().find(|v| v.name == "total").unwrap();
    assert_eq!(total.role, VariableRole::Internal);
}

#[test]
fn test_loop_read_before_write_stays_a_read() {
    let code = "function f(c, v) { while (c) { use(v); v = next(); } }";
    let summary = summarize(code, "f");
    assert_eq!(mode_of(&summary, "v"), Some(AccessMode::ReadPotential));
}

#[test]
fn test_selection_range_boundary() {
    let code = "function f(a, b) { let t = a * 2; b = t + 1; return b; }";
    // Select only the first two statements.
    let summary =
        analyze_selection(code, Path::new("test.js"), "f", Some(0), Some(1)).unwrap();

    assert!(summary.falls_through);
    assert!(!summary.always_returns);
    assert!(summary.arguments().any(|v| v.name == "a"));
    assert!(summary.results().any(|v| v.name == "b"));
    // t lives entirely inside the selection.
    let t = summary.variables.iter().find(|v| v.name == "t").unwrap();
    assert_eq!(t.role, VariableRole::Internal);
    assert_eq!(t.mode, AccessMode::Unknown);
}

#[test]
fn test_caught_exception_does_not_escape() {
    let code = r#"
        class AppError extends Error {}
        function f() {
            try { throw new AppError("boom"); } catch (e) { log(e); }
        }
    "#;
    let summary = summarize(code, "f");
    assert!(summary.exceptions.is_empty());
    assert!(summary.falls_through);
}

#[test]
fn test_uncaught_exception_escapes_with_its_type() {
    let code = "function f(x) { if (!x) { throw new RangeError(\"bad\"); } return x; }";
    let summary = summarize(code, "f");
    assert_eq!(summary.exceptions, vec!["RangeError".to_string()]);
    assert!(summary.throws || summary.partial_return);
}

#[test]
fn test_finally_runs_on_every_path() {
    let code = r#"
        function f(res) {
            try { return res.read(); } finally { res.close(); }
        }
    "#;
    let summary = summarize(code, "f");
    assert!(summary.always_returns);
    assert_eq!(mode_of(&summary, "res"), Some(AccessMode::Read));
}

#[test]
fn test_labels_resolved_inside_selection() {
    let code = r#"
        function f(grid) {
            outer: for (let i = 0; i < grid.length; i++) {
                for (let j = 0; j < grid.length; j++) {
                    if (grid[i][j]) { break outer; }
                }
            }
            return grid;
        }
    "#;
    let summary = summarize(code, "f");
    assert!(summary.escaping_branches.is_empty());
    assert!(summary.always_returns);
}

#[test]
fn test_free_type_variable_in_selection() {
    let code = r#"
        function pick<T>(items: T[], index: number) {
            const chosen: T = items[index];
            return chosen;
        }
    "#;
    let summary = summarize_ts(code, "pick");
    assert_eq!(summary.type_variables, vec!["T".to_string()]);
}

#[test]
fn test_closure_capture_reads_without_returning() {
    let code = r#"
        function f(xs, limit) {
            const kept = xs.filter(function (x) { return x < limit; });
            use(kept);
        }
    "#;
    let summary = summarize(code, "f");
    assert!(!summary.always_returns);
    assert!(!summary.partial_return);
    assert_eq!(mode_of(&summary, "limit"), Some(AccessMode::Read));
}

#[test]
fn test_compound_assignment_makes_parameter_an_input() {
    let code = "function f(n) { n += 1; return n; }";
    let summary = summarize(code, "f");
    assert_eq!(mode_of(&summary, "n"), Some(AccessMode::Read));
    assert!(summary.arguments().any(|v| v.name == "n"));
}

#[test]
fn test_destructuring_assignment_writes_targets() {
    let code = "function f(pair, a, b) { [a, b] = pair; return a + b; }";
    let summary = summarize(code, "f");
    assert_eq!(mode_of(&summary, "pair"), Some(AccessMode::Read));
    assert_eq!(mode_of(&summary, "a"), Some(AccessMode::Write));
    assert_eq!(mode_of(&summary, "b"), Some(AccessMode::Write));
}

#[test]
fn test_dead_store_after_return_still_reported() {
    let code = "function f(v) { return 1; v = 2; }";
    let summary = summarize(code, "f");
    assert!(summary.always_returns);
    assert_eq!(mode_of(&summary, "v"), Some(AccessMode::Write));
}

#[test]
fn test_summary_json_shape() {
    let code = "function f(a) { if (a) { return 1; } }";
    let summary = summarize(code, "f");
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["always_returns"], false);
    assert_eq!(json["partial_return"], true);
    assert_eq!(json["variables"][0]["name"], "a");
    assert_eq!(json["variables"][0]["mode"], "read");
    assert_eq!(json["variables"][0]["role"], "argument");
}
