//! Per-step script instrumentation.
//!
//! Every step synthesizes a fresh program that re-runs the source prefix
//! `1..=target_line` inside a `try` block and then emits a sentinel-framed
//! JSON snapshot of the local variables (or a framed error record when the
//! prefix raised). Re-running from the top means any externally visible
//! side effects in the prefix fire again on every step; that duplication is
//! a documented property of the protocol, not a bug.

use crate::protocol::{DEBUG_END, DEBUG_START, ERROR_END, ERROR_START};
use crate::source::SourceIndex;

/// Synthesize the instrumented program for one step.
///
/// All instrumentation bindings carry a double-underscore prefix so the
/// snapshot helper's own filter hides them from the captured variables.
pub fn build_program(source: &SourceIndex, target_line: usize) -> String {
    let mut script: Vec<String> = vec![
        "import json as __dbg_json".to_string(),
        "import inspect as __dbg_inspect".to_string(),
        "import traceback as __dbg_traceback".to_string(),
        String::new(),
        "def __dbg_snapshot():".to_string(),
        "    __frame = __dbg_inspect.currentframe().f_back".to_string(),
        "    __bindings = dict(__frame.f_locals)".to_string(),
        "    __variables = []".to_string(),
        "    for __name, __value in __bindings.items():".to_string(),
        "        if __name.startswith('__'):".to_string(),
        "            continue".to_string(),
        "        try:".to_string(),
        "            __variables.append({".to_string(),
        "                'name': str(__name),".to_string(),
        "                'value': str(__value),".to_string(),
        "                'type': str(type(__value).__name__),".to_string(),
        format!("                'line': {target_line},"),
        "            })".to_string(),
        "        except Exception:".to_string(),
        "            pass".to_string(),
        "    return __variables".to_string(),
        String::new(),
        "try:".to_string(),
    ];

    // Source lines 1..=target_line, reindented one level under the try.
    for line in source.lines().iter().take(target_line) {
        script.push(format!("    {line}"));
    }

    script.push(format!("    print(\"{DEBUG_START}\")"));
    script.push(format!(
        "    print(__dbg_json.dumps({{\"variables\": __dbg_snapshot(), \"output\": \"\", \"line\": {target_line}}}))"
    ));
    script.push(format!("    print(\"{DEBUG_END}\")"));
    script.push("except Exception as __dbg_exc:".to_string());
    script.push(format!("    print(\"{ERROR_START}\")"));
    script.push(
        "    print(__dbg_json.dumps({\"error\": str(__dbg_exc), \"traceback\": __dbg_traceback.format_exc()}))"
            .to_string(),
    );
    script.push(format!("    print(\"{ERROR_END}\")"));

    script.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(source: &str) -> SourceIndex {
        SourceIndex::build(source).unwrap()
    }

    #[test]
    fn test_program_contains_prefix_only() {
        let source = index("x = 1\ny = 2\nz = x + y");
        let program = build_program(&source, 2);

        assert!(program.contains("    x = 1"));
        assert!(program.contains("    y = 2"));
        assert!(!program.contains("z = x + y"));
    }

    #[test]
    fn test_program_reindents_nested_code() {
        let source = index("for i in range(3):\n    total = i");
        let program = build_program(&source, 2);

        assert!(program.contains("    for i in range(3):"));
        assert!(program.contains("        total = i"));
    }

    #[test]
    fn test_program_emits_both_sentinel_pairs() {
        let source = index("x = 1");
        let program = build_program(&source, 1);

        for marker in [DEBUG_START, DEBUG_END, ERROR_START, ERROR_END] {
            assert!(program.contains(marker), "missing {marker}");
        }
    }

    #[test]
    fn test_snapshot_carries_target_line() {
        let source = index("x = 1\ny = 2");
        let program = build_program(&source, 2);

        assert!(program.contains("\"line\": 2"));
        assert!(program.contains("'line': 2,"));
    }

    #[test]
    fn test_success_payload_output_is_empty_by_construction() {
        let source = index("print('hello')");
        let program = build_program(&source, 1);

        // User prints go to raw stdout; the framed payload never carries them.
        assert!(program.contains("\"output\": \"\""));
    }

    #[test]
    fn test_instrumentation_bindings_are_dunder_prefixed() {
        let source = index("x = 1");
        let program = build_program(&source, 1);

        assert!(program.contains("import json as __dbg_json"));
        assert!(program.contains("def __dbg_snapshot():"));
        assert!(program.contains("except Exception as __dbg_exc:"));
    }
}
