//! Source-level lint for `canvas/src`.
//!
//! Library code here runs inside the browser and inside the image server, so
//! a panic takes down a page or a request. Each pattern below has a ceiling;
//! the numbers only go down. Test sidecars (`*_test.rs`) are not scanned.
//!
//! The model, geometry, share, and SVG modules are also linked by the image
//! server, so they must stay free of browser bindings.

use std::fs;
use std::path::Path;

/// Modules the server links; no `web_sys` / `wasm_bindgen` allowed.
const PORTABLE_MODULES: &[&str] = &[
    "arrange.rs",
    "avatar.rs",
    "camera.rs",
    "consts.rs",
    "doc.rs",
    "hit.rs",
    "input.rs",
    "layout.rs",
    "persistence.rs",
    "share.rs",
    "svg.rs",
];

struct Source {
    path: String,
    text: String,
}

fn library_sources() -> Vec<Source> {
    let mut out = Vec::new();
    walk(Path::new("src"), &mut out);
    out
}

fn walk(dir: &Path, out: &mut Vec<Source>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            walk(&path, out);
            continue;
        }
        let name = path.to_string_lossy().to_string();
        if !name.ends_with(".rs") || name.ends_with("_test.rs") {
            continue;
        }
        if let Ok(text) = fs::read_to_string(&path) {
            out.push(Source { path: name, text });
        }
    }
}

/// Per-file line counts for `needle`, files without a match omitted.
fn occurrences(sources: &[Source], needle: &str) -> Vec<(String, usize)> {
    sources
        .iter()
        .map(|s| (s.path.clone(), s.text.lines().filter(|l| l.contains(needle)).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

fn assert_within(needle: &str, ceiling: usize) {
    let hits = occurrences(&library_sources(), needle);
    let found: usize = hits.iter().map(|(_, n)| n).sum();
    let listing: Vec<String> = hits.iter().map(|(p, n)| format!("  {p}: {n}")).collect();
    assert!(
        found <= ceiling,
        "`{needle}` appears {found} times in canvas/src, ceiling is {ceiling}:\n{}",
        listing.join("\n")
    );
}

macro_rules! ceiling {
    ($name:ident, $needle:expr, $max:expr) => {
        #[test]
        fn $name() {
            assert_within($needle, $max);
        }
    };
}

// Crashes.
ceiling!(no_unwrap, ".unwrap()", 0);
ceiling!(no_expect, ".expect(", 0);
ceiling!(no_panic, "panic!(", 0);
ceiling!(no_unreachable, "unreachable!(", 0);
ceiling!(no_todo, "todo!(", 0);
ceiling!(no_unimplemented, "unimplemented!(", 0);

// Errors thrown away unread.
ceiling!(no_discarded_results, "let _ =", 0);
ceiling!(no_result_to_option, ".ok()", 0);

// Lint escapes.
ceiling!(no_dead_code_escape, "#[allow(dead_code)]", 0);
ceiling!(few_clippy_escapes, "#[allow(clippy::", 5);

#[test]
fn portable_modules_have_no_browser_bindings() {
    let portable: Vec<Source> = library_sources()
        .into_iter()
        .filter(|s| PORTABLE_MODULES.iter().any(|m| Path::new(&s.path).ends_with(m)))
        .collect();
    assert_eq!(portable.len(), PORTABLE_MODULES.len(), "a portable module is missing from src/");

    let mut hits = occurrences(&portable, "web_sys");
    hits.extend(occurrences(&portable, "wasm_bindgen"));
    assert!(hits.is_empty(), "browser bindings in portable modules: {hits:?}");
}
