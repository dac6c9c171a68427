//! Integration test: file discovery and result ordering via Analyzer.

use rxlint_core::{Config, FileContext, Severity, Violation};
use rxlint_ts::{node_location, Analyzer, Rule, SourceFile, TypeResolver};
use std::fs;
use std::path::{Path, PathBuf};

/// Reports every top-level statement, so each analyzed file shows up.
struct EveryStatement;

impl Rule for EveryStatement {
    fn name(&self) -> &'static str {
        "every-statement"
    }
    fn code(&self) -> &'static str {
        "TEST100"
    }
    fn default_severity(&self) -> Severity {
        Severity::Info
    }
    fn check(
        &self,
        ctx: &FileContext<'_>,
        file: &SourceFile,
        _types: &dyn TypeResolver,
    ) -> Vec<Violation> {
        let root = file.root();
        let mut cursor = root.walk();
        root.named_children(&mut cursor)
            .map(|node| {
                Violation::new(
                    self.code(),
                    self.name(),
                    self.default_severity(),
                    node_location(ctx, node),
                    "statement",
                )
            })
            .collect()
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, content).expect("write fixture");
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "src/b.ts", "let b = 1;\nlet c = 2;\n");
    write(root, "src/a.tsx", "const el = <div />;\n");
    write(root, "src/types.d.ts", "declare const x: number;\n");
    write(root, "src/readme.md", "# not code\n");
    write(root, "node_modules/rxjs/index.ts", "export const of = 1;\n");
    write(root, "out/bundle.ts", "let ignored = 1;\n");
    write(root, ".gitignore", "out/\n");
    dir
}

fn analyzed_files(config: Config, root: &Path) -> Vec<PathBuf> {
    let analyzer = Analyzer::builder()
        .root(root)
        .config(config)
        .rule(EveryStatement)
        .build()
        .expect("analyzer should build");
    let result = analyzer.analyze().expect("analysis should succeed");
    let mut files: Vec<PathBuf> = result
        .violations
        .iter()
        .map(|v| v.location.file.clone())
        .collect();
    files.dedup();
    files
}

#[test]
fn discovers_typescript_sources_only() {
    let dir = project();
    let files = analyzed_files(Config::default(), dir.path());
    assert_eq!(
        files,
        vec![PathBuf::from("src/a.tsx"), PathBuf::from("src/b.ts")]
    );
}

#[test]
fn gitignore_can_be_disabled() {
    let dir = project();
    let config = Config::parse("[analyzer]\nrespect_gitignore = false\n").expect("config");
    let files = analyzed_files(config, dir.path());
    assert!(files.contains(&PathBuf::from("out/bundle.ts")));
    assert!(!files.iter().any(|f| f.starts_with("node_modules")));
}

#[test]
fn results_are_sorted_by_file_then_position() {
    let dir = project();
    let analyzer = Analyzer::builder()
        .root(dir.path())
        .rule(EveryStatement)
        .build()
        .expect("analyzer should build");
    let result = analyzer.analyze().expect("analysis should succeed");

    assert_eq!(result.files_checked, 2);
    let positions: Vec<(String, usize)> = result
        .violations
        .iter()
        .map(|v| (v.location.file.display().to_string(), v.location.line))
        .collect();
    assert_eq!(
        positions,
        vec![
            ("src/a.tsx".to_string(), 1),
            ("src/b.ts".to_string(), 1),
            ("src/b.ts".to_string(), 2),
        ]
    );
}

#[test]
fn single_file_root() {
    let dir = project();
    let files = analyzed_files(Config::default(), &dir.path().join("src/b.ts"));
    assert_eq!(files, vec![PathBuf::from("b.ts")]);
}
