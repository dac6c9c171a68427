//! TypeScript parsing with Tree-sitter.

use std::path::Path;

use rxlint_core::{FileContext, Location};
use tree_sitter::{Language, Node, Parser, Tree};

/// Grammar flavour used to parse a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`).
    TypeScript,
    /// TypeScript with JSX (`.tsx`).
    Tsx,
}

impl Dialect {
    /// Picks the dialect for a path, or `None` if the file is not analyzable.
    ///
    /// Declaration files (`.d.ts`) carry no executable code and are skipped.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name().and_then(|n| n.to_str())?;
        if file_name.ends_with(".d.ts")
            || file_name.ends_with(".d.mts")
            || file_name.ends_with(".d.cts")
        {
            return None;
        }
        match path.extension().and_then(|e| e.to_str())? {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Errors raised while building a syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load TypeScript grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// Tree-sitter returned no tree (cancelled or timed out).
    #[error("parser produced no syntax tree")]
    NoTree,
}

/// A parsed TypeScript source file.
///
/// Owns both the source text and its syntax tree, so nodes borrowed from
/// [`SourceFile::root`] stay valid for as long as the file is alive.
pub struct SourceFile {
    text: String,
    tree: Tree,
    dialect: Dialect,
}

impl SourceFile {
    /// Parses source text.
    ///
    /// Tree-sitter recovers from syntax errors, so malformed input still
    /// yields a tree; use [`SourceFile::has_syntax_errors`] to detect it.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or no tree is produced.
    pub fn parse(text: impl Into<String>, dialect: Dialect) -> Result<Self, ParseError> {
        let text = text.into();
        let mut parser = Parser::new();
        parser.set_language(&dialect.language())?;
        let tree = parser.parse(&text, None).ok_or(ParseError::NoTree)?;
        Ok(Self {
            text,
            tree,
            dialect,
        })
    }

    /// Root `program` node.
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Full source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Dialect this file was parsed with.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Source text covered by `node`.
    #[must_use]
    pub fn node_text(&self, node: Node<'_>) -> &str {
        self.text.get(node.byte_range()).unwrap_or("")
    }

    /// True if Tree-sitter had to recover from syntax errors.
    #[must_use]
    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("dialect", &self.dialect)
            .field("len", &self.text.len())
            .finish_non_exhaustive()
    }
}

/// Location of `node` in the file described by `ctx`, with its byte span.
#[must_use]
pub fn node_location(ctx: &FileContext<'_>, node: Node<'_>) -> Location {
    let start = node.start_position();
    Location::new(ctx.relative_path.clone(), start.row + 1, start.column + 1)
        .with_span(node.start_byte(), node.end_byte() - node.start_byte())
}

/// Strips one pair of matching quotes from a string literal's source text.
#[must_use]
pub fn unquote(literal: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = literal
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    literal
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn dialect_from_extension() {
        assert_eq!(
            Dialect::from_path(Path::new("src/app.ts")),
            Some(Dialect::TypeScript)
        );
        assert_eq!(
            Dialect::from_path(Path::new("src/module.mts")),
            Some(Dialect::TypeScript)
        );
        assert_eq!(
            Dialect::from_path(Path::new("src/view.tsx")),
            Some(Dialect::Tsx)
        );
        assert_eq!(Dialect::from_path(Path::new("src/index.js")), None);
        assert_eq!(Dialect::from_path(Path::new("README")), None);
    }

    #[test]
    fn declaration_files_are_skipped() {
        assert_eq!(Dialect::from_path(Path::new("typings/rxjs.d.ts")), None);
    }

    #[test]
    fn parses_program() {
        let file = SourceFile::parse("const a: number = 1;\n", Dialect::TypeScript)
            .expect("parse");
        assert_eq!(file.root().kind(), "program");
        assert!(!file.has_syntax_errors());
        assert_eq!(file.node_text(file.root()), "const a: number = 1;\n");
    }

    #[test]
    fn recovers_from_syntax_errors() {
        let file = SourceFile::parse("const = ;", Dialect::TypeScript).expect("parse");
        assert!(file.has_syntax_errors());
    }

    #[test]
    fn tsx_parses_jsx() {
        let file = SourceFile::parse("const el = <div>{x}</div>;\n", Dialect::Tsx).expect("parse");
        assert!(!file.has_syntax_errors());
    }

    #[test]
    fn location_is_one_indexed_with_span() {
        let file =
            SourceFile::parse("let a = 1;\nlet bb = 2;\n", Dialect::TypeScript).expect("parse");
        let ctx = FileContext::in_memory(Path::new("a.ts"), file.text());
        let second = file.root().named_child(1).expect("second statement");
        let loc = node_location(&ctx, second);
        assert_eq!(loc.file, PathBuf::from("a.ts"));
        assert_eq!((loc.line, loc.column), (2, 1));
        assert_eq!((loc.offset, loc.length), (11, 11));
    }

    #[test]
    fn unquote_strips_matching_quotes() {
        assert_eq!(unquote("\"rxjs\""), "rxjs");
        assert_eq!(unquote("'rxjs/operators'"), "rxjs/operators");
        assert_eq!(unquote("rxjs"), "rxjs");
        assert_eq!(unquote("'mismatch\""), "'mismatch\"");
    }
}
