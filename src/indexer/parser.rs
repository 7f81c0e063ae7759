// Language extractors

use std::path::Path;

use tree_sitter::{Language, Node, Parser as TreeParser, Tree};

use crate::error::{IndexError, Result};
use crate::index::{Symbol, SymbolKind};

/// Extracts the declared symbols of one source file.
///
/// Implementations must return symbols in source order and report malformed
/// input as [`IndexError::Parse`] instead of a partial result.
pub trait SymbolExtractor: Send + Sync {
    /// Language tag stored on every symbol (`python`, `rust`)
    fn language(&self) -> &'static str;

    /// File extensions handled, without the dot
    fn extensions(&self) -> &'static [&'static str];

    fn can_extract(&self, file_path: &str) -> bool {
        Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().contains(&ext))
            .unwrap_or(false)
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>>;
}

/// Extractors selectable by file extension or language tag
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn SymbolExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self { extractors: Vec::new() }
    }

    /// Registry with every built-in extractor
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PythonExtractor::new()));
        registry.register(Box::new(RustExtractor::new()));
        registry
    }

    /// Registry restricted to the given language tags; unknown tags are skipped
    pub fn for_languages(languages: &[String]) -> Self {
        let mut registry = Self::new();
        for extractor in Self::with_defaults().extractors {
            if languages.iter().any(|lang| lang == extractor.language()) {
                registry.register(extractor);
            }
        }
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn SymbolExtractor>) {
        self.extractors.push(extractor);
    }

    pub fn for_path(&self, file_path: &str) -> Option<&dyn SymbolExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_extract(file_path))
            .map(|e| e.as_ref())
    }

    pub fn for_language(&self, language: &str) -> Result<&dyn SymbolExtractor> {
        self.extractors
            .iter()
            .find(|e| e.language() == language)
            .map(|e| e.as_ref())
            .ok_or_else(|| IndexError::UnsupportedLanguage(language.to_string()))
    }

    pub fn languages(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.language()).collect()
    }

    pub fn is_candidate(&self, file_path: &str) -> bool {
        self.for_path(file_path).is_some()
    }

    /// Extract with whichever extractor claims the path
    pub fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let extractor = self
            .for_path(file_path)
            .ok_or_else(|| IndexError::UnsupportedLanguage(file_path.to_string()))?;
        extractor.extract(source, file_path)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse `source` and reject trees that contain error or missing nodes.
fn parse_source(language: &Language, source: &str, file_path: &str) -> Result<Tree> {
    let parse_error = |message: String| IndexError::Parse {
        path: file_path.to_string(),
        message,
    };

    let mut parser = TreeParser::new();
    parser
        .set_language(language)
        .map_err(|e| parse_error(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| parse_error("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root).start_position();
        return Err(parse_error(format!(
            "syntax error at line {}, column {}",
            at.row + 1,
            at.column
        )));
    }

    Ok(tree)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn first_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(|child| first_of_kind(child, kinds))
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

fn field_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field)
        .map(|child| node_text(child, source))
        .filter(|text| !text.is_empty())
}

/// Where a declaration sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Module,
    Class,
    Function,
}

#[derive(Debug, Clone)]
struct Context {
    container: Container,
    scope: Option<String>,
}

impl Context {
    fn module() -> Self {
        Self {
            container: Container::Module,
            scope: None,
        }
    }

    fn enter(&self, container: Container, name: &str) -> Self {
        Self {
            container,
            scope: Some(name.to_string()),
        }
    }
}

struct SymbolBuilder<'a> {
    file_path: &'a str,
    language: &'static str,
}

impl SymbolBuilder<'_> {
    fn build(&self, name: &str, kind: SymbolKind, node: Node, cx: &Context) -> Symbol {
        let start = node.start_position();

        Symbol {
            name: name.to_string(),
            kind,
            file: self.file_path.to_string(),
            line: start.row + 1,
            column: start.column,
            end_line: None,
            scope: cx.scope.clone(),
            language: self.language.to_string(),
            signature: None,
            docstring: None,
        }
    }

    fn build_block(&self, name: &str, kind: SymbolKind, node: Node, cx: &Context) -> Symbol {
        let mut symbol = self.build(name, kind, node, cx);
        symbol.end_line = Some(node.end_position().row + 1);
        symbol
    }
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

/// Python extractor using tree-sitter
pub struct PythonExtractor;

/// Python declaration nodes the walker cares about
enum PyDecl<'t> {
    Function(Node<'t>),
    Class(Node<'t>),
    Assignment(Node<'t>),
    Import(Node<'t>),
    ImportFrom(Node<'t>),
    Other(Node<'t>),
}

impl<'t> PyDecl<'t> {
    fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "function_definition" => PyDecl::Function(node),
            "class_definition" => PyDecl::Class(node),
            "assignment" => PyDecl::Assignment(node),
            "import_statement" => PyDecl::Import(node),
            "import_from_statement" | "future_import_statement" => PyDecl::ImportFrom(node),
            _ => PyDecl::Other(node),
        }
    }
}

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }

    fn walk(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context, out: &mut Vec<Symbol>) {
        match PyDecl::classify(node) {
            PyDecl::Function(node) => match self.function_symbol(node, source, b, cx) {
                Some(symbol) => {
                    let inner = cx.enter(Container::Function, &symbol.name);
                    out.push(symbol);
                    self.walk_children(node, source, b, &inner, out);
                }
                None => self.walk_children(node, source, b, cx, out),
            },
            PyDecl::Class(node) => match self.class_symbol(node, source, b, cx) {
                Some(symbol) => {
                    let inner = cx.enter(Container::Class, &symbol.name);
                    out.push(symbol);
                    self.walk_children(node, source, b, &inner, out);
                }
                None => self.walk_children(node, source, b, cx, out),
            },
            PyDecl::Assignment(node) => {
                if cx.container == Container::Module {
                    self.variable_symbols(node, source, b, cx, out);
                }
            }
            PyDecl::Import(node) => self.import_symbols(node, None, source, b, cx, out),
            PyDecl::ImportFrom(node) => {
                let module = if node.kind() == "future_import_statement" {
                    Some("__future__")
                } else {
                    field_text(node, "module_name", source)
                };
                self.import_symbols(node, Some(module.unwrap_or("")), source, b, cx, out);
            }
            PyDecl::Other(node) => self.walk_children(node, source, b, cx, out),
        }
    }

    fn walk_children(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context, out: &mut Vec<Symbol>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.walk(child, source, b, cx, out);
        }
    }

    fn function_symbol(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context) -> Option<Symbol> {
        let name = field_text(node, "name", source)?;

        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| parameter_names(params, source))
            .unwrap_or_default();

        let mut cursor = node.walk();
        let is_async = node.children(&mut cursor).any(|child| child.kind() == "async");
        let keyword = if is_async { "async def" } else { "def" };

        let kind = if cx.container == Container::Class {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let mut symbol = b.build_block(name, kind, node, cx);
        symbol.signature = Some(format!("{} {}({})", keyword, name, parameters.join(", ")));
        symbol.docstring = node.child_by_field_name("body").and_then(|body| docstring(body, source));
        Some(symbol)
    }

    fn class_symbol(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context) -> Option<Symbol> {
        let name = field_text(node, "name", source)?;

        let mut bases = Vec::new();
        if let Some(args) = node.child_by_field_name("superclasses") {
            let mut cursor = args.walk();
            for arg in args.named_children(&mut cursor) {
                match arg.kind() {
                    "keyword_argument" | "list_splat" | "dictionary_splat" | "comment" => {}
                    _ => bases.push(node_text(arg, source)),
                }
            }
        }

        let signature = if bases.is_empty() {
            format!("class {}", name)
        } else {
            format!("class {}({})", name, bases.join(", "))
        };

        let mut symbol = b.build_block(name, SymbolKind::Class, node, cx);
        symbol.signature = Some(signature);
        symbol.docstring = node.child_by_field_name("body").and_then(|body| docstring(body, source));
        Some(symbol)
    }

    /// One variable per simple identifier target; `a = b = 1` binds both.
    fn variable_symbols(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context, out: &mut Vec<Symbol>) {
        let mut current = Some(node);

        while let Some(assignment) = current {
            let right = assignment.child_by_field_name("right");
            if right.is_none() {
                // Bare annotation (`x: int`) binds nothing
                break;
            }

            if let Some(left) = assignment.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    // Every target shares the statement position
                    out.push(b.build(node_text(left, source), SymbolKind::Variable, node, cx));
                }
            }

            current = right.filter(|r| r.kind() == "assignment");
        }
    }

    /// `module` is `None` for `import x`, the module text for `from m import x`.
    fn import_symbols(
        &self,
        node: Node,
        module: Option<&str>,
        source: &str,
        b: &SymbolBuilder,
        cx: &Context,
        out: &mut Vec<Symbol>,
    ) {
        let mut cursor = node.walk();
        for entry in node.children_by_field_name("name", &mut cursor) {
            let (imported, alias) = match entry.kind() {
                "aliased_import" => (
                    field_text(entry, "name", source),
                    field_text(entry, "alias", source),
                ),
                _ => (Some(node_text(entry, source)), None),
            };

            let Some(imported) = imported.filter(|s| !s.is_empty()) else {
                continue;
            };

            let mut symbol = b.build(alias.unwrap_or(imported), SymbolKind::Import, node, cx);
            symbol.signature = Some(match module {
                Some(module) => format!("from {} import {}", module, imported),
                None => format!("import {}", imported),
            });
            out.push(symbol);
        }
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor for PythonExtractor {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let tree = parse_source(&tree_sitter_python::LANGUAGE.into(), source, file_path)?;

        // The grammar still accepts Python 2 statement forms
        if let Some(legacy) = first_of_kind(tree.root_node(), &["print_statement", "exec_statement"]) {
            let at = legacy.start_position();
            return Err(IndexError::Parse {
                path: file_path.to_string(),
                message: format!(
                    "Python 2 {} at line {}, column {}",
                    legacy.kind().replace('_', " "),
                    at.row + 1,
                    at.column
                ),
            });
        }

        let builder = SymbolBuilder {
            file_path,
            language: self.language(),
        };
        let mut symbols = Vec::new();
        self.walk(tree.root_node(), source, &builder, &Context::module(), &mut symbols);

        Ok(symbols)
    }
}

fn parameter_names(params: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor) {
        let name = match param.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => Some(node_text(param, source)),
            "default_parameter" | "typed_default_parameter" => field_text(param, "name", source),
            "typed_parameter" => {
                let mut inner = param.walk();
                let first = param.named_children(&mut inner).next();
                first.map(|n| node_text(n, source))
            }
            _ => None,
        };

        if let Some(name) = name.filter(|n| !n.is_empty()) {
            names.push(name.to_string());
        }
    }

    names
}

/// Leading string literal of a block, cleaned like `inspect.cleandoc`
fn docstring(body: Node, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;

    if first.kind() != "expression_statement" {
        return None;
    }

    let mut inner = first.walk();
    let expr = first.named_children(&mut inner).next()?;
    let raw = match expr.kind() {
        "string" => string_literal_body(node_text(expr, source))?.to_string(),
        // Adjacent literals: "a" "b"
        "concatenated_string" => {
            let mut parts = expr.walk();
            let pieces: Vec<Node> = expr
                .named_children(&mut parts)
                .filter(|part| part.kind() == "string")
                .collect();
            pieces
                .into_iter()
                .map(|part| string_literal_body(node_text(part, source)))
                .collect::<Option<String>>()?
        }
        _ => return None,
    };

    let cleaned = clean_docstring(&raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Strip prefix and quotes; bytes and f-strings are not docstrings.
fn string_literal_body(literal: &str) -> Option<&str> {
    let prefix_len = literal
        .find(|c| c == '"' || c == '\'')
        .unwrap_or(literal.len());
    let prefix = &literal[..prefix_len];
    if prefix.chars().any(|c| matches!(c, 'b' | 'B' | 'f' | 'F')) {
        return None;
    }

    let quoted = &literal[prefix_len..];
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * quote.len() && quoted.starts_with(quote) && quoted.ends_with(quote) {
            return Some(&quoted[quote.len()..quoted.len() - quote.len()]);
        }
    }

    None
}

fn clean_docstring(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.bytes().take_while(|b| *b == b' ').count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            cleaned.push(line.trim_start());
        } else {
            let indent = line.bytes().take(margin).take_while(|b| *b == b' ').count();
            cleaned.push(&line[indent..]);
        }
    }

    while cleaned.first().map_or(false, |line| line.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().map_or(false, |line| line.trim().is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

// ---------------------------------------------------------------------------
// Rust
// ---------------------------------------------------------------------------

/// Rust extractor using tree-sitter
pub struct RustExtractor;

enum RustDecl<'t> {
    Function(Node<'t>),
    Type(Node<'t>, SymbolKind),
    Impl(Node<'t>),
    Constant(Node<'t>),
    Use(Node<'t>),
    Other(Node<'t>),
}

impl<'t> RustDecl<'t> {
    fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "function_item" | "function_signature_item" => RustDecl::Function(node),
            "struct_item" => RustDecl::Type(node, SymbolKind::Struct),
            "enum_item" => RustDecl::Type(node, SymbolKind::Enum),
            "trait_item" => RustDecl::Type(node, SymbolKind::Trait),
            "mod_item" => RustDecl::Type(node, SymbolKind::Module),
            "impl_item" => RustDecl::Impl(node),
            "const_item" | "static_item" => RustDecl::Constant(node),
            "use_declaration" => RustDecl::Use(node),
            _ => RustDecl::Other(node),
        }
    }
}

impl RustExtractor {
    pub fn new() -> Self {
        Self
    }

    fn walk(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context, out: &mut Vec<Symbol>) {
        match RustDecl::classify(node) {
            RustDecl::Function(node) => {
                let Some(name) = field_text(node, "name", source) else {
                    return;
                };

                let kind = if cx.container == Container::Class {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };

                let parameters = node
                    .child_by_field_name("parameters")
                    .map(|params| rust_parameters(params, source))
                    .unwrap_or_default();

                let mut symbol = b.build_block(name, kind, node, cx);
                symbol.signature = Some(format!("fn {}({})", name, parameters.join(", ")));
                symbol.docstring = doc_comment(node, source);
                out.push(symbol);

                if let Some(body) = node.child_by_field_name("body") {
                    self.walk_children(body, source, b, &cx.enter(Container::Function, name), out);
                }
            }
            RustDecl::Type(node, kind) => {
                let Some(name) = field_text(node, "name", source) else {
                    return;
                };

                let keyword = match kind {
                    SymbolKind::Module => "mod",
                    other => other.as_str(),
                };

                let mut symbol = b.build_block(name, kind, node, cx);
                symbol.signature = Some(format!("{} {}", keyword, name));
                symbol.docstring = doc_comment(node, source);
                out.push(symbol);

                let inner = match kind {
                    SymbolKind::Trait => Some(cx.enter(Container::Class, name)),
                    SymbolKind::Module => Some(cx.enter(Container::Module, name)),
                    _ => None,
                };
                if let (Some(inner), Some(body)) = (inner, node.child_by_field_name("body")) {
                    self.walk_children(body, source, b, &inner, out);
                }
            }
            RustDecl::Impl(node) => {
                let owner = field_text(node, "type", source).unwrap_or("impl");
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk_children(body, source, b, &cx.enter(Container::Class, owner), out);
                }
            }
            RustDecl::Constant(node) => {
                if cx.container != Container::Module {
                    return;
                }
                if let Some(name) = field_text(node, "name", source) {
                    let keyword = if node.kind() == "static_item" { "static" } else { "const" };
                    let mut symbol = b.build(name, SymbolKind::Variable, node, cx);
                    symbol.signature = Some(format!("{} {}", keyword, name));
                    symbol.docstring = doc_comment(node, source);
                    out.push(symbol);
                }
            }
            RustDecl::Use(node) => {
                let Some(argument) = node.child_by_field_name("argument") else {
                    return;
                };

                let mut leaves = Vec::new();
                use_leaves(argument, "", source, &mut leaves);

                for leaf in leaves {
                    let mut symbol = b.build(&leaf.name, SymbolKind::Import, node, cx);
                    symbol.signature = Some(match &leaf.alias {
                        Some(alias) => format!("use {} as {}", leaf.path, alias),
                        None => format!("use {}", leaf.path),
                    });
                    out.push(symbol);
                }
            }
            RustDecl::Other(node) => self.walk_children(node, source, b, cx, out),
        }
    }

    fn walk_children(&self, node: Node, source: &str, b: &SymbolBuilder, cx: &Context, out: &mut Vec<Symbol>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.walk(child, source, b, cx, out);
        }
    }
}

impl Default for RustExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor for RustExtractor {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let tree = parse_source(&tree_sitter_rust::LANGUAGE.into(), source, file_path)?;

        let builder = SymbolBuilder {
            file_path,
            language: self.language(),
        };
        let mut symbols = Vec::new();
        self.walk(tree.root_node(), source, &builder, &Context::module(), &mut symbols);

        Ok(symbols)
    }
}

fn rust_parameters(params: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "self_parameter" => names.push(node_text(param, source).to_string()),
            "parameter" => {
                if let Some(pattern) = field_text(param, "pattern", source) {
                    names.push(pattern.to_string());
                }
            }
            _ => {}
        }
    }

    names
}

/// `///` comments directly above an item, attributes in between allowed
fn doc_comment(node: Node, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut current = node.prev_sibling();

    while let Some(sibling) = current {
        match sibling.kind() {
            "line_comment" => {
                let text = node_text(sibling, source).trim_end();
                match text.strip_prefix("///") {
                    Some(rest) if !rest.starts_with('/') => {
                        lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
                    }
                    _ => break,
                }
            }
            "attribute_item" => {}
            _ => break,
        }
        current = sibling.prev_sibling();
    }

    if lines.is_empty() {
        return None;
    }

    lines.reverse();
    Some(lines.join("\n"))
}

struct UseLeaf {
    path: String,
    name: String,
    alias: Option<String>,
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}::{}", prefix, segment)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn use_leaves(node: Node, prefix: &str, source: &str, out: &mut Vec<UseLeaf>) {
    match node.kind() {
        "self" => {
            if !prefix.is_empty() {
                out.push(UseLeaf {
                    path: prefix.to_string(),
                    name: last_segment(prefix).to_string(),
                    alias: None,
                });
            }
        }
        "identifier" | "crate" | "super" | "metavariable" | "scoped_identifier" => {
            let path = join_path(prefix, node_text(node, source));
            let name = last_segment(&path).to_string();
            out.push(UseLeaf { path, name, alias: None });
        }
        "use_as_clause" => {
            let (Some(path), Some(alias)) = (
                field_text(node, "path", source),
                field_text(node, "alias", source),
            ) else {
                return;
            };
            out.push(UseLeaf {
                path: join_path(prefix, path),
                name: alias.to_string(),
                alias: Some(alias.to_string()),
            });
        }
        "scoped_use_list" => {
            let nested = match field_text(node, "path", source) {
                Some(path) => join_path(prefix, path),
                None => prefix.to_string(),
            };
            if let Some(list) = node.child_by_field_name("list") {
                use_leaves(list, &nested, source, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                use_leaves(child, prefix, source, out);
            }
        }
        // Glob imports bind no single name
        _ => {}
    }
}
