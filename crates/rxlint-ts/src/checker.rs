//! Declared-type resolution for expressions.
//!
//! Rules that need type information ask a [`TypeResolver`] for the static
//! type of an expression node. [`SourceTypeChecker`] answers from what the
//! file itself declares: type annotations, initializers, class and interface
//! heritage, function return types and imported library creation functions.
//! Knowledge about the library's own declarations (its class hierarchy and
//! member return types) comes from [`AmbientTypes`].
//!
//! Resolution is deliberately conservative. Whenever a type cannot be
//! determined from declarations (untyped parameters, `any`, unions of
//! several non-null types, conditional expressions) the answer is `None`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Range;

use tree_sitter::Node;

use crate::syntax::{unquote, SourceFile};

/// Bound on nested inference steps (initializer chains, member lookups).
const MAX_INFERENCE_DEPTH: usize = 32;

/// Node kinds that open a block scope for `let`/`const`/`var` bindings.
const BLOCK_SCOPES: &[&str] = &[
    "program",
    "statement_block",
    "for_statement",
    "for_in_statement",
    "switch_body",
    "class_static_block",
];

/// Node kinds that rebind `this`.
const THIS_BINDERS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "generator_function_declaration",
];

/// Static type of an expression, as far as the resolver knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    supertypes: Vec<String>,
    shadows_library: bool,
}

impl TypeDescriptor {
    /// Creates a descriptor with no known supertypes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            shadows_library: false,
        }
    }

    /// Sets the transitive supertypes of this type.
    #[must_use]
    pub fn with_supertypes(mut self, supertypes: Vec<String>) -> Self {
        self.supertypes = supertypes;
        self
    }

    /// Marks the name as a local declaration hiding a library type of the
    /// same name. The type is then not assignable to its own name.
    #[must_use]
    pub fn shadowing_library(mut self) -> Self {
        self.shadows_library = true;
        self
    }

    /// Nominal name of the type, without type arguments.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All known supertypes, nearest first.
    #[must_use]
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// True if this type is `target` or has `target` among its supertypes.
    #[must_use]
    pub fn is_assignable_to(&self, target: &str) -> bool {
        (!self.shadows_library && self.name == target)
            || self.supertypes.iter().any(|s| s == target)
    }
}

/// Type-resolution service offered to rules.
///
/// Implementations are read-only oracles: they answer for nodes of the file
/// they were built for and never change state between queries.
pub trait TypeResolver {
    /// Static type of `expr`, or `None` if it cannot be determined.
    fn resolve_type(&self, expr: Node<'_>) -> Option<TypeDescriptor>;
}

/// Resolver used when no enabled rule asks for type information.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTypeInfo;

impl TypeResolver for NoTypeInfo {
    fn resolve_type(&self, _expr: Node<'_>) -> Option<TypeDescriptor> {
        None
    }
}

/// Built-in declarations of the reactive-stream library.
#[derive(Debug, Clone)]
pub struct AmbientTypes {
    package: String,
    stream_root: String,
    supertypes: HashMap<String, Vec<String>>,
    creation_functions: HashSet<String>,
    stream_constants: HashSet<String>,
    member_returns: HashMap<String, Option<String>>,
}

impl AmbientTypes {
    /// Declarations of RxJS (5.x patch style through 7.x).
    #[must_use]
    pub fn rxjs() -> Self {
        let supertypes = [
            ("Subject", "Observable"),
            ("BehaviorSubject", "Subject"),
            ("ReplaySubject", "Subject"),
            ("AsyncSubject", "Subject"),
            ("AnonymousSubject", "Subject"),
            ("ConnectableObservable", "Observable"),
            ("GroupedObservable", "Observable"),
        ]
        .into_iter()
        .map(|(sub, sup)| (sub.to_string(), vec![sup.to_string()]))
        .collect();

        let creation_functions = [
            "ajax",
            "combineLatest",
            "concat",
            "create",
            "defer",
            "empty",
            "forkJoin",
            "from",
            "fromEvent",
            "fromEventPattern",
            "generate",
            "iif",
            "interval",
            "merge",
            "never",
            "of",
            "onErrorResumeNext",
            "pairs",
            "race",
            "range",
            "throwError",
            "timer",
            "using",
            "zip",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let stream_constants = ["EMPTY", "NEVER"].into_iter().map(String::from).collect();

        let member_returns = [
            ("subscribe", Some("Subscription")),
            ("toPromise", Some("Promise")),
            ("forEach", Some("Promise")),
            ("next", Some("void")),
            ("error", Some("void")),
            ("complete", Some("void")),
            ("unsubscribe", Some("void")),
            ("getValue", None),
        ]
        .into_iter()
        .map(|(member, ret)| (member.to_string(), ret.map(String::from)))
        .collect();

        Self {
            package: "rxjs".to_string(),
            stream_root: "Observable".to_string(),
            supertypes,
            creation_functions,
            stream_constants,
            member_returns,
        }
    }

    /// Name of the library's core stream type.
    #[must_use]
    pub fn stream_root(&self) -> &str {
        &self.stream_root
    }

    /// True if `module` (unquoted) is the library or one of its entry points,
    /// scoped or not: `rxjs`, `rxjs/operators`, `@scope/rxjs`.
    #[must_use]
    pub fn is_library_module(&self, module: &str) -> bool {
        let package = self.package.as_str();
        if module.starts_with('.') || module.starts_with('/') {
            return false;
        }
        module == package
            || module.starts_with(&format!("{package}/"))
            || module.ends_with(&format!("/{package}"))
            || module.contains(&format!("/{package}/"))
    }

    fn direct_supertypes(&self, name: &str) -> &[String] {
        self.supertypes.get(name).map_or(&[], Vec::as_slice)
    }

    /// True if the library declares a type called `name`.
    fn declares_type(&self, name: &str) -> bool {
        name == self.stream_root
            || self
                .supertypes
                .iter()
                .any(|(sub, sups)| sub == name || sups.iter().any(|s| s == name))
    }

    fn is_creation_function(&self, name: &str) -> bool {
        self.creation_functions.contains(name)
    }

    fn is_stream_constant(&self, name: &str) -> bool {
        self.stream_constants.contains(name)
    }
}

impl Default for AmbientTypes {
    fn default() -> Self {
        Self::rxjs()
    }
}

/// Where a binding's type comes from.
#[derive(Debug, Clone, Copy)]
enum Origin<'a> {
    /// A type annotation (`type_annotation` or a bare type node).
    Annotated(Node<'a>),
    /// An initializer expression.
    Initialized(Node<'a>),
    /// Declared without type or initializer, or destructured.
    Unknown,
}

#[derive(Debug)]
struct Binding<'a> {
    name: String,
    scope: Range<usize>,
    declared_at: usize,
    origin: Origin<'a>,
}

#[derive(Debug)]
struct ImportBinding {
    module: String,
    /// Exported name, `*` for namespace imports, `default` for default imports.
    imported: String,
}

#[derive(Debug)]
struct ClassInfo<'a> {
    name: Option<String>,
    node_id: usize,
    heritage: Vec<String>,
    fields: HashMap<String, Origin<'a>>,
    methods: HashMap<String, Node<'a>>,
}

/// [`TypeResolver`] built from the declarations of a single file.
pub struct SourceTypeChecker<'a> {
    file: &'a SourceFile,
    ambient: &'a AmbientTypes,
    bindings: Vec<Binding<'a>>,
    imports: HashMap<String, ImportBinding>,
    classes: Vec<ClassInfo<'a>>,
    functions: HashMap<String, Node<'a>>,
}

impl<'a> SourceTypeChecker<'a> {
    /// Indexes the declarations of `file`.
    #[must_use]
    pub fn new(file: &'a SourceFile, ambient: &'a AmbientTypes) -> Self {
        let mut checker = Self {
            file,
            ambient,
            bindings: Vec::new(),
            imports: HashMap::new(),
            classes: Vec::new(),
            functions: HashMap::new(),
        };
        checker.collect();
        tracing::trace!(
            bindings = checker.bindings.len(),
            imports = checker.imports.len(),
            classes = checker.classes.len(),
            "indexed declarations"
        );
        checker
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        self.file.node_text(node)
    }

    // ---- declaration indexing ----

    fn collect(&mut self) {
        let file = self.file;
        let mut cursor = file.root().walk();
        loop {
            self.record(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn record(&mut self, node: Node<'a>) {
        match node.kind() {
            "import_statement" => self.record_import(node),
            "variable_declarator" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return;
                };
                let origin = match (
                    node.child_by_field_name("type"),
                    node.child_by_field_name("value"),
                ) {
                    (Some(ty), _) => Origin::Annotated(ty),
                    (None, Some(value)) => Origin::Initialized(value),
                    (None, None) => Origin::Unknown,
                };
                let scope = Self::block_scope(node);
                self.bind_pattern(name, scope, origin);
            }
            "required_parameter" | "optional_parameter" => {
                let Some(pattern) = node.child_by_field_name("pattern") else {
                    return;
                };
                let origin = match (
                    node.child_by_field_name("type"),
                    node.child_by_field_name("value"),
                ) {
                    (Some(ty), _) => Origin::Annotated(ty),
                    (None, Some(value)) => Origin::Initialized(value),
                    (None, None) => Origin::Unknown,
                };
                let scope = node
                    .parent()
                    .and_then(|params| params.parent())
                    .map_or_else(|| node.byte_range(), |f| f.byte_range());
                self.bind_pattern(pattern, scope, origin);
            }
            "arrow_function" => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    self.bind_pattern(param, node.byte_range(), Origin::Unknown);
                }
            }
            "for_in_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_pattern(left, node.byte_range(), Origin::Unknown);
                }
            }
            "catch_clause" => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    self.bind_pattern(param, node.byte_range(), Origin::Unknown);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                if let (Some(name), Some(ret)) = (
                    node.child_by_field_name("name"),
                    node.child_by_field_name("return_type"),
                ) {
                    self.functions.insert(self.text(name).to_string(), ret);
                }
            }
            "class_declaration" | "abstract_class_declaration" | "class" => {
                self.record_class(node);
            }
            "interface_declaration" => self.record_interface(node),
            _ => {}
        }
    }

    fn record_import(&mut self, node: Node<'a>) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let module = unquote(self.text(source)).to_string();

        let mut cursor = node.walk();
        let Some(clause) = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };

        let mut clause_cursor = clause.walk();
        for part in clause.named_children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => {
                    self.imports.insert(
                        self.text(part).to_string(),
                        ImportBinding {
                            module: module.clone(),
                            imported: "default".to_string(),
                        },
                    );
                }
                "namespace_import" => {
                    let mut ns_cursor = part.walk();
                    let local = part
                        .named_children(&mut ns_cursor)
                        .find(|c| c.kind() == "identifier");
                    if let Some(local) = local {
                        self.imports.insert(
                            self.text(local).to_string(),
                            ImportBinding {
                                module: module.clone(),
                                imported: "*".to_string(),
                            },
                        );
                    }
                }
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.named_children(&mut spec_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = unquote(self.text(name)).to_string();
                        let local = spec
                            .child_by_field_name("alias")
                            .map_or_else(|| imported.clone(), |a| self.text(a).to_string());
                        self.imports.insert(
                            local,
                            ImportBinding {
                                module: module.clone(),
                                imported,
                            },
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn record_class(&mut self, node: Node<'a>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());

        let mut heritage = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "class_heritage" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for clause in child.named_children(&mut clause_cursor) {
                match clause.kind() {
                    "extends_clause" => {
                        let mut value_cursor = clause.walk();
                        for value in clause.children_by_field_name("value", &mut value_cursor) {
                            if let Some(n) = self.type_name(value) {
                                heritage.push(n.to_string());
                            }
                        }
                    }
                    "implements_clause" => {
                        let mut type_cursor = clause.walk();
                        for ty in clause.named_children(&mut type_cursor) {
                            if let Some(n) = self.type_name(ty) {
                                heritage.push(n.to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut fields = HashMap::new();
        let mut methods = HashMap::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            for member in body.named_children(&mut body_cursor) {
                self.record_member(member, &mut fields, &mut methods);
            }
        }

        self.classes.push(ClassInfo {
            name,
            node_id: node.id(),
            heritage,
            fields,
            methods,
        });
    }

    fn record_interface(&mut self, node: Node<'a>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());

        let mut heritage = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "extends_type_clause" {
                continue;
            }
            let mut type_cursor = child.walk();
            for ty in child.named_children(&mut type_cursor) {
                if let Some(n) = self.type_name(ty) {
                    heritage.push(n.to_string());
                }
            }
        }

        let mut fields = HashMap::new();
        let mut methods = HashMap::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            for member in body.named_children(&mut body_cursor) {
                self.record_member(member, &mut fields, &mut methods);
            }
        }

        self.classes.push(ClassInfo {
            name,
            node_id: node.id(),
            heritage,
            fields,
            methods,
        });
    }

    fn record_member(
        &self,
        member: Node<'a>,
        fields: &mut HashMap<String, Origin<'a>>,
        methods: &mut HashMap<String, Node<'a>>,
    ) {
        let Some(name) = member.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name).to_string();

        match member.kind() {
            "public_field_definition" | "property_signature" => {
                let origin = match (
                    member.child_by_field_name("type"),
                    member.child_by_field_name("value"),
                ) {
                    (Some(ty), _) => Origin::Annotated(ty),
                    (None, Some(value)) => Origin::Initialized(value),
                    (None, None) => Origin::Unknown,
                };
                fields.insert(name, origin);
            }
            "method_definition" if name == "constructor" => {
                let Some(params) = member.child_by_field_name("parameters") else {
                    return;
                };
                let mut cursor = params.walk();
                for param in params.named_children(&mut cursor) {
                    if !Self::is_parameter_property(param) {
                        continue;
                    }
                    let Some(pattern) = param.child_by_field_name("pattern") else {
                        continue;
                    };
                    let origin = param
                        .child_by_field_name("type")
                        .map_or(Origin::Unknown, Origin::Annotated);
                    fields.insert(self.text(pattern).to_string(), origin);
                }
            }
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let Some(ret) = member.child_by_field_name("return_type") else {
                    return;
                };
                let mut cursor = member.walk();
                let is_getter = member.children(&mut cursor).any(|c| c.kind() == "get");
                if is_getter {
                    fields.insert(name, Origin::Annotated(ret));
                } else {
                    methods.insert(name, ret);
                }
            }
            _ => {}
        }
    }

    fn is_parameter_property(param: Node<'_>) -> bool {
        let mut cursor = param.walk();
        let found = param.children(&mut cursor).any(|c| {
            matches!(
                c.kind(),
                "accessibility_modifier" | "override_modifier" | "readonly"
            )
        });
        found
    }

    fn bind_pattern(&mut self, pattern: Node<'a>, scope: Range<usize>, origin: Origin<'a>) {
        if pattern.kind() == "identifier" {
            self.bindings.push(Binding {
                name: self.text(pattern).to_string(),
                scope,
                declared_at: pattern.start_byte(),
                origin,
            });
            return;
        }

        // Destructured names shadow outer bindings but carry no type.
        let mut cursor = pattern.walk();
        let mut stack = vec![pattern];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "identifier" | "shorthand_property_identifier_pattern" => {
                    self.bindings.push(Binding {
                        name: self.text(node).to_string(),
                        scope: scope.clone(),
                        declared_at: node.start_byte(),
                        origin: Origin::Unknown,
                    });
                }
                // Keys and defaults inside patterns are not bindings.
                "property_identifier" => {}
                "pair_pattern" => {
                    if let Some(value) = node.child_by_field_name("value") {
                        stack.push(value);
                    }
                }
                "assignment_pattern" | "object_assignment_pattern" => {
                    if let Some(left) = node.child_by_field_name("left") {
                        stack.push(left);
                    }
                }
                _ => stack.extend(node.named_children(&mut cursor)),
            }
        }
    }

    fn block_scope(node: Node<'_>) -> Range<usize> {
        let mut current = node.parent();
        while let Some(n) = current {
            if BLOCK_SCOPES.contains(&n.kind()) {
                return n.byte_range();
            }
            current = n.parent();
        }
        0..usize::MAX
    }

    // ---- resolution ----

    fn lookup_binding(&self, name: &str, at: usize) -> Option<&Binding<'a>> {
        self.bindings
            .iter()
            .filter(|b| b.name == name && b.scope.contains(&at))
            .min_by(|a, b| {
                a.scope
                    .len()
                    .cmp(&b.scope.len())
                    // Same scope: the last declaration before the use wins.
                    .then_with(|| (b.declared_at <= at).cmp(&(a.declared_at <= at)))
                    .then_with(|| b.declared_at.cmp(&a.declared_at))
            })
    }

    fn class_named(&self, name: &str) -> Option<&ClassInfo<'a>> {
        self.classes
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
    }

    fn enclosing_class(&self, node: Node<'_>) -> Option<&ClassInfo<'a>> {
        let mut current = node.parent();
        while let Some(n) = current {
            let kind = n.kind();
            if THIS_BINDERS.contains(&kind) {
                return None;
            }
            if kind == "method_definition" && n.parent().is_some_and(|p| p.kind() == "object") {
                return None;
            }
            if kind == "class_body" {
                let class = n.parent()?;
                return self.classes.iter().find(|c| c.node_id == class.id());
            }
            current = n.parent();
        }
        None
    }

    fn direct_supertypes(&self, name: &str) -> Vec<String> {
        let mut direct: Vec<String> = self
            .classes
            .iter()
            .filter(|c| c.name.as_deref() == Some(name))
            .flat_map(|c| c.heritage.iter().cloned())
            .collect();
        // A local declaration hides the library type of the same name.
        if self.class_named(name).is_none() {
            direct.extend(self.ambient.direct_supertypes(name).iter().cloned());
        }
        direct
    }

    fn shadows_library(&self, name: &str) -> bool {
        self.ambient.declares_type(name)
            && self.class_named(name).is_some()
            && self.library_import(name).is_none()
    }

    fn supertype_closure(&self, root: &str, direct: Vec<String>) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::from([root.to_string()]);
        let mut queue: VecDeque<String> = direct.into();
        let mut out = Vec::new();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next.clone()) {
                queue.extend(self.direct_supertypes(&next));
                out.push(next);
            }
        }
        out
    }

    fn describe(&self, name: &str) -> TypeDescriptor {
        let supertypes = self.supertype_closure(name, self.direct_supertypes(name));
        let descriptor =
            TypeDescriptor::new(name).with_supertypes(self.library_visible(supertypes));
        if self.shadows_library(name) {
            descriptor.shadowing_library()
        } else {
            descriptor
        }
    }

    fn library_visible(&self, supertypes: Vec<String>) -> Vec<String> {
        supertypes
            .into_iter()
            .filter(|s| !self.shadows_library(s))
            .collect()
    }

    fn describe_class(&self, class: &ClassInfo<'a>) -> TypeDescriptor {
        match &class.name {
            Some(name) => self.describe(name),
            None => {
                let supertypes = self.supertype_closure("", class.heritage.clone());
                TypeDescriptor::new("(anonymous class)")
                    .with_supertypes(self.library_visible(supertypes))
            }
        }
    }

    fn stream_type(&self) -> TypeDescriptor {
        TypeDescriptor::new(self.ambient.stream_root())
    }

    /// Simple name of a type or heritage expression (`Rx.Observable<T>` → `Observable`).
    fn type_name(&self, node: Node<'_>) -> Option<&'a str> {
        match node.kind() {
            "type_identifier" | "identifier" => Some(self.text(node)),
            "generic_type" => self.type_name(node.child_by_field_name("name")?),
            "nested_type_identifier" => Some(self.text(node.child_by_field_name("name")?)),
            "member_expression" => Some(self.text(node.child_by_field_name("property")?)),
            _ => None,
        }
    }

    fn evaluate(&self, origin: Origin<'a>, depth: usize) -> Option<TypeDescriptor> {
        match origin {
            Origin::Annotated(ty) => self.from_type_node(ty, depth + 1),
            Origin::Initialized(value) => self.infer(value, depth + 1),
            Origin::Unknown => None,
        }
    }

    fn from_type_node(&self, node: Node<'_>, depth: usize) -> Option<TypeDescriptor> {
        if depth > MAX_INFERENCE_DEPTH {
            return None;
        }
        match node.kind() {
            "type_annotation" | "parenthesized_type" => {
                self.from_type_node(node.named_child(0)?, depth + 1)
            }
            "type_identifier" | "generic_type" | "nested_type_identifier" => {
                Some(self.describe(self.type_name(node)?))
            }
            "predefined_type" => match self.text(node) {
                "any" | "unknown" | "never" => None,
                other => Some(TypeDescriptor::new(other)),
            },
            "array_type" | "tuple_type" => Some(self.describe("Array")),
            "function_type" => Some(TypeDescriptor::new("Function")),
            "union_type" => {
                let mut members = Vec::new();
                self.flatten_union(node, &mut members);
                match members.as_slice() {
                    [single] => self.from_type_node(*single, depth + 1),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn flatten_union<'n>(&self, node: Node<'n>, out: &mut Vec<Node<'n>>) {
        let mut cursor = node.walk();
        for member in node.named_children(&mut cursor) {
            if member.kind() == "union_type" {
                self.flatten_union(member, out);
            } else if !matches!(self.text(member), "null" | "undefined" | "void") {
                out.push(member);
            }
        }
    }

    fn infer(&self, node: Node<'_>, depth: usize) -> Option<TypeDescriptor> {
        if depth > MAX_INFERENCE_DEPTH {
            return None;
        }
        match node.kind() {
            "identifier" => self.infer_identifier(node, depth),
            "this" => {
                let class = self.enclosing_class(node)?;
                Some(self.describe_class(class))
            }
            "member_expression" => self.infer_member(node, depth),
            "call_expression" => self.infer_call(node, depth),
            "new_expression" => {
                let constructor = node.child_by_field_name("constructor")?;
                Some(self.describe(self.type_name(constructor)?))
            }
            "parenthesized_expression" | "non_null_expression" | "satisfies_expression" => {
                self.infer(node.named_child(0)?, depth + 1)
            }
            "as_expression" => {
                let ty = node.named_child(1)?;
                self.from_type_node(ty, depth + 1)
            }
            "array" => Some(self.describe("Array")),
            "object" => Some(TypeDescriptor::new("Object")),
            "string" | "template_string" => Some(TypeDescriptor::new("string")),
            "number" => Some(TypeDescriptor::new("number")),
            "true" | "false" => Some(TypeDescriptor::new("boolean")),
            "arrow_function" | "function_expression" | "function" => {
                Some(TypeDescriptor::new("Function"))
            }
            _ => None,
        }
    }

    fn infer_identifier(&self, node: Node<'_>, depth: usize) -> Option<TypeDescriptor> {
        let name = self.text(node);
        if let Some(binding) = self.lookup_binding(name, node.start_byte()) {
            return self.evaluate(binding.origin, depth);
        }
        let import = self.imports.get(name)?;
        (self.ambient.is_library_module(&import.module)
            && self.ambient.is_stream_constant(&import.imported))
        .then(|| self.stream_type())
    }

    fn infer_member(&self, node: Node<'_>, depth: usize) -> Option<TypeDescriptor> {
        let object = node.child_by_field_name("object")?;
        let property = self.text(node.child_by_field_name("property")?);

        let class = if object.kind() == "this" {
            self.enclosing_class(object)?
        } else {
            let owner = self.infer(object, depth + 1)?;
            self.class_named(owner.name())?
        };
        let origin = self.find_inherited(class, |c| c.fields.get(property).copied())?;
        self.evaluate(origin, depth)
    }

    /// First hit of `lookup` on `class` or its ancestors, breadth first.
    /// Each class is visited once, so cyclic heritage terminates.
    fn find_inherited<T>(
        &self,
        class: &ClassInfo<'a>,
        lookup: impl Fn(&ClassInfo<'a>) -> Option<T>,
    ) -> Option<T> {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<&ClassInfo<'a>> = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.node_id) {
                continue;
            }
            if let Some(found) = lookup(current) {
                return Some(found);
            }
            queue.extend(current.heritage.iter().filter_map(|h| self.class_named(h)));
        }
        None
    }

    fn method_return(&self, class: &ClassInfo<'a>, method: &str) -> Option<Node<'a>> {
        self.find_inherited(class, |c| c.methods.get(method).copied())
    }

    fn infer_call(&self, node: Node<'_>, depth: usize) -> Option<TypeDescriptor> {
        let callee = node.child_by_field_name("function")?;
        match callee.kind() {
            "identifier" => self.infer_function_call(callee, depth),
            "member_expression" => {
                let object = callee.child_by_field_name("object")?;
                let method = self.text(callee.child_by_field_name("property")?);

                if self.is_stream_factory(object) && self.ambient.is_creation_function(method) {
                    return Some(self.stream_type());
                }

                let receiver = self.infer(object, depth + 1)?;
                if let Some(ret) = self
                    .class_named(receiver.name())
                    .and_then(|c| self.method_return(c, method))
                {
                    return self.from_type_node(ret, depth + 1);
                }
                if receiver.is_assignable_to(self.ambient.stream_root()) {
                    return match self.ambient.member_returns.get(method) {
                        Some(Some(ret)) => Some(self.describe(ret)),
                        Some(None) => None,
                        None => Some(self.stream_type()),
                    };
                }
                None
            }
            _ => None,
        }
    }

    fn infer_function_call(&self, callee: Node<'_>, depth: usize) -> Option<TypeDescriptor> {
        let name = self.text(callee);
        if let Some(binding) = self.lookup_binding(name, callee.start_byte()) {
            let Origin::Initialized(value) = binding.origin else {
                return None;
            };
            let ret = value.child_by_field_name("return_type")?;
            return self.from_type_node(ret, depth + 1);
        }
        if let Some(ret) = self.functions.get(name) {
            return self.from_type_node(*ret, depth + 1);
        }
        let import = self.imports.get(name)?;
        (self.ambient.is_library_module(&import.module)
            && self.ambient.is_creation_function(&import.imported))
        .then(|| self.stream_type())
    }

    /// `Observable`, `Rx` (namespace import) or `Rx.Observable` from the library.
    fn is_stream_factory(&self, object: Node<'_>) -> bool {
        match object.kind() {
            "identifier" => self.library_import(self.text(object)).is_some_and(|i| {
                i.imported == "*" || i.imported == self.ambient.stream_root()
            }),
            "member_expression" => {
                let (Some(ns), Some(property)) = (
                    object.child_by_field_name("object"),
                    object.child_by_field_name("property"),
                ) else {
                    return false;
                };
                ns.kind() == "identifier"
                    && self.text(property) == self.ambient.stream_root()
                    && self
                        .library_import(self.text(ns))
                        .is_some_and(|i| i.imported == "*")
            }
            _ => false,
        }
    }

    fn library_import(&self, local: &str) -> Option<&ImportBinding> {
        self.imports
            .get(local)
            .filter(|i| self.ambient.is_library_module(&i.module))
    }
}

impl TypeResolver for SourceTypeChecker<'_> {
    fn resolve_type(&self, expr: Node<'_>) -> Option<TypeDescriptor> {
        self.infer(expr, 0)
    }
}

impl std::fmt::Debug for SourceTypeChecker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTypeChecker")
            .field("bindings", &self.bindings.len())
            .field("imports", &self.imports.len())
            .field("classes", &self.classes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Dialect;

    /// Resolves the receiver of the `index`-th `.{method}(` call in `src`.
    fn receiver_type(src: &str, method: &str, index: usize) -> Option<TypeDescriptor> {
        let file = SourceFile::parse(src, Dialect::TypeScript).expect("parse");
        let ambient = AmbientTypes::rxjs();
        let checker = SourceTypeChecker::new(&file, &ambient);

        let mut receivers = Vec::new();
        let mut cursor = file.root().walk();
        let mut stack = vec![file.root()];
        while let Some(node) = stack.pop() {
            if node.kind() == "call_expression" {
                if let Some(callee) = node.child_by_field_name("function") {
                    if callee.kind() == "member_expression"
                        && callee
                            .child_by_field_name("property")
                            .is_some_and(|p| file.node_text(p) == method)
                    {
                        receivers.push(callee.child_by_field_name("object").expect("object"));
                    }
                }
            }
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        receivers.sort_by_key(|n| n.start_byte());
        let receiver = receivers.get(index).copied().expect("call not found");
        checker.resolve_type(receiver)
    }

    fn is_stream(src: &str, method: &str) -> bool {
        receiver_type(src, method, 0).is_some_and(|t| t.is_assignable_to("Observable"))
    }

    #[test]
    fn descriptor_assignability() {
        let t = TypeDescriptor::new("BehaviorSubject")
            .with_supertypes(vec!["Subject".into(), "Observable".into()]);
        assert!(t.is_assignable_to("BehaviorSubject"));
        assert!(t.is_assignable_to("Observable"));
        assert!(!t.is_assignable_to("Promise"));
    }

    #[test]
    fn library_module_matching() {
        let ambient = AmbientTypes::rxjs();
        assert!(ambient.is_library_module("rxjs"));
        assert!(ambient.is_library_module("rxjs/operators"));
        assert!(ambient.is_library_module("@acutmore/rxjs"));
        assert!(ambient.is_library_module("@acutmore/rxjs/add/operator/map"));
        assert!(!ambient.is_library_module("rxjs-compat-shim"));
        assert!(!ambient.is_library_module("lodash"));
    }

    #[test]
    fn annotated_variable() {
        assert!(is_stream(
            "declare const src: Observable<number>;\nsrc.map(x => x);\n",
            "map"
        ));
        assert!(is_stream(
            "let src: Observable<number> = getIt();\nsrc.map(x => x);\n",
            "map"
        ));
    }

    #[test]
    fn annotated_parameter() {
        assert!(is_stream(
            "function f(source: Observable<string>) {\n  return source.filter(Boolean);\n}\n",
            "filter"
        ));
    }

    #[test]
    fn untyped_parameter_is_unknown() {
        assert!(receiver_type("function f(source) { return source.map(x => x); }\n", "map", 0)
            .is_none());
        assert!(receiver_type("const f = source => source.map(x => x);\n", "map", 0).is_none());
    }

    #[test]
    fn array_literal_is_not_a_stream() {
        let t = receiver_type("const someObj = [1, 2, 3];\nsomeObj.filter(x => x > 1);\n", "filter", 0)
            .expect("array type");
        assert_eq!(t.name(), "Array");
        assert!(!t.is_assignable_to("Observable"));
    }

    #[test]
    fn any_is_unknown() {
        assert!(receiver_type("let x: any;\nx.map(y => y);\n", "map", 0).is_none());
    }

    #[test]
    fn subject_hierarchy_from_new_expression() {
        let t = receiver_type("const s = new BehaviorSubject<number>(0);\ns.map(x => x);\n", "map", 0)
            .expect("type");
        assert_eq!(t.name(), "BehaviorSubject");
        assert_eq!(t.supertypes(), ["Subject".to_string(), "Observable".to_string()]);
    }

    #[test]
    fn creation_function_imported_from_library() {
        assert!(is_stream(
            "import { of } from 'rxjs';\nconst a = of(1, 2);\na.map(x => x);\n",
            "map"
        ));
        // A local `of` is not the library's.
        assert!(!is_stream(
            "import { of } from './utils';\nconst a = of(1, 2);\na.map(x => x);\n",
            "map"
        ));
    }

    #[test]
    fn static_creation_on_observable_class() {
        assert!(is_stream(
            "import { Observable } from 'rxjs/Observable';\nObservable.of(1).map(x => x);\n",
            "map"
        ));
        assert!(is_stream(
            "import * as Rx from 'rxjs';\nRx.Observable.from([1]).map(x => x);\n",
            "map"
        ));
    }

    #[test]
    fn library_constants() {
        assert!(is_stream("import { EMPTY } from 'rxjs';\nEMPTY.map(x => x);\n", "map"));
    }

    #[test]
    fn chained_operator_calls_stay_streams() {
        let src = "declare const src: Observable<number>;\nsrc.map(x => x).filter(x => x > 0);\n";
        assert!(is_stream(src, "filter"));
    }

    #[test]
    fn subscribe_result_is_not_a_stream() {
        let src = "declare const src: Observable<number>;\nconst sub = src.subscribe();\nsub.add(() => {});\n";
        let t = receiver_type(src, "add", 0).expect("type");
        assert_eq!(t.name(), "Subscription");
        assert!(!t.is_assignable_to("Observable"));
    }

    #[test]
    fn class_fields_through_this() {
        let src = r"
class Store {
  private readonly state$: BehaviorSubject<State>;
  private readonly destroy$ = new Subject<void>();
  constructor(private readonly events$: Observable<Event>) {}
  run() {
    this.state$.map(s => s);
    this.destroy$.map(s => s);
    this.events$.map(e => e);
  }
}
";
        for i in 0..3 {
            let t = receiver_type(src, "map", i).expect("field type");
            assert!(t.is_assignable_to("Observable"), "call #{i} resolved to {t:?}");
        }
    }

    #[test]
    fn this_inside_nested_function_is_unknown() {
        let src = r"
class Store {
  state$: Observable<number>;
  run() {
    setTimeout(function () { this.state$.map(s => s); });
  }
}
";
        assert!(receiver_type(src, "map", 0).is_none());
    }

    #[test]
    fn local_subclass_of_stream() {
        let src = r"
class Channel<T> extends Subject<T> {}
const ch = new Channel<number>();
ch.map(x => x);
";
        let t = receiver_type(src, "map", 0).expect("type");
        assert_eq!(t.name(), "Channel");
        assert!(t.is_assignable_to("Subject"));
        assert!(t.is_assignable_to("Observable"));
    }

    #[test]
    fn this_inside_stream_subclass() {
        let src = r"
class Ticker extends Observable<number> {
  doubled() { return this.map(x => x * 2); }
}
";
        assert!(is_stream(src, "map"));
    }

    #[test]
    fn interface_extending_stream() {
        let src = r"
interface Feed extends Observable<string> {}
function f(feed: Feed) { feed.map(x => x); }
";
        assert!(is_stream(src, "map"));
    }

    #[test]
    fn inner_untyped_declaration_shadows_outer() {
        let src = r"
const items: Observable<number> = source;
function f() {
  const items = [1, 2];
  items.map(x => x);
}
";
        let t = receiver_type(src, "map", 0).expect("type");
        assert_eq!(t.name(), "Array");
    }

    #[test]
    fn destructured_binding_shadows_outer() {
        let src = r"
const items: Observable<number> = source;
function f(opts) {
  const { items } = opts;
  items.map(x => x);
}
";
        assert!(receiver_type(src, "map", 0).is_none());
    }

    #[test]
    fn optional_union_uses_the_non_null_member() {
        assert!(is_stream(
            "let src: Observable<number> | undefined;\nsrc!.map(x => x);\n",
            "map"
        ));
        assert!(receiver_type(
            "let src: Observable<number> | number[];\nsrc.map(x => x);\n",
            "map",
            0
        )
        .is_none());
    }

    #[test]
    fn function_return_types() {
        assert!(is_stream(
            "function load(): Observable<Item[]> { return null!; }\nload().map(x => x);\n",
            "map"
        ));
        assert!(is_stream(
            "const load = (): Observable<Item[]> => null!;\nload().map(x => x);\n",
            "map"
        ));
    }

    #[test]
    fn method_return_types() {
        let src = r"
class Api {
  fetch(): Observable<string> { return null!; }
}
const api = new Api();
api.fetch().map(x => x);
";
        assert!(is_stream(src, "map"));
    }

    #[test]
    fn cast_expression() {
        assert!(is_stream(
            "const a = (getIt() as Observable<number>);\na.map(x => x);\n",
            "map"
        ));
    }

    #[test]
    fn self_referential_initializer_terminates() {
        assert!(receiver_type("let a = b;\nlet b = a;\na.map(x => x);\n", "map", 0).is_none());
    }

    #[test]
    fn cyclic_heritage_terminates() {
        let src = r"
interface A extends B, C {}
interface B extends A, C {}
interface C extends A, B {}
declare const x: A;
x.missing.map(v => v);
";
        assert!(receiver_type(src, "map", 0).is_none());
    }

    #[test]
    fn members_found_through_cyclic_heritage() {
        let src = r"
interface A extends B {}
interface B extends A { feed: Observable<number>; }
declare const x: A;
x.feed.map(v => v);
";
        assert!(is_stream(src, "map"));
    }

    #[test]
    fn local_class_hides_library_type() {
        let subject = r"
class Subject { map(f) { return 1; } }
const s = new Subject();
s.map(x => x);
";
        let t = receiver_type(subject, "map", 0).expect("type");
        assert_eq!(t.name(), "Subject");
        assert!(!t.is_assignable_to("Subject"));
        assert!(!t.is_assignable_to("Observable"));

        let observable = "class Observable { map(f) { return 1; } }\nnew Observable().map(x => x);\n";
        assert!(!is_stream(observable, "map"));

        let subclass = r"
class Subject {}
class Channel extends Subject {}
new Channel().map(x => x);
";
        assert!(!is_stream(subclass, "map"));
    }

    #[test]
    fn relative_modules_are_not_the_library() {
        let ambient = AmbientTypes::rxjs();
        assert!(!ambient.is_library_module("./rxjs"));
        assert!(!ambient.is_library_module("../vendor/rxjs/index"));
        assert!(!ambient.is_library_module("/abs/rxjs"));

        let src = "import { of } from \"./rxjs\";\nof(1).map(x => x);\n";
        assert!(!is_stream(src, "map"));
    }

    #[test]
    fn no_type_info_resolves_nothing() {
        let file = SourceFile::parse("const a = [1];\n", Dialect::TypeScript).expect("parse");
        assert!(NoTypeInfo.resolve_type(file.root()).is_none());
    }
}
