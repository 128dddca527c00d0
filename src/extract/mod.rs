//! Metadata extraction from setup scripts
//!
//! A small symbolic interpreter over the parsed script. It records top-level
//! literal assignments, finds the single `setup()` call (at top level or under
//! the `__main__` guard) and resolves its keyword arguments into
//! [`PackageMetadata`]. Nothing is executed; anything beyond literals, names
//! and simple concatenation is rejected with the offending argument named.

use crate::error::{
    BabelResult, ExtractError, ExtractErrorKind, ParseError, ParseErrorKind, Warning,
};
use crate::metadata::{FieldValue, PackageMetadata};
use crate::position::{Position, Span};
use indexmap::IndexMap;
use rustpython_parser::{ast, Parse};
use tracing::debug;

pub mod symbol_table;

pub use symbol_table::{Binding, Failure, SymbolTable};

/// Modules whose `setup` attribute is the configuration function
const SETUP_MODULES: [&str; 2] = ["setuptools", "distutils.core"];

/// Source path reported by the Python parser
const SCRIPT_PATH: &str = "<setup script>";

/// Result of a successful extraction
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub metadata: PackageMetadata,
    pub warnings: Vec<Warning>,
}

/// Parse a setup script and extract its package metadata
pub fn extract(source: &str) -> BabelResult<Extraction> {
    let suite = ast::Suite::parse(source, SCRIPT_PATH).map_err(|error| syntax_error(source, &error))?;
    Ok(ScriptExtractor::new(source).extract_suite(&suite)?)
}

fn syntax_error(source: &str, error: &rustpython_parser::ParseError) -> ParseError {
    ParseError {
        span: Span::single(Position::from_offset(source, usize::from(error.offset))),
        kind: ParseErrorKind::InvalidSyntax {
            message: error.error.to_string(),
        },
    }
}

/// Span of the byte range `start..end` in `source`
fn span_between(source: &str, start: impl Into<usize>, end: impl Into<usize>) -> Span {
    Span::new(
        Position::from_offset(source, start.into()),
        Position::from_offset(source, end.into()),
    )
}

/// Metadata field a keyword argument maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Version,
    Author,
    InstallRequires,
    SetupRequires,
    Extras,
    EntryPoints,
}

impl Field {
    /// Look up the field for a `setup()` keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "name" | "package_name" => Some(Field::Name),
            "version" => Some(Field::Version),
            "author" => Some(Field::Author),
            "install_requires" => Some(Field::InstallRequires),
            "setup_requires" => Some(Field::SetupRequires),
            "extras_require" | "extra_requires" => Some(Field::Extras),
            "entry_points" => Some(Field::EntryPoints),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Version => "version",
            Field::Author => "author",
            Field::InstallRequires => "install_requires",
            Field::SetupRequires => "setup_requires",
            Field::Extras => "extras",
            Field::EntryPoints => "entry_points",
        }
    }
}

/// A `setup()` call found while walking the script, with the bindings
/// visible at that point
#[derive(Debug, Clone)]
struct Candidate<'a> {
    call: &'a ast::ExprCall,
    span: Span,
    symbols: SymbolTable,
}

/// Walks a parsed script, building the symbol table and collecting setup calls
pub struct ScriptExtractor<'a> {
    source: &'a str,
    symbols: SymbolTable,
    candidates: Vec<Candidate<'a>>,
}

impl<'a> ScriptExtractor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            symbols: SymbolTable::new(),
            candidates: Vec::new(),
        }
    }

    /// Extract metadata from the statements parsed out of `source`
    pub fn extract_suite(mut self, suite: &'a [ast::Stmt]) -> Result<Extraction, ExtractError> {
        self.walk(suite, false);

        match self.candidates.len() {
            0 => Err(ExtractError {
                span: None,
                kind: ExtractErrorKind::NoConfigurationCallFound,
            }),
            1 => {
                let candidate = self.candidates.remove(0);
                evaluate_call(&candidate, self.source)
            }
            count => Err(ExtractError {
                span: Some(self.candidates[1].span),
                kind: ExtractErrorKind::AmbiguousConfigurationCall { count },
            }),
        }
    }

    fn walk(&mut self, statements: &'a [ast::Stmt], guarded: bool) {
        for statement in statements {
            match statement {
                ast::Stmt::Import(import) => {
                    for alias in &import.names {
                        let module = alias.name.as_str();
                        if SETUP_MODULES.contains(&module) {
                            if let Some(asname) = &alias.asname {
                                self.symbols.bind(asname.as_str(), Binding::SetupModule);
                            }
                        } else {
                            let bound = match &alias.asname {
                                Some(asname) => asname.as_str(),
                                None => module.split('.').next().unwrap_or(module),
                            };
                            let failure =
                                Failure::unsupported(format!("imported module `{}`", module));
                            self.symbols.bind(bound, Binding::Failed(failure));
                        }
                    }
                }
                ast::Stmt::ImportFrom(import) => {
                    let module = import.module.as_ref().map_or("", |module| module.as_str());
                    let from_setup_module = SETUP_MODULES.contains(&module);
                    for alias in &import.names {
                        let name = alias.name.as_str();
                        let bound = alias.asname.as_ref().map_or(name, |asname| asname.as_str());
                        if from_setup_module && (name == "setup" || name == "*") {
                            let bound = if name == "*" { "setup" } else { bound };
                            self.symbols.bind(bound, Binding::SetupFunction);
                        } else if name != "*" {
                            let failure =
                                Failure::unsupported(format!("name imported from `{}`", module));
                            self.symbols.bind(bound, Binding::Failed(failure));
                        }
                    }
                }
                ast::Stmt::Assign(assign) => {
                    self.record_if_setup(&assign.value, guarded);
                    let binding = self.evaluate_binding(&assign.value);
                    for target in &assign.targets {
                        self.bind_target(target, &binding);
                    }
                }
                ast::Stmt::AnnAssign(assign) => {
                    if let Some(value) = &assign.value {
                        self.record_if_setup(value, guarded);
                        let binding = self.evaluate_binding(value);
                        self.bind_target(&assign.target, &binding);
                    }
                }
                ast::Stmt::If(conditional) => {
                    if !guarded && is_main_guard(&conditional.test) {
                        self.walk(&conditional.body, true);
                        if !conditional.orelse.is_empty() {
                            debug!("ignoring else branch of __main__ guard");
                        }
                    } else {
                        debug!(
                            condition = construct_name(&conditional.test),
                            "ignoring conditional block"
                        );
                    }
                }
                ast::Stmt::Expr(expression) => self.record_if_setup(&expression.value, guarded),
                _ => debug!("skipping statement outside the recognized subset"),
            }
        }
    }

    /// Collect `value` as a candidate if it calls the configuration function
    fn record_if_setup(&mut self, value: &'a ast::Expr, guarded: bool) {
        let ast::Expr::Call(call) = value else {
            return;
        };
        if !self.is_setup_callee(&call.func) {
            return;
        }

        let span = span_between(self.source, call.range.start(), call.range.end());
        debug!(location = %span.start, guarded, "found setup() call");
        self.candidates.push(Candidate {
            call,
            span,
            symbols: self.symbols.clone(),
        });
    }

    fn evaluate_binding(&self, value: &ast::Expr) -> Binding {
        match evaluate(value, &self.symbols, self.source) {
            Ok(value) => Binding::Value(value),
            Err(failure) => Binding::Failed(failure),
        }
    }

    fn bind_target(&mut self, target: &ast::Expr, binding: &Binding) {
        match target {
            ast::Expr::Name(name) => self.symbols.bind(name.id.as_str(), binding.clone()),
            ast::Expr::Tuple(ast::ExprTuple { elts, .. })
            | ast::Expr::List(ast::ExprList { elts, .. }) => {
                for item in elts {
                    self.bind_target(item, &Binding::Failed(Failure::unsupported("tuple unpacking")));
                }
            }
            ast::Expr::Starred(starred) => self.bind_target(&starred.value, binding),
            other => debug!(assignment = construct_name(other), "ignoring assignment target"),
        }
    }

    fn is_setup_callee(&self, func: &ast::Expr) -> bool {
        match func {
            ast::Expr::Name(name) => {
                let name = name.id.as_str();
                name == "setup" || matches!(self.symbols.lookup(name), Some(Binding::SetupFunction))
            }
            ast::Expr::Attribute(attribute) if attribute.attr.as_str() == "setup" => {
                match dotted_name(&attribute.value) {
                    Some(path) => {
                        SETUP_MODULES.contains(&path.as_str())
                            || matches!(self.symbols.lookup(&path), Some(Binding::SetupModule))
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }
}

/// `a.b.c` for a chain of attribute accesses on a name
fn dotted_name(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(name) => Some(name.id.as_str().to_string()),
        ast::Expr::Attribute(attribute) => {
            dotted_name(&attribute.value).map(|base| format!("{}.{}", base, attribute.attr.as_str()))
        }
        _ => None,
    }
}

/// `__name__ == "__main__"`, in either operand order
fn is_main_guard(test: &ast::Expr) -> bool {
    let ast::Expr::Compare(compare) = test else {
        return false;
    };
    if !matches!(compare.ops.as_slice(), [ast::CmpOp::Eq]) {
        return false;
    }

    let operands = (compare.left.as_ref(), compare.comparators.first());
    let (name, value) = match operands {
        (ast::Expr::Name(name), Some(ast::Expr::Constant(value)))
        | (ast::Expr::Constant(value), Some(ast::Expr::Name(name))) => (name, value),
        _ => return false,
    };
    name.id.as_str() == "__name__"
        && matches!(&value.value, ast::Constant::Str(text) if text == "__main__")
}

/// Short description of an expression kind for diagnostics
fn construct_name(expr: &ast::Expr) -> &'static str {
    match expr {
        ast::Expr::BoolOp(_) => "boolean expression",
        ast::Expr::NamedExpr(_) => "assignment expression",
        ast::Expr::BinOp(_) => "arithmetic expression",
        ast::Expr::UnaryOp(_) => "unary expression",
        ast::Expr::Lambda(_) => "lambda",
        ast::Expr::IfExp(_) => "conditional expression",
        ast::Expr::Dict(_) => "dict display",
        ast::Expr::Set(_) => "set display",
        ast::Expr::ListComp(_) => "list comprehension",
        ast::Expr::SetComp(_) => "set comprehension",
        ast::Expr::DictComp(_) => "dict comprehension",
        ast::Expr::GeneratorExp(_) => "generator expression",
        ast::Expr::Await(_) => "await expression",
        ast::Expr::Yield(_) | ast::Expr::YieldFrom(_) => "yield expression",
        ast::Expr::Compare(_) => "comparison",
        ast::Expr::Call(_) => "call",
        ast::Expr::FormattedValue(_) | ast::Expr::JoinedStr(_) => "f-string",
        ast::Expr::Constant(_) => "literal",
        ast::Expr::Attribute(_) => "attribute access",
        ast::Expr::Subscript(_) => "subscript",
        ast::Expr::Starred(_) => "starred expression",
        ast::Expr::Name(_) => "name",
        ast::Expr::List(_) => "list display",
        ast::Expr::Tuple(_) => "tuple display",
        ast::Expr::Slice(_) => "slice",
    }
}

fn operator_symbol(op: &ast::Operator) -> &'static str {
    match op {
        ast::Operator::Add => "+",
        ast::Operator::Sub => "-",
        ast::Operator::Mult => "*",
        ast::Operator::MatMult => "@",
        ast::Operator::Div => "/",
        ast::Operator::Mod => "%",
        ast::Operator::Pow => "**",
        ast::Operator::LShift => "<<",
        ast::Operator::RShift => ">>",
        ast::Operator::BitOr => "|",
        ast::Operator::BitXor => "^",
        ast::Operator::BitAnd => "&",
        ast::Operator::FloorDiv => "//",
    }
}

/// Resolve an expression to a literal value
fn evaluate(expr: &ast::Expr, symbols: &SymbolTable, source: &str) -> Result<FieldValue, Failure> {
    match expr {
        ast::Expr::Constant(constant) => evaluate_constant(constant, source),
        ast::Expr::JoinedStr(fstring) => evaluate_fstring(&fstring.values, symbols, source),
        ast::Expr::BinOp(binary) if binary.op == ast::Operator::Add => {
            let left = evaluate(&binary.left, symbols, source)?;
            let right = evaluate(&binary.right, symbols, source)?;
            match (left, right) {
                (FieldValue::Str(mut left), FieldValue::Str(right)) => {
                    left.push_str(&right);
                    Ok(FieldValue::Str(left))
                }
                (FieldValue::List(mut left), FieldValue::List(right)) => {
                    left.extend(right);
                    Ok(FieldValue::List(left))
                }
                (left, right) => Err(Failure::unsupported(format!(
                    "concatenation of {} and {}",
                    left.kind(),
                    right.kind()
                ))),
            }
        }
        ast::Expr::BinOp(binary) => Err(Failure::unsupported(format!(
            "arithmetic expression `{}`",
            operator_symbol(&binary.op)
        ))),
        ast::Expr::List(ast::ExprList { elts, .. })
        | ast::Expr::Tuple(ast::ExprTuple { elts, .. }) => elts
            .iter()
            .map(|item| match evaluate(item, symbols, source)? {
                FieldValue::Str(value) => Ok(FieldValue::Str(value)),
                other => Err(Failure::unsupported(format!("{} inside a list", other.kind()))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List),
        ast::Expr::Dict(dict) => {
            let mut map = IndexMap::new();
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                let Some(key) = key else {
                    return Err(Failure::unsupported("dict unpacking `**`"));
                };
                let key = match evaluate(key, symbols, source)? {
                    FieldValue::Str(key) => key,
                    other => {
                        return Err(Failure::unsupported(format!(
                            "{} used as dict key",
                            other.kind()
                        )))
                    }
                };
                map.insert(key, evaluate(value, symbols, source)?);
            }
            Ok(FieldValue::Dict(map))
        }
        ast::Expr::Name(name) => {
            let name = name.id.as_str();
            match symbols.lookup(name) {
                Some(Binding::Value(value)) => Ok(value.clone()),
                Some(Binding::Failed(failure)) => Err(failure.clone()),
                Some(Binding::SetupFunction) | Some(Binding::SetupModule) => Err(
                    Failure::unsupported(format!("reference to imported `{}`", name)),
                ),
                None => Err(Failure::Unresolved {
                    name: name.to_string(),
                }),
            }
        }
        other => Err(Failure::unsupported(construct_name(other))),
    }
}

/// Strings and booleans resolve to themselves; numbers keep their source text
fn evaluate_constant(constant: &ast::ExprConstant, source: &str) -> Result<FieldValue, Failure> {
    match &constant.value {
        ast::Constant::Str(value) => Ok(FieldValue::Str(value.clone())),
        ast::Constant::Bool(value) => Ok(FieldValue::Bool(*value)),
        ast::Constant::Int(_) | ast::Constant::Float(_) => {
            let range = usize::from(constant.range.start())..usize::from(constant.range.end());
            source
                .get(range)
                .map(|text| FieldValue::Str(text.to_string()))
                .ok_or_else(|| Failure::unsupported("number"))
        }
        ast::Constant::None => Err(Failure::unsupported("None")),
        ast::Constant::Bytes(_) => Err(Failure::unsupported("bytes literal")),
        _ => Err(Failure::unsupported("literal")),
    }
}

/// F-strings whose fields are bare references to strings are concatenations
fn evaluate_fstring(
    values: &[ast::Expr],
    symbols: &SymbolTable,
    source: &str,
) -> Result<FieldValue, Failure> {
    let mut text = String::new();

    for value in values {
        let formatted = match value {
            ast::Expr::FormattedValue(formatted) => formatted,
            literal => {
                match evaluate(literal, symbols, source)? {
                    FieldValue::Str(literal) => text.push_str(&literal),
                    other => {
                        return Err(Failure::unsupported(format!("f-string containing a {}", other.kind())))
                    }
                }
                continue;
            }
        };

        let conversion = match formatted.conversion {
            ast::ConversionFlag::None => None,
            ast::ConversionFlag::Str => Some('s'),
            ast::ConversionFlag::Ascii => Some('a'),
            ast::ConversionFlag::Repr => Some('r'),
        };
        if let Some(conversion) = conversion {
            return Err(Failure::unsupported(format!(
                "f-string with conversion `!{}`",
                conversion
            )));
        }
        if formatted.format_spec.is_some() {
            return Err(Failure::unsupported("f-string with format spec"));
        }

        match evaluate(&formatted.value, symbols, source)? {
            FieldValue::Str(value) => text.push_str(&value),
            other => {
                return Err(Failure::unsupported(format!(
                    "f-string interpolating a {}",
                    other.kind()
                )))
            }
        }
    }

    Ok(FieldValue::Str(text))
}

/// Resolve the keyword arguments of the one setup() call
fn evaluate_call(candidate: &Candidate<'_>, source: &str) -> Result<Extraction, ExtractError> {
    let mut metadata = PackageMetadata::default();
    let mut warnings = Vec::new();
    let mut seen: IndexMap<Field, String> = IndexMap::new();

    if let Some(argument) = candidate.call.args.first() {
        let error = match argument {
            ast::Expr::Starred(starred) => Failure::unsupported("argument unpacking `*`")
                .into_error(
                    &format!("*{}", dotted_name(&starred.value).unwrap_or_default()),
                    candidate.span,
                ),
            other => Failure::unsupported(construct_name(other))
                .into_error("positional argument 1", candidate.span),
        };
        return Err(error);
    }

    for keyword in &candidate.call.keywords {
        let span = span_between(source, keyword.range.start(), keyword.range.end());
        let Some(name) = &keyword.arg else {
            return Err(Failure::unsupported("keyword argument unpacking `**`").into_error(
                &format!("**{}", dotted_name(&keyword.value).unwrap_or_default()),
                span,
            ));
        };
        let name = name.as_str();

        let Some(field) = Field::from_keyword(name) else {
            match evaluate(&keyword.value, &candidate.symbols, source) {
                Ok(value) => {
                    metadata.unknown_fields.insert(name.to_string(), value);
                }
                Err(failure) => {
                    let reason = failure.into_error(name, span).kind.to_string();
                    let warning = Warning::ArgumentDropped {
                        argument: name.to_string(),
                        reason,
                    };
                    debug!("{}", warning);
                    warnings.push(warning);
                }
            }
            continue;
        };

        if seen.contains_key(&field) {
            return Err(ExtractError {
                span: Some(span),
                kind: ExtractErrorKind::DuplicateField {
                    field: field.name().to_string(),
                    argument: name.to_string(),
                },
            });
        }

        let value = evaluate(&keyword.value, &candidate.symbols, source)
            .map_err(|failure| failure.into_error(name, span))?;
        assign_field(&mut metadata, field, value).map_err(|failure| failure.into_error(name, span))?;
        seen.insert(field, name.to_string());
    }

    Ok(Extraction { metadata, warnings })
}

fn wrong_shape(found: &FieldValue, expected: &str) -> Failure {
    Failure::unsupported(format!("{} where {} is expected", found.kind(), expected))
}

fn assign_field(metadata: &mut PackageMetadata, field: Field, value: FieldValue) -> Result<(), Failure> {
    match field {
        Field::Name | Field::Version | Field::Author => {
            let text = value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| wrong_shape(&value, "a string"))?;
            match field {
                Field::Name => metadata.name = Some(text),
                Field::Version => metadata.version = Some(text),
                _ => metadata.author = Some(text),
            }
        }
        Field::InstallRequires | Field::SetupRequires => {
            let list = value
                .as_string_list()
                .ok_or_else(|| wrong_shape(&value, "a list of strings"))?;
            if field == Field::InstallRequires {
                metadata.install_requires = Some(list);
            } else {
                metadata.setup_requires = Some(list);
            }
        }
        Field::Extras | Field::EntryPoints => {
            let grouped = value
                .as_grouped()
                .ok_or_else(|| wrong_shape(&value, "a dict of string lists"))?;
            if field == Field::Extras {
                metadata.extras = Some(grouped);
            } else {
                metadata.entry_points = Some(grouped);
            }
        }
    }
    Ok(())
}
