//! Emits a plain-text program in a dynamically-typed scripting target, plus
//! a column-accurate source map (spec §4.8).

use rustc_hash::{FxHashMap, FxHashSet};

use lumina_ir::mir::{AggregateKind, BinOp, Function, Ir, NumCastKind, Program, UnOp};
use lumina_util::{FileId, SourceMap, Span, Symbol};

use crate::error::{Result, ScriptBackendError};
use crate::runtime;
use crate::sourcemap::{Mapping, RawSourceMap};

/// The one-line module preamble the driver's `--target esm|cjs` option
/// selects (spec §4.8: "a one-line preamble... the choice is orthogonal to
/// the rest of emission"). `wasm` routes to `lumina-backend-stack` instead
/// and never reaches this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

impl ModuleFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "esm" => Ok(ModuleFormat::Esm),
            "cjs" => Ok(ModuleFormat::Cjs),
            other => Err(ScriptBackendError::UnsupportedModuleFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub module_format: ModuleFormat,
    /// Name recorded in the source map's `file` field.
    pub output_file: String,
}

pub struct EmitOutput {
    pub code: String,
    pub source_map: RawSourceMap,
}

/// Emits `program` against `source_map` (used to resolve each `Span`'s
/// `FileId` to a file name for the source map's `sources` list).
pub fn emit_program(program: &Program, source_map: &SourceMap, opts: &EmitOptions) -> Result<EmitOutput> {
    let captures_by_function = collect_closure_captures(program);
    let mut emitter = Emitter::new(source_map);

    emitter.write_raw(runtime::prelude());
    emitter.write_raw("\n");

    for function in &program.functions {
        emitter.emit_function(function, captures_by_function.get(&function.name))?;
        emitter.write_raw("\n");
    }

    let exported: Vec<&str> = program
        .functions
        .iter()
        .filter(|f| f.exported)
        .map(|f| f.name.as_str())
        .collect();
    emitter.write_raw(&module_preamble(opts.module_format, &exported));
    emitter.write_raw("\n");

    Ok(EmitOutput {
        code: emitter.out,
        source_map: RawSourceMap::build(&opts.output_file, emitter.source_names, &emitter.mappings),
    })
}

fn module_preamble(format: ModuleFormat, exported: &[&str]) -> String {
    match format {
        ModuleFormat::Esm => format!("export {{ {} }};", exported.join(", ")),
        ModuleFormat::Cjs => {
            let bindings: Vec<String> = exported.iter().map(|n| format!("{n}: {n}")).collect();
            format!("module.exports = {{ {} }};", bindings.join(", "))
        }
    }
}

/// Walks every function body in `program`, recording the capture list of
/// every `Closure` node keyed by the synthesized lambda function it names.
/// Lowering (`lumina-ir::lower::hir_to_mir::lower_lambda`) records what a
/// lambda captures but leaves threading those captures into the target's
/// function-value representation to the back end; this is that threading:
/// a lambda's synthesized top-level function gets the capture list
/// prepended as leading parameters, and the `Closure` node that references
/// it partially applies them with the host's native `Function.prototype.bind`
/// rather than an invented runtime helper.
fn collect_closure_captures(program: &Program) -> FxHashMap<Symbol, Vec<Symbol>> {
    let mut out = FxHashMap::default();
    for function in &program.functions {
        walk_stmt_list(&function.body, &mut |ir| {
            if let Ir::Closure { function, captures, .. } = ir {
                out.insert(*function, captures.clone());
            }
        });
    }
    out
}

/// Pre-pass mirroring `lumina-backend-stack`'s `collect_locals`: finds every
/// name bound by `Ir::Let` anywhere in a function's body, including inside
/// nested `If`/`Loop`/`Block` branches. `Ir::Let` is emitted as a JS `let` at
/// its binding site (`emit_stmt`), which is block-scoped; a phi operand bound
/// inside an `if`/`else` branch is then invisible to the `Ir::Phi` ternary
/// emitted after the branch closes. Declaring every such name once at the
/// function's top scope and emitting `Ir::Let` as a plain assignment
/// everywhere else keeps the binding alive across the whole function, the
/// same way `collect_locals` hoists every WASM local into the function
/// prologue regardless of which branch first assigns it.
fn collect_let_names(body: &[Ir], names: &mut FxHashSet<Symbol>) {
    for ir in body {
        if let Ir::Let { name, .. } = ir {
            names.insert(*name);
        }
        for block in ir.blocks() {
            collect_let_names(block, names);
        }
    }
}

fn sorted_let_names(names: &FxHashSet<Symbol>) -> Vec<Symbol> {
    let mut v: Vec<Symbol> = names.iter().copied().collect();
    v.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    v
}

fn walk_stmt_list(body: &[Ir], f: &mut impl FnMut(&Ir)) {
    for ir in body {
        walk_ir(ir, f);
    }
}

fn walk_ir(ir: &Ir, f: &mut impl FnMut(&Ir)) {
    f(ir);
    for child in ir.children() {
        walk_ir(child, f);
    }
    for block in ir.blocks() {
        walk_stmt_list(block, f);
    }
}

struct Emitter<'a> {
    source_map: &'a SourceMap,
    out: String,
    line: u32,
    col: u32,
    mappings: Vec<Mapping>,
    source_names: Vec<String>,
    file_index: FxHashMap<FileId, u32>,
}

impl<'a> Emitter<'a> {
    fn new(source_map: &'a SourceMap) -> Self {
        Emitter {
            source_map,
            out: String::new(),
            line: 0,
            col: 0,
            mappings: Vec::new(),
            source_names: Vec::new(),
            file_index: FxHashMap::default(),
        }
    }

    fn write_raw(&mut self, s: &str) {
        for ch in s.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.out.push_str(s);
    }

    fn write_indent(&mut self, depth: usize) {
        self.write_raw(&"  ".repeat(depth));
    }

    fn file_index_of(&mut self, file_id: FileId) -> u32 {
        if let Some(idx) = self.file_index.get(&file_id) {
            return *idx;
        }
        let name = self
            .source_map
            .get(file_id)
            .map(|f| f.name().to_string())
            .unwrap_or_else(|| format!("<unknown file {}>", file_id.index()));
        let idx = self.source_names.len() as u32;
        self.source_names.push(name);
        self.file_index.insert(file_id, idx);
        idx
    }

    fn record_mapping(&mut self, span: Span) {
        let source_file = self.file_index_of(span.file_id);
        self.mappings.push(Mapping {
            generated_line: self.line,
            generated_col: self.col,
            source_file,
            original_line: span.line,
            original_col: span.column,
        });
    }

    fn emit_function(&mut self, function: &Function, captures: Option<&Vec<Symbol>>) -> Result<()> {
        self.record_mapping(function.span);
        let mut params: Vec<&str> = Vec::new();
        if let Some(caps) = captures {
            params.extend(caps.iter().map(|s| s.as_str()));
        }
        params.extend(function.params.iter().map(|s| s.as_str()));

        self.write_raw(&format!("function {}({}) {{\n", function.name.as_str(), params.join(", ")));

        let mut let_names = FxHashSet::default();
        collect_let_names(&function.body, &mut let_names);
        let let_names = sorted_let_names(&let_names);
        if !let_names.is_empty() {
            let decls: Vec<&str> = let_names.iter().map(|s| s.as_str()).collect();
            self.write_indent(1);
            self.write_raw(&format!("let {};\n", decls.join(", ")));
        }

        self.emit_stmt_list(&function.body, 1)?;
        self.write_raw("}\n");
        Ok(())
    }

    fn emit_stmt_list(&mut self, body: &[Ir], depth: usize) -> Result<()> {
        for ir in body {
            self.emit_stmt(ir, depth)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, ir: &Ir, depth: usize) -> Result<()> {
        self.record_mapping(ir.span());
        self.write_indent(depth);
        match ir {
            Ir::Let { name, value, .. } => {
                // Declared up front in the function prologue (see
                // `collect_let_names`), so binding here is a plain
                // assignment, not a block-scoped `let`.
                self.write_raw(&format!("{} = ", name.as_str()));
                self.emit_expr(value)?;
                self.write_raw(";\n");
            }
            Ir::Assign { name, value, .. } => {
                self.write_raw(&format!("{} = ", name.as_str()));
                self.emit_expr(value)?;
                self.write_raw(";\n");
            }
            Ir::If { cond, then_branch, else_branch, .. } => {
                self.write_raw("if (");
                self.emit_expr(cond)?;
                self.write_raw(") {\n");
                self.emit_stmt_list(then_branch, depth + 1)?;
                self.write_indent(depth);
                if else_branch.is_empty() {
                    self.write_raw("}\n");
                } else {
                    self.write_raw("} else {\n");
                    self.emit_stmt_list(else_branch, depth + 1)?;
                    self.write_indent(depth);
                    self.write_raw("}\n");
                }
            }
            Ir::Loop { body, .. } => {
                self.write_raw("while (true) {\n");
                self.emit_stmt_list(body, depth + 1)?;
                self.write_indent(depth);
                self.write_raw("}\n");
            }
            Ir::Break { .. } => self.write_raw("break;\n"),
            Ir::Continue { .. } => self.write_raw("continue;\n"),
            Ir::Return { value, .. } => {
                self.write_raw("return");
                if let Some(v) = value {
                    self.write_raw(" ");
                    self.emit_expr(v)?;
                }
                self.write_raw(";\n");
            }
            Ir::Store { place, value, .. } => {
                self.emit_expr(place)?;
                self.write_raw(" = ");
                self.emit_expr(value)?;
                self.write_raw(";\n");
            }
            Ir::Block { body, .. } => {
                self.write_raw("{\n");
                self.emit_stmt_list(body, depth + 1)?;
                self.write_indent(depth);
                self.write_raw("}\n");
            }
            other => {
                self.emit_expr(other)?;
                self.write_raw(";\n");
            }
        }
        Ok(())
    }

    fn emit_expr(&mut self, ir: &Ir) -> Result<()> {
        self.record_mapping(ir.span());
        match ir {
            Ir::Phi { condition, then_value, else_value, .. } => {
                self.write_raw("(");
                self.emit_expr(condition)?;
                self.write_raw(" ? ");
                self.emit_expr(then_value)?;
                self.write_raw(" : ");
                self.emit_expr(else_value)?;
                self.write_raw(")");
            }
            Ir::Binary { op, left, right, .. } => {
                self.write_raw("(");
                self.emit_expr(left)?;
                self.write_raw(&format!(" {} ", binop_str(*op)));
                self.emit_expr(right)?;
                self.write_raw(")");
            }
            Ir::Unary { op, operand, .. } => {
                self.write_raw(unop_str(*op));
                self.emit_expr(operand)?;
            }
            Ir::Call { callee, args, .. } => {
                self.write_raw(callee.as_str());
                self.write_raw("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.write_raw(", ");
                    }
                    self.emit_expr(arg)?;
                }
                self.write_raw(")");
            }
            Ir::Member { object, field, .. } => {
                self.emit_expr(object)?;
                self.write_raw(&format!(".{}", field.as_str()));
            }
            Ir::Tag { object, .. } => {
                self.emit_expr(object)?;
                self.write_raw(".__tag");
            }
            Ir::Index { object, index, .. } => {
                self.emit_expr(object)?;
                self.write_raw("[");
                self.emit_expr(index)?;
                self.write_raw("]");
            }
            Ir::Ident { name, .. } => self.write_raw(name.as_str()),
            Ir::Number { value, .. } => self.write_raw(&format!("{value}")),
            Ir::Int { value, .. } => self.write_raw(&format!("{value}")),
            Ir::Str { value, .. } => self.emit_string_literal(value.as_str()),
            Ir::Bool { value, .. } => self.write_raw(if *value { "true" } else { "false" }),
            Ir::Unit { .. } => self.write_raw("undefined"),
            Ir::Aggregate { kind, fields, .. } => self.emit_aggregate(kind, fields)?,
            Ir::Cast { value, kind, .. } => self.emit_cast(value, *kind)?,
            Ir::Closure { function, captures, .. } => {
                if captures.is_empty() {
                    self.write_raw(function.as_str());
                } else {
                    let caps = captures.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
                    self.write_raw(&format!("{}.bind(null, {})", function.as_str(), caps));
                }
            }
            Ir::Let { .. }
            | Ir::Assign { .. }
            | Ir::If { .. }
            | Ir::Loop { .. }
            | Ir::Break { .. }
            | Ir::Continue { .. }
            | Ir::Return { .. }
            | Ir::Block { .. } => {
                return Err(ScriptBackendError::MalformedIr(
                    "statement-only IR node found in expression position",
                ));
            }
        }
        Ok(())
    }

    fn emit_aggregate(&mut self, kind: &AggregateKind, fields: &[Ir]) -> Result<()> {
        match kind {
            AggregateKind::Tuple | AggregateKind::Array => {
                self.write_raw("[");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write_raw(", ");
                    }
                    self.emit_expr(f)?;
                }
                self.write_raw("]");
            }
            AggregateKind::Struct(_) => {
                self.write_raw("{ ");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write_raw(", ");
                    }
                    self.write_raw(&format!("_{i}: "));
                    self.emit_expr(f)?;
                }
                self.write_raw(" }");
            }
            AggregateKind::EnumVariant(_, _, discriminant) => {
                self.write_raw(&format!("{{ __tag: {discriminant}"));
                for (i, f) in fields.iter().enumerate() {
                    self.write_raw(&format!(", _{i}: "));
                    self.emit_expr(f)?;
                }
                self.write_raw(" }");
            }
        }
        Ok(())
    }

    /// Casts lower to native scripting-target numeric coercions rather than
    /// a runtime helper: the target's numbers are IEEE-754 doubles
    /// throughout, so `IntToFloat`/`FloatToFloat` are identities and only
    /// the int-narrowing casts need an explicit operation.
    fn emit_cast(&mut self, value: &Ir, kind: NumCastKind) -> Result<()> {
        match kind {
            NumCastKind::IntToFloat | NumCastKind::FloatToFloat => self.emit_expr(value),
            NumCastKind::IntToInt => {
                self.write_raw("(");
                self.emit_expr(value)?;
                self.write_raw(" | 0)");
                Ok(())
            }
            NumCastKind::FloatToInt => {
                self.write_raw("Math.trunc(");
                self.emit_expr(value)?;
                self.write_raw(")");
                Ok(())
            }
        }
    }

    /// Escapes a string literal so that real newlines in the source text
    /// become the two-character escape `\n` in generated output: the
    /// generated-line counter only advances on a literal newline character
    /// in the emitted stream (spec §4.8), so an escaped one must never
    /// reach `write_raw` as `\n`.
    fn emit_string_literal(&mut self, s: &str) {
        let mut escaped = String::with_capacity(s.len() + 2);
        escaped.push('"');
        for ch in s.chars() {
            match ch {
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                other => escaped.push(other),
            }
        }
        escaped.push('"');
        self.write_raw(&escaped);
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "===",
        BinOp::Ne => "!==",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
    }
}

fn unop_str(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::Not => "!",
        UnOp::BitNot => "~",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_util::Span;

    fn dummy_span() -> Span {
        Span::new(0, 0, 1, 1)
    }

    fn leaf(name: &str) -> Ir {
        Ir::Ident { name: Symbol::intern(name), span: dummy_span() }
    }

    fn sample_function(name: &str, exported: bool) -> Function {
        Function {
            name: Symbol::intern(name),
            params: vec![Symbol::intern("x")],
            body: vec![Ir::Return {
                value: Some(Box::new(Ir::Binary {
                    op: BinOp::Add,
                    left: Box::new(leaf("x")),
                    right: Box::new(Ir::Int { value: 1, span: dummy_span() }),
                    span: dummy_span(),
                })),
                span: dummy_span(),
            }],
            exported,
            span: dummy_span(),
        }
    }

    #[test]
    fn a_simple_function_emits_a_function_declaration_and_a_return() {
        let program = Program { functions: vec![sample_function("main", true)] };
        let source_map = SourceMap::new();
        let opts = EmitOptions { module_format: ModuleFormat::Esm, output_file: "out.js".to_string() };
        let output = emit_program(&program, &source_map, &opts).unwrap();
        assert!(output.code.contains("function main(x) {"));
        assert!(output.code.contains("return (x + 1);"));
        assert!(output.code.contains("export { main };"));
    }

    #[test]
    fn cjs_module_format_assigns_module_exports() {
        let program = Program { functions: vec![sample_function("main", true)] };
        let source_map = SourceMap::new();
        let opts = EmitOptions { module_format: ModuleFormat::Cjs, output_file: "out.js".to_string() };
        let output = emit_program(&program, &source_map, &opts).unwrap();
        assert!(output.code.contains("module.exports = { main: main };"));
    }

    #[test]
    fn a_closure_with_captures_binds_them_and_the_function_gains_leading_params() {
        let lambda = Function {
            name: Symbol::intern("lambda_0"),
            params: vec![Symbol::intern("y")],
            body: vec![Ir::Return {
                value: Some(Box::new(Ir::Binary {
                    op: BinOp::Add,
                    left: Box::new(leaf("captured_1")),
                    right: Box::new(leaf("y")),
                    span: dummy_span(),
                })),
                span: dummy_span(),
            }],
            exported: false,
            span: dummy_span(),
        };
        let main = Function {
            name: Symbol::intern("main"),
            params: vec![],
            body: vec![Ir::Let {
                name: Symbol::intern("f"),
                value: Box::new(Ir::Closure {
                    function: Symbol::intern("lambda_0"),
                    captures: vec![Symbol::intern("captured_1")],
                    span: dummy_span(),
                }),
                span: dummy_span(),
            }],
            exported: true,
            span: dummy_span(),
        };
        let program = Program { functions: vec![lambda, main] };
        let source_map = SourceMap::new();
        let opts = EmitOptions { module_format: ModuleFormat::Esm, output_file: "out.js".to_string() };
        let output = emit_program(&program, &source_map, &opts).unwrap();
        assert!(output.code.contains("function lambda_0(captured_1, y) {"));
        assert!(output.code.contains("let f;\n"));
        assert!(output.code.contains("f = lambda_0.bind(null, captured_1);"));
    }

    #[test]
    fn a_let_bound_phi_operand_inside_an_if_branch_is_hoisted_to_function_scope() {
        let cond_name = Symbol::intern("if_cond");
        let then_name = Symbol::intern("if_then_1");
        let else_name = Symbol::intern("if_else_1");
        let result_name = Symbol::intern("if_result_1");
        let function = Function {
            name: Symbol::intern("main"),
            params: vec![],
            body: vec![
                Ir::Let {
                    name: cond_name,
                    value: Box::new(Ir::Bool { value: true, span: dummy_span() }),
                    span: dummy_span(),
                },
                Ir::If {
                    cond: Box::new(leaf("if_cond")),
                    then_branch: vec![Ir::Let {
                        name: then_name,
                        value: Box::new(Ir::Int { value: 1, span: dummy_span() }),
                        span: dummy_span(),
                    }],
                    else_branch: vec![Ir::Let {
                        name: else_name,
                        value: Box::new(Ir::Int { value: 2, span: dummy_span() }),
                        span: dummy_span(),
                    }],
                    span: dummy_span(),
                },
                Ir::Let {
                    name: result_name,
                    value: Box::new(Ir::Phi {
                        condition: Box::new(leaf("if_cond")),
                        then_value: Box::new(leaf("if_then_1")),
                        else_value: Box::new(leaf("if_else_1")),
                        span: dummy_span(),
                    }),
                    span: dummy_span(),
                },
                Ir::Return { value: Some(Box::new(leaf("if_result_1"))), span: dummy_span() },
            ],
            exported: true,
            span: dummy_span(),
        };
        let program = Program { functions: vec![function] };
        let source_map = SourceMap::new();
        let opts = EmitOptions { module_format: ModuleFormat::Esm, output_file: "out.js".to_string() };
        let output = emit_program(&program, &source_map, &opts).unwrap();
        // All four phi-machinery names are declared once at function scope,
        // before the `if` that conditionally assigns them.
        assert!(output.code.contains("let if_cond, if_else_1, if_result_1, if_then_1;\n"));
        // Branch bodies assign, they do not re-declare with `let`.
        assert!(output.code.contains("if_then_1 = 1;"));
        assert!(output.code.contains("if_else_1 = 2;"));
        assert!(!output.code.contains("let if_then_1"));
        assert!(!output.code.contains("let if_else_1"));
        // The merge point can read both names after the `if` block closes.
        assert!(output.code.contains("if_result_1 = (if_cond ? if_then_1 : if_else_1);"));
    }

    #[test]
    fn a_string_literal_with_a_real_newline_is_escaped_not_emitted_literally() {
        let program = Program {
            functions: vec![Function {
                name: Symbol::intern("main"),
                params: vec![],
                body: vec![Ir::Return {
                    value: Some(Box::new(Ir::Str { value: Symbol::intern("a\nb"), span: dummy_span() })),
                    span: dummy_span(),
                }],
                exported: true,
                span: dummy_span(),
            }],
        };
        let source_map = SourceMap::new();
        let opts = EmitOptions { module_format: ModuleFormat::Esm, output_file: "out.js".to_string() };
        let output = emit_program(&program, &source_map, &opts).unwrap();
        assert!(output.code.contains("\"a\\nb\""));
    }

    #[test]
    fn two_nodes_on_the_same_generated_line_from_distinct_source_columns_get_distinct_mappings() {
        let span_a = Span::new(0, 1, 3, 5);
        let span_b = Span::new(2, 3, 3, 9);
        let program = Program {
            functions: vec![Function {
                name: Symbol::intern("main"),
                params: vec![],
                body: vec![Ir::Return {
                    value: Some(Box::new(Ir::Binary {
                        op: BinOp::Add,
                        left: Box::new(Ir::Int { value: 1, span: span_a }),
                        right: Box::new(Ir::Int { value: 2, span: span_b }),
                        span: span_a,
                    })),
                    span: span_a,
                }],
                exported: false,
                span: dummy_span(),
            }],
        };
        let source_map = SourceMap::new();
        let opts = EmitOptions { module_format: ModuleFormat::Esm, output_file: "out.js".to_string() };
        let output = emit_program(&program, &source_map, &opts).unwrap();
        // Both `Int` literals are written on the same generated line; their
        // distinct source columns (5 and 9) must produce distinct segments.
        let segments: Vec<&str> = output.source_map.mappings.split(',').collect();
        assert!(segments.len() >= 2);
        assert_ne!(segments[segments.len() - 2], segments[segments.len() - 1]);
    }
}
