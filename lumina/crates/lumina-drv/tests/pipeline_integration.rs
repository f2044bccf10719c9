//! End-to-end pipeline tests: hand-built `ParsedProgram`s run through
//! `check_program`/`compile_program`, mirroring the style `lumina-sem`'s own
//! unit tests use to construct AST fixtures directly (no parser collaborator
//! exists in this workspace - see `lumina_drv::Session`'s doc comment).

use lumina_ast::{
    Block, Expr, ExprKind, FnItem, GenericParam, Item, ItemKind, Literal, NodeId, ParsedProgram,
    Program, Stmt, Type as AstType, Visibility,
};
use lumina_drv::config::{Config, EmitType, Target};
use lumina_drv::pipeline::{check_program, compile_program};
use lumina_util::diagnostic::DiagnosticCode;
use lumina_util::{SourceMap, Span, Symbol};

fn path_type(name: &str) -> AstType {
    AstType::Path(lumina_ast::Path { segments: vec![lumina_ast::PathSegment { ident: Symbol::intern(name), args: None }] })
}

fn return_literal_fn(name: &str, lit: Literal, ret_type: Option<AstType>) -> Item {
    let body = Block {
        id: NodeId(0),
        stmts: Vec::<Stmt>::new(),
        trailing: Some(Box::new(Expr { id: NodeId(0), span: Span::DUMMY, kind: ExprKind::Literal(lit) })),
        span: Span::DUMMY,
    };
    Item {
        id: NodeId(0),
        span: Span::DUMMY,
        kind: ItemKind::Fn(FnItem {
            name: Symbol::intern(name),
            generics: Vec::<GenericParam>::new(),
            params: Vec::new(),
            ret_type,
            body,
            visibility: Visibility::Public,
            async_kw: false,
            where_clause: None,
        }),
    }
}

#[test]
fn checking_a_well_typed_program_reports_no_diagnostics() {
    let program = Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, None)] };
    let result = check_program(&ParsedProgram::Ok(program));
    assert!(!result.has_errors());
    assert!(result.ir.is_none(), "check never reaches IR lowering");
}

#[test]
fn checking_a_badly_typed_program_reports_a_lum_001_diagnostic() {
    let program =
        Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, Some(path_type("bool")))] };
    let result = check_program(&ParsedProgram::Ok(program));
    assert!(result.has_errors());
    assert!(result.diagnostics.iter().any(|d| d.code == Some(DiagnosticCode::LUM_001)));
}

#[test]
fn compiling_a_well_typed_program_gates_never_trip_and_output_is_produced() {
    let program = Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, None)] };
    let config = Config::new(std::path::PathBuf::from("main.lum"));
    let source_map = SourceMap::new();
    let result = compile_program(&ParsedProgram::Ok(program), &source_map, &config).unwrap();
    assert!(!result.has_errors());
    assert!(result.ir.is_some());
    assert!(result.code.is_some());
}

#[test]
fn compiling_a_badly_typed_program_gates_before_monomorphization() {
    let program =
        Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, Some(path_type("bool")))] };
    let config = Config::new(std::path::PathBuf::from("main.lum"));
    let source_map = SourceMap::new();
    let result = compile_program(&ParsedProgram::Ok(program), &source_map, &config).unwrap();
    assert!(result.has_errors());
    assert!(result.ir.is_none(), "the HM gate must stop the pipeline before IR lowering");
}

#[test]
fn requesting_ast_emission_stops_before_monomorphization_even_when_clean() {
    let program = Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, None)] };
    let mut config = Config::new(std::path::PathBuf::from("main.lum"));
    config.emit = EmitType::Ast;
    let source_map = SourceMap::new();
    let result = compile_program(&ParsedProgram::Ok(program), &source_map, &config).unwrap();
    assert!(!result.has_errors());
    assert!(result.ir.is_none());
    assert!(result.code.is_none());
}

#[test]
fn wasm_target_routes_through_the_stack_machine_backend() {
    let program = Program { items: vec![return_literal_fn("main", Literal::Int { value: 1, suffix: None }, None)] };
    let mut config = Config::new(std::path::PathBuf::from("main.lum"));
    config.target = Target::Wasm;
    let source_map = SourceMap::new();
    let result = compile_program(&ParsedProgram::Ok(program), &source_map, &config).unwrap();
    assert!(!result.has_errors());
    assert!(result.code.unwrap().contains("module"));
}

#[test]
fn a_parse_failure_short_circuits_compile_before_hm_inference() {
    let parsed = ParsedProgram::Err(vec![lumina_ast::ParseError { message: "unexpected `}`".into(), span: Span::DUMMY }]);
    let config = Config::new(std::path::PathBuf::from("main.lum"));
    let source_map = SourceMap::new();
    let result = compile_program(&parsed, &source_map, &config).unwrap();
    assert!(result.has_errors());
    assert_eq!(result.diagnostics[0].code, Some(DiagnosticCode::PARSE_ERROR));
}
