//! lumina-drv - Compiler Driver
//!
//! ============================================================================
//! COMPILER DRIVER OVERVIEW
//! ============================================================================
//!
//! The driver is the orchestrator between a parsed program and back-end
//! output. It owns:
//!
//! 1. CONFIGURATION
//!    - `--out`, `--target esm|cjs|wasm`, `--grammar <path>` passthrough
//!    - what to emit (AST / typed / IR / final output)
//!
//! 2. SESSION STATE
//!    - the source map used to resolve wire-format diagnostic locations
//!    - the parsed program, once supplied (see note below)
//!
//! 3. PIPELINE ORCHESTRATION
//!    - run the phases in order, merging each phase's diagnostics
//!    - gate monomorphization/lowering/emission behind a clean HM + semantic
//!      pass (spec §7)
//!
//! 4. ERROR REPORTING
//!    - collect every phase's diagnostics into one vector (spec §7)
//!    - convert to the stable wire format for the CLI collaborator
//!
//! ============================================================================
//! COMPILATION PIPELINE
//! ============================================================================
//!
//! ```text
//! ParsedProgram (external collaborator's output)
//!        │
//!        ▼
//!   [HM Inference]      ──▶ InferResult (independent of Analysis)
//!   [Semantic Analysis] ──▶ AnalyzeResult
//!        │ (gate: any error diagnostic stops here for `compile`)
//!        ▼
//!   [Monomorphization] ──▶ specialized Program
//!        │
//!        ▼
//!   [IR Lowering]    ──▶ lumina_ir::Program
//!   [IR Optimization] (fixed-point pass loop)
//!        │
//!        ▼
//!   [Back-end Emission] ──▶ scripting text + source map, or
//!                           stack-machine S-expression text
//! ```
//!
//! Lexing and parsing are NOT part of this pipeline: spec §1 scopes the
//! surface grammar and tokenizer out as an external collaborator's
//! responsibility. `Session` consumes a [`lumina_ast::ParsedProgram`]
//! supplied by the caller (tests construct one directly; a real CLI build
//! would wire in a parser crate here) rather than reading `.lum` text
//! itself - see [`Session::set_parsed`].
//!
//! ============================================================================
//! CLI SURFACE (spec §6; exposed by the `lumina` binary, not this crate)
//! ============================================================================
//!
//! - `lumina compile <file> [--out <file>] [--target esm|cjs|wasm] [--grammar <path>]`
//! - `lumina check <file>` - parse + both analysis phases, no emission
//! - `lumina watch <file>` - external collaborator responsibility, stubbed
//! - `lumina repl` - orthogonal to the core, stubbed
//!
//! ============================================================================
//! ERROR HANDLING
//! ============================================================================
//!
//! - All errors are collected into a `diagnostics` vector (spec §7).
//! - The only fatal short-circuits: (a) a parse failure aborts before HM;
//!   (b) any error-severity diagnostic after HM + semantic analysis gates
//!   `compile`; (c) `check` always runs both analysis phases regardless of
//!   whether the other already found errors.
//! - Exit codes: 0 success, 1 any error diagnostic. Other codes are
//!   reserved for collaborator tooling, not part of the core contract.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod wire;

pub use config::{Config, EmitType, Target};
pub use error::{LuminaError, Result};
pub use pipeline::{check_program, compile_program, PipelineOutput};
pub use session::Session;
pub use wire::{to_wire, to_wire_json, WireDiagnostic, WireLocation, WirePosition, WireRelated};
