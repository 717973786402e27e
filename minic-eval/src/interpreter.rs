use crate::error::RuntimeError;
use crate::io::Io;
use crate::value::Value;
use minic_parser::ast::{FnDeclaration, Program, Stmt, StmtKind, Type};
use minic_source::Position;
use rustc_hash::FxHashMap;

mod builtins;
mod expr;

/// Maximum number of nested calls, `main` included.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;
/// Digits printed after the decimal point by `printFloat`.
pub const DEFAULT_FLOAT_PRECISION: usize = 6;

/// Remaining host stack below which evaluation moves to a new segment.
const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each host stack segment allocated by [`grow_stack`].
const STACK_SEGMENT: usize = 1024 * 1024;

/// Evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub max_call_depth: usize,
    pub float_precision: usize,
    /// Print every call and return to stderr.
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            float_precision: DEFAULT_FLOAT_PRECISION,
            trace: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    ty: Type,
    value: Value,
}

/// A single lexical scope.
#[derive(Debug, Default)]
struct Scope {
    bindings: FxHashMap<String, Binding>,
}

impl Scope {
    /// Returns `false` if `ident` is already declared in this scope.
    fn declare(&mut self, ident: &str, ty: Type, value: Value) -> bool {
        if self.bindings.contains_key(ident) {
            return false;
        }
        self.bindings.insert(ident.to_string(), Binding { ty, value });
        true
    }

    fn get(&self, ident: &str) -> Option<&Binding> {
        self.bindings.get(ident)
    }

    fn get_mut(&mut self, ident: &str) -> Option<&mut Binding> {
        self.bindings.get_mut(ident)
    }
}

struct CallFrame<'a> {
    ident: &'a str,
    return_ty: Type,
    /// Innermost scope last. The first scope holds the parameters.
    scopes: Vec<Scope>,
    return_value: Option<Value>,
}

/// What a statement asks its enclosing block to do next.
pub(crate) enum Flow {
    Next,
    Return,
}

/// Converts `value` for storage in a slot of type `ty`.
/// `context` builds the error message from the name of the offending type.
fn coerce(
    value: Value,
    ty: Type,
    pos: Position,
    context: impl FnOnce(&str) -> String,
) -> Result<Value, RuntimeError> {
    let found = value.type_name();
    value.coerce(ty).ok_or_else(|| RuntimeError::TypeMismatch {
        message: context(found),
        pos,
    })
}

/// Runs `f`, switching to a fresh host stack segment first if the current one is nearly full.
/// Every statement and expression is evaluated through here.
pub(crate) fn grow_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

/// Walks the AST of a [`Program`], starting at `main`.
pub struct Interpreter<'a, 'io> {
    program: &'a Program,
    io: &'io mut dyn Io,
    globals: Scope,
    call_stack: Vec<CallFrame<'a>>,
    config: Config,
}

impl<'a, 'io> Interpreter<'a, 'io> {
    pub fn new(program: &'a Program, io: &'io mut dyn Io) -> Self {
        Self::with_config(program, io, Config::default())
    }

    pub fn with_config(program: &'a Program, io: &'io mut dyn Io, config: Config) -> Self {
        Self {
            program,
            io,
            globals: Scope::default(),
            call_stack: Vec::new(),
            config,
        }
    }

    /// Initializes the globals and calls `main`.
    /// Returns the exit status: the value returned by an `int main`, `0` otherwise.
    pub fn run(&mut self) -> Result<i32, RuntimeError> {
        let program = self.program;
        let main = program.function("main").ok_or(RuntimeError::MissingMain)?;

        for global in &program.globals {
            self.exec_stmt(global)?;
        }

        match self.call_function(main, Vec::new(), main.pos)? {
            Some(Value::Int(status)) => Ok(status as i32),
            _ => Ok(0),
        }
    }

    /// Calls a user function with already evaluated arguments.
    /// The caller checks the arity. Returns `None` if the function did not return a value.
    pub(crate) fn call_function(
        &mut self,
        func: &'a FnDeclaration,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Option<Value>, RuntimeError> {
        let depth = self.call_stack.len();
        if depth >= self.config.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                ident: func.ident.clone(),
                depth: self.config.max_call_depth,
                pos,
            });
        }
        let mut scope = Scope::default();
        for (param, arg) in func.params.iter().zip(args) {
            let value = coerce(arg, param.ty, pos, |found| {
                format!(
                    "parameter `{}` of `{}` has type `{}`, received `{}`",
                    param.ident, func.ident, param.ty, found
                )
            })?;
            if !scope.declare(&param.ident, param.ty, value) {
                return Err(RuntimeError::DuplicateVariable {
                    ident: param.ident.clone(),
                    pos: func.pos,
                });
            }
        }

        if self.config.trace {
            eprintln!("{}call {} at {}", "  ".repeat(depth), func.ident, pos);
        }

        self.call_stack.push(CallFrame {
            ident: &func.ident,
            return_ty: func.return_ty,
            scopes: vec![scope],
            return_value: None,
        });
        let result = self.exec_stmts(&func.body);
        let frame = self.call_stack.pop();
        result?;

        let return_value = frame.and_then(|frame| frame.return_value);
        if self.config.trace {
            let indent = "  ".repeat(depth);
            match &return_value {
                Some(value) => eprintln!("{}return {:?} from {}", indent, value, func.ident),
                None => eprintln!("{}return from {}", indent, func.ident),
            }
        }
        Ok(return_value)
    }

    /* Variables */
    /// Declares a variable in the innermost scope, or as a global outside of any call.
    fn declare(
        &mut self,
        ident: &str,
        ty: Type,
        value: Value,
        pos: Position,
    ) -> Result<(), RuntimeError> {
        let scope = match self
            .call_stack
            .last_mut()
            .and_then(|frame| frame.scopes.last_mut())
        {
            Some(scope) => scope,
            None => &mut self.globals,
        };
        if scope.declare(ident, ty, value) {
            Ok(())
        } else {
            Err(RuntimeError::DuplicateVariable {
                ident: ident.to_string(),
                pos,
            })
        }
    }

    /// Resolves `ident` in the current function's scopes, innermost first, then in the globals.
    fn lookup(&self, ident: &str, pos: Position) -> Result<&Binding, RuntimeError> {
        let local = self
            .call_stack
            .last()
            .and_then(|frame| frame.scopes.iter().rev().find_map(|scope| scope.get(ident)));
        match local {
            Some(binding) => Ok(binding),
            None => self
                .globals
                .get(ident)
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    ident: ident.to_string(),
                    pos,
                }),
        }
    }

    fn lookup_mut(&mut self, ident: &str, pos: Position) -> Result<&mut Binding, RuntimeError> {
        let local = self
            .call_stack
            .last_mut()
            .and_then(|frame| {
                frame
                    .scopes
                    .iter_mut()
                    .rev()
                    .find_map(|scope| scope.get_mut(ident))
            });
        match local {
            Some(binding) => Ok(binding),
            None => self
                .globals
                .get_mut(ident)
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    ident: ident.to_string(),
                    pos,
                }),
        }
    }

    /* Statements */
    pub(crate) fn exec_stmts(&mut self, body: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in body {
            if let Flow::Return = self.exec_stmt(stmt)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Next)
    }

    /// Executes `body` in a fresh child scope.
    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, RuntimeError> {
        if let Some(frame) = self.call_stack.last_mut() {
            frame.scopes.push(Scope::default());
        }
        let flow = self.exec_stmts(body);
        if let Some(frame) = self.call_stack.last_mut() {
            frame.scopes.pop();
        }
        flow
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        grow_stack(|| self.exec_stmt_kind(stmt))
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match &stmt.kind {
            StmtKind::VarDeclaration {
                ident,
                ty,
                initializer,
            } => {
                let value = match initializer {
                    Some(initializer) => {
                        let value = self.eval_expr(initializer)?;
                        coerce(value, *ty, stmt.pos, |found| {
                            format!(
                                "cannot initialize `{}` variable `{}` with a `{}` value",
                                ty, ident, found
                            )
                        })?
                    }
                    None => Value::zero(*ty).ok_or_else(|| RuntimeError::TypeMismatch {
                        message: format!("variable `{}` cannot be declared `{}`", ident, ty),
                        pos: stmt.pos,
                    })?,
                };
                self.declare(ident, *ty, value, stmt.pos)?;
            }
            StmtKind::Assign { ident, value } => {
                // the target must exist before the value is evaluated
                self.lookup(ident, stmt.pos)?;
                let value = self.eval_expr(value)?;
                let binding = self.lookup_mut(ident, stmt.pos)?;
                let ty = binding.ty;
                binding.value = coerce(value, ty, stmt.pos, |found| {
                    format!(
                        "cannot assign a `{}` value to `{}` variable `{}`",
                        found, ty, ident
                    )
                })?;
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.eval_condition(condition)? {
                    return self.exec_block(then_body);
                } else if let Some(else_body) = else_body {
                    return self.exec_block(else_body);
                }
            }
            StmtKind::While { condition, body } => {
                while self.eval_condition(condition)? {
                    if let Flow::Return = self.exec_block(body)? {
                        return Ok(Flow::Return);
                    }
                }
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => Some(self.eval_expr(expr)?),
                    None => None,
                };
                if let Some(frame) = self.call_stack.last_mut() {
                    frame.return_value = match (value, frame.return_ty) {
                        (Some(_), Type::Void) => {
                            return Err(RuntimeError::TypeMismatch {
                                message: format!(
                                    "`void` function `{}` cannot return a value",
                                    frame.ident
                                ),
                                pos: stmt.pos,
                            })
                        }
                        (Some(value), ty) => Some(coerce(value, ty, stmt.pos, |found| {
                            format!(
                                "function `{}` returns `{}`, found a `{}` value",
                                frame.ident, ty, found
                            )
                        })?),
                        (None, _) => None,
                    };
                }
                return Ok(Flow::Return);
            }
            StmtKind::ExprStmt(expr) => {
                // discard the result of the call, if any
                self.eval_expr_stmt(expr)?;
            }
        }
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StdIo;
    use minic_source::Source;

    fn run_with(
        source: &str,
        input: &str,
        config: Config,
    ) -> (Result<i32, RuntimeError>, String) {
        let source = Source::new(source);
        let program = minic_parser::parse(&source).unwrap();
        let mut io = StdIo::captured(input);
        let result = Interpreter::with_config(&program, &mut io, config).run();
        (result, io.output())
    }

    fn run(source: &str) -> (Result<i32, RuntimeError>, String) {
        run_with(source, "", Config::default())
    }

    fn output(source: &str) -> String {
        let (result, output) = run(source);
        result.unwrap();
        output
    }

    #[test]
    fn test_factorial() {
        let source = r#"
            int factorial(int n) {
                if (n <= 1) return 1;
                return n * factorial(n - 1);
            }
            void main() {
                printStr("Factorial: ");
                printInt(factorial(5));
            }"#;
        assert_eq!(output(source), "Factorial: 120");
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(run("int main() { return 3; }").0, Ok(3));
        assert_eq!(run("void main() { }").0, Ok(0));
        assert_eq!(run("int main() { }").0, Ok(0));
    }

    #[test]
    fn test_missing_main() {
        assert_eq!(run("int f() { return 1; }").0, Err(RuntimeError::MissingMain));
    }

    #[test]
    fn test_globals() {
        let source = r#"
            int counter = 10;
            float scale;
            void bump() { counter = counter + 1; }
            void main() {
                bump();
                bump();
                printInt(counter);
                printFloat(scale);
            }"#;
        assert_eq!(output(source), "120.000000");
    }

    #[test]
    fn test_shadowing_and_scopes() {
        let source = r#"
            int x = 1;
            void main() {
                printInt(x);
                int x = 2;
                if (1) {
                    int x = 3;
                    printInt(x);
                }
                printInt(x);
            }"#;
        assert_eq!(output(source), "132");

        let (result, _) = run("void main() { if (1) { int y = 1; } printInt(y); }");
        assert!(matches!(result, Err(RuntimeError::UndefinedVariable { ident, .. }) if ident == "y"));
    }

    #[test]
    fn test_callee_cannot_see_caller_locals() {
        let source = "void f() { printInt(local); } void main() { int local = 1; f(); }";
        let (result, _) = run(source);
        assert!(matches!(result, Err(RuntimeError::UndefinedVariable { ident, .. }) if ident == "local"));
    }

    #[test]
    fn test_duplicate_variable() {
        let (result, _) = run("void main() { int a; float a; }");
        assert!(matches!(result, Err(RuntimeError::DuplicateVariable { ident, .. }) if ident == "a"));

        let (result, _) = run("void f(int n) { int n = 2; } void main() { f(1); }");
        assert!(matches!(result, Err(RuntimeError::DuplicateVariable { .. })));
    }

    #[test]
    fn test_widening() {
        let source = "float half(float x) { return x / 2; } void main() { float f = 3; printFloat(half(f)); printStr(\" \"); printFloat(half(5)); }";
        assert_eq!(output(source), "1.500000 2.500000");
    }

    #[test]
    fn test_no_narrowing() {
        let (result, _) = run("void main() { int a = 1.5; }");
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));

        let (result, _) = run("int f() { return 2.0; } void main() { printInt(f()); }");
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));

        let (result, _) = run("void f(int n) { } void main() { f(1.0); }");
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_while_and_early_return() {
        let source = r#"
            int first_multiple(int n, int limit) {
                int i = 1;
                while (i < limit) {
                    if (i % n == 0) {
                        return i;
                    }
                    i = i + 1;
                }
                return -1;
            }
            void main() {
                printInt(first_multiple(7, 100));
                printInt(first_multiple(200, 100));
            }"#;
        assert_eq!(output(source), "7-1");
    }

    #[test]
    fn test_void_return() {
        let source = "void f(int n) { if (n > 0) { printInt(n); return; } printStr(\"none\"); } void main() { f(1); f(0); }";
        assert_eq!(output(source), "1none");

        let (result, _) = run("void f() { return 1; } void main() { f(); }");
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_stack_overflow() {
        let config = Config {
            max_call_depth: 64,
            ..Config::default()
        };
        let (result, _) = run_with(
            "int f(int n) { return f(n + 1); } void main() { f(0); }",
            "",
            config,
        );
        assert!(matches!(
            result,
            Err(RuntimeError::StackOverflow { ident, depth: 64, .. }) if ident == "f"
        ));

        // 63 nested calls under `main` fit in 64 frames
        let source = "int f(int n) { if (n == 0) return 0; return 1 + f(n - 1); } int main() { return f(62); }";
        assert_eq!(run_with(source, "", config).0, Ok(62));
    }

    #[test]
    fn test_output_before_error_is_kept() {
        let (result, output) =
            run(r#"void main() { printStr("before"); printInt(1 / 0); printStr("after"); }"#);
        assert!(matches!(result, Err(RuntimeError::DivisionByZero { .. })));
        assert_eq!(output, "before");
    }

    #[test]
    fn test_assign_resolves_target_first() {
        let source = r#"
            int noisy() {
                printStr("called");
                return 1;
            }
            void main() {
                missing = noisy();
            }"#;
        let (result, output) = run(source);
        assert!(matches!(
            result,
            Err(RuntimeError::UndefinedVariable { ident, .. }) if ident == "missing"
        ));
        assert_eq!(output, "");
    }

    #[test]
    fn test_deep_recursion_grows_host_stack() {
        let config = Config {
            max_call_depth: 10_000,
            ..Config::default()
        };
        let source = r#"
            int sum(int n) {
                if (n == 0) return 0;
                return n + sum(n - 1);
            }
            int main() {
                return sum(5000) - 12502500;
            }"#;
        assert_eq!(run_with(source, "", config).0, Ok(0));
    }

    #[test]
    fn test_scan_int() {
        let source = "void main() { int a = scanInt(); int b = scanInt(); printInt(a + b); }";
        let (result, output) = run_with(source, "40\n2\n", Config::default());
        assert_eq!(result, Ok(0));
        assert_eq!(output, "42");

        let (result, _) = run_with(source, "40", Config::default());
        assert!(matches!(result, Err(RuntimeError::EndOfInput { .. })));

        let (result, _) = run_with(source, "forty two", Config::default());
        assert!(matches!(result, Err(RuntimeError::MalformedInput { text, .. }) if text == "forty"));
    }

    #[test]
    fn test_float_precision() {
        let config = Config {
            float_precision: 2,
            ..Config::default()
        };
        let (result, output) = run_with("void main() { printFloat(3.14159); }", "", config);
        assert_eq!(result, Ok(0));
        assert_eq!(output, "3.14");
    }
}
