pub mod check;

use minic_parser::ast::Program;
use minic_source::Source;

/// Runs every static check on `program`. Errors are added to `source.errors`.
/// Returns `true` if the program passed.
pub fn check(source: &Source, program: &Program) -> bool {
    check::Checker::new(source, program).check_program()
}
