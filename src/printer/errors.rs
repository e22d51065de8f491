use std::fmt::Display;
use std::io::Write;

/// Writes every error on its own line. Nothing is written when `errors` is empty.
pub fn print_errors<W: Write, E: Display>(out: &mut W, errors: &[E]) -> std::io::Result<()> {
    for err in errors {
        writeln!(out, "Error: {err}")?;
    }
    Ok(())
}
