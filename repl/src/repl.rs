use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Context;
use interpreter::Interpreter;
use tracing::{debug, info};

/// Runs the prompt loop until `input` is exhausted. Every line is parsed on its own but evaluated
/// in the same session, so bindings made on earlier lines stay visible. Bytes that are not valid
/// UTF-8 are replaced and end up as illegal tokens instead of ending the session.
pub fn start<R, W>(mut input: R, mut output: W, prompt: &str) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut interpreter = Interpreter::new();
    let mut line = Vec::new();

    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            debug!("end of input");
            return Ok(());
        }

        let src = String::from_utf8_lossy(&line);
        eval_source(&mut interpreter, &src, &mut output)?;
    }
}

/// Runs a whole file as a single program. Returns false when it failed to parse or stopped with
/// a runtime error.
pub fn run_file<W: Write>(path: &Path, mut output: W) -> anyhow::Result<bool> {
    let bytes = fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    info!("running {}", path.display());

    let src = String::from_utf8_lossy(&bytes);
    let mut interpreter = Interpreter::new();
    let clean = eval_source(&mut interpreter, &src, &mut output)?;
    Ok(clean)
}

// Prints either every parse error on its own line, or the rendered result if there is one.
fn eval_source<W: Write>(
    interpreter: &mut Interpreter,
    src: &str,
    output: &mut W,
) -> io::Result<bool> {
    let program = match interpreter::parse(src) {
        Ok(program) => program,
        Err(errors) => {
            for err in errors {
                writeln!(output, "{}", err)?;
            }
            return Ok(false);
        }
    };

    match interpreter.eval(&program) {
        Some(value) => {
            writeln!(output, "{}", value)?;
            Ok(!value.is_error())
        }
        None => Ok(true),
    }
}
