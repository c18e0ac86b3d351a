// File: src/repl.rs
//
// An interactive read-eval-print loop backed by rustyline for line
// editing and history. Each accepted line is compiled and run against
// a VM that persists across lines, so top-level `var`/`fn`/`class`
// declarations from one line are visible to the next.

use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::compiler::compile_source;
use crate::config::Config;
use crate::vm::Vm;

const PROMPT: &str = "izi> ";
const HISTORY_FILE: &str = ".izi_history";

pub fn run(config: Config) -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let _ = editor.load_history(HISTORY_FILE);
    let mut vm = Vm::new(config.clone());

    println!("izi {} — interactive REPL. Ctrl-D to exit.", env!("CARGO_PKG_VERSION"));

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str())?;
                eval_line(&mut vm, &line, &config);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    let _ = editor.save_history(HISTORY_FILE);
    Ok(())
}

fn eval_line(vm: &mut Vm, line: &str, config: &Config) {
    // A bare expression (no trailing `;`) is echoed, matching the
    // convenience most embedded-language REPLs offer.
    let source = if line.trim_end().ends_with(';') || line.trim_end().ends_with('}') {
        line.to_string()
    } else {
        format!("print({});", line)
    };

    match compile_source(&source, None, config.clone()) {
        Ok(chunk) => match vm.run_chunk(Rc::new(chunk)) {
            Ok(_) => {}
            Err(err) => eprintln!("{}", err),
        },
        Err(err) => eprintln!("{}", err),
    }
}
