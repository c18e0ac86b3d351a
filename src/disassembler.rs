// File: src/disassembler.rs
//
// Pure Chunk-to-text pretty printer (spec §4.6). Used by tooling only;
// never mutates the Chunk it prints.

use std::fmt::Write as _;

use crate::bytecode::{Chunk, Op};

pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", name);
    let mut offset = 0usize;
    let mut last_line = -1i32;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, offset, &mut out, &mut last_line);
    }
    out
}

fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String, last_line: &mut i32) -> usize {
    let line = chunk.get_line(offset);
    let line_col = if offset > 0 && line == *last_line {
        "   |".to_string()
    } else {
        format!("{:4}", line)
    };
    *last_line = line;

    let byte = chunk.code[offset];
    let op = match Op::from_byte(byte) {
        Some(op) => op,
        None => {
            let _ = writeln!(out, "{:04} {} UNKNOWN({})", offset, line_col, byte);
            return offset + 1;
        }
    };

    match op {
        Op::Constant => operand_instruction(chunk, op, offset, &line_col, out, |idx| {
            format!("{} ({})", idx, chunk.constants[idx as usize])
        }),
        Op::GetGlobal | Op::SetGlobal | Op::GetProperty | Op::SetProperty | Op::GetSuperMethod => {
            operand_instruction(chunk, op, offset, &line_col, out, |idx| {
                format!("{} ({})", idx, chunk.names[idx as usize])
            })
        }
        Op::GetLocal | Op::SetLocal | Op::Call => {
            operand_instruction(chunk, op, offset, &line_col, out, |idx| idx.to_string())
        }
        Op::Jump | Op::JumpIfFalse => {
            let target = u16::from_be_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let _ = writeln!(
                out,
                "{:04} {} {:<16} -> {}",
                offset,
                line_col,
                format!("{:?}", op),
                offset + 3 + target as usize
            );
            offset + 3
        }
        Op::Loop => {
            let dist = u16::from_be_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let _ = writeln!(
                out,
                "{:04} {} {:<16} -> {}",
                offset,
                line_col,
                format!("{:?}", op),
                (offset + 3).saturating_sub(dist as usize)
            );
            offset + 3
        }
        Op::Try => {
            let catch_off = u16::from_be_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let finally_off = u16::from_be_bytes([chunk.code[offset + 3], chunk.code[offset + 4]]);
            let name_idx = chunk.code[offset + 5];
            let _ = writeln!(
                out,
                "{:04} {} {:<16} catch+{} finally+{} var={}",
                offset,
                line_col,
                "TRY",
                catch_off,
                finally_off,
                name_idx
            );
            offset + 6
        }
        simple => {
            let _ = writeln!(out, "{:04} {} {:?}", offset, line_col, simple);
            offset + 1
        }
    }
}

fn operand_instruction(
    chunk: &Chunk,
    op: Op,
    offset: usize,
    line_col: &str,
    out: &mut String,
    render: impl Fn(u8) -> String,
) -> usize {
    let idx = chunk.code[offset + 1];
    let _ = writeln!(out, "{:04} {} {:<16} {}", offset, line_col, format!("{:?}", op), render(idx));
    offset + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn disassembles_a_simple_program_without_panicking() {
        let chunk = crate::compiler::compile_source("print(2 + 3 * 4);", None, Config::default()).unwrap();
        let text = disassemble(&chunk, "test");
        assert!(text.contains("== test =="));
        assert!(text.contains("Print"));
    }
}
