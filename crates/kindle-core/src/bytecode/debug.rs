//! Bytecode disassembler for debugging

use std::fmt::Write;

use super::chunk::Chunk;
use super::opcode::OpCode;
use super::value::Value;

/// Disassemble a chunk to a string
#[must_use]
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut output = format!("== {name} ==\n");

    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, offset);
        output.push_str(&line);
        output.push('\n');
        offset = next;
    }

    output
}

/// Disassemble the instruction at `offset`, returning its text and the
/// offset of the next instruction
#[must_use]
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut output = format!("{offset:04} ");

    // Line number, or | if same as previous byte
    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        output.push_str("   | ");
    } else {
        let _ = write!(output, "{line:4} ");
    }

    let Some(byte) = chunk.read_byte(offset) else {
        output.push_str("Invalid offset");
        return (output, offset + 1);
    };

    let Ok(opcode) = OpCode::try_from(byte) else {
        let _ = write!(output, "Unknown opcode {byte}");
        return (output, offset + 1);
    };

    let index = match opcode {
        OpCode::Constant => chunk.read_byte(offset + 1).map(u32::from),
        OpCode::ConstantLong => chunk.read_u24(offset + 1),
        OpCode::Nil
        | OpCode::True
        | OpCode::False
        | OpCode::Equal
        | OpCode::Greater
        | OpCode::Less
        | OpCode::Add
        | OpCode::Subtract
        | OpCode::Multiply
        | OpCode::Divide
        | OpCode::Not
        | OpCode::Negate
        | OpCode::Return => {
            output.push_str(opcode.name());
            return (output, offset + 1);
        }
    };

    match index {
        Some(index) => {
            let _ = write!(
                output,
                "{:16} {:4} '{}'",
                opcode.name(),
                index,
                format_constant(chunk.get_constant(index))
            );
        }
        None => {
            let _ = write!(output, "{:16} <truncated operand>", opcode.name());
        }
    }

    (output, offset + opcode.size())
}

fn format_constant(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "<invalid>".to_string(),
    }
}
