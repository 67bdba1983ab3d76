/// Operation identifier taken from the low two decimal digits of an
/// instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Mul,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    AdjustRelativeBase,
    Halt,
}

impl Opcode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => Opcode::Add,
            2 => Opcode::Mul,
            3 => Opcode::Input,
            4 => Opcode::Output,
            5 => Opcode::JumpIfTrue,
            6 => Opcode::JumpIfFalse,
            7 => Opcode::LessThan,
            8 => Opcode::Equals,
            9 => Opcode::AdjustRelativeBase,
            99 => Opcode::Halt,
            _ => return None,
        })
    }

    /// (read parameters, written parameters). Written parameters always
    /// follow the read ones.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => (2, 1),
            Opcode::Input => (0, 1),
            Opcode::Output | Opcode::AdjustRelativeBase => (1, 0),
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => (2, 0),
            Opcode::Halt => (0, 0),
        }
    }

    pub fn param_count(self) -> usize {
        let (reads, writes) = self.arity();
        reads + writes
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustRelativeBase => "ARB",
            Opcode::Halt => "HALT",
        }
    }
}

/// Addressing mode of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Operand is the value stored at the raw parameter.
    Position,
    /// Operand is the raw parameter itself. Never valid for writes.
    Immediate,
    /// Operand address is the relative base plus the raw parameter.
    Relative,
}

impl Mode {
    fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Mode::Position),
            1 => Some(Mode::Immediate),
            2 => Some(Mode::Relative),
            _ => None,
        }
    }
}

/// A decoded instruction word: the opcode plus one mode per parameter.
///
/// Parameters past the opcode's arity are always `Position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: [Mode; 3],
}

impl Instruction {
    /// Split `word` into opcode and mode digits.
    ///
    /// Mode digits are read right to left starting at the hundreds digit; a
    /// missing digit means position mode. Returns `None` for negative words,
    /// unknown opcodes, and mode digits other than 0, 1 or 2 on a parameter
    /// the opcode actually takes. Digits beyond the opcode's arity are ignored.
    pub fn decode(word: i64) -> Option<Self> {
        if word < 0 {
            return None;
        }
        let opcode = Opcode::from_code(word % 100)?;
        let mut modes = [Mode::Position; 3];
        let mut rest = word / 100;
        for mode in modes.iter_mut().take(opcode.param_count()) {
            *mode = Mode::from_digit(rest % 10)?;
            rest /= 10;
        }
        Some(Self { opcode, modes })
    }

    /// Width of the instruction in memory, including the word itself.
    pub fn width(&self) -> usize {
        1 + self.opcode.param_count()
    }
}

/// Render a linear listing of `program`.
///
/// Words that do not decode, or whose parameters would run past the end of
/// the program, are listed as `DATA`. The listing is purely static: it does
/// not know where execution will jump or which words are data.
pub fn disassemble(program: &[i64]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let mut addr = 0;
    while addr < program.len() {
        let word = program[addr];
        let instr = Instruction::decode(word).filter(|i| addr + i.width() <= program.len());
        match instr {
            Some(instr) => {
                let params = &program[addr + 1..addr + instr.width()];
                let raw = program[addr..addr + instr.width()]
                    .iter()
                    .map(|w| w.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                let operands = params
                    .iter()
                    .zip(instr.modes)
                    .map(|(&p, mode)| match mode {
                        Mode::Position => format!("[{p}]"),
                        Mode::Immediate => p.to_string(),
                        Mode::Relative => format!("[rb{p:+}]"),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(
                    out,
                    "{addr:04}: {raw:<24} {} {operands}",
                    instr.opcode.mnemonic()
                );
                addr += instr.width();
            }
            None => {
                let _ = writeln!(out, "{addr:04}: {word:<24} DATA {word}");
                addr += 1;
            }
        }
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_never_panics(word in any::<i64>()) {
            let _ = Instruction::decode(word);
        }

        #[test]
        fn decoded_opcode_matches_low_digits(word in 0i64..100_000) {
            if let Some(instr) = Instruction::decode(word) {
                prop_assert_eq!(Opcode::from_code(word % 100), Some(instr.opcode));
            }
        }

        #[test]
        fn disassemble_never_panics(program in prop::collection::vec(any::<i64>(), 0..128)) {
            let _ = disassemble(&program);
        }
    }
}
