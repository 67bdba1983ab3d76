use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::decode::{Instruction, Mode, Opcode};
use crate::error::{Result, VmError};
use crate::memory::{Memory, MemorySnapshot};

/// Configuration for a single machine instance.
#[derive(Debug, Clone, Default)]
pub struct MachineConfig {
    /// Maximum number of instructions executed over the machine's lifetime
    /// (`None` for unbounded). Exceeding it is fatal.
    pub step_limit: Option<u64>,
}

/// What a single `resume` call stopped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// An OUTPUT instruction produced this value.
    Output(i64),
    /// An INPUT instruction found the queue empty. The instruction pointer
    /// still points at it; supplying input and resuming re-executes it.
    NeedsInput,
    /// HALT was decoded. Any further `resume` is an error.
    Halted,
}

/// Lifecycle of a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    AwaitingInput,
    Halted,
    /// A fatal error aborted the instance. Every later `resume` returns it again.
    Faulted(VmError),
}

/// Result of executing one instruction.
enum Step {
    Continue,
    Output(i64),
    Blocked,
    Halted,
}

/// A re-entrant Intcode machine.
///
/// Execution only happens inside [`Machine::resume`], which runs exactly as
/// many instructions as it takes to reach the next output, the next input
/// starvation, or HALT, then hands control back to the caller.
#[derive(Debug, Clone)]
pub struct Machine {
    memory: Memory,
    ip: i64,
    relative_base: i64,
    state: State,
    input: VecDeque<i64>,
    config: MachineConfig,
    steps: u64,
    /// A non-ASCII output read while assembling a text line, returned by the
    /// next `read_line`.
    pub(crate) held_output: Option<i64>,
}

impl Machine {
    pub fn new(program: Vec<i64>) -> Self {
        Self::with_config(program, MachineConfig::default())
    }

    pub fn with_config(program: Vec<i64>, config: MachineConfig) -> Self {
        Self {
            memory: Memory::new(program),
            ip: 0,
            relative_base: 0,
            state: State::Running,
            input: VecDeque::new(),
            config,
            steps: 0,
            held_output: None,
        }
    }

    /// Run until the next suspension point.
    ///
    /// `input`, when given, is appended to the input queue before any
    /// instruction executes.
    pub fn resume(&mut self, input: Option<i64>) -> Result<Signal> {
        match &self.state {
            State::Halted => return Err(VmError::ResumeAfterHalt { ip: self.ip }),
            State::Faulted(err) => return Err(err.clone()),
            State::Running | State::AwaitingInput => {}
        }
        if let Some(value) = input {
            self.input.push_back(value);
        }
        self.state = State::Running;

        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Output(value)) => return Ok(Signal::Output(value)),
                Ok(Step::Blocked) => {
                    debug!("awaiting input at ip {}", self.ip);
                    self.state = State::AwaitingInput;
                    return Ok(Signal::NeedsInput);
                }
                Ok(Step::Halted) => {
                    debug!("halted after {} steps", self.steps);
                    self.state = State::Halted;
                    return Ok(Signal::Halted);
                }
                Err(err) => {
                    warn!("machine faulted: {err}");
                    self.state = State::Faulted(err.clone());
                    return Err(err);
                }
            }
        }
    }

    /// Decode and execute the instruction at the instruction pointer.
    fn step(&mut self) -> Result<Step> {
        let ip = self.ip;
        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                return Err(VmError::StepLimitExceeded { limit, ip });
            }
        }

        let word = self.memory.read(ip).map_err(|e| e.at(ip))?;
        let instr = Instruction::decode(word).ok_or(VmError::MalformedOpcode { word, ip })?;
        trace!("{ip:06} {word} {:?} rb={}", instr.opcode, self.relative_base);

        let next = ip.wrapping_add(instr.width() as i64);

        let step = match instr.opcode {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => {
                let a = self.read_param(&instr, 0)?;
                let b = self.read_param(&instr, 1)?;
                let value = match instr.opcode {
                    Opcode::Add => a.wrapping_add(b),
                    Opcode::Mul => a.wrapping_mul(b),
                    Opcode::LessThan => (a < b) as i64,
                    _ => (a == b) as i64,
                };
                self.write_param(&instr, word, 2, value)?;
                self.ip = next;
                Step::Continue
            }
            Opcode::Input => {
                let Some(value) = self.input.pop_front() else {
                    return Ok(Step::Blocked);
                };
                self.write_param(&instr, word, 0, value)?;
                self.ip = next;
                Step::Continue
            }
            Opcode::Output => {
                let value = self.read_param(&instr, 0)?;
                self.ip = next;
                Step::Output(value)
            }
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
                let cond = self.read_param(&instr, 0)?;
                let target = self.read_param(&instr, 1)?;
                let taken = (cond != 0) == (instr.opcode == Opcode::JumpIfTrue);
                self.ip = if taken { target } else { next };
                Step::Continue
            }
            Opcode::AdjustRelativeBase => {
                let delta = self.read_param(&instr, 0)?;
                self.relative_base = self.relative_base.wrapping_add(delta);
                self.ip = next;
                Step::Continue
            }
            Opcode::Halt => {
                self.ip = next;
                Step::Halted
            }
        };
        self.steps += 1;
        Ok(step)
    }

    fn raw_param(&self, n: usize) -> Result<i64> {
        let address = self.ip.wrapping_add(1 + n as i64);
        self.memory.read(address).map_err(|e| e.at(self.ip))
    }

    fn read_param(&self, instr: &Instruction, n: usize) -> Result<i64> {
        let raw = self.raw_param(n)?;
        let address = match instr.modes[n] {
            Mode::Immediate => return Ok(raw),
            Mode::Position => raw,
            Mode::Relative => self.relative_base.wrapping_add(raw),
        };
        self.memory.read(address).map_err(|e| e.at(self.ip))
    }

    fn write_address(&self, instr: &Instruction, word: i64, n: usize) -> Result<i64> {
        let raw = self.raw_param(n)?;
        match instr.modes[n] {
            Mode::Position => Ok(raw),
            Mode::Relative => Ok(self.relative_base.wrapping_add(raw)),
            Mode::Immediate => Err(VmError::ImmediateWrite { word, ip: self.ip }),
        }
    }

    fn write_param(&mut self, instr: &Instruction, word: i64, n: usize, value: i64) -> Result<()> {
        let address = self.write_address(instr, word, n)?;
        self.memory.write(address, value).map_err(|e| e.at(self.ip))
    }

    pub fn push_input(&mut self, value: i64) {
        self.input.push_back(value);
    }

    pub fn extend_input<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.input.extend(values);
    }

    /// Number of queued input values not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Read memory without executing anything.
    pub fn peek(&self, address: i64) -> Result<i64> {
        self.memory.read(address).map_err(|e| e.at(self.ip))
    }

    /// Overwrite a memory cell from outside the program, e.g. to patch a
    /// mode flag at address 0 before the first resume.
    pub fn poke(&mut self, address: i64, value: i64) -> Result<()> {
        self.memory.write(address, value).map_err(|e| e.at(self.ip))
    }

    pub fn memory(&self) -> MemorySnapshot {
        self.memory.snapshot()
    }

    pub fn ip(&self) -> i64 {
        self.ip
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Instructions completed so far. A starved INPUT or a faulting
    /// instruction is not counted.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Reads values until a zero, outputting each one doubled.
    const DOUBLER: [i64; 15] = [3, 100, 1006, 100, 14, 1002, 100, 2, 101, 4, 101, 1105, 1, 0, 99];

    proptest! {
        #[test]
        fn resume_never_panics(program in prop::collection::vec(any::<i64>(), 0..64)) {
            let config = MachineConfig { step_limit: Some(1000) };
            let mut m = Machine::with_config(program, config);
            for _ in 0..16 {
                match m.resume(Some(1)) {
                    Ok(Signal::Halted) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        }

        #[test]
        fn stepwise_matches_batch(
            inputs in prop::collection::vec(any::<i64>().prop_filter("nonzero", |v| *v != 0), 0..32)
        ) {
            let mut batch = Machine::new(DOUBLER.to_vec());
            batch.extend_input(inputs.iter().copied().chain([0]));
            let mut batch_out = Vec::new();
            loop {
                match batch.resume(None).unwrap() {
                    Signal::Output(v) => batch_out.push(v),
                    Signal::Halted => break,
                    Signal::NeedsInput => panic!("batch machine starved"),
                }
            }

            let mut stepwise = Machine::new(DOUBLER.to_vec());
            let mut feed = inputs.iter().copied().chain([0]);
            let mut pending = None;
            let mut step_out = Vec::new();
            loop {
                match stepwise.resume(pending.take()).unwrap() {
                    Signal::Output(v) => step_out.push(v),
                    Signal::NeedsInput => pending = feed.next(),
                    Signal::Halted => break,
                }
            }

            let expected: Vec<i64> = inputs.iter().map(|v| v.wrapping_mul(2)).collect();
            prop_assert_eq!(&batch_out, &expected);
            prop_assert_eq!(step_out, batch_out);
        }

        #[test]
        fn stepwise_matches_batch_for_any_program(
            program in prop::collection::vec(-10i64..300, 1..48),
            inputs in prop::collection::vec(any::<i64>(), 0..8)
        ) {
            let config = MachineConfig { step_limit: Some(2000) };
            let finish = |trace: &mut Vec<Result<i64, String>>, end: Result<Signal>| match end {
                Ok(signal) => trace.push(Err(format!("{signal:?}"))),
                Err(e) => trace.push(Err(e.to_string())),
            };

            let mut batch = Machine::with_config(program.clone(), config.clone());
            batch.extend_input(inputs.iter().copied());
            let mut batch_trace = Vec::new();
            loop {
                match batch.resume(None) {
                    Ok(Signal::Output(v)) => batch_trace.push(Ok(v)),
                    end => { finish(&mut batch_trace, end); break; }
                }
            }

            let mut stepwise = Machine::with_config(program, config);
            let mut feed = inputs.iter().copied();
            let mut pending = None;
            let mut step_trace = Vec::new();
            loop {
                match stepwise.resume(pending.take()) {
                    Ok(Signal::Output(v)) => step_trace.push(Ok(v)),
                    Ok(Signal::NeedsInput) if feed.len() > 0 => pending = feed.next(),
                    end => { finish(&mut step_trace, end); break; }
                }
            }

            prop_assert_eq!(step_trace, batch_trace);
            prop_assert_eq!(stepwise.memory(), batch.memory());
            prop_assert_eq!(stepwise.steps(), batch.steps());
        }

        #[test]
        fn identical_runs_are_deterministic(
            program in prop::collection::vec(-10i64..300, 1..48),
            inputs in prop::collection::vec(any::<i64>(), 0..8)
        ) {
            let run = || {
                let config = MachineConfig { step_limit: Some(2000) };
                let mut m = Machine::with_config(program.clone(), config);
                m.extend_input(inputs.iter().copied());
                let mut trace = Vec::new();
                loop {
                    match m.resume(None) {
                        Ok(Signal::Output(v)) => trace.push(Ok(v)),
                        Ok(other) => { trace.push(Err(format!("{other:?}"))); break; }
                        Err(e) => { trace.push(Err(e.to_string())); break; }
                    }
                }
                (trace, m.memory())
            };
            prop_assert_eq!(run(), run());
        }
    }
}
