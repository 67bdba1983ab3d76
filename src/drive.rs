//! Driving styles built on [`Machine::resume`].
//!
//! - batch: all input queued up front, starvation is fatal
//! - stepwise: run until the machine asks for input, decide, resume
//! - many: independent batch runs of one program, spread across threads

use rayon::prelude::*;

use crate::error::{Result, VmError};
use crate::machine::{Machine, MachineConfig, Signal};

impl Machine {
    /// Run to halt with whatever input is already queued, collecting every
    /// output. Running out of input is an [`VmError::InputStarvation`].
    pub fn run_batch(&mut self) -> Result<Vec<i64>> {
        self.outputs().collect()
    }

    /// Run to the next output. `Ok(None)` means the machine halted first.
    pub fn next_output(&mut self) -> Result<Option<i64>> {
        match self.resume(None)? {
            Signal::Output(value) => Ok(Some(value)),
            Signal::Halted => Ok(None),
            Signal::NeedsInput => Err(VmError::InputStarvation { ip: self.ip() }),
        }
    }

    /// Collect outputs until the machine needs input or halts.
    ///
    /// Calling this on an already halted machine returns an empty vector.
    pub fn run_until_input(&mut self) -> Result<Vec<i64>> {
        let mut out = Vec::new();
        if self.is_halted() {
            return Ok(out);
        }
        loop {
            match self.resume(None)? {
                Signal::Output(value) => out.push(value),
                Signal::NeedsInput | Signal::Halted => return Ok(out),
            }
        }
    }

    /// Iterate over outputs in batch style. The iterator ends at halt and
    /// yields one error (then ends) on any fatal condition.
    pub fn outputs(&mut self) -> Outputs<'_> {
        Outputs {
            machine: self,
            done: false,
        }
    }
}

/// Iterator returned by [`Machine::outputs`].
pub struct Outputs<'a> {
    machine: &'a mut Machine,
    done: bool,
}

impl Iterator for Outputs<'_> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.machine.next_output() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Batch-run `program` with `inputs` and return every output.
pub fn run(program: &[i64], inputs: &[i64]) -> Result<Vec<i64>> {
    let mut machine = Machine::new(program.to_vec());
    machine.extend_input(inputs.iter().copied());
    machine.run_batch()
}

/// Batch-run `program` and return only its final output, if any.
pub fn run_last(program: &[i64], inputs: &[i64]) -> Result<Option<i64>> {
    Ok(run(program, inputs)?.pop())
}

/// Batch-run one fresh instance of `program` per input set, in parallel.
///
/// Results come back in the order of `input_sets`. Instances share nothing,
/// so one failing does not affect the others.
pub fn run_many(
    program: &[i64],
    input_sets: &[Vec<i64>],
    config: &MachineConfig,
) -> Vec<Result<Vec<i64>>> {
    input_sets
        .par_iter()
        .map(|inputs| {
            let mut machine = Machine::with_config(program.to_vec(), config.clone());
            machine.extend_input(inputs.iter().copied());
            machine.run_batch()
        })
        .collect()
}
