use log::debug;
use thiserror::Error;

use crate::error::VmError;
use crate::machine::{Machine, MachineConfig};

/// Failure of a composition of machines. A fatal error in any one stage is
/// fatal to the whole composition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: usize,
        #[source]
        source: VmError,
    },

    #[error("pipeline has no stages")]
    Empty,

    #[error("stage {stage} produced no output")]
    NoOutput { stage: usize },

    #[error("every stage is waiting for input and none has halted")]
    Deadlock,
}

/// A chain of machines where each stage's output becomes the next stage's
/// input. With feedback, the last stage feeds the first, forming a ring.
#[derive(Debug, Clone)]
pub struct Pipeline {
    machines: Vec<Machine>,
}

impl Pipeline {
    /// One machine per phase setting, each with its phase queued as its
    /// first input.
    pub fn new(program: &[i64], phases: &[i64]) -> Self {
        Self::with_config(program, phases, &MachineConfig::default())
    }

    pub fn with_config(program: &[i64], phases: &[i64], config: &MachineConfig) -> Self {
        let machines = phases
            .iter()
            .map(|&phase| {
                let mut machine = Machine::with_config(program.to_vec(), config.clone());
                machine.push_input(phase);
                machine
            })
            .collect();
        Self { machines }
    }

    pub fn from_machines(machines: Vec<Machine>) -> Self {
        Self { machines }
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Single pass: each stage runs to halt on the previous stage's final
    /// output, starting from `seed`. Returns the last stage's final output.
    pub fn run(&mut self, seed: i64) -> Result<i64, NetworkError> {
        if self.machines.is_empty() {
            return Err(NetworkError::Empty);
        }
        let mut signal = seed;
        for (stage, machine) in self.machines.iter_mut().enumerate() {
            machine.push_input(signal);
            let outputs = machine
                .run_batch()
                .map_err(|source| NetworkError::Stage { stage, source })?;
            signal = *outputs.last().ok_or(NetworkError::NoOutput { stage })?;
        }
        Ok(signal)
    }

    /// Ring mode: stages are advanced round-robin, each only as far as its
    /// next need for input or halt, and every output is queued on the next
    /// stage (the last stage feeds the first). `seed` goes to stage 0.
    ///
    /// Stops when no stage can make progress. Returns the last value the
    /// final stage emitted.
    pub fn run_feedback(&mut self, seed: i64) -> Result<i64, NetworkError> {
        let n = self.machines.len();
        if n == 0 {
            return Err(NetworkError::Empty);
        }
        self.machines[0].push_input(seed);

        let mut last = None;
        let mut round = 0u64;
        loop {
            let mut progressed = false;
            for stage in 0..n {
                let machine = &mut self.machines[stage];
                if machine.is_halted() {
                    continue;
                }
                let before = machine.steps();
                let outputs = machine
                    .run_until_input()
                    .map_err(|source| NetworkError::Stage { stage, source })?;
                progressed |= machine.steps() != before;

                if stage == n - 1 {
                    if let Some(&value) = outputs.last() {
                        last = Some(value);
                    }
                }
                self.machines[(stage + 1) % n].extend_input(outputs);
            }
            round += 1;
            if !progressed {
                break;
            }
        }
        debug!("feedback loop settled after {round} rounds");

        if !self.machines.iter().any(Machine::is_halted) {
            return Err(NetworkError::Deadlock);
        }
        last.ok_or(NetworkError::NoOutput { stage: n - 1 })
    }
}
