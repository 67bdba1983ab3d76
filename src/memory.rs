use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::VmError;

/// Zero-initialized, conceptually unbounded memory.
///
/// The loaded program occupies a contiguous `Vec`; any address past its end
/// lives in a sparse map and reads as 0 until first written. Entries are
/// never removed.
///
/// Negative addresses are rejected rather than wrapped.
#[derive(Debug, Clone)]
pub struct Memory {
    program: Vec<i64>,
    extension: HashMap<i64, i64>,
}

/// An access to a negative address. The engine turns this into
/// [`VmError::UndefinedAddress`] once it knows the instruction pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndefinedAddress(pub i64);

impl UndefinedAddress {
    pub fn at(self, ip: i64) -> VmError {
        VmError::UndefinedAddress { address: self.0, ip }
    }
}

impl Memory {
    pub fn new(program: Vec<i64>) -> Self {
        Self {
            program,
            extension: HashMap::new(),
        }
    }

    pub fn read(&self, address: i64) -> Result<i64, UndefinedAddress> {
        if address < 0 {
            return Err(UndefinedAddress(address));
        }
        match self.program.get(address as usize) {
            Some(&value) => Ok(value),
            None => Ok(self.extension.get(&address).copied().unwrap_or(0)),
        }
    }

    pub fn write(&mut self, address: i64, value: i64) -> Result<(), UndefinedAddress> {
        if address < 0 {
            return Err(UndefinedAddress(address));
        }
        match self.program.get_mut(address as usize) {
            Some(slot) => *slot = value,
            None => {
                self.extension.insert(address, value);
            }
        }
        Ok(())
    }

    /// Number of words in the loaded program segment.
    pub fn program_len(&self) -> usize {
        self.program.len()
    }

    /// Number of addresses written beyond the program segment.
    pub fn extension_len(&self) -> usize {
        self.extension.len()
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let mut cells: BTreeMap<i64, i64> = self
            .program
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as i64, v))
            .collect();
        cells.extend(self.extension.iter().map(|(&a, &v)| (a, v)));
        MemorySnapshot { cells }
    }
}

/// An owned, address-ordered copy of every materialized memory cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    cells: BTreeMap<i64, i64>,
}

impl MemorySnapshot {
    /// Value at `address`; unmaterialized addresses read as 0.
    pub fn get(&self, address: i64) -> i64 {
        self.cells.get(&address).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.cells.iter().map(|(&a, &v)| (a, v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest materialized address, if any.
    pub fn last_address(&self) -> Option<i64> {
        self.cells.keys().next_back().copied()
    }
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (address, value) in self.iter() {
            writeln!(f, "{address:06}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_program_segment() {
        let mem = Memory::new(vec![1, 2, 3]);
        assert_eq!(mem.read(0), Ok(1));
        assert_eq!(mem.read(2), Ok(3));
    }

    #[test]
    fn unwritten_extension_reads_zero() {
        let mem = Memory::new(vec![1, 2, 3]);
        assert_eq!(mem.read(3), Ok(0));
        assert_eq!(mem.read(1_000_000_000), Ok(0));
        assert_eq!(mem.extension_len(), 0);
    }

    #[test]
    fn write_past_program_goes_to_extension() {
        let mut mem = Memory::new(vec![0; 4]);
        mem.write(10_000, 77).unwrap();
        assert_eq!(mem.read(10_000), Ok(77));
        assert_eq!(mem.program_len(), 4);
        assert_eq!(mem.extension_len(), 1);
    }

    #[test]
    fn write_inside_program_overwrites() {
        let mut mem = Memory::new(vec![5, 6]);
        mem.write(1, -9).unwrap();
        assert_eq!(mem.read(1), Ok(-9));
        assert_eq!(mem.extension_len(), 0);
    }

    #[test]
    fn negative_address_is_rejected() {
        let mut mem = Memory::new(vec![1]);
        assert_eq!(mem.read(-1), Err(UndefinedAddress(-1)));
        assert_eq!(mem.write(-5, 3), Err(UndefinedAddress(-5)));
        assert_eq!(
            UndefinedAddress(-5).at(8),
            VmError::UndefinedAddress { address: -5, ip: 8 }
        );
    }

    #[test]
    fn snapshot_merges_both_tiers_in_order() {
        let mut mem = Memory::new(vec![4, 5]);
        mem.write(6, 1).unwrap();
        mem.write(3, 2).unwrap();
        let snap = mem.snapshot();
        let cells: Vec<_> = snap.iter().collect();
        assert_eq!(cells, vec![(0, 4), (1, 5), (3, 2), (6, 1)]);
        assert_eq!(snap.get(5), 0);
        assert_eq!(snap.last_address(), Some(6));
    }

    #[test]
    fn snapshot_of_far_address_stays_sparse() {
        let mut mem = Memory::new(vec![1, 2]);
        mem.write(i64::MAX - 1, 7).unwrap();
        let snap = mem.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get(i64::MAX - 1), 7);
        assert_eq!(snap.last_address(), Some(i64::MAX - 1));
        assert_eq!(snap.to_string().lines().count(), 3);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut mem = Memory::new(vec![1]);
        let snap = mem.snapshot();
        mem.write(0, 9).unwrap();
        assert_eq!(snap.get(0), 1);
    }

    #[test]
    fn empty_snapshot() {
        let snap = Memory::new(Vec::new()).snapshot();
        assert!(snap.is_empty());
        assert_eq!(snap.last_address(), None);
        assert_eq!(snap.to_string(), "");
    }
}
