use super::addr::{MemoryAddress, Space};
use super::num::Number;

/// Variable storage for one machine: a persistent region that
/// participates in snapshot/rollback and an impersistent scratch region
/// that survives it.
#[derive(Debug, Clone)]
pub struct MemoryHeap {
    persistent: Vec<Number>,
    impersistent: Vec<Number>,
}

impl MemoryHeap {
    pub fn new(persistent_slots: usize, impersistent_slots: usize) -> MemoryHeap {
        MemoryHeap {
            persistent: vec![Number::ZERO; persistent_slots],
            impersistent: vec![Number::ZERO; impersistent_slots],
        }
    }

    pub fn load(&self, addr: MemoryAddress) -> Option<Number> {
        match addr.space {
            Space::Persistent => self.persistent.get(addr.index as usize).copied(),
            Space::Impersistent => self.impersistent.get(addr.index as usize).copied(),
        }
    }

    #[must_use]
    pub fn store(&mut self, addr: MemoryAddress, value: Number) -> bool {
        let slot = match addr.space {
            Space::Persistent => self.persistent.get_mut(addr.index as usize),
            Space::Impersistent => self.impersistent.get_mut(addr.index as usize),
        };
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Direct write into the persistent region, used to seed parameter
    /// slots before initializer programs run.
    pub fn set_persistent(&mut self, index: usize, value: Number) {
        if let Some(slot) = self.persistent.get_mut(index) {
            *slot = value;
        }
    }

    /// Overwrites this heap's persistent region from another heap.
    /// Impersistent slots are untouched.
    pub fn copy_persistent_from(&mut self, other: &MemoryHeap) {
        self.persistent.copy_from_slice(&other.persistent);
    }

    pub fn zero_impersistent(&mut self) {
        self.impersistent.fill(Number::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store() {
        let mut heap = MemoryHeap::new(2, 1);
        assert!(heap.store(MemoryAddress::persistent(1), Number(7.0)));
        assert!(heap.store(MemoryAddress::impersistent(0), Number(3.0)));
        assert_eq!(heap.load(MemoryAddress::persistent(1)), Some(Number(7.0)));
        assert_eq!(heap.load(MemoryAddress::persistent(0)), Some(Number::ZERO));
        assert_eq!(heap.load(MemoryAddress::impersistent(0)), Some(Number(3.0)));
    }

    #[test]
    fn test_out_of_range() {
        let mut heap = MemoryHeap::new(1, 0);
        assert_eq!(heap.load(MemoryAddress::persistent(1)), None);
        assert!(!heap.store(MemoryAddress::impersistent(0), Number::ONE));
    }

    #[test]
    fn test_rollback_leaves_impersistent() {
        let mut stable = MemoryHeap::new(2, 2);
        stable.set_persistent(0, Number(1.0));
        let mut unstable = stable.clone();
        assert!(unstable.store(MemoryAddress::persistent(0), Number(9.0)));
        assert!(unstable.store(MemoryAddress::impersistent(1), Number(5.0)));
        unstable.copy_persistent_from(&stable);
        assert_eq!(
            unstable.load(MemoryAddress::persistent(0)),
            Some(Number(1.0))
        );
        assert_eq!(
            unstable.load(MemoryAddress::impersistent(1)),
            Some(Number(5.0))
        );
    }
}
