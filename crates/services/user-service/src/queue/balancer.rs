//! Least-bytes partition selection.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Picks the partition this producer has written the fewest bytes to.
///
/// Ties go to the lowest partition id, so a fresh balancer starts at the
/// first partition. Only bytes reported through [`LeastBytes::record`] count.
#[derive(Debug, Default)]
pub struct LeastBytes {
    written: Mutex<HashMap<i32, u64>>,
}

impl LeastBytes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the least-loaded partition; `None` when `partitions` is empty.
    pub fn pick(&self, partitions: &[i32]) -> Option<i32> {
        let written = self.lock();
        partitions
            .iter()
            .copied()
            .min_by_key(|p| (written.get(p).copied().unwrap_or(0), *p))
    }

    /// Account for `len` bytes delivered to `partition`.
    pub fn record(&self, partition: i32, len: usize) {
        *self.lock().entry(partition).or_insert(0) += len as u64;
    }

    /// Bytes written to `partition` so far.
    pub fn written(&self, partition: i32) -> u64 {
        self.lock().get(&partition).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i32, u64>> {
        self.written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(balancer: &LeastBytes, partitions: &[i32], len: usize) -> Option<i32> {
        let partition = balancer.pick(partitions)?;
        balancer.record(partition, len);
        Some(partition)
    }

    #[test]
    fn test_empty_partitions() {
        assert_eq!(LeastBytes::new().pick(&[]), None);
    }

    #[test]
    fn test_ties_go_to_lowest_partition() {
        let balancer = LeastBytes::new();
        assert_eq!(send(&balancer, &[2, 0, 1], 10), Some(0));
        assert_eq!(balancer.written(0), 10);
    }

    #[test]
    fn test_prefers_least_loaded_partition() {
        let balancer = LeastBytes::new();
        let partitions = [0, 1, 2];

        assert_eq!(send(&balancer, &partitions, 100), Some(0));
        assert_eq!(send(&balancer, &partitions, 10), Some(1));
        assert_eq!(send(&balancer, &partitions, 10), Some(2));
        // 1 and 2 hold 10 bytes each, 0 holds 100
        assert_eq!(send(&balancer, &partitions, 50), Some(1));
        assert_eq!(send(&balancer, &partitions, 5), Some(2));
        assert_eq!(balancer.written(1), 60);
        assert_eq!(balancer.written(2), 15);
    }

    #[test]
    fn test_unrecorded_picks_do_not_shift_load() {
        let balancer = LeastBytes::new();
        let partitions = [0, 1];

        // A failed produce never reports its bytes
        assert_eq!(balancer.pick(&partitions), Some(0));
        assert_eq!(balancer.pick(&partitions), Some(0));
        assert_eq!(balancer.written(0), 0);

        balancer.record(0, 8);
        assert_eq!(balancer.pick(&partitions), Some(1));
    }

    #[test]
    fn test_new_partitions_start_empty() {
        let balancer = LeastBytes::new();
        send(&balancer, &[0], 40);
        assert_eq!(balancer.pick(&[0, 1]), Some(1));
    }
}
