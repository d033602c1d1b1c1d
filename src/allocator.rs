use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use crate::SurfelId;

/// Fixed-capacity pool of surfel ids: an atomic free-id stack plus a presence
/// bitmap.
///
/// Both operations are lock-free and may be invoked concurrently from many
/// invocations of the same dispatch. The pipeline never allocates and
/// deallocates within the same dispatch (spawning and despawning are separate
/// passes), and the stack relies on that: concurrent `allocate` calls are safe
/// with each other, concurrent `deallocate` calls are safe with each other.
///
/// Invariant: an id's presence bit is set iff the id is not on the free
/// stack; at every point between dispatches, `free() + live() == capacity()`.
pub struct SlotAllocator {
    stack: Vec<AtomicU32>,
    top: AtomicI32,
    bitmap: Vec<AtomicU32>,
    capacity: u32,
}

impl SlotAllocator {
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0 && capacity % 32 == 0);

        Self {
            stack: (0..capacity).map(AtomicU32::new).collect(),
            top: AtomicI32::new(capacity as i32),
            bitmap: (0..capacity / 32).map(|_| AtomicU32::new(0)).collect(),
            capacity,
        }
    }

    /// Pops a free id and marks it live; `None` once the pool is exhausted.
    ///
    /// Callers must hold a unit of the per-frame allocation budget (see
    /// [`AllocationContext`]); this call itself never blocks or retries.
    pub fn allocate(&self) -> Option<SurfelId> {
        let slot = self.top.fetch_sub(1, Ordering::AcqRel);

        if slot <= 0 {
            self.top.fetch_add(1, Ordering::AcqRel);
            return None;
        }

        let id = self.stack[(slot - 1) as usize].load(Ordering::Acquire);

        self.bitmap[(id / 32) as usize].fetch_or(1 << (id % 32), Ordering::AcqRel);

        Some(SurfelId::new(id))
    }

    /// Returns a live id to the free stack and clears its presence bit.
    ///
    /// Precondition: `id` is currently allocated; despawn passes guarantee
    /// this by only despawning ids read back from the bitmap or the cache.
    pub fn deallocate(&self, id: SurfelId) {
        debug_assert!(self.is_allocated(id));

        self.bitmap[(id.get() / 32) as usize]
            .fetch_and(!(1 << (id.get() % 32)), Ordering::AcqRel);

        let slot = self.top.fetch_add(1, Ordering::AcqRel);

        self.stack[slot as usize].store(id.get(), Ordering::Release);
    }

    pub fn is_allocated(&self, id: SurfelId) -> bool {
        let word = self.bitmap[(id.get() / 32) as usize].load(Ordering::Acquire);

        word & (1 << (id.get() % 32)) != 0
    }

    /// Number of ids currently on the free stack.
    pub fn free(&self) -> u32 {
        self.top.load(Ordering::Acquire).max(0) as u32
    }

    /// Number of ids currently live (presence-bitmap population).
    pub fn live(&self) -> u32 {
        self.bitmap
            .iter()
            .map(|word| word.load(Ordering::Acquire).count_ones())
            .sum()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Iterates over all currently live ids.
    pub fn iter_live(&self) -> impl Iterator<Item = SurfelId> + '_ {
        (0..self.capacity)
            .map(SurfelId::new)
            .filter(|id| self.is_allocated(*id))
    }
}

/// Per-frame allocation budget, computed once before the spawn pass begins
/// and shared by all of its invocations.
pub struct AllocationContext {
    remaining: AtomicI32,
}

impl AllocationContext {
    pub fn new(allocator: &SlotAllocator, max_spawns: u32) -> Self {
        Self {
            remaining: AtomicI32::new(allocator.free().min(max_spawns) as i32),
        }
    }

    /// Consumes one unit of budget; `false` once the budget is exhausted, at
    /// which point the caller aborts spawning for the frame.
    pub fn try_take(&self) -> bool {
        self.remaining.fetch_sub(1, Ordering::AcqRel) > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire).max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::prelude::*;

    use super::*;

    #[test]
    fn conservation() {
        let allocator = SlotAllocator::new(64);
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut live = Vec::new();

        for _ in 0..1000 {
            assert_eq!(allocator.free() + allocator.live(), 64);

            if rng.gen_bool(0.5) {
                if let Some(id) = allocator.allocate() {
                    live.push(id);
                }
            } else if !live.is_empty() {
                let id = live.swap_remove(rng.gen_range(0..live.len()));

                allocator.deallocate(id);
            }
        }

        assert_eq!(allocator.free() + allocator.live(), 64);
        assert_eq!(allocator.live() as usize, live.len());
    }

    #[test]
    fn exhaustion_returns_none() {
        let allocator = SlotAllocator::new(32);

        for _ in 0..32 {
            assert!(allocator.allocate().is_some());
        }

        assert!(allocator.allocate().is_none());
        assert_eq!(allocator.free(), 0);
        assert_eq!(allocator.live(), 32);
    }

    #[test]
    fn deallocate_restores_exactly_one_slot() {
        let allocator = SlotAllocator::new(32);
        let id = allocator.allocate().unwrap();

        assert_eq!(allocator.free(), 31);
        assert!(allocator.is_allocated(id));

        allocator.deallocate(id);

        assert_eq!(allocator.free(), 32);
        assert_eq!(allocator.live(), 0);
        assert!(!allocator.is_allocated(id));
    }

    /// Simulates the pipeline's usage: rounds of concurrent allocations
    /// followed by rounds of concurrent deallocations; no id may ever be
    /// handed out twice.
    #[test]
    fn concurrent_rounds_yield_unique_ids() {
        let allocator = SlotAllocator::new(256);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let allocated: Vec<Vec<SurfelId>> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|_| {
                        scope.spawn(|| {
                            (0..16).filter_map(|_| allocator.allocate()).collect()
                        })
                    })
                    .collect();

                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let allocated: Vec<SurfelId> = allocated.into_iter().flatten().collect();
            let unique: HashSet<SurfelId> = allocated.iter().copied().collect();

            assert_eq!(unique.len(), allocated.len());
            assert_eq!(allocator.free() + allocator.live(), 256);

            let mut to_free: Vec<SurfelId> = allocator.iter_live().collect();

            to_free.shuffle(&mut rng);
            to_free.truncate(rng.gen_range(0..=to_free.len()));

            std::thread::scope(|scope| {
                let allocator = &allocator;

                for chunk in to_free.chunks(32) {
                    scope.spawn(move || {
                        for id in chunk {
                            allocator.deallocate(*id);
                        }
                    });
                }
            });

            assert_eq!(allocator.free() + allocator.live(), 256);
        }
    }

    #[test]
    fn budget_is_bounded_by_free_slots() {
        let allocator = SlotAllocator::new(32);

        for _ in 0..30 {
            allocator.allocate();
        }

        let budget = AllocationContext::new(&allocator, 64);

        assert_eq!(budget.remaining(), 2);
        assert!(budget.try_take());
        assert!(budget.try_take());
        assert!(!budget.try_take());
        assert!(!budget.try_take());
    }
}
