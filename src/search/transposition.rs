use crate::movegen::moves::Move;

pub const DEFAULT_TT_SIZE_MB: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Empty,
    Exact,
    LowerBound,
    UpperBound,
}

/// One probe-or-overwrite slot. Collisions are resolved by replacement.
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub kind: NodeKind,
    pub hash: u64,
    pub depth: u8,
    pub eval: i32,
    pub best_move: Move,
}

impl TTEntry {
    const fn empty() -> TTEntry {
        TTEntry {
            kind: NodeKind::Empty,
            hash: 0,
            depth: 0,
            eval: 0,
            best_move: Move::NULL,
        }
    }
}

/// Open-addressed fixed-size table indexed by `hash % capacity`. Owned by a
/// single search context; never shared across tasks.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> TranspositionTable {
        let capacity = (size_mb * 1024 * 1024 / std::mem::size_of::<TTEntry>()).max(1);
        TranspositionTable {
            entries: vec![TTEntry::empty(); capacity],
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    /// Returns the stored entry only when it belongs to this exact hash.
    #[inline(always)]
    pub fn probe(&self, hash: u64) -> Option<&TTEntry> {
        let entry = &self.entries[self.index(hash)];
        if entry.kind == NodeKind::Empty || entry.hash != hash {
            return None;
        }
        Some(entry)
    }

    #[inline(always)]
    pub fn store(&mut self, kind: NodeKind, hash: u64, depth: u8, eval: i32, best_move: Move) {
        let index = self.index(hash);
        self.entries[index] = TTEntry {
            kind,
            hash,
            depth,
            eval,
            best_move,
        };
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = TTEntry::empty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::moves::MoveFlag;

    #[test]
    fn test_store_and_probe() {
        let mut tt = TranspositionTable::new(1);
        let hash = 0x1234_5678_9ABC_DEF0;
        let mv = Move::new(52, 36, MoveFlag::None);

        assert!(tt.probe(hash).is_none());
        tt.store(NodeKind::Exact, hash, 5, 120, mv);

        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.kind, NodeKind::Exact);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.eval, 120);
        assert_eq!(entry.best_move, mv);
    }

    #[test]
    fn test_index_collision_misses() {
        let mut tt = TranspositionTable::new(1);
        let capacity = tt.capacity() as u64;
        let hash = 42u64;
        let colliding = hash + capacity;

        tt.store(NodeKind::Exact, hash, 3, 10, Move::NULL);
        // Same slot, different hash: probe must not return the foreign entry.
        assert!(tt.probe(colliding).is_none());

        // And the overwrite wins the slot.
        tt.store(NodeKind::Exact, colliding, 4, 20, Move::NULL);
        assert!(tt.probe(hash).is_none());
        assert_eq!(tt.probe(colliding).unwrap().eval, 20);
    }

    #[test]
    fn test_clear() {
        let mut tt = TranspositionTable::new(1);
        tt.store(NodeKind::Exact, 7, 2, 50, Move::NULL);
        tt.clear();
        assert!(tt.probe(7).is_none());
    }
}
