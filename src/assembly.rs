/// A sub-document produced by a split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Current position in the assembly order
    pub id: usize,
    /// `start-end` of the range it was cut from
    pub source_range: String,
    pub file_name: String,
    pub page_count: u32,
    pub bytes: Vec<u8>,
}

/// The user-reorderable list of extracted documents.
#[derive(Debug, Clone, Default)]
pub struct AssemblyOrder {
    entries: Vec<ExtractedDocument>,
}

impl AssemblyOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        source_range: String,
        file_name: String,
        page_count: u32,
        bytes: Vec<u8>,
    ) -> &ExtractedDocument {
        let id = self.entries.len();
        self.entries.push(ExtractedDocument {
            id,
            source_range,
            file_name,
            page_count,
            bytes,
        });
        &self.entries[id]
    }

    /// Move the entry at `from` to `to`, then renumber every entry.
    ///
    /// Returns `false` if either index is out of bounds.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.entries.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            self.renumber();
        }
        true
    }

    /// Rearrange into `order`, a permutation of current positions: `order[i]`
    /// is the position of the entry that should end up at `i`.
    pub fn arrange(&mut self, order: &[usize]) -> bool {
        let len = self.entries.len();
        let mut seen = vec![false; len];
        if order.len() != len {
            return false;
        }
        for &position in order {
            if position >= len || std::mem::replace(&mut seen[position], true) {
                return false;
            }
        }

        // Track where each original entry currently sits while moving them.
        let mut current: Vec<usize> = (0..len).collect();
        for (target, &original) in order.iter().enumerate() {
            let from = current
                .iter()
                .position(|&entry| entry == original)
                .unwrap_or(target);
            let moved = current.remove(from);
            current.insert(target, moved);
            self.reorder(from, target);
        }
        true
    }

    /// Entries in the order a merge concatenates them
    pub fn merge_order(&self) -> &[ExtractedDocument] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ExtractedDocument> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and its bytes.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries.shrink_to_fit();
    }

    fn renumber(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.id = position;
        }
    }
}
