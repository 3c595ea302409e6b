use std::collections::HashMap;

/// A NewGRF record as reported by a `GC_NEWGRF_LOOKUP` packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGrfRecord {
    pub grf_id: u32,
    pub md5: [u8; 16],
    pub name: String,
}

/// Process-local `index -> NewGrfRecord` table.
///
/// Populated opportunistically while decoding a listing session and shared
/// across that session's packets. Callers typically create a fresh table
/// per refresh and let it drop afterward; nothing requires it to be
/// persisted across refreshes.
#[derive(Default, Debug)]
pub struct NewGrfLookup {
    entries: HashMap<u32, NewGrfRecord>,
}

impl NewGrfLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record at `index`.
    pub fn insert(&mut self, index: u32, record: NewGrfRecord) {
        self.entries.insert(index, record);
    }

    pub fn get(&self, index: u32) -> Option<&NewGrfRecord> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_index_overwrites() {
        let mut table = NewGrfLookup::new();
        table.insert(
            1,
            NewGrfRecord {
                grf_id: 10,
                md5: [0; 16],
                name: "first".into(),
            },
        );
        table.insert(
            1,
            NewGrfRecord {
                grf_id: 20,
                md5: [1; 16],
                name: "second".into(),
            },
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).unwrap().name, "second");
    }

    #[test]
    fn unknown_index_resolves_to_none() {
        let table = NewGrfLookup::new();
        assert!(table.get(99).is_none());
    }
}
