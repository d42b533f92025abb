/// Accumulates items and yields them as fixed-size chunks: a full chunk on
/// the `push` that fills the buffer, the remainder on `finish`. Replaces
/// manual index bookkeeping around buffered batch submission.
#[derive(Debug, Clone)]
pub struct ChunkBuffer<T> {
    capacity: usize,
    items: Vec<T>,
}

impl<T> ChunkBuffer<T> {
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), items: Vec::new() }
    }

    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.items.push(item);
        (self.items.len() == self.capacity)
            .then(|| std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity)))
    }

    /// Drains whatever is buffered, if anything.
    pub fn finish(self) -> Option<Vec<T>> {
        (!self.items.is_empty()).then_some(self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_full_chunks_then_the_remainder() {
        let mut buffer = ChunkBuffer::new(3);
        let mut chunks = Vec::new();
        for item in 0..7 {
            if let Some(chunk) = buffer.push(item) {
                chunks.push(chunk);
            }
        }
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.finish(), Some(vec![6]));
    }

    #[test]
    fn finish_on_an_exact_multiple_is_empty() {
        let mut buffer = ChunkBuffer::new(2);
        assert!(buffer.push(1).is_none());
        assert!(buffer.push(2).is_some());
        assert_eq!(buffer.finish(), None);
    }
}
