use crate::Error;

/// Hands out consecutive internal ids. Passed explicitly through the
/// ingestion pipeline; there is no ambient counter state.
#[derive(Debug, Clone, Default)]
pub struct UniqueIdGenerator {
    next: usize,
}

impl UniqueIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: usize) -> Self {
        Self { next }
    }

    /// The next free id. Exhausting the id space is fatal to ingestion.
    pub fn generate(&mut self) -> Result<usize, Error> {
        let id = self.next;
        self.next = id.checked_add(1).ok_or(Error::IdSpaceExhausted)?;
        Ok(id)
    }

    /// How many ids have been handed out.
    pub fn generated(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_consecutive() {
        let mut ids = UniqueIdGenerator::new();
        assert_eq!(ids.generate().unwrap(), 0);
        assert_eq!(ids.generate().unwrap(), 1);
        assert_eq!(ids.generated(), 2);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut ids = UniqueIdGenerator::starting_at(usize::MAX);
        assert!(matches!(ids.generate(), Err(Error::IdSpaceExhausted)));
    }
}
