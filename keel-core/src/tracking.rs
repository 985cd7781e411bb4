/// Insertion and revision state embedded in every model.
///
/// Each successful read or write advances `revision` by one, so
/// [`stored_revision`](ModelTracking::stored_revision) is the value the
/// instance expects to find in the `revision` column. Updates only match
/// the row while nobody else advanced it, which is the optimistic lock.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelTracking {
    revision: i64,
    inserted: bool,
}

impl ModelTracking {
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Revision the caller believes is persisted, `-1` for a fresh instance.
    pub fn stored_revision(&self) -> i64 {
        self.revision - 1
    }

    pub fn is_inserted(&self) -> bool {
        self.inserted
    }

    /// Loads the value read from the `revision` column.
    pub(crate) fn load_revision(&mut self, revision: i64) {
        self.revision = revision;
    }

    pub fn after_get(&mut self) {
        self.inserted = true;
        self.revision += 1;
    }

    pub fn after_put(&mut self) {
        self.inserted = true;
        self.revision += 1;
    }

    pub fn after_delete(&mut self) {
        self.inserted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh() {
        let tracking = ModelTracking::default();
        assert_eq!(tracking.revision(), 0);
        assert_eq!(tracking.stored_revision(), -1);
        assert!(!tracking.is_inserted());
    }

    #[test]
    fn after_put() {
        let mut tracking = ModelTracking::default();
        tracking.after_put();
        assert!(tracking.is_inserted());
        assert_eq!(tracking.revision(), 1);
        assert_eq!(tracking.stored_revision(), 0);
        tracking.after_put();
        assert_eq!(tracking.stored_revision(), 1);
    }

    #[test]
    fn after_get() {
        let mut tracking = ModelTracking::default();
        tracking.load_revision(4);
        tracking.after_get();
        assert!(tracking.is_inserted());
        assert_eq!(tracking.revision(), 5);
        assert_eq!(tracking.stored_revision(), 4);
    }

    #[test]
    fn after_delete() {
        let mut tracking = ModelTracking::default();
        tracking.after_put();
        tracking.after_delete();
        assert!(!tracking.is_inserted());
        assert_eq!(tracking.revision(), 1);
    }
}
