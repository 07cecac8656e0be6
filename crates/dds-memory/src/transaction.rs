use dds_store::{GetOptions, StoreError, StoreResult};

/// Committed state of one collection plus the copy staged by an open
/// transaction.
///
/// Writes go to the staged copy while a transaction is open and straight to
/// the committed state otherwise. Commit swaps the staged copy in; rollback
/// drops it.
#[derive(Debug, Default)]
pub(crate) struct TxState<T> {
    committed: T,
    staged: Option<T>,
}

impl<T: Clone> TxState<T> {
    pub(crate) fn new(committed: T) -> Self {
        Self {
            committed,
            staged: None,
        }
    }

    pub(crate) fn visible(&self, options: GetOptions) -> &T {
        match &self.staged {
            Some(staged) if !options.ignore_transactions => staged,
            _ => &self.committed,
        }
    }

    pub(crate) fn writable(&mut self) -> &mut T {
        match &mut self.staged {
            Some(staged) => staged,
            None => &mut self.committed,
        }
    }

    pub(crate) fn in_transaction(&self) -> bool {
        self.staged.is_some()
    }

    pub(crate) fn begin(&mut self) -> StoreResult<()> {
        if self.staged.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.staged = Some(self.committed.clone());
        Ok(())
    }

    pub(crate) fn commit(&mut self) -> StoreResult<()> {
        let staged = self.staged.take().ok_or(StoreError::NoActiveTransaction)?;
        self.committed = staged;
        Ok(())
    }

    pub(crate) fn rollback(&mut self) -> StoreResult<()> {
        self.staged
            .take()
            .map(|_| ())
            .ok_or(StoreError::NoActiveTransaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_outside_transaction_hit_committed() {
        let mut state = TxState::new(vec![1]);
        state.writable().push(2);
        assert_eq!(state.visible(GetOptions::default()), &vec![1, 2]);
    }

    #[test]
    fn staged_writes_hidden_from_committed_reads() {
        let mut state = TxState::new(vec![1]);
        state.begin().unwrap();
        state.writable().push(2);
        assert_eq!(state.visible(GetOptions::default()), &vec![1, 2]);
        assert_eq!(state.visible(GetOptions::outside_transaction()), &vec![1]);
        state.commit().unwrap();
        assert_eq!(state.visible(GetOptions::outside_transaction()), &vec![1, 2]);
    }

    #[test]
    fn rollback_discards_staged() {
        let mut state = TxState::new(vec![1]);
        state.begin().unwrap();
        state.writable().clear();
        state.rollback().unwrap();
        assert_eq!(state.visible(GetOptions::default()), &vec![1]);
        assert!(!state.in_transaction());
    }

    #[test]
    fn nested_begin_and_orphan_commit_fail() {
        let mut state = TxState::new(0u8);
        state.begin().unwrap();
        assert!(matches!(state.begin(), Err(StoreError::TransactionActive)));
        state.commit().unwrap();
        assert!(matches!(state.commit(), Err(StoreError::NoActiveTransaction)));
        assert!(matches!(state.rollback(), Err(StoreError::NoActiveTransaction)));
    }
}
