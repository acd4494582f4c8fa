use log::{trace, warn};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxnError {
    #[error("Failed to begin transaction: {0}")]
    Begin(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Rollback failed: {0}")]
    Rollback(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    ReadOnly,
    ReadWrite,
}

pub trait Transaction: Send + Sync {
    fn commit(self: Box<Self>) -> Result<(), TxnError>;

    fn rollback(self: Box<Self>) -> Result<(), TxnError>;
}

pub trait TransactionService: Send + Sync {
    fn begin(&self, mode: TxnMode) -> Result<Box<dyn Transaction>, TxnError>;
}

/// Service for backends that have no transactional semantics.
#[derive(Debug, Default)]
pub struct NoTransactions;

struct NoopTransaction;

impl Transaction for NoopTransaction {
    fn commit(self: Box<Self>) -> Result<(), TxnError> {
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), TxnError> {
        Ok(())
    }
}

impl TransactionService for NoTransactions {
    fn begin(&self, _mode: TxnMode) -> Result<Box<dyn Transaction>, TxnError> {
        Ok(Box::new(NoopTransaction))
    }
}

/// Transaction scope of one command. Handlers begin it when they touch the
/// disk, the dispatch loop ends it once the handler returns and anything
/// still open when it is dropped is rolled back.
pub struct UnitOfWork {
    service: Arc<dyn TransactionService>,
    current: Option<(TxnMode, Box<dyn Transaction>)>,
    session_id: u32,
}

impl UnitOfWork {
    pub fn new(service: Arc<dyn TransactionService>, session_id: u32) -> Self {
        Self {
            service,
            current: None,
            session_id,
        }
    }

    /// Starts a transaction unless a compatible one is open. A read-only
    /// transaction is committed and replaced when writing is requested.
    pub fn begin(&mut self, mode: TxnMode) -> bool {
        match self.current {
            Some((TxnMode::ReadWrite, _)) => return true,
            Some((TxnMode::ReadOnly, _)) if mode == TxnMode::ReadOnly => return true,
            Some(_) => self.end(),
            None => {}
        }

        match self.service.begin(mode) {
            Ok(txn) => {
                trace!("session={} Began {:?} transaction", self.session_id, mode);
                self.current = Some((mode, txn));
                true
            }
            Err(e) => {
                warn!("session={} {}", self.session_id, e);
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Commits the open transaction, failures are logged only.
    pub fn end(&mut self) {
        if let Some((mode, txn)) = self.current.take() {
            match txn.commit() {
                Ok(()) => trace!("session={} Committed {:?} transaction", self.session_id, mode),
                Err(e) => warn!("session={} {}", self.session_id, e),
            }
        }
    }

    pub fn rollback(&mut self) {
        if let Some((_, txn)) = self.current.take() {
            if let Err(e) = txn.rollback() {
                warn!("session={} {}", self.session_id, e);
            }
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.rollback();
    }
}
