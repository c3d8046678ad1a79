use super::transaction::{Transaction, TransactionMode};
use super::{TxError, TxResult};
use crate::db::ConnectionFactory;
use log::error;

/// Opens transactions, each on its own freshly acquired connection.
pub struct TransactionManager {
    factory: Box<dyn ConnectionFactory>,
}

impl TransactionManager {
    pub fn new(factory: impl ConnectionFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    pub fn new_transaction_read_write(&self) -> TxResult<Transaction> {
        self.open(TransactionMode::ReadWrite)
    }

    /// Opens a transaction that rejects write statements.
    pub fn new_transaction_read_only(&self) -> TxResult<Transaction> {
        self.open(TransactionMode::ReadOnly)
    }

    /// Runs `work` in a read-write transaction.
    ///
    /// Commits when `work` returns `Ok`; otherwise the transaction is rolled
    /// back when it goes out of scope.
    pub fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction) -> Result<T, E>,
        E: From<TxError>,
    {
        let mut tx = self.new_transaction_read_write()?;
        let value = work(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn open(&self, mode: TransactionMode) -> TxResult<Transaction> {
        let conn = self.factory.connect().map_err(|err| {
            error!(
                "event=tx_acquire module=tx status=error mode={} error={}",
                mode.as_str(),
                err
            );
            TxError::Db(err)
        })?;
        Transaction::begin(conn, mode)
    }
}
