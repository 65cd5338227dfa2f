//! Scripted in-memory ledger for orchestration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use async_trait::async_trait;

use bondfi_evm::{Ledger, ReadError, SendError, Wallet};

type Selector = [u8; 4];

/// One recorded state-changing call.
#[derive(Debug, Clone)]
pub(crate) struct SentCall {
    pub contract: Address,
    pub selector: Selector,
    pub calldata: Bytes,
    #[allow(dead_code)]
    pub note: String,
}

/// Mock [`Ledger`]/[`Wallet`] with per-(contract, selector) scripted
/// read responses and recorded sends.
///
/// Reads consume queued responses in FIFO order, falling back to a
/// per-selector default when the queue is empty. An unscripted read
/// panics: tests must declare every remote interaction they expect.
pub(crate) struct MockLedger {
    account: Address,
    reads: Mutex<HashMap<(Address, Selector), VecDeque<Result<Bytes, String>>>>,
    default_reads: Mutex<HashMap<(Address, Selector), Bytes>>,
    read_log: Mutex<Vec<(Address, Selector)>>,
    send_failures: Mutex<HashMap<(Address, Selector), String>>,
    sent: Mutex<Vec<SentCall>>,
    send_counter: AtomicU64,
}

impl MockLedger {
    pub(crate) fn new() -> Self {
        Self {
            account: Address::repeat_byte(0xAA),
            reads: Mutex::new(HashMap::new()),
            default_reads: Mutex::new(HashMap::new()),
            read_log: Mutex::new(Vec::new()),
            send_failures: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            send_counter: AtomicU64::new(0),
        }
    }

    /// Queue one successful read response for `(contract, selector)`.
    pub(crate) fn queue_read(&self, contract: Address, selector: Selector, return_data: Vec<u8>) {
        self.reads
            .lock()
            .unwrap()
            .entry((contract, selector))
            .or_default()
            .push_back(Ok(Bytes::from(return_data)));
    }

    /// Queue one failing read for `(contract, selector)`.
    pub(crate) fn queue_read_failure(
        &self,
        contract: Address,
        selector: Selector,
        message: &str,
    ) {
        self.reads
            .lock()
            .unwrap()
            .entry((contract, selector))
            .or_default()
            .push_back(Err(message.to_string()));
    }

    /// Respond with `return_data` whenever the queue for
    /// `(contract, selector)` is empty.
    pub(crate) fn set_default_read(
        &self,
        contract: Address,
        selector: Selector,
        return_data: Vec<u8>,
    ) {
        self.default_reads
            .lock()
            .unwrap()
            .insert((contract, selector), Bytes::from(return_data));
    }

    /// Make every send to `(contract, selector)` fail with `message`.
    pub(crate) fn fail_sends(&self, contract: Address, selector: Selector, message: &str) {
        self.send_failures
            .lock()
            .unwrap()
            .insert((contract, selector), message.to_string());
    }

    pub(crate) fn sent(&self) -> Vec<SentCall> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn sent_selectors(&self) -> Vec<Selector> {
        self.sent().iter().map(|call| call.selector).collect()
    }

    /// How many reads hit `(contract, selector)` so far.
    pub(crate) fn reads_of(&self, contract: Address, selector: Selector) -> usize {
        self.read_log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| **entry == (contract, selector))
            .count()
    }

    pub(crate) fn total_reads(&self) -> usize {
        self.read_log.lock().unwrap().len()
    }
}

fn selector_of(calldata: &Bytes) -> Selector {
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&calldata[..4]);
    selector
}

#[async_trait]
impl Ledger for MockLedger {
    async fn read(&self, contract: Address, calldata: Bytes) -> Result<Bytes, ReadError> {
        let selector = selector_of(&calldata);
        self.read_log.lock().unwrap().push((contract, selector));

        let queued = self
            .reads
            .lock()
            .unwrap()
            .get_mut(&(contract, selector))
            .and_then(VecDeque::pop_front);

        if let Some(response) = queued {
            return response.map_err(ReadError::Reverted);
        }

        if let Some(default) = self
            .default_reads
            .lock()
            .unwrap()
            .get(&(contract, selector))
        {
            return Ok(default.clone());
        }

        panic!("unscripted read: contract {contract}, selector 0x{}", alloy::hex::encode(selector));
    }
}

#[async_trait]
impl Wallet for MockLedger {
    fn address(&self) -> Address {
        self.account
    }

    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
        note: &str,
    ) -> Result<TxHash, SendError> {
        let selector = selector_of(&calldata);

        if let Some(message) = self.send_failures.lock().unwrap().get(&(contract, selector)) {
            return Err(SendError::Rejected(message.clone()));
        }

        self.sent.lock().unwrap().push(SentCall {
            contract,
            selector,
            calldata,
            note: note.to_string(),
        });

        let nonce = self.send_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(B256::from(U256::from(nonce)))
    }
}
