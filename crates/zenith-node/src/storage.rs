//! RocksDB storage backend for the Zenith node.
//!
//! Every record is stored as JSON. Channel keys are big-endian ids so a
//! column-family scan returns channels in id order.

use anyhow::{Context, Result};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

use zenith_core::{Amount, BlockHeight, Channel, Principal};
use zenith_ledger::SettlementBinding;

/// Column family names for different data types.
const CF_CHANNELS: &str = "channels";
const CF_BINDINGS: &str = "bindings";
const CF_ACCOUNTS: &str = "accounts";
const CF_STATE: &str = "state";

const KEY_HEIGHT: &[u8] = b"height";

/// RocksDB-backed storage for the Zenith node.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_CHANNELS, Options::default()),
            ColumnFamilyDescriptor::new(CF_BINDINGS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_STATE, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    /// Put a value into a column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Get a value from a column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        let value = self.db.get_cf(&cf, key)?;
        Ok(value)
    }

    /// Every key/value pair of a column family, in key order.
    fn scan(&self, cf_name: &str) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        let mut entries = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            entries.push(item?);
        }
        Ok(entries)
    }

    /// Atomically write a channel record together with the balances and
    /// height it changed.
    pub fn commit(
        &self,
        channel: Option<&Channel>,
        balances: &[(Principal, Amount)],
        height: BlockHeight,
    ) -> Result<()> {
        let cf_channels = self
            .db
            .cf_handle(CF_CHANNELS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_CHANNELS))?;
        let cf_accounts = self
            .db
            .cf_handle(CF_ACCOUNTS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_ACCOUNTS))?;
        let cf_state = self
            .db
            .cf_handle(CF_STATE)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_STATE))?;

        let mut batch = WriteBatch::default();
        if let Some(channel) = channel {
            batch.put_cf(&cf_channels, channel.id().to_key(), serde_json::to_vec(channel)?);
        }
        for (who, balance) in balances {
            batch.put_cf(&cf_accounts, who.as_str().as_bytes(), serde_json::to_vec(balance)?);
        }
        batch.put_cf(&cf_state, KEY_HEIGHT, serde_json::to_vec(&height)?);
        self.db.write(batch)?;
        Ok(())
    }

    /// Store a channel record.
    pub fn put_channel(&self, channel: &Channel) -> Result<()> {
        self.put(CF_CHANNELS, &channel.id().to_key(), &serde_json::to_vec(channel)?)
    }

    /// All channel records, ordered by id.
    pub fn load_channels(&self) -> Result<Vec<Channel>> {
        self.scan(CF_CHANNELS)?
            .into_iter()
            .map(|(_, value)| {
                serde_json::from_slice(&value).context("corrupt channel record")
            })
            .collect()
    }

    /// Store a settlement binding.
    pub fn put_binding(&self, binding: &SettlementBinding) -> Result<()> {
        self.put(
            CF_BINDINGS,
            binding.owner.as_str().as_bytes(),
            &serde_json::to_vec(binding)?,
        )
    }

    /// All settlement bindings.
    pub fn load_bindings(&self) -> Result<Vec<SettlementBinding>> {
        self.scan(CF_BINDINGS)?
            .into_iter()
            .map(|(_, value)| {
                serde_json::from_slice(&value).context("corrupt settlement binding")
            })
            .collect()
    }

    /// Store an account balance.
    pub fn put_balance(&self, who: &Principal, balance: Amount) -> Result<()> {
        self.put(CF_ACCOUNTS, who.as_str().as_bytes(), &serde_json::to_vec(&balance)?)
    }

    /// All account balances.
    pub fn load_balances(&self) -> Result<Vec<(Principal, Amount)>> {
        self.scan(CF_ACCOUNTS)?
            .into_iter()
            .map(|(key, value)| -> Result<(Principal, Amount)> {
                let who = std::str::from_utf8(&key)
                    .context("account key is not UTF-8")?
                    .parse::<Principal>()?;
                let balance: Amount =
                    serde_json::from_slice(&value).context("corrupt account balance")?;
                Ok((who, balance))
            })
            .collect()
    }

    /// Store the chain height.
    pub fn put_height(&self, height: BlockHeight) -> Result<()> {
        self.put(CF_STATE, KEY_HEIGHT, &serde_json::to_vec(&height)?)
    }

    /// Stored chain height. `None` means the data directory was never
    /// initialized.
    pub fn get_height(&self) -> Result<Option<BlockHeight>> {
        self.get(CF_STATE, KEY_HEIGHT)?
            .map(|bytes| serde_json::from_slice(&bytes).context("corrupt chain height"))
            .transpose()
    }

    /// Flush memtables to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
