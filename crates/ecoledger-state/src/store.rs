//! The state store: every table of the credit module.
//!
//! The host runs each transaction serially against the store; a handler
//! either completes or all of its writes are discarded. [`atomically`]
//! reproduces that contract for embedders: the closure runs against a
//! copy of the state which replaces the original only on success.
//!
//! All tables are `BTreeMap`s so every iteration is in deterministic key
//! order. Monotonic sequences are persisted here, never in process-local
//! variables.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use ecoledger_types::{
    Address, Batch, BatchBalance, BatchSupply, Class, CreditType, EcoError, Project, Result,
    SellOrder, constants::MAX_PRECISION,
};

/// All persisted state of the credit module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    credit_types: BTreeMap<String, CreditType>,
    classes: BTreeMap<u64, Class>,
    class_id_index: BTreeMap<String, u64>,
    class_issuers: BTreeSet<(u64, Address)>,
    projects: BTreeMap<u64, Project>,
    project_id_index: BTreeMap<String, u64>,
    batches: BTreeMap<u64, Batch>,
    batch_denom_index: BTreeMap<String, u64>,
    supplies: BTreeMap<u64, BatchSupply>,
    balances: BTreeMap<(Address, u64), BatchBalance>,
    sell_orders: BTreeMap<u64, SellOrder>,
    /// (source, tx id) → batch key, for bridge idempotence.
    origin_txs: BTreeMap<(String, String), u64>,

    // Persisted counters. Surrogate keys and order ids start at 1 so
    // zero can mean "unset" on the wire.
    next_class_key: u64,
    next_project_key: u64,
    next_batch_key: u64,
    next_sell_order_id: u64,
    class_seqs: BTreeMap<String, u64>,
    project_seqs: BTreeMap<u64, u64>,
    batch_seqs: BTreeMap<u64, u64>,
}

/// Run `f` against a copy of `state`, committing the copy only if `f`
/// succeeds. On error the original state is untouched.
pub fn atomically<T>(state: &mut State, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
    let mut tx = state.clone();
    let out = f(&mut tx)?;
    *state = tx;
    Ok(out)
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Credit types
    // -----------------------------------------------------------------

    /// Register a credit type. Abbreviations are unique; precision is
    /// capped at [`MAX_PRECISION`].
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidRequest`] on a duplicate abbreviation
    /// or excessive precision.
    pub fn add_credit_type(&mut self, credit_type: CreditType) -> Result<()> {
        if credit_type.precision > MAX_PRECISION {
            return Err(EcoError::InvalidRequest(format!(
                "credit type precision cannot exceed {MAX_PRECISION}: got {}",
                credit_type.precision
            )));
        }
        if self.credit_types.contains_key(&credit_type.abbreviation) {
            return Err(EcoError::InvalidRequest(format!(
                "credit type {} already exists",
                credit_type.abbreviation
            )));
        }
        self.credit_types
            .insert(credit_type.abbreviation.clone(), credit_type);
        Ok(())
    }

    #[must_use]
    pub fn credit_type(&self, abbrev: &str) -> Option<&CreditType> {
        self.credit_types.get(abbrev)
    }

    // -----------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------

    /// Next class sequence under a credit type (1-based).
    pub fn next_class_seq(&mut self, abbrev: &str) -> u64 {
        let seq = self.class_seqs.entry(abbrev.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Insert a class, assigning its surrogate key.
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidRequest`] if the class id is taken.
    pub fn insert_class(&mut self, mut class: Class) -> Result<u64> {
        if self.class_id_index.contains_key(&class.id) {
            return Err(EcoError::InvalidRequest(format!(
                "class with id {} already exists",
                class.id
            )));
        }
        self.next_class_key += 1;
        class.key = self.next_class_key;
        self.class_id_index.insert(class.id.clone(), class.key);
        self.classes.insert(class.key, class);
        Ok(self.next_class_key)
    }

    #[must_use]
    pub fn class(&self, key: u64) -> Option<&Class> {
        self.classes.get(&key)
    }

    #[must_use]
    pub fn class_by_id(&self, id: &str) -> Option<&Class> {
        self.class_id_index.get(id).and_then(|k| self.classes.get(k))
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn add_class_issuer(&mut self, class_key: u64, issuer: Address) {
        self.class_issuers.insert((class_key, issuer));
    }

    #[must_use]
    pub fn is_class_issuer(&self, class_key: u64, addr: &Address) -> bool {
        self.class_issuers.contains(&(class_key, addr.clone()))
    }

    /// Issuers of a class, in address order.
    pub fn class_issuers(&self, class_key: u64) -> impl Iterator<Item = &Address> {
        self.class_issuers
            .iter()
            .filter(move |(k, _)| *k == class_key)
            .map(|(_, addr)| addr)
    }

    // -----------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------

    /// Next project sequence under a class (1-based).
    pub fn next_project_seq(&mut self, class_key: u64) -> u64 {
        let seq = self.project_seqs.entry(class_key).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Insert a project, assigning its surrogate key.
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidRequest`] if the project id is taken.
    pub fn insert_project(&mut self, mut project: Project) -> Result<u64> {
        if self.project_id_index.contains_key(&project.id) {
            return Err(EcoError::InvalidRequest(format!(
                "project with id {} already exists",
                project.id
            )));
        }
        self.next_project_key += 1;
        project.key = self.next_project_key;
        self.project_id_index.insert(project.id.clone(), project.key);
        self.projects.insert(project.key, project);
        Ok(self.next_project_key)
    }

    #[must_use]
    pub fn project(&self, key: u64) -> Option<&Project> {
        self.projects.get(&key)
    }

    #[must_use]
    pub fn project_by_id(&self, id: &str) -> Option<&Project> {
        self.project_id_index
            .get(id)
            .and_then(|k| self.projects.get(k))
    }

    /// The first project of a class carrying the given reference id, in
    /// key order. Used by the bridge to resolve receipts.
    #[must_use]
    pub fn project_by_reference(&self, class_key: u64, reference_id: &str) -> Option<&Project> {
        self.projects
            .values()
            .find(|p| p.class_key == class_key && p.reference_id == reference_id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    // -----------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------

    /// Next batch sequence under a project (1-based).
    pub fn next_batch_seq(&mut self, project_key: u64) -> u64 {
        let seq = self.batch_seqs.entry(project_key).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Insert a batch, assigning its surrogate key.
    ///
    /// # Errors
    /// Returns [`EcoError::InvalidRequest`] if the denom is taken.
    pub fn insert_batch(&mut self, mut batch: Batch) -> Result<u64> {
        if self.batch_denom_index.contains_key(&batch.denom) {
            return Err(EcoError::InvalidRequest(format!(
                "batch with denom {} already exists",
                batch.denom
            )));
        }
        self.next_batch_key += 1;
        batch.key = self.next_batch_key;
        self.batch_denom_index.insert(batch.denom.clone(), batch.key);
        self.batches.insert(batch.key, batch);
        Ok(self.next_batch_key)
    }

    #[must_use]
    pub fn batch(&self, key: u64) -> Option<&Batch> {
        self.batches.get(&key)
    }

    #[must_use]
    pub fn batch_by_denom(&self, denom: &str) -> Option<&Batch> {
        self.batch_denom_index
            .get(denom)
            .and_then(|k| self.batches.get(k))
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// Decimal precision governing amounts of a batch, resolved through
    /// its project, class, and credit type.
    ///
    /// # Errors
    /// Returns [`EcoError::NotFound`] if any link in the chain is
    /// missing, which indicates a referential-integrity bug.
    pub fn precision_for_batch(&self, batch_key: u64) -> Result<u32> {
        let batch = self
            .batch(batch_key)
            .ok_or_else(|| EcoError::NotFound(format!("batch key {batch_key}")))?;
        let project = self
            .project(batch.project_key)
            .ok_or_else(|| EcoError::NotFound(format!("project key {}", batch.project_key)))?;
        let class = self
            .class(project.class_key)
            .ok_or_else(|| EcoError::NotFound(format!("class key {}", project.class_key)))?;
        let credit_type = self.credit_type(&class.credit_type_abbrev).ok_or_else(|| {
            EcoError::NotFound(format!("credit type {}", class.credit_type_abbrev))
        })?;
        Ok(credit_type.precision)
    }

    // -----------------------------------------------------------------
    // Supply and balances
    // -----------------------------------------------------------------

    #[must_use]
    pub fn supply(&self, batch_key: u64) -> BatchSupply {
        self.supplies.get(&batch_key).cloned().unwrap_or_default()
    }

    pub fn set_supply(&mut self, batch_key: u64, supply: BatchSupply) {
        self.supplies.insert(batch_key, supply);
    }

    #[must_use]
    pub fn balance(&self, addr: &Address, batch_key: u64) -> BatchBalance {
        self.balances
            .get(&(addr.clone(), batch_key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_balance(&mut self, addr: &Address, batch_key: u64, balance: BatchBalance) {
        self.balances.insert((addr.clone(), batch_key), balance);
    }

    /// All balance entries of a batch, in address order.
    pub fn balances_for_batch(
        &self,
        batch_key: u64,
    ) -> impl Iterator<Item = (&Address, &BatchBalance)> {
        self.balances
            .iter()
            .filter(move |((_, k), _)| *k == batch_key)
            .map(|((addr, _), bal)| (addr, bal))
    }

    /// All balance entries of an address, in batch-key order.
    pub fn balances_for_address(
        &self,
        addr: &Address,
    ) -> impl Iterator<Item = (u64, &BatchBalance)> {
        self.balances
            .range((addr.clone(), 0)..=(addr.clone(), u64::MAX))
            .map(|((_, k), bal)| (*k, bal))
    }

    // -----------------------------------------------------------------
    // Sell orders
    // -----------------------------------------------------------------

    /// Next sell order id (1-based, global).
    pub fn next_sell_order_id(&mut self) -> u64 {
        self.next_sell_order_id += 1;
        self.next_sell_order_id
    }

    pub fn insert_sell_order(&mut self, order: SellOrder) {
        self.sell_orders.insert(order.id, order);
    }

    #[must_use]
    pub fn sell_order(&self, id: u64) -> Option<&SellOrder> {
        self.sell_orders.get(&id)
    }

    pub fn sell_order_mut(&mut self, id: u64) -> Option<&mut SellOrder> {
        self.sell_orders.get_mut(&id)
    }

    pub fn remove_sell_order(&mut self, id: u64) -> Option<SellOrder> {
        self.sell_orders.remove(&id)
    }

    pub fn sell_orders(&self) -> impl Iterator<Item = &SellOrder> {
        self.sell_orders.values()
    }

    /// All sell orders of a seller, in order-id order.
    pub fn sell_orders_by_seller(&self, seller: &Address) -> impl Iterator<Item = &SellOrder> {
        self.sell_orders
            .values()
            .filter(move |o| &o.seller == seller)
    }

    // -----------------------------------------------------------------
    // Origin txs
    // -----------------------------------------------------------------

    /// Register a bridge origin tx against the batch it minted.
    ///
    /// # Errors
    /// Returns [`EcoError::DuplicateBridgeReceive`] if the pair was
    /// already registered.
    pub fn register_origin_tx(&mut self, source: &str, id: &str, batch_key: u64) -> Result<()> {
        let key = (source.to_string(), id.to_string());
        if self.origin_txs.contains_key(&key) {
            return Err(EcoError::DuplicateBridgeReceive {
                id: id.to_string(),
                source_chain: source.to_string(),
            });
        }
        self.origin_txs.insert(key, batch_key);
        Ok(())
    }

    /// The batch minted by a previously registered origin tx, if any.
    #[must_use]
    pub fn origin_tx_batch(&self, source: &str, id: &str) -> Option<u64> {
        self.origin_txs
            .get(&(source.to_string(), id.to_string()))
            .copied()
    }
}
