//! Transaction ledger service
//!
//! Registers income and outgo from command arguments and answers the
//! aggregate queries over a month: totals, per-category breakdown and the
//! filtered listing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, MonthPeriod, Transaction, TransactionId, TransactionType};
use crate::storage::Storage;

use super::filter::FilterCriteria;
use super::{internal_error, overflow_error};

/// `<amount:int> <rest>`
static AMOUNT_AND_REST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+(.*)$").expect("valid transaction regex"));

const REGISTER_FAILED: &str = "Ocurrió un error al registrar la transacción.";
const QUERY_FAILED: &str = "Ocurrió un error al consultar los movimientos.";

/// What `register` stored, for composing the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub id: TransactionId,
    pub kind: TransactionType,
    /// Signed amount as stored
    pub amount: Money,
    pub category: String,
    pub subcategory: Option<String>,
}

impl TransactionSummary {
    /// `category` or `category / subcategory`
    pub fn location(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{} / {}", self.category, sub),
            None => self.category.clone(),
        }
    }
}

impl From<&Transaction> for TransactionSummary {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id,
            kind: txn.kind,
            amount: txn.amount,
            category: txn.category.clone(),
            subcategory: txn.subcategory.clone(),
        }
    }
}

/// Income and outgo totals for a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    pub income: Money,
    /// Magnitude of the month's outgo (never negative)
    pub outgo: Money,
    pub balance: Money,
}

/// One `(type, category)` group of a month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub kind: TransactionType,
    pub category: String,
    /// Signed sum of the group's amounts
    pub total: Money,
    pub count: usize,
}

/// Service for registering and aggregating transactions
pub struct TransactionLedger<'a> {
    storage: &'a Storage,
    currency: String,
}

impl<'a> TransactionLedger<'a> {
    /// Create a new ledger service
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            currency: "$".to_string(),
        }
    }

    /// Use `symbol` when rendering reports
    pub fn with_currency(mut self, symbol: impl Into<String>) -> Self {
        self.currency = symbol.into();
        self
    }

    /// Register a transaction dated today
    pub fn register(
        &self,
        raw_type: &str,
        args: &str,
        owner_id: &str,
        owner_name: Option<&str>,
    ) -> LedgerResult<TransactionSummary> {
        self.register_on(
            raw_type,
            args,
            owner_id,
            owner_name,
            chrono::Local::now().date_naive(),
        )
    }

    /// Register a transaction dated `date`
    pub fn register_on(
        &self,
        raw_type: &str,
        args: &str,
        owner_id: &str,
        owner_name: Option<&str>,
        date: NaiveDate,
    ) -> LedgerResult<TransactionSummary> {
        let kind = TransactionType::from_command(raw_type).ok_or_else(|| {
            LedgerError::InvalidType("Tipo inválido. Usá \"ingreso\" o \"gasto\".".into())
        })?;

        let invalid_format = || {
            LedgerError::InvalidFormat(format!(
                "Formato inválido. Usá: \"{} 1000 sueldo\".",
                kind.command_word()
            ))
        };

        let captures = AMOUNT_AND_REST
            .captures(args.trim())
            .ok_or_else(invalid_format)?;
        let units: i64 = captures[1].parse().map_err(|_| invalid_format())?;
        let magnitude = units
            .checked_mul(100)
            .map(Money::from_cents)
            .ok_or_else(invalid_format)?;

        let rest = captures[2].trim();
        let (category, subcategory) = match rest.split_once(char::is_whitespace) {
            Some((category, sub)) => (category, Some(sub.trim().to_string())),
            None => (rest, None),
        };
        if category.is_empty() {
            return Err(invalid_format());
        }

        let mut txn = Transaction::new(kind, magnitude, category, owner_id, date);
        txn.subcategory = subcategory.filter(|s| !s.is_empty());
        txn.owner_name = owner_name.map(str::to_string);

        txn.validate().map_err(|e| {
            debug!("Rejected {} {:?}: {}", kind, args, e);
            invalid_format()
        })?;

        self.storage
            .transactions
            .insert(txn.clone())
            .map_err(|e| internal_error("Failed to register transaction", e, REGISTER_FAILED))?;

        info!(
            "Registered {} {} in {}",
            txn.kind,
            txn.amount,
            txn.location()
        );
        if let Err(e) = self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.location()),
            &txn,
        ) {
            warn!("Failed to audit transaction {}: {}", txn.id, e);
        }

        Ok(TransactionSummary::from(&txn))
    }

    fn transactions_in(&self, period: MonthPeriod) -> LedgerResult<Vec<Transaction>> {
        self.storage
            .transactions
            .get_by_period(period)
            .map_err(|e| internal_error("Failed to read transactions", e, QUERY_FAILED))
    }

    /// Income, outgo and balance for a month
    pub fn balance(&self, period: MonthPeriod) -> LedgerResult<BalanceSummary> {
        let transactions = self.transactions_in(period)?;
        let out_of_range = || overflow_error(&format!("Balance of {}", period), QUERY_FAILED);

        let income = Money::checked_sum(
            transactions
                .iter()
                .filter(|t| t.is_income())
                .map(|t| t.amount),
        )
        .ok_or_else(out_of_range)?;
        let signed_outgo = Money::checked_sum(
            transactions
                .iter()
                .filter(|t| t.is_outgo())
                .map(|t| t.amount),
        )
        .ok_or_else(out_of_range)?;

        Ok(BalanceSummary {
            income,
            outgo: signed_outgo.checked_abs().ok_or_else(out_of_range)?,
            balance: income.checked_add(signed_outgo).ok_or_else(out_of_range)?,
        })
    }

    /// Totals grouped by type and category, ordered by type then category
    pub fn category_breakdown(&self, period: MonthPeriod) -> LedgerResult<Vec<CategoryTotal>> {
        let mut groups: BTreeMap<(TransactionType, String), (Money, usize)> = BTreeMap::new();

        for txn in self.transactions_in(period)? {
            let entry = groups
                .entry((txn.kind, txn.category))
                .or_insert((Money::zero(), 0));
            entry.0 = entry.0.checked_add(txn.amount).ok_or_else(|| {
                overflow_error(&format!("Category totals of {}", period), QUERY_FAILED)
            })?;
            entry.1 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|((kind, category), (total, count))| CategoryTotal {
                kind,
                category,
                total,
                count,
            })
            .collect())
    }

    /// Per-category report with a month-name header
    pub fn balance_per_category(&self, period: MonthPeriod) -> LedgerResult<String> {
        let groups = self.category_breakdown(period)?;
        let header = format!("Resumen de {} {}", period.month_name(), period.year());

        if groups.is_empty() {
            return Ok(format!("{}\n\nSin movimientos.", header));
        }

        let mut report = format!("{}\n", header);
        for group in &groups {
            report.push_str(&format!(
                "\n• {} - {}: {} ({} tx)",
                group.kind.command_word(),
                group.category,
                group.total.abs().format_compact(&self.currency),
                group.count
            ));
        }
        Ok(report)
    }

    /// Transactions of the filter's month narrowed by type and category
    pub fn filtered_transactions(&self, criteria: &FilterCriteria) -> LedgerResult<Vec<Transaction>> {
        let period = criteria.period()?;
        Ok(self
            .transactions_in(period)?
            .into_iter()
            .filter(|t| criteria.matches(t.kind, &t.category))
            .collect())
    }

    /// Running total after each of `transactions`
    pub fn running_totals(transactions: &[Transaction]) -> LedgerResult<Vec<Money>> {
        let mut running = Money::zero();
        transactions
            .iter()
            .map(|txn| -> LedgerResult<Money> {
                running = running
                    .checked_add(txn.amount)
                    .ok_or_else(|| overflow_error("Running total", QUERY_FAILED))?;
                Ok(running)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::services::filter::FilterValidator;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn may_2025() -> MonthPeriod {
        MonthPeriod::new(2025, 5).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_register_outgo_with_subcategory() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);

        let summary = ledger
            .register_on("gasto", "500 servicios metrogas", "123", Some("ana"), day(5))
            .unwrap();

        assert_eq!(summary.kind, TransactionType::Outgo);
        assert_eq!(summary.amount, Money::from_units(-500));
        assert_eq!(summary.category, "servicios");
        assert_eq!(summary.subcategory.as_deref(), Some("metrogas"));
        assert_eq!(summary.location(), "servicios / metrogas");

        let stored = storage.transactions.get_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, Money::from_units(-500));
        assert_eq!(stored[0].owner_name.as_deref(), Some("ana"));
        assert!(stored[0].validate().is_ok());
    }

    #[test]
    fn test_register_without_subcategory() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);

        let summary = ledger
            .register_on("gasto", "800 supermercado", "123", None, day(5))
            .unwrap();
        assert_eq!(summary.subcategory, None);

        let income = ledger
            .register_on("INGRESO", "1000 sueldo  enero extra ", "123", None, day(5))
            .unwrap();
        assert_eq!(income.amount, Money::from_units(1000));
        assert_eq!(income.subcategory.as_deref(), Some("enero extra"));
    }

    #[test]
    fn test_register_rejects_unknown_type() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);

        let err = ledger
            .register_on("compra", "500 comida", "123", None, day(5))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidType(_)));
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_register_rejects_bad_format() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);

        for args in [
            "",
            "500",
            "comida 500",
            "12.5 comida",
            "-5 comida",
            "99999999999999999999 x",
            "90000000000000000 a",
            "1000000000001 a",
        ] {
            let err = ledger
                .register_on("gasto", args, "123", None, day(5))
                .unwrap_err();
            assert!(
                matches!(err, LedgerError::InvalidFormat(_)),
                "args {:?} gave {:?}",
                args,
                err
            );
        }
        let err = ledger
            .register_on("ingreso", "x", "123", None, day(5))
            .unwrap_err();
        assert_eq!(err.to_string(), "Formato inválido. Usá: \"ingreso 1000 sueldo\".");
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_register_writes_audit_entry() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);
        ledger
            .register_on("gasto", "500 comida", "123", None, day(5))
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_type, EntityType::Transaction);
    }

    #[test]
    fn test_register_persistence_failure_is_internal() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();
        std::fs::create_dir_all(paths.transactions_file().join("blocker")).unwrap();

        let ledger = TransactionLedger::new(&storage);
        let err = ledger
            .register_on("gasto", "500 comida", "123", None, day(5))
            .unwrap_err();

        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(err.to_string(), REGISTER_FAILED);
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_balance() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);
        ledger.register_on("ingreso", "1000 sueldo", "1", None, day(1)).unwrap();
        ledger.register_on("gasto", "300 comida", "1", None, day(2)).unwrap();
        ledger.register_on("gasto", "500 servicios luz", "1", None, day(3)).unwrap();
        // other month
        ledger
            .register_on("gasto", "999 viaje", "1", None, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .unwrap();

        let balance = ledger.balance(may_2025()).unwrap();
        assert_eq!(balance.income, Money::from_units(1000));
        assert_eq!(balance.outgo, Money::from_units(800));
        assert_eq!(balance.balance, Money::from_units(200));

        let empty = ledger.balance(MonthPeriod::new(2025, 1).unwrap()).unwrap();
        assert_eq!(empty, BalanceSummary::default());
    }

    #[test]
    fn test_category_breakdown_is_grouped_and_ordered() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);
        ledger.register_on("gasto", "300 comida", "1", None, day(2)).unwrap();
        ledger.register_on("gasto", "200 comida", "1", None, day(3)).unwrap();
        ledger.register_on("gasto", "100 bar", "1", None, day(3)).unwrap();
        ledger.register_on("ingreso", "1000 sueldo", "1", None, day(1)).unwrap();

        let groups = ledger.category_breakdown(may_2025()).unwrap();
        let keys: Vec<_> = groups
            .iter()
            .map(|g| (g.kind, g.category.as_str(), g.total, g.count))
            .collect();
        assert_eq!(
            keys,
            vec![
                (TransactionType::Income, "sueldo", Money::from_units(1000), 1),
                (TransactionType::Outgo, "bar", Money::from_units(-100), 1),
                (TransactionType::Outgo, "comida", Money::from_units(-500), 2),
            ]
        );

        let report = ledger.balance_per_category(may_2025()).unwrap();
        assert!(report.starts_with("Resumen de mayo 2025"));
        assert!(report.contains("• gasto - comida: $500 (2 tx)"));
        assert!(report.contains("• ingreso - sueldo: $1000 (1 tx)"));
    }

    #[test]
    fn test_register_accepts_single_entry_limit() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);
        let summary = ledger
            .register_on("ingreso", "1000000000000 herencia", "1", None, day(5))
            .unwrap();
        assert_eq!(summary.amount, Money::MAX_ENTRY);
    }

    #[test]
    fn test_totals_out_of_range_are_internal() {
        let (_temp, storage) = create_test_storage();
        let huge = Money::from_cents(i64::MAX / 2 + 1);
        for category in ["a", "a"] {
            // rows written by an older build without the entry limit
            storage
                .transactions
                .insert(Transaction::new(TransactionType::Income, huge, category, "1", day(5)))
                .unwrap();
        }
        let ledger = TransactionLedger::new(&storage);

        let err = ledger.balance(may_2025()).unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(err.to_string(), QUERY_FAILED);
        assert!(matches!(
            ledger.category_breakdown(may_2025()),
            Err(LedgerError::Internal(_))
        ));

        let rows = storage.transactions.get_all().unwrap();
        assert!(matches!(
            TransactionLedger::running_totals(&rows),
            Err(LedgerError::Internal(_))
        ));
        assert_eq!(
            TransactionLedger::running_totals(&rows[..1]).unwrap(),
            vec![huge]
        );
    }

    #[test]
    fn test_balance_per_category_empty_month() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);
        let report = ledger.balance_per_category(may_2025()).unwrap();
        assert_eq!(report, "Resumen de mayo 2025\n\nSin movimientos.");
    }

    #[test]
    fn test_filtered_transactions() {
        let (_temp, storage) = create_test_storage();
        let ledger = TransactionLedger::new(&storage);
        ledger.register_on("gasto", "300 comida", "1", None, day(9)).unwrap();
        ledger.register_on("gasto", "200 Comida", "1", None, day(2)).unwrap();
        ledger.register_on("ingreso", "50 comida", "1", None, day(4)).unwrap();
        ledger.register_on("gasto", "100 bar", "1", None, day(3)).unwrap();

        let today = day(20);
        let criteria = FilterValidator::parse_at("gasto comida", today).unwrap();
        let found = ledger.filtered_transactions(&criteria).unwrap();
        let amounts: Vec<_> = found.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![Money::from_units(-200), Money::from_units(-300)]);

        let all = FilterValidator::parse_at("", today).unwrap();
        assert_eq!(ledger.filtered_transactions(&all).unwrap().len(), 4);

        let other_month = FilterValidator::parse_at("junio", today).unwrap();
        assert!(ledger.filtered_transactions(&other_month).unwrap().is_empty());
    }
}
