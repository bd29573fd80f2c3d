//! Credit card installment scheduling
//!
//! A purchase is split into equal installments, each charged to its own
//! `YYYY-MM` billing cycle. The first cycle depends on the card's cutoff:
//! `visa` and `amex` close on the first Thursday of the month, every other
//! card closes after the 10th.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::card::uses_thursday_cutoff;
use crate::models::{CreditCardPurchase, Money, MonthPeriod, PurchaseId};
use crate::storage::Storage;

use super::{internal_error, overflow_error};

/// `<amount> <vendor> [<card>] [<installments>]`
///
/// The vendor is matched reluctantly so the optional trailing tokens are not
/// swallowed. A card token must contain a non-digit, so a trailing number is
/// always the installment count.
static PURCHASE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d{1,2})?)\s+([\pL\pN\s]+?)(?:\s+(\S*[^\s\d]\S*))?(?:\s+(\d+))?$")
        .expect("valid purchase regex")
});

const DEFAULT_CUTOFF_DAY: u32 = 10;
const MAX_INSTALLMENTS: u32 = 360;

const INVALID_FORMAT: &str =
    "Formato inválido. Usar: \"tarjeta 1000 Supermercado [Visa] [n_cuotas]\".";
const REGISTER_FAILED: &str = "Error interno al registrar la compra de tarjeta.";
const QUERY_FAILED: &str = "Error interno al consultar la tarjeta.";

/// Cutoff of one card in one month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    pub date: NaiveDate,
    /// Purchases made on the cutoff date still belong to the month
    pub inclusive: bool,
}

impl Cutoff {
    /// Whether a purchase at `at` is billed in the cutoff's own month
    pub fn admits(&self, at: NaiveDateTime) -> bool {
        if self.inclusive {
            at.date() <= self.date
        } else {
            at.date() < self.date
        }
    }
}

/// Cutoff of `card_name` in `period`
pub fn cutoff_for(period: MonthPeriod, card_name: Option<&str>) -> Cutoff {
    if uses_thursday_cutoff(card_name) {
        Cutoff {
            date: period
                .nth_weekday(Weekday::Thu, 1)
                .unwrap_or_else(|| period.start_date()),
            inclusive: false,
        }
    } else {
        Cutoff {
            date: NaiveDate::from_ymd_opt(period.year(), period.month(), DEFAULT_CUTOFF_DAY)
                .unwrap_or_else(|| period.start_date()),
            inclusive: true,
        }
    }
}

/// Billing cycle of the first installment of a purchase made at `now`
pub fn first_billing_cycle(now: NaiveDateTime, card_name: Option<&str>) -> MonthPeriod {
    let current = MonthPeriod::containing(now.date());
    if cutoff_for(current, card_name).admits(now) {
        current
    } else {
        current.next()
    }
}

/// `n` consecutive cycles starting at `first`
pub fn billing_cycles(first: MonthPeriod, n: u32) -> Vec<MonthPeriod> {
    std::iter::successors(Some(first), |p| Some(p.next()))
        .take(n as usize)
        .collect()
}

/// Split `total` into `n` installments that add up to `total` exactly
///
/// Every installment gets the truncated share except the last, which also
/// takes the remainder.
pub fn split_installments(total: Money, n: u32) -> Vec<Money> {
    let n = i64::from(n.max(1));
    let base = Money::from_cents(total.cents() / n);
    let remainder = total - base * n;

    let mut amounts = vec![base; n as usize];
    if let Some(last) = amounts.last_mut() {
        *last += remainder;
    }
    amounts
}

/// What `register_purchase` stored, for composing the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub amount: Money,
    pub vendor: String,
    pub card_name: Option<String>,
    /// `(cycle, amount)` of each installment, in cycle order
    pub schedule: Vec<(MonthPeriod, Money)>,
}

impl PurchaseSummary {
    pub fn installments(&self) -> usize {
        self.schedule.len()
    }

    pub fn first_cycle(&self) -> Option<MonthPeriod> {
        self.schedule.first().map(|(cycle, _)| *cycle)
    }
}

struct ParsedPurchase {
    amount: Money,
    vendor: String,
    card_name: Option<String>,
    installments: u32,
}

fn parse_purchase(args: &str) -> LedgerResult<ParsedPurchase> {
    let invalid = || LedgerError::InvalidFormat(INVALID_FORMAT.into());

    let captures = PURCHASE_GRAMMAR.captures(args.trim()).ok_or_else(invalid)?;

    let amount = Money::parse(&captures[1]).map_err(|_| invalid())?;
    if amount.is_zero() || !amount.fits_single_entry() {
        return Err(invalid());
    }

    let vendor = captures[2].trim().to_string();
    if vendor.is_empty() {
        return Err(invalid());
    }

    let card_name = captures.get(3).map(|m| m.as_str().to_string());
    let installments = match captures.get(4) {
        Some(m) => m.as_str().parse::<u32>().map_err(|_| invalid())?.max(1),
        None => 1,
    };
    if installments > MAX_INSTALLMENTS {
        return Err(invalid());
    }

    Ok(ParsedPurchase {
        amount,
        vendor,
        card_name,
        installments,
    })
}

fn to_utc(at: NaiveDateTime) -> chrono::DateTime<Utc> {
    Local
        .from_local_datetime(&at)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&at))
}

/// Service for credit card purchases
pub struct CreditCardScheduler<'a> {
    storage: &'a Storage,
}

impl<'a> CreditCardScheduler<'a> {
    /// Create a new scheduler
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Register a purchase made now
    pub fn register_purchase(
        &self,
        args: &str,
        owner_id: &str,
        owner_name: Option<&str>,
    ) -> LedgerResult<PurchaseSummary> {
        self.register_purchase_at(args, owner_id, owner_name, Local::now().naive_local())
    }

    /// Register a purchase made at local time `now`
    pub fn register_purchase_at(
        &self,
        args: &str,
        owner_id: &str,
        owner_name: Option<&str>,
        now: NaiveDateTime,
    ) -> LedgerResult<PurchaseSummary> {
        let parsed = parse_purchase(args)?;

        let first = first_billing_cycle(now, parsed.card_name.as_deref());
        let cycles = billing_cycles(first, parsed.installments);
        let amounts = split_installments(parsed.amount, parsed.installments);
        let purchased_at = to_utc(now);

        let rows: Vec<CreditCardPurchase> = cycles
            .iter()
            .zip(&amounts)
            .enumerate()
            .map(|(index, (cycle, amount))| CreditCardPurchase {
                id: PurchaseId::new(),
                owner_id: owner_id.to_string(),
                owner_name: owner_name.map(str::to_string),
                amount: *amount,
                vendor: parsed.vendor.clone(),
                card_name: parsed.card_name.clone(),
                billing_cycle: *cycle,
                installment: index as u32 + 1,
                installments: parsed.installments,
                purchased_at,
            })
            .collect();

        self.storage
            .card_purchases
            .insert_batch(rows.clone())
            .map_err(|e| internal_error("Failed to register card purchase", e, REGISTER_FAILED))?;

        info!(
            "Registered card purchase {} at {} in {} installment(s) from {}",
            parsed.amount, parsed.vendor, parsed.installments, first
        );

        let audit_rows: Vec<(String, Option<String>, CreditCardPurchase)> = rows
            .into_iter()
            .map(|row| (row.id.to_string(), Some(row.label()), row))
            .collect();
        if let Err(e) = self
            .storage
            .log_create_batch(EntityType::CardPurchase, &audit_rows)
        {
            warn!("Failed to audit card purchase at {}: {}", parsed.vendor, e);
        }

        Ok(PurchaseSummary {
            amount: parsed.amount,
            vendor: parsed.vendor,
            card_name: parsed.card_name,
            schedule: cycles.into_iter().zip(amounts).collect(),
        })
    }

    /// Sum of the installments charged to `cycle`, zero when there are none
    pub fn monthly_balance(&self, cycle: MonthPeriod) -> LedgerResult<Money> {
        let purchases = self.monthly_purchases(cycle)?;
        Money::checked_sum(purchases.iter().map(|p| p.amount))
            .ok_or_else(|| overflow_error(&format!("Card balance of {}", cycle), QUERY_FAILED))
    }

    /// Installments charged to `cycle`, newest purchase first
    pub fn monthly_purchases(&self, cycle: MonthPeriod) -> LedgerResult<Vec<CreditCardPurchase>> {
        self.storage
            .card_purchases
            .get_by_cycle(cycle)
            .map_err(|e| internal_error("Failed to read card purchases", e, QUERY_FAILED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use chrono::NaiveTime;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    fn cycle(s: &str) -> MonthPeriod {
        MonthPeriod::parse(s).unwrap()
    }

    #[test]
    fn test_grammar() {
        let p = parse_purchase("1500 Amazon").unwrap();
        assert_eq!(p.amount, Money::from_units(1500));
        assert_eq!(p.vendor, "Amazon");
        assert_eq!(p.card_name, None);
        assert_eq!(p.installments, 1);

        let p = parse_purchase("3000 TiendaX 3").unwrap();
        assert_eq!(p.vendor, "TiendaX");
        assert_eq!(p.card_name, None);
        assert_eq!(p.installments, 3);

        let p = parse_purchase("1000.5 Supermercado Visa 6").unwrap();
        assert_eq!(p.amount, Money::from_cents(100_050));
        assert_eq!(p.vendor, "Supermercado");
        assert_eq!(p.card_name.as_deref(), Some("Visa"));
        assert_eq!(p.installments, 6);

        // the last word of a multi-word vendor is read as the card
        let p = parse_purchase("200 Mercado Libre").unwrap();
        assert_eq!(p.vendor, "Mercado");
        assert_eq!(p.card_name.as_deref(), Some("Libre"));

        let p = parse_purchase("200 kiosco 0").unwrap();
        assert_eq!(p.installments, 1);
    }

    #[test]
    fn test_grammar_rejects_malformed_input() {
        for args in [
            "invalid_format_string",
            "",
            "1000",
            "10.123 Amazon",
            "0 Amazon",
            "0.00 Amazon",
            "-50 Amazon",
            "100 Amazon visa 99999999999",
            "100 Amazon 361",
            "1000000000000.01 Amazon",
            "92233720368547758 Amazon",
        ] {
            let err = parse_purchase(args).err();
            assert!(
                matches!(err, Some(LedgerError::InvalidFormat(_))),
                "args {:?}",
                args
            );
        }
    }

    #[test]
    fn test_split_sums_exactly() {
        let amounts = split_installments(Money::from_units(1000), 3);
        assert_eq!(
            amounts,
            vec![
                Money::from_cents(33_333),
                Money::from_cents(33_333),
                Money::from_cents(33_334)
            ]
        );

        for cents in [1, 99, 100, 99_999, 300_000, 123_457] {
            for n in 1..=13 {
                let total = Money::from_cents(cents);
                let parts = split_installments(total, n);
                assert_eq!(parts.len(), n as usize);
                assert_eq!(
                    Money::checked_sum(parts.iter().copied()),
                    Some(total),
                    "{} / {}",
                    cents,
                    n
                );
            }
        }
    }

    #[test]
    fn test_default_cutoff_boundary() {
        assert_eq!(first_billing_cycle(at(2025, 5, 5, 12), None), cycle("2025-05"));
        assert_eq!(first_billing_cycle(at(2025, 5, 10, 23), None), cycle("2025-05"));
        assert_eq!(first_billing_cycle(at(2025, 5, 11, 0), None), cycle("2025-06"));
        assert_eq!(
            first_billing_cycle(at(2025, 12, 20, 9), Some("master")),
            cycle("2026-01")
        );
    }

    #[test]
    fn test_thursday_cutoff_boundary() {
        // first Thursday of April 2025 is the 3rd, of May the 1st
        assert_eq!(first_billing_cycle(at(2025, 4, 2, 23), Some("visa")), cycle("2025-04"));
        assert_eq!(first_billing_cycle(at(2025, 4, 30, 23), Some("visa")), cycle("2025-05"));
        assert_eq!(first_billing_cycle(at(2025, 5, 1, 0), Some("VISA")), cycle("2025-06"));
        // first Thursday of June 2025 is the 5th
        assert_eq!(first_billing_cycle(at(2025, 6, 4, 18), Some("amex")), cycle("2025-06"));
        assert_eq!(first_billing_cycle(at(2025, 6, 5, 8), Some("amex")), cycle("2025-07"));
        // the 2nd is before June's Thursday even though May's fell on the 1st
        assert_eq!(first_billing_cycle(at(2025, 6, 2, 8), Some("visa")), cycle("2025-06"));
    }

    #[test]
    fn test_billing_cycles_are_consecutive() {
        let cycles = billing_cycles(cycle("2025-11"), 4);
        let names: Vec<String> = cycles.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
        assert!(cycles.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_register_single_payment() {
        let (_temp, storage) = create_test_storage();
        let scheduler = CreditCardScheduler::new(&storage);

        let summary = scheduler
            .register_purchase_at("1500 Amazon", "200213027", Some("usuario_test"), at(2025, 5, 5, 12))
            .unwrap();
        assert_eq!(summary.installments(), 1);
        assert_eq!(summary.first_cycle(), Some(cycle("2025-05")));

        let rows = scheduler.monthly_purchases(cycle("2025-05")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Money::from_units(1500));
        assert_eq!(rows[0].vendor, "Amazon");
        assert_eq!(rows[0].owner_name.as_deref(), Some("usuario_test"));
    }

    #[test]
    fn test_register_installments() {
        let (_temp, storage) = create_test_storage();
        let scheduler = CreditCardScheduler::new(&storage);

        let summary = scheduler
            .register_purchase_at("3000 TiendaX 3", "200213027", None, at(2025, 5, 5, 12))
            .unwrap();
        assert_eq!(
            summary.schedule,
            vec![
                (cycle("2025-05"), Money::from_units(1000)),
                (cycle("2025-06"), Money::from_units(1000)),
                (cycle("2025-07"), Money::from_units(1000)),
            ]
        );

        let summary = scheduler
            .register_purchase_at("1000 TiendaY visa 3", "200213027", None, at(2025, 5, 11, 12))
            .unwrap();
        let amounts: Vec<Money> = summary.schedule.iter().map(|(_, a)| *a).collect();
        assert_eq!(
            amounts,
            vec![
                Money::from_cents(33_333),
                Money::from_cents(33_333),
                Money::from_cents(33_334)
            ]
        );
        assert_eq!(summary.first_cycle(), Some(cycle("2025-06")));
        assert_eq!(storage.card_purchases.count().unwrap(), 6);

        let july = scheduler.monthly_purchases(cycle("2025-07")).unwrap();
        // newest purchase first
        assert_eq!(july[0].vendor, "TiendaY");
        assert_eq!(july[0].installment, 2);
        assert_eq!(july[1].vendor, "TiendaX");
        assert_eq!(july[1].installment, 3);
        assert_eq!(july[1].installments, 3);
    }

    #[test]
    fn test_after_cutoff_rolls_to_next_month() {
        let (_temp, storage) = create_test_storage();
        let scheduler = CreditCardScheduler::new(&storage);

        let summary = scheduler
            .register_purchase_at("500 PagoWeb 2", "1", None, at(2025, 5, 11, 12))
            .unwrap();
        let cycles: Vec<MonthPeriod> = summary.schedule.iter().map(|(c, _)| *c).collect();
        assert_eq!(cycles, vec![cycle("2025-06"), cycle("2025-07")]);
    }

    #[test]
    fn test_monthly_balance() {
        let (_temp, storage) = create_test_storage();
        let scheduler = CreditCardScheduler::new(&storage);
        scheduler.register_purchase_at("200 kiosco", "1", None, at(2025, 5, 2, 10)).unwrap();
        scheduler.register_purchase_at("300 farmacia", "1", None, at(2025, 5, 3, 10)).unwrap();
        scheduler.register_purchase_at("150 libreria", "1", None, at(2025, 5, 20, 10)).unwrap();

        assert_eq!(scheduler.monthly_balance(cycle("2025-05")).unwrap(), Money::from_units(500));
        assert_eq!(scheduler.monthly_balance(cycle("2025-06")).unwrap(), Money::from_units(150));
        assert_eq!(scheduler.monthly_balance(cycle("2025-07")).unwrap(), Money::zero());
    }

    #[test]
    fn test_monthly_balance_out_of_range_is_internal() {
        let (_temp, storage) = create_test_storage();
        let huge = Money::from_cents(i64::MAX / 2 + 1);
        let rows = (0..2)
            .map(|_| CreditCardPurchase {
                id: PurchaseId::new(),
                owner_id: "1".into(),
                owner_name: None,
                amount: huge,
                vendor: "legacy".into(),
                card_name: None,
                billing_cycle: cycle("2025-05"),
                installment: 1,
                installments: 1,
                purchased_at: Utc::now(),
            })
            .collect();
        storage.card_purchases.insert_batch(rows).unwrap();

        let err = CreditCardScheduler::new(&storage)
            .monthly_balance(cycle("2025-05"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(err.to_string(), QUERY_FAILED);
    }

    #[test]
    fn test_failed_write_rolls_back_every_installment() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();
        std::fs::create_dir_all(paths.card_purchases_file().join("blocker")).unwrap();

        let scheduler = CreditCardScheduler::new(&storage);
        let err = scheduler
            .register_purchase_at("3000 TiendaX 3", "1", None, at(2025, 5, 5, 12))
            .unwrap_err();

        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(err.to_string(), REGISTER_FAILED);
        assert_eq!(storage.card_purchases.count().unwrap(), 0);
        assert!(storage.audit().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_register_audits_each_installment() {
        let (_temp, storage) = create_test_storage();
        CreditCardScheduler::new(&storage)
            .register_purchase_at("900 TiendaX amex 3", "1", None, at(2025, 5, 5, 12))
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.entity_type == EntityType::CardPurchase));
        assert_eq!(entries[0].entity_name.as_deref(), Some("TiendaX (amex)"));
    }
}
