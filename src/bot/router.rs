//! Command routing
//!
//! Splits incoming text into a command word and its arguments, runs the
//! matching service and renders the reply. Errors never escape `dispatch`:
//! they become the reply text.

use chrono::{Datelike, Local, NaiveDateTime};
use log::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::models::period::{month_from_name, month_name};
use crate::models::{Money, MonthPeriod, TransactionType};
use crate::services::{
    ClosureService, CreditCardScheduler, FilterCriteria, FilterValidator, TransactionLedger,
};
use crate::storage::Storage;

use super::message::ReplyFormat;

/// Reply for unknown or empty commands
pub const HELP_TEXT: &str = "Comando desconocido. Opciones:\n\
• ingreso <monto> <categoría> [<rubro>]\n\
• gasto <monto> <categoría> [<rubro>]\n\
• balance\n\
• filtro_balance [<mes>]\n\
• filtro_tx [<tipo>] [<categoría>] [<mes>] [<año>]\n\
• cierre [<mes>]\n\
• tarjeta <monto> <vendor> [<card_name>] [<n_cuotas>]\n\
• tarjeta_balance [<mes>]";

/// Who sent the command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub chat_id: String,
    pub display_name: Option<String>,
}

impl CallerContext {
    pub fn new(chat_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            display_name,
        }
    }
}

/// Recognized command words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Register(TransactionType),
    Balance,
    FilterBalance,
    FilterTransactions,
    Close,
    Card,
    CardBalance,
}

impl Command {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "ingreso" | "gasto" => TransactionType::from_command(word).map(Self::Register),
            "balance" => Some(Self::Balance),
            "filtro_balance" => Some(Self::FilterBalance),
            "filtro_tx" => Some(Self::FilterTransactions),
            "cierre" => Some(Self::Close),
            "tarjeta" => Some(Self::Card),
            "tarjeta_balance" => Some(Self::CardBalance),
            _ => None,
        }
    }

    /// Formatting hint for the transport
    pub fn reply_format(&self) -> ReplyFormat {
        match self {
            Self::FilterBalance | Self::FilterTransactions | Self::CardBalance => {
                ReplyFormat::Monospace
            }
            _ => ReplyFormat::Plain,
        }
    }
}

/// Maps free text to service calls
pub struct CommandRouter<'a> {
    storage: &'a Storage,
    currency: String,
}

impl<'a> CommandRouter<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            currency: "$".to_string(),
        }
    }

    /// Use `symbol` in every amount of the replies
    pub fn with_currency(mut self, symbol: impl Into<String>) -> Self {
        self.currency = symbol.into();
        self
    }

    /// Re-read the data files before the next command
    pub fn refresh(&self) -> LedgerResult<()> {
        self.storage.refresh()
    }

    /// Split text into `(command, args)`
    ///
    /// The text is trimmed and lowercased; a leading `/` and a `@botname`
    /// suffix on the command word are dropped.
    pub fn route(text: &str) -> (String, String) {
        let text = text.trim().to_lowercase();
        let text = text.strip_prefix('/').unwrap_or(&text);

        let (command, args) = match text.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (text, ""),
        };
        let command = command.split('@').next().unwrap_or(command);

        (command.to_string(), args.to_string())
    }

    /// Route and dispatch a raw message at the current local time
    pub fn handle(&self, text: &str, caller: &CallerContext) -> String {
        let (command, args) = Self::route(text);
        self.dispatch(&command, &args, caller)
    }

    /// Run a command at the current local time
    pub fn dispatch(&self, command: &str, args: &str, caller: &CallerContext) -> String {
        self.dispatch_at(command, args, caller, Local::now().naive_local())
    }

    /// Run a command as if it arrived at local time `now`
    pub fn dispatch_at(
        &self,
        command: &str,
        args: &str,
        caller: &CallerContext,
        now: NaiveDateTime,
    ) -> String {
        let Some(parsed) = Command::from_word(command) else {
            debug!("Unknown command {:?}", command);
            return HELP_TEXT.to_string();
        };

        let result = match parsed {
            Command::Register(kind) => self.register(kind.command_word(), args, caller, now),
            Command::Balance => self.balance(now),
            Command::FilterBalance => self.filter_balance(args, now),
            Command::FilterTransactions => self.filter_transactions(args, now),
            Command::Close => self.close(args, now),
            Command::Card => self.card(args, caller, now),
            Command::CardBalance => self.card_balance(args, now),
        };

        result.unwrap_or_else(|e| e.to_string())
    }

    fn money(&self, amount: Money) -> String {
        amount.format_compact(&self.currency)
    }

    fn ledger(&self) -> TransactionLedger<'a> {
        TransactionLedger::new(self.storage).with_currency(self.currency.clone())
    }

    fn register(
        &self,
        raw_type: &str,
        args: &str,
        caller: &CallerContext,
        now: NaiveDateTime,
    ) -> LedgerResult<String> {
        let summary = self.ledger().register_on(
            raw_type,
            args,
            &caller.chat_id,
            caller.display_name.as_deref(),
            now.date(),
        )?;

        Ok(format!(
            "Registrado: {} de {} en {}",
            raw_type,
            self.money(summary.amount.abs()),
            summary.location()
        ))
    }

    fn balance(&self, now: NaiveDateTime) -> LedgerResult<String> {
        let period = MonthPeriod::containing(now.date());
        let totals = self.ledger().balance(period)?;

        Ok(format!(
            "Balance actual:\nIngresos: {}\nGastos: {}\nSaldo: {}",
            self.money(totals.income),
            self.money(totals.outgo),
            self.money(totals.balance)
        ))
    }

    fn filter_balance(&self, args: &str, now: NaiveDateTime) -> LedgerResult<String> {
        let period = resolve_month(
            args,
            now,
            "Mes inválido. Usar “filtro_balance mayo” o “filtro_balance” para mes actual.",
        )?;
        self.ledger().balance_per_category(period)
    }

    fn filter_transactions(&self, args: &str, now: NaiveDateTime) -> LedgerResult<String> {
        let criteria = FilterValidator::parse_at(args, now.date())?;
        let transactions = self.ledger().filtered_transactions(&criteria)?;
        let scope = describe_filter(&criteria);

        if transactions.is_empty() {
            return Ok(format!("No hay movimientos para {}.", scope));
        }

        let totals = TransactionLedger::running_totals(&transactions)?;
        let mut lines = vec![format!("Movimientos de {}:", scope)];
        for (txn, running) in transactions.iter().zip(&totals) {
            lines.push(format!(
                "{} {} {}: {} (acum. {})",
                txn.date.format("%d/%m"),
                txn.kind.command_word(),
                txn.location(),
                self.money(txn.amount),
                self.money(*running)
            ));
        }
        let total = totals.last().copied().unwrap_or_default();
        lines.push(format!("Total: {}", self.money(total)));

        Ok(lines.join("\n"))
    }

    fn close(&self, args: &str, now: NaiveDateTime) -> LedgerResult<String> {
        let period = resolve_month(
            args,
            now,
            "Mes inválido. Usar: “cierre mayo” o simplemente “cierre” para mes actual.",
        )?;
        let closure = ClosureService::new(self.storage).close_month(period.month(), period.year())?;

        Ok(format!(
            "Cierre de {} {}:\nIngresos: {}\nGastos: {}\nSaldo: {}",
            period.month_name(),
            period.year(),
            self.money(closure.income),
            self.money(closure.outgo),
            self.money(closure.balance)
        ))
    }

    fn card(&self, args: &str, caller: &CallerContext, now: NaiveDateTime) -> LedgerResult<String> {
        let summary = CreditCardScheduler::new(self.storage).register_purchase_at(
            args,
            &caller.chat_id,
            caller.display_name.as_deref(),
            now,
        )?;

        let mut reply = format!(
            "Compra con tarjeta registrada: {} en {}",
            self.money(summary.amount),
            summary.vendor
        );
        if let Some(card) = &summary.card_name {
            reply.push_str(&format!(" ({})", card));
        }
        if let (Some(first), Some((last, _))) = (summary.first_cycle(), summary.schedule.last()) {
            if summary.installments() > 1 {
                reply.push_str(&format!(
                    "\n{} cuotas, de {} a {}",
                    summary.installments(),
                    first,
                    last
                ));
            } else {
                reply.push_str(&format!("\nCiclo: {}", first));
            }
        }
        Ok(reply)
    }

    fn card_balance(&self, args: &str, now: NaiveDateTime) -> LedgerResult<String> {
        let period = resolve_month(
            args,
            now,
            "Mes inválido. Usar “tarjeta_balance mayo” o “tarjeta_balance” para mes actual.",
        )?;
        let scheduler = CreditCardScheduler::new(self.storage);
        let total = scheduler.monthly_balance(period)?;
        let purchases = scheduler.monthly_purchases(period)?;

        let mut reply = format!(
            "Balance tarjeta para {} {}: {}",
            period.month_name(),
            period.year(),
            self.money(total)
        );
        for purchase in &purchases {
            reply.push_str(&format!("\n• {}", purchase.label()));
            if purchase.is_installment_plan() {
                reply.push_str(&format!(
                    " cuota {}/{}",
                    purchase.installment, purchase.installments
                ));
            }
            reply.push_str(&format!(": {}", self.money(purchase.amount)));
        }
        Ok(reply)
    }
}

/// Month of the current year named by `args`, or the current month
fn resolve_month(args: &str, now: NaiveDateTime, usage: &str) -> LedgerResult<MonthPeriod> {
    let today = now.date();
    let key = args.trim();
    if key.is_empty() {
        return Ok(MonthPeriod::containing(today));
    }

    let month = month_from_name(key).or_else(|| key.parse::<u32>().ok());
    month
        .and_then(|m| MonthPeriod::new(today.year(), m).ok())
        .ok_or_else(|| LedgerError::InvalidMonth(usage.to_string()))
}

fn describe_filter(criteria: &FilterCriteria) -> String {
    let mut parts = Vec::new();
    if let Some(kind) = criteria.kind {
        parts.push(kind.command_word().to_string());
    }
    if let Some(category) = &criteria.category {
        parts.push(category.clone());
    }
    parts.push(format!(
        "{} {}",
        month_name(criteria.month).unwrap_or("?"),
        criteria.year
    ));
    parts.join(" / ")
}
