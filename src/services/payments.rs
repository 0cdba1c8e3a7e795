// src/services/payments.rs

//! Payment history and totals.
//!
//! The ledger is append-only and its file order is taken as chronological;
//! nothing here re-sorts by timestamp.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Lecture, LectureId, Payment, PaymentKind};
use crate::storage::{EntityStore, Record};

/// Month label for payments whose timestamp cannot be read.
pub const UNKNOWN_MONTH: &str = "unknown";

/// A payment with its item name resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLine {
    pub payment_id: String,
    pub lecture_id: LectureId,
    /// Lecture title or textbook name; the lecture ID when unknown
    pub item_name: String,
    pub amount: i64,
    pub kind: PaymentKind,
    pub method: String,
    pub paid_at: String,
    pub status: String,
}

/// Totals over one user's payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub user_id: String,
    /// Signed sum, spending is negative
    pub total: i64,
    pub lecture_total: i64,
    pub textbook_total: i64,
    pub count: usize,
    /// Most recent lines, oldest first
    pub recent: Vec<PaymentLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`, or [`UNKNOWN_MONTH`]
    pub month: String,
    pub total: i64,
    pub count: usize,
}

pub struct PaymentAggregator<'a> {
    payments: &'a EntityStore<Payment>,
    lectures: &'a EntityStore<Lecture>,
}

impl<'a> PaymentAggregator<'a> {
    pub fn new(payments: &'a EntityStore<Payment>, lectures: &'a EntityStore<Lecture>) -> Self {
        Self { payments, lectures }
    }

    /// The user's payments in file order.
    pub fn find_by_user(&self, user_id: &str) -> Vec<Payment> {
        self.payments.find_by_foreign_key(user_id.trim())
    }

    /// Signed sum of the amounts, reported as-is.
    pub fn total(payments: &[Payment]) -> i64 {
        payments.iter().map(|p| p.amount).sum()
    }

    /// The last `n` payments in file order.
    pub fn recent(payments: &[Payment], n: usize) -> &[Payment] {
        &payments[payments.len().saturating_sub(n)..]
    }

    /// The user's payments with item names resolved.
    pub fn history(&self, user_id: &str) -> Vec<PaymentLine> {
        self.find_by_user(user_id)
            .iter()
            .map(|payment| self.line(payment))
            .collect()
    }

    pub fn summary(&self, user_id: &str, recent: usize) -> PaymentSummary {
        let payments = self.find_by_user(user_id);
        let total_of = |kind: PaymentKind| -> i64 {
            payments
                .iter()
                .filter(|p| p.kind == kind)
                .map(|p| p.amount)
                .sum()
        };

        PaymentSummary {
            user_id: user_id.to_string(),
            total: Self::total(&payments),
            lecture_total: total_of(PaymentKind::Lecture),
            textbook_total: total_of(PaymentKind::Textbook),
            count: payments.len(),
            recent: Self::recent(&payments, recent)
                .iter()
                .map(|payment| self.line(payment))
                .collect(),
        }
    }

    /// Signed totals per calendar month, ascending.
    pub fn monthly_totals(payments: &[Payment]) -> Vec<MonthlyTotal> {
        let mut months: BTreeMap<String, (i64, usize)> = BTreeMap::new();
        for payment in payments {
            let month = payment
                .timestamp()
                .map(|ts| ts.format("%Y-%m").to_string())
                .unwrap_or_else(|| UNKNOWN_MONTH.to_string());
            let entry = months.entry(month).or_default();
            entry.0 += payment.amount;
            entry.1 += 1;
        }

        months
            .into_iter()
            .map(|(month, (total, count))| MonthlyTotal { month, total, count })
            .collect()
    }

    /// Append a payment to the ledger; a payment ID already recorded is
    /// rejected.
    pub fn record(&self, payment: Payment) -> Result<()> {
        let (id, user_id, amount) = (payment.id.clone(), payment.user_id.clone(), payment.amount);
        self.payments.append(payment)?;
        log::info!(
            "Recorded {} {} for {} ({})",
            Payment::FORMAT.name,
            id,
            user_id,
            amount
        );
        Ok(())
    }

    fn line(&self, payment: &Payment) -> PaymentLine {
        let lecture = self.lectures.find_by_id(&payment.lecture_id);
        let item_name = match (payment.kind, lecture) {
            (PaymentKind::Textbook, Some(lecture)) => lecture.textbook.unwrap_or(lecture.title),
            (PaymentKind::Lecture, Some(lecture)) => lecture.title,
            (_, None) => payment.lecture_id.to_string(),
        };

        PaymentLine {
            payment_id: payment.id.clone(),
            lecture_id: payment.lecture_id,
            item_name,
            amount: payment.amount,
            kind: payment.kind,
            method: payment.method.clone(),
            paid_at: payment.paid_at.clone(),
            status: payment.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::fixtures;

    fn payment(id: &str, amount: i64) -> Payment {
        Payment {
            id: id.to_string(),
            user_id: "u1".to_string(),
            lecture_id: LectureId::new(1),
            amount,
            kind: PaymentKind::Lecture,
            method: "카드".to_string(),
            paid_at: "2025-03-02 14:30:00".to_string(),
            status: "완료".to_string(),
        }
    }

    #[test]
    fn test_total_is_signed_sum() {
        let payments = vec![payment("P1", -150000), payment("P2", -25000)];
        assert_eq!(PaymentAggregator::total(&payments), -175000);
        assert_eq!(PaymentAggregator::total(&[]), 0);
    }

    #[test]
    fn test_recent_takes_tail_in_file_order() {
        let payments: Vec<_> = (0..5).map(|i| payment(&format!("P{i}"), -1000 * i)).collect();
        let recent: Vec<_> = PaymentAggregator::recent(&payments, 3)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(recent, vec!["P2", "P3", "P4"]);
        assert_eq!(PaymentAggregator::recent(&payments, 10).len(), 5);
        assert!(PaymentAggregator::recent(&payments, 0).is_empty());
    }

    #[test]
    fn test_find_by_user_keeps_file_order() {
        let (_tmp, catalog) = fixtures::catalog();
        let ids: Vec<_> = catalog
            .payment_aggregator()
            .find_by_user("u1")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["P1", "P2", "P5", "P6"]);
        assert!(catalog.payment_aggregator().find_by_user("ghost").is_empty());
    }

    #[test]
    fn test_summary_splits_by_kind() {
        let (_tmp, catalog) = fixtures::catalog();
        let summary = catalog.payment_aggregator().summary("u1", 3);

        assert_eq!(summary.total, -315000);
        assert_eq!(summary.lecture_total, -270000);
        assert_eq!(summary.textbook_total, -45000);
        assert_eq!(summary.count, 4);

        let recent: Vec<_> = summary.recent.iter().map(|l| l.payment_id.as_str()).collect();
        assert_eq!(recent, vec!["P2", "P5", "P6"]);
        assert_eq!(summary.recent[0].item_name, "개념원리");
        assert_eq!(summary.recent[1].item_name, "영어 독해 마스터");
    }

    #[test]
    fn test_monthly_totals() {
        let (_tmp, catalog) = fixtures::catalog();
        let mut payments = catalog.payment_aggregator().find_by_user("u1");
        let mut undated = payment("PX", -1);
        undated.paid_at = "어제".to_string();
        payments.push(undated);

        let months = PaymentAggregator::monthly_totals(&payments);
        let flat: Vec<_> = months.iter().map(|m| (m.month.as_str(), m.total, m.count)).collect();
        assert_eq!(
            flat,
            vec![
                ("2025-03", -175000, 2),
                ("2025-04", -140000, 2),
                (UNKNOWN_MONTH, -1, 1),
            ]
        );
    }

    #[test]
    fn test_record_appends_and_rejects_duplicates() {
        let (tmp, catalog) = fixtures::catalog();
        let aggregator = catalog.payment_aggregator();

        let mut new = payment("P7", -99000);
        new.lecture_id = LectureId::new(4);
        aggregator.record(new).unwrap();

        assert_eq!(aggregator.find_by_user("u1").last().unwrap().id, "P7");
        let written = std::fs::read_to_string(tmp.path().join("payments.txt")).unwrap();
        assert!(written.ends_with("P7/u1/L004/-99000/N/카드/2025-03-02 14:30:00/완료\n"));

        let err = aggregator.record(payment("P1", -1)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
