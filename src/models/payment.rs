//! Payment data structure.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;
use crate::models::LectureId;
use crate::storage::record::{RecordFormat, parse_number};
use crate::storage::{Record, WritableRecord};

/// What a payment was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    Lecture,
    Textbook,
}

impl PaymentKind {
    /// Read the textbook-purchased flag column.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_lowercase().as_str() {
            "y" | "o" | "1" | "true" => Self::Textbook,
            _ => Self::Lecture,
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::Lecture => "N",
            Self::Textbook => "Y",
        }
    }
}

/// One line of the payment ledger.
///
/// Amounts are signed: spending is negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub lecture_id: LectureId,
    pub amount: i64,
    pub kind: PaymentKind,
    pub method: String,

    /// Timestamp exactly as stored, e.g. "2025-03-02 14:30:00"
    pub paid_at: String,

    pub status: String,
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M",
];

impl Payment {
    /// Parse the stored timestamp, `None` if it matches no known format.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.paid_at.trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }
}

impl Record for Payment {
    type Id = String;

    const FORMAT: RecordFormat = RecordFormat::new("payment", b'/', "paymentId", 7);

    fn id(&self) -> String {
        self.id.clone()
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Self {
            id: fields[0].clone(),
            user_id: fields[1].clone(),
            lecture_id: LectureId::parse(&fields[2])?,
            amount: parse_number(Self::FORMAT.name, "amount", &fields[3])?,
            kind: PaymentKind::from_flag(&fields[4]),
            method: fields[5].clone(),
            paid_at: fields[6].clone(),
            status: fields.get(7).cloned().unwrap_or_default(),
        })
    }

    fn foreign_key(&self) -> Option<String> {
        Some(self.user_id.clone())
    }
}

impl WritableRecord for Payment {
    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user_id.clone(),
            self.lecture_id.to_string(),
            self.amount.to_string(),
            self.kind.flag().to_string(),
            self.method.clone(),
            self.paid_at.clone(),
            self.status.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn parse(line: &str) -> Result<Payment> {
        let fields = Payment::FORMAT.parse_line(line)?;
        Payment::from_fields(&fields)
    }

    #[test]
    fn test_from_fields() {
        let payment = parse("P1/u1/L001/-150000/N/카드/2025-03-02 14:30:00/완료").unwrap();
        assert_eq!(payment.amount, -150000);
        assert_eq!(payment.kind, PaymentKind::Lecture);
        assert_eq!(payment.status, "완료");
        assert_eq!(payment.timestamp().unwrap().month(), 3);
    }

    #[test]
    fn test_textbook_flag() {
        let payment = parse("P2/u1/2/-25000/Y/계좌이체/2025-03-05").unwrap();
        assert_eq!(payment.kind, PaymentKind::Textbook);
        assert_eq!(payment.status, "");
        assert_eq!(payment.timestamp().unwrap().day(), 5);
    }

    #[test]
    fn test_legacy_comma_line_is_rejected() {
        assert!(parse("u1,pw,홍길동,Y").is_err());
    }

    #[test]
    fn test_unparseable_timestamp() {
        let payment = parse("P3/u1/L001/-1/N/카드/어제/완료").unwrap();
        assert!(payment.timestamp().is_none());
    }

    #[test]
    fn test_to_line() {
        let payment = parse("P2/u1/2/-25000/y/계좌이체/2025-03-05/완료").unwrap();
        assert_eq!(payment.to_line(), "P2/u1/L002/-25000/Y/계좌이체/2025-03-05/완료");
    }
}
