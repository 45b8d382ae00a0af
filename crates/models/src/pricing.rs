//! Derived values for orders and their entries. Nothing here touches the
//! database; callers load fresh rows and pass them in.

use chrono::NaiveDate;
use sea_orm::prelude::Decimal;

use crate::order_entry::PricedEntry;

/// `quantity × service price`.
pub fn entry_price(quantity: i32, service_price: Decimal) -> Decimal {
    Decimal::from(quantity) * service_price
}

/// Sum of the effective price of every entry; zero for an empty order.
pub fn order_amount<'a, I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = &'a PricedEntry>,
{
    entries.into_iter().map(PricedEntry::price).sum()
}

/// Overdue iff a due-back date is set and today is strictly after it.
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(due_back, Some(d) if today > d)
}

/// Legacy save-time default for the stored entry price column.
pub fn normalize_legacy_price(stored: Decimal, service_price: Decimal) -> Decimal {
    if stored.is_zero() { service_price } else { stored }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{order_entry, service};
    use uuid::Uuid;

    fn priced(quantity: i32, cents: i64) -> PricedEntry {
        let service = service::Model { id: Uuid::new_v4(), name: "svc".into(), price: Decimal::new(cents, 2) };
        PricedEntry {
            entry: order_entry::Model {
                id: Uuid::new_v4(),
                quantity,
                price: Decimal::ZERO,
                service_id: service.id,
                order_id: Uuid::new_v4(),
            },
            service,
        }
    }

    #[test]
    fn amount_sums_quantity_times_price() {
        let entries = vec![priced(2, 4500), priced(1, 12000)];
        assert_eq!(order_amount(&entries), Decimal::new(21000, 2));
    }

    #[test]
    fn empty_order_costs_nothing() {
        let entries: Vec<PricedEntry> = Vec::new();
        assert_eq!(order_amount(&entries), Decimal::ZERO);
    }

    #[test]
    fn amount_follows_service_price_changes() {
        let mut entries = vec![priced(3, 1000)];
        assert_eq!(order_amount(&entries), Decimal::new(3000, 2));
        entries[0].service.price = Decimal::new(1500, 2);
        assert_eq!(order_amount(&entries), Decimal::new(4500, 2));
    }

    #[test]
    fn overdue_is_strict() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(!is_overdue(None, today));
        assert!(!is_overdue(Some(today), today));
        assert!(!is_overdue(NaiveDate::from_ymd_opt(2024, 1, 16), today));
        assert!(is_overdue(NaiveDate::from_ymd_opt(2024, 1, 14), today));
    }

    #[test]
    fn legacy_price_defaults_only_when_zero() {
        let svc = Decimal::new(4500, 2);
        assert_eq!(normalize_legacy_price(Decimal::ZERO, svc), svc);
        assert_eq!(normalize_legacy_price(Decimal::new(10, 0), svc), Decimal::new(10, 0));
    }
}
