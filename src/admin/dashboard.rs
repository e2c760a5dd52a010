use crate::Taka;
use crate::model::{OrderRecord, OrderStatus};

/// Delivery charge waived on each order.
pub const FREE_DELIVERY_SAVING: Taka = Taka::new(80);

/// How many orders the dashboard lists.
pub const RECENT_ORDERS: usize = 10;

/// Headline numbers for the back-office landing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    /// Sum of totals, cancelled orders excluded.
    pub revenue: Taka,
    pub discounts_given: Taka,
    pub free_delivery_given: Taka,
    pub total_orders: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

impl DashboardStats {
    pub fn from_orders(orders: &[OrderRecord]) -> Self {
        let mut stats = DashboardStats {
            total_orders: orders.len(),
            ..Default::default()
        };

        for order in orders {
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Confirmed => stats.confirmed += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => {
                    stats.cancelled += 1;
                    continue;
                }
            }
            stats.revenue += order.total;
            stats.discounts_given += order.discount;
            stats.free_delivery_given += FREE_DELIVERY_SAVING;
        }

        stats
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Confirmed => self.confirmed,
            OrderStatus::Shipped => self.shipped,
            OrderStatus::Delivered => self.delivered,
            OrderStatus::Cancelled => self.cancelled,
        }
    }

    /// The most recent orders, newest first.
    pub fn recent(orders: &[OrderRecord]) -> Vec<&OrderRecord> {
        let mut sorted: Vec<_> = orders.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted.truncate(RECENT_ORDERS);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::test_utils::order;

    #[test]
    fn empty_dashboard() {
        assert_eq!(DashboardStats::from_orders(&[]), DashboardStats::default());
    }

    #[test]
    fn cancelled_orders_are_counted_but_not_earned() {
        let orders = vec![
            order(1, "A", OrderStatus::Pending, 1450, 0),
            order(2, "B", OrderStatus::Delivered, 6670, 580),
            order(3, "C", OrderStatus::Cancelled, 2650, 0),
        ];
        let stats = DashboardStats::from_orders(&orders);

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.revenue, Taka::new(8120));
        assert_eq!(stats.discounts_given, Taka::new(580));
        assert_eq!(stats.free_delivery_given, Taka::new(160));
        assert_eq!(stats.count(OrderStatus::Pending), 1);
        assert_eq!(stats.count(OrderStatus::Delivered), 1);
        assert_eq!(stats.count(OrderStatus::Cancelled), 1);
        assert_eq!(stats.count(OrderStatus::Shipped), 0);
    }

    #[test]
    fn recent_keeps_ten_newest() {
        let orders: Vec<_> = (1..=15)
            .map(|id| order(id, "A", OrderStatus::Pending, 100, 0))
            .collect();
        let recent = DashboardStats::recent(&orders);
        assert_eq!(recent.len(), RECENT_ORDERS);
        assert!(
            recent
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );
    }
}
