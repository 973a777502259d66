use serde::{Deserialize, Serialize};

use crate::utils::format::{format_entered_time, format_quantity};

/// Placeholder for order fields the API did not populate
const MISSING: &str = "N/A";

/// An order as returned by the orders endpoint. Only the fields the summary
/// table needs are modeled; the rest of the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "orderId")]
    pub order_id: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "orderType")]
    pub order_type: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "enteredTime")]
    pub entered_time: Option<String>,
    #[serde(rename = "orderLegCollection", default)]
    pub order_legs: Vec<OrderLeg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLeg {
    pub instruction: Option<String>,
    pub quantity: Option<f64>,
    pub instrument: Option<Instrument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Option<String>,
}

impl Order {
    /// Symbol of the first order leg, if any.
    pub fn symbol(&self) -> Option<&str> {
        self.order_legs
            .first()
            .and_then(|leg| leg.instrument.as_ref())
            .and_then(|instrument| instrument.symbol.as_deref())
    }
}

/// One row of the order summary table, everything stringified for display.
/// Leg columns come from the first order leg.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_id: String,
    pub status: String,
    pub symbol: String,
    pub instruction: String,
    pub quantity: String,
    pub order_type: String,
    pub price: String,
    pub duration: String,
    pub entered_time: String,
}

impl OrderSummary {
    pub const HEADERS: [&'static str; 9] = [
        "Order ID",
        "Status",
        "Symbol",
        "Instruction",
        "Quantity",
        "Type",
        "Price",
        "Duration",
        "Entered Time",
    ];

    pub fn from_order(order: &Order) -> Self {
        let leg = order.order_legs.first();
        Self {
            order_id: order
                .order_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            status: display(&order.status),
            symbol: leg
                .and_then(|leg| leg.instrument.as_ref())
                .and_then(|instrument| instrument.symbol.clone())
                .unwrap_or_else(|| MISSING.to_string()),
            instruction: display(&leg.and_then(|leg| leg.instruction.clone())),
            quantity: leg
                .and_then(|leg| leg.quantity)
                .map(format_quantity)
                .unwrap_or_else(|| "0".to_string()),
            order_type: display(&order.order_type),
            price: order
                .price
                .map(|price| price.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            duration: display(&order.duration),
            entered_time: order
                .entered_time
                .as_deref()
                .map(format_entered_time)
                .unwrap_or_else(|| MISSING.to_string()),
        }
    }

    pub fn row(&self) -> Vec<String> {
        vec![
            self.order_id.clone(),
            self.status.clone(),
            self.symbol.clone(),
            self.instruction.clone(),
            self.quantity.clone(),
            self.order_type.clone(),
            self.price.clone(),
            self.duration.clone(),
            self.entered_time.clone(),
        ]
    }
}

fn display(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_string())
}
