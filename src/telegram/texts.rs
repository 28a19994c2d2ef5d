//! Centralized user-facing strings and formatting helpers.
//!
//! Reply-keyboard routing matches on these exact strings, so they live
//! in one place instead of being scattered through the handlers.

use crate::storage::cart::CartView;
use crate::storage::orders::{Order, OrderItem, OrderStatus};

// Customer menu buttons
pub const BTN_CATALOG: &str = "🛍 Catalog";
pub const BTN_CART: &str = "🛒 Cart";
pub const BTN_DELIVERY_STATUS: &str = "🚚 Delivery status";
pub const BTN_CONTACT: &str = "❓ Contact us";

// Checkout buttons
pub const BTN_CHECKOUT: &str = "📦 Checkout";
pub const BTN_CANCEL: &str = "🔙 Cancel";
pub const BTN_BACK_TO_MENU: &str = "🔙 Back to menu";

// Admin menu buttons
pub const BTN_ADMIN_CATALOG: &str = "🛠 Manage catalog";
pub const BTN_ADMIN_CATEGORIES: &str = "🗂 Categories";
pub const BTN_ADMIN_ORDERS: &str = "📦 Orders";
pub const BTN_ADMIN_QUESTIONS: &str = "❓ Questions";

pub const WELCOME: &str = "Welcome! Browse the catalog, fill your cart, and place an order.";
pub const WELCOME_ADMIN: &str = "Welcome back. Admin tools are on the keyboard below.";
pub const CANCELLED: &str = "Cancelled. Back to the main menu.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const TRY_AGAIN_LATER: &str = "Something went wrong on our side. Please try again later.";
pub const SESSION_EXPIRED: &str = "That conversation expired (the bot was restarted). Let's start over from the menu.";
pub const UNKNOWN_INPUT: &str = "I didn't catch that — use the menu buttons or /help.";

/// Formats a price in cents as dollars: 9950 -> "$99.50".
pub fn format_price(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

/// Human label with emoji for an order status.
pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "⏳ pending",
        OrderStatus::Confirmed => "✅ confirmed",
        OrderStatus::Fulfilled => "📬 fulfilled",
        OrderStatus::Cancelled => "🚫 cancelled",
    }
}

/// Renders the cart for the customer.
pub fn render_cart(view: &CartView) -> String {
    let mut text = String::from("🛒 Your Cart:\n\n");
    for line in &view.lines {
        text.push_str(&format!(
            "🏷 {}\n📊 Quantity: {}\n💰 Price: {}\n💵 Subtotal: {}\n─────────────────\n",
            line.title,
            line.quantity,
            format_price(line.unit_price),
            format_price(line.line_total()),
        ));
    }
    text.push_str(&format!("\n💳 Total: {}", format_price(view.total)));
    text
}

/// Renders one order with its item snapshots.
pub fn render_order(order: &Order, items: &[OrderItem]) -> String {
    let mut text = format!(
        "Order #{}\n📋 Status: {}\n📅 Created: {}\n",
        order.id,
        status_label(order.status),
        order.created_at.format("%Y-%m-%d %H:%M"),
    );
    for item in items {
        text.push_str(&format!(
            "  • {} × {} @ {}\n",
            item.title,
            item.quantity,
            format_price(item.unit_price)
        ));
    }
    text.push_str(&format!("💳 Total: {}", format_price(order.total)));
    text
}

/// Confirmation shown right after checkout.
pub fn order_placed(order: &Order) -> String {
    format!(
        "✅ Order #{} placed!\n\n📦 Shipping to:\n{}\n📞 {}\n💳 Total: {}\n\nOur team will contact you shortly to confirm the order.",
        order.id,
        order.address,
        order.phone,
        format_price(order.total),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(99000), "$990.00");
        assert_eq!(format_price(1300), "$13.00");
        assert_eq!(format_price(5), "$0.05");
    }
}
