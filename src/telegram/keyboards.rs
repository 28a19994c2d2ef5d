//! Reply and inline keyboard builders.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
};

use crate::storage::cart::CartView;
use crate::storage::catalog::{Category, Product};
use crate::storage::orders::{Order, OrderStatus};
use crate::telegram::texts;

/// Shorthand for an inline callback button.
pub fn cb(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), data.into())
}

/// Main reply keyboard for customers.
pub fn customer_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(texts::BTN_CATALOG),
            KeyboardButton::new(texts::BTN_CART),
        ],
        vec![
            KeyboardButton::new(texts::BTN_DELIVERY_STATUS),
            KeyboardButton::new(texts::BTN_CONTACT),
        ],
    ])
    .resize_keyboard()
}

/// Main reply keyboard for admins: customer rows plus the admin tools.
pub fn admin_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(texts::BTN_CATALOG),
            KeyboardButton::new(texts::BTN_CART),
        ],
        vec![
            KeyboardButton::new(texts::BTN_DELIVERY_STATUS),
            KeyboardButton::new(texts::BTN_CONTACT),
        ],
        vec![
            KeyboardButton::new(texts::BTN_ADMIN_CATALOG),
            KeyboardButton::new(texts::BTN_ADMIN_CATEGORIES),
        ],
        vec![
            KeyboardButton::new(texts::BTN_ADMIN_ORDERS),
            KeyboardButton::new(texts::BTN_ADMIN_QUESTIONS),
        ],
    ])
    .resize_keyboard()
}

/// One-row keyboard with only a cancel button, shown during flows.
pub fn cancel_only() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(texts::BTN_CANCEL)]]).resize_keyboard()
}

/// Keyboard shown with the cart: checkout or back.
pub fn cart_actions() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(texts::BTN_CHECKOUT)],
        vec![KeyboardButton::new(texts::BTN_BACK_TO_MENU)],
    ])
    .resize_keyboard()
}

/// Removes the reply keyboard (used when leaving a flow).
pub fn remove() -> KeyboardRemove {
    KeyboardRemove::new()
}

/// One inline button per category.
pub fn category_list(categories: &[Category]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        categories
            .iter()
            .map(|c| vec![cb(c.title.clone(), format!("cat:{}", c.id))])
            .collect::<Vec<_>>(),
    )
}

/// Inline actions under a customer-facing product card.
pub fn product_card(product: &Product) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("🛒 Add to cart", format!("prod:add:{}", product.id))]])
}

/// Inline actions under an admin-facing product card.
pub fn admin_product_card(product: &Product) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            cb("✏️ Title", format!("adm:prod:edit:{}:title", product.id)),
            cb("✏️ Description", format!("adm:prod:edit:{}:description", product.id)),
        ],
        vec![
            cb("✏️ Image", format!("adm:prod:edit:{}:image", product.id)),
            cb("✏️ Price", format!("adm:prod:edit:{}:price", product.id)),
        ],
        vec![cb("🗑 Delete", format!("adm:prod:del:{}", product.id))],
    ])
}

/// Inline actions under an admin-facing category row.
pub fn admin_category_card(category: &Category) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        cb("✏️ Rename", format!("adm:cat:ren:{}", category.id)),
        cb("🗑 Delete", format!("adm:cat:del:{}", category.id)),
    ]])
}

/// Per-line quantity controls shown under the rendered cart.
pub fn cart_controls(view: &CartView) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        view.lines
            .iter()
            .map(|line| {
                vec![
                    cb("➖", format!("cart:dec:{}", line.product_id)),
                    cb(format!("{} ×{}", line.title, line.quantity), "noop"),
                    cb("➕", format!("cart:inc:{}", line.product_id)),
                    cb("🗑", format!("cart:rm:{}", line.product_id)),
                ]
            })
            .collect::<Vec<_>>(),
    )
}

/// Footer button that starts the new-product wizard.
pub fn new_product_button() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("➕ New product", "adm:prod:new")]])
}

/// Footer button that starts the new-category prompt.
pub fn new_category_button() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("➕ New category", "adm:cat:new")]])
}

/// Legal next-status buttons for an order on the admin board.
pub fn admin_order_actions(order: &Order) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if order.status.can_transition_to(OrderStatus::Confirmed) {
        row.push(cb("✅ Confirm", format!("adm:order:confirm:{}", order.id)));
    }
    if order.status.can_transition_to(OrderStatus::Fulfilled) {
        row.push(cb("📬 Fulfil", format!("adm:order:fulfil:{}", order.id)));
    }
    if order.status.can_transition_to(OrderStatus::Cancelled) {
        row.push(cb("🚫 Cancel", format!("adm:order:cancel:{}", order.id)));
    }
    InlineKeyboardMarkup::new(vec![row])
}

/// Answer button under a pending question on the admin board.
pub fn admin_question_actions(question_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("💬 Answer", format!("adm:q:ans:{}", question_id))]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::orders::Order;
    use chrono::NaiveDateTime;

    fn order_with_status(status: OrderStatus) -> Order {
        Order {
            id: 1,
            user_id: 1,
            status,
            address: "x".to_string(),
            phone: "y".to_string(),
            total: 0,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn terminal_orders_offer_no_actions() {
        let kb = admin_order_actions(&order_with_status(OrderStatus::Fulfilled));
        assert!(kb.inline_keyboard.iter().all(|row| row.is_empty()));
    }

    #[test]
    fn pending_orders_offer_confirm_and_cancel() {
        let kb = admin_order_actions(&order_with_status(OrderStatus::Pending));
        assert_eq!(kb.inline_keyboard[0].len(), 2);
    }
}
