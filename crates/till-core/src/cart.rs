//! The in-memory cart for the active sale.
//!
//! The cart is owned by the active checkout flow and cleared on payment or
//! session close. It is a plain value type: all storage-facing projections
//! (the published snapshot) are derived from it, never the other way round.

use serde::{Deserialize, Serialize};

use crate::money::MinorUnits;

/// A sellable product as the register sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier (e.g. "P001")
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price in minor units
    pub price_minor: MinorUnits,
    /// Category used by reporting
    pub category: String,
}

/// One line of the cart: a product and a positive quantity.
///
/// Invariant: `quantity > 0`. A line whose quantity would reach zero is
/// removed from the cart, never stored at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Line total in minor units (`price * quantity`, exact in integers).
    pub fn total_minor(&self) -> MinorUnits {
        self.product.price_minor * MinorUnits::from(self.quantity)
    }
}

/// The list of line items for the currently active sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the cart.
    ///
    /// If the product is already present, its quantity is incremented by 1;
    /// otherwise a new line with quantity 1 is appended.
    pub fn add_product(&mut self, product: Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                product,
                quantity: 1,
            });
        }
    }

    /// Sets the quantity of a line to an absolute value.
    ///
    /// A quantity of zero (or the absence of the product) removes the line
    /// entirely. Unknown product ids are ignored.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) {
        if quantity == 0 {
            self.lines.retain(|l| l.product.id != product_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price * quantity` over all lines, in minor units.
    pub fn total_minor(&self) -> MinorUnits {
        self.lines.iter().map(CartLine::total_minor).sum()
    }

    /// Returns true when the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The current lines, in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse() -> Product {
        Product {
            id: "P001".to_string(),
            name: "Mouse".to_string(),
            price_minor: 2999,
            category: "Peripherals".to_string(),
        }
    }

    fn monitor() -> Product {
        Product {
            id: "P004".to_string(),
            name: "Monitor".to_string(),
            price_minor: 59_999,
            category: "Displays".to_string(),
        }
    }

    #[test]
    fn test_add_product_increments_existing_line() {
        let mut cart = Cart::new();
        cart.add_product(mouse());
        cart.add_product(mouse());

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.total_minor(), 5998);
    }

    #[test]
    fn test_set_quantity_is_absolute() {
        let mut cart = Cart::new();
        cart.add_product(mouse());
        cart.set_quantity("P001", 5);

        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.total_minor(), 5 * 2999);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let mut cart = Cart::new();
        cart.add_product(mouse());
        cart.add_product(monitor());
        cart.set_quantity("P001", 0);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product.id, "P004");
        assert!(cart.lines().iter().all(|l| l.quantity > 0));
    }

    #[test]
    fn test_add_then_remove_restores_total() {
        let mut cart = Cart::new();
        cart.add_product(monitor());
        let before = cart.total_minor();

        cart.add_product(mouse());
        cart.set_quantity("P001", 0);

        assert_eq!(cart.total_minor(), before);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_product(mouse());
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_minor(), 0);
    }

    #[test]
    fn test_set_quantity_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add_product(mouse());
        cart.set_quantity("P999", 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
    }
}
