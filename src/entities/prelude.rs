pub use super::discounts::Entity as Discounts;
