use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// User types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub address: Option<String>,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("name cannot be empty".to_string());
            }
        }
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(format!("invalid email address: {}", email)),
    }
}

// Product types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub reviews: i32,
    pub image_url: Option<String>,
    pub original_price: Option<f64>,
    pub is_new: bool,
    pub is_on_sale: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub category: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: i32,
    pub image_url: Option<String>,
    pub original_price: Option<f64>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
}

impl ProductCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        validate_product_numbers(
            Some(self.price),
            Some(self.stock),
            self.rating,
            Some(self.reviews),
            self.original_price,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i32>,
    pub image_url: Option<String>,
    pub original_price: Option<f64>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_product_numbers(
            self.price,
            self.stock,
            self.rating,
            self.reviews,
            self.original_price,
        )
    }
}

fn validate_product_numbers(
    price: Option<f64>,
    stock: Option<i32>,
    rating: Option<f64>,
    reviews: Option<i32>,
    original_price: Option<f64>,
) -> Result<(), String> {
    if price.is_some_and(|p| p <= 0.0) {
        return Err("price must be greater than 0".to_string());
    }
    if stock.is_some_and(|s| s < 0) {
        return Err("stock cannot be negative".to_string());
    }
    if rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
        return Err("rating must be between 0 and 5".to_string());
    }
    if reviews.is_some_and(|r| r < 0) {
        return Err("reviews cannot be negative".to_string());
    }
    if original_price.is_some_and(|p| p <= 0.0) {
        return Err("original_price must be greater than 0".to_string());
    }
    Ok(())
}

/// Listing filters; all text matches are case-insensitive substrings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub category: Option<String>,
    pub search: Option<String>,
    pub is_on_sale: Option<bool>,
    pub is_new: Option<bool>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            category: None,
            search: None,
            is_on_sale: None,
            is_new: None,
        }
    }
}

impl ProductFilter {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be at least 1".to_string());
        }
        if !(1..=100).contains(&self.limit) {
            return Err("limit must be between 1 and 100".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

// Order types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!("Invalid status. Must be one of: {}", valid.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: Option<String>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItemCreate>,
}

impl OrderCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("order must contain at least one item".to_string());
        }
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(format!("quantity for {} must be greater than 0", item.product_id));
            }
            if item.unit_price <= 0.0 {
                return Err(format!("unit_price for {} must be greater than 0", item.product_id));
            }
        }
        Ok(())
    }
}

/// Outcome of checking order items against current stock and prices.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert!(err.contains("pending, processing, shipped, delivered, cancelled"));
    }

    #[test]
    fn test_product_create_validation() {
        let mut product = ProductCreate {
            name: "Headphones".to_string(),
            brand: None,
            description: None,
            price: 59.0,
            stock: 3,
            category: Some("Audio".to_string()),
            rating: Some(4.5),
            reviews: 0,
            image_url: None,
            original_price: None,
            is_new: false,
            is_on_sale: false,
        };
        assert!(product.validate().is_ok());

        product.rating = Some(7.0);
        assert!(product.validate().is_err());

        product.rating = None;
        product.price = 0.0;
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_user_email_validation() {
        let user = UserCreate {
            name: "Ana".to_string(),
            email: "not-an-email".to_string(),
            address: None,
        };
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_product_filter_limits() {
        let filter = ProductFilter {
            limit: 101,
            ..Default::default()
        };
        assert!(filter.validate().is_err());
        assert!(ProductFilter::default().validate().is_ok());
    }
}
