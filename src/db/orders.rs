use crate::db::models::{Order, OrderItem, OrderItemCreate, OrderStatus, OrderValidation};
use crate::db::products::find_product;
use crate::db::{Database, DbError};
use duckdb::{params, Connection, OptionalExt};
use tracing::{error, info, warn};

/// Largest accepted gap between the order's unit price and the catalogue price.
const PRICE_TOLERANCE: f64 = 0.01;

fn load_items(conn: &Connection, order_id: &str) -> Result<Vec<OrderItem>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, order_id, product_id, quantity, unit_price FROM order_items WHERE order_id = ? ORDER BY id",
    )?;
    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                product_id: row.get(2)?,
                quantity: row.get(3)?,
                unit_price: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Loads orders matching `where_clause` together with their items.
fn load_orders(conn: &Connection, where_clause: &str, arg: Option<&str>) -> Result<Vec<Order>, DbError> {
    let sql = format!(
        "SELECT id, user_id, total_price, status, CAST(created_at AS VARCHAR) FROM orders{} ORDER BY created_at, id",
        where_clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let map = |row: &duckdb::Row<'_>| -> duckdb::Result<(String, String, f64, String, Option<String>)> {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    };
    let heads = match arg {
        Some(value) => stmt.query_map([value], map)?.collect::<Result<Vec<_>, _>>()?,
        None => stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?,
    };

    heads
        .into_iter()
        .map(|(id, user_id, total_price, status, created_at)| {
            let status = status.parse::<OrderStatus>().map_err(DbError::Invalid)?;
            let items = load_items(conn, &id)?;
            Ok(Order {
                id,
                user_id,
                total_price,
                status,
                created_at,
                items,
            })
        })
        .collect()
}

/// Checks each item against current stock and price, collecting every problem.
fn validate_items(conn: &Connection, items: &[OrderItemCreate]) -> Result<OrderValidation, DbError> {
    let mut errors = Vec::new();
    let mut total_price = 0.0;

    for item in items {
        let Some(product) = find_product(conn, &item.product_id)? else {
            errors.push(format!("Product {} not found", item.product_id));
            continue;
        };

        if item.quantity > product.stock {
            errors.push(format!(
                "Insufficient stock for {}. Available: {}, Requested: {}",
                product.name, product.stock, item.quantity
            ));
            continue;
        }

        if (item.unit_price - product.price).abs() > PRICE_TOLERANCE {
            errors.push(format!(
                "Price mismatch for {}. Current price: ${}, Order price: ${}",
                product.name, product.price, item.unit_price
            ));
            continue;
        }

        total_price += item.quantity as f64 * item.unit_price;
    }

    if errors.is_empty() {
        Ok(OrderValidation {
            valid: true,
            total_price: Some(total_price),
            errors,
        })
    } else {
        Ok(OrderValidation {
            valid: false,
            total_price: None,
            errors,
        })
    }
}

/// Lowers stock by `quantity`, never below zero. Failures are logged, not raised.
fn decrement_stock(conn: &Connection, product_id: &str, quantity: i32) {
    let result = conn.execute(
        "UPDATE products SET stock = greatest(stock - ?, 0), updated_at = current_timestamp WHERE id = ?",
        params![quantity, product_id],
    );

    match result {
        Ok(0) => warn!("Product {} not found while updating stock", product_id),
        Ok(_) => {}
        Err(e) => error!("Error updating product stock for {}: {}", product_id, e),
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn validate(&self, items: Vec<OrderItemCreate>) -> Result<OrderValidation, DbError> {
        self.db.run(move |conn| validate_items(conn, &items)).await
    }

    /// Creates a pending order, its items, and decrements stock item by item.
    ///
    /// The steps run sequentially without a transaction: a failure part-way leaves
    /// the rows written so far in place.
    pub async fn create(&self, user_id: &str, items: Vec<OrderItemCreate>) -> Result<Order, DbError> {
        let user_id = user_id.to_string();

        self.db
            .run(move |conn| {
                let user_exists = conn
                    .query_row("SELECT id FROM users WHERE id = ?", [&user_id], |row| {
                        row.get::<_, String>(0)
                    })
                    .optional()?
                    .is_some();
                if !user_exists {
                    return Err(DbError::NotFound(format!("user {}", user_id)));
                }

                let validation = validate_items(conn, &items)?;
                if !validation.valid {
                    return Err(DbError::Invalid(format!(
                        "Order validation failed: {}",
                        validation.errors.join(", ")
                    )));
                }

                let total_price: f64 = items
                    .iter()
                    .map(|item| item.quantity as f64 * item.unit_price)
                    .sum();

                let order_id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO orders (id, user_id, total_price, status) VALUES (?, ?, ?, ?)",
                    params![order_id, user_id, total_price, OrderStatus::Pending.as_str()],
                )?;

                for item in &items {
                    let item_id = uuid::Uuid::new_v4().to_string();
                    conn.execute(
                        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price) VALUES (?, ?, ?, ?, ?)",
                        params![item_id, order_id, item.product_id, item.quantity, item.unit_price],
                    )?;
                    decrement_stock(conn, &item.product_id, item.quantity);
                }

                info!("Order {} created for user {} ({} items)", order_id, user_id, items.len());

                load_orders(conn, " WHERE id = ?", Some(&order_id))?
                    .pop()
                    .ok_or_else(|| DbError::NotFound(format!("order {}", order_id)))
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Order>, DbError> {
        let id = id.to_string();
        self.db
            .run(move |conn| Ok(load_orders(conn, " WHERE id = ?", Some(&id))?.pop()))
            .await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, DbError> {
        let user_id = user_id.to_string();
        self.db
            .run(move |conn| load_orders(conn, " WHERE user_id = ?", Some(&user_id)))
            .await
    }

    pub async fn list(&self) -> Result<Vec<Order>, DbError> {
        self.db.run(|conn| load_orders(conn, "", None)).await
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Option<Order>, DbError> {
        let id = id.to_string();
        self.db
            .run(move |conn| {
                let updated = conn.execute(
                    "UPDATE orders SET status = ?, updated_at = current_timestamp WHERE id = ?",
                    params![status.as_str(), id],
                )?;
                if updated == 0 {
                    return Ok(None);
                }
                Ok(load_orders(conn, " WHERE id = ?", Some(&id))?.pop())
            })
            .await
    }
}
