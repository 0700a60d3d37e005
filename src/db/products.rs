use crate::db::models::{Product, ProductCreate, ProductFilter, ProductListResponse, ProductUpdate};
use crate::db::{Database, DbError};
use duckdb::types::Value;
use duckdb::{params, params_from_iter, Connection, OptionalExt};
use tracing::{debug, info};

const PRODUCT_COLUMNS: &str = "id, name, brand, description, price, stock, category, rating, reviews, \
     image_url, original_price, is_new, is_on_sale, \
     CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)";

fn map_product(row: &duckdb::Row<'_>) -> duckdb::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        stock: row.get(5)?,
        category: row.get(6)?,
        rating: row.get(7)?,
        reviews: row.get(8)?,
        image_url: row.get(9)?,
        original_price: row.get(10)?,
        is_new: row.get(11)?,
        is_on_sale: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

pub(crate) fn find_product(conn: &Connection, id: &str) -> Result<Option<Product>, DbError> {
    let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_product).optional()?)
}

/// Builds the WHERE clause shared by the listing and its count.
fn filter_clause(filter: &ProductFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        conditions.push("category ILIKE ?".to_string());
        values.push(Value::Text(format!("%{}%", category)));
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        conditions.push("(name ILIKE ? OR brand ILIKE ? OR description ILIKE ?)".to_string());
        let pattern = format!("%{}%", search);
        for _ in 0..3 {
            values.push(Value::Text(pattern.clone()));
        }
    }

    if let Some(is_on_sale) = filter.is_on_sale {
        conditions.push("is_on_sale = ?".to_string());
        values.push(Value::Boolean(is_on_sale));
    }

    if let Some(is_new) = filter.is_new {
        conditions.push("is_new = ?".to_string());
        values.push(Value::Boolean(is_new));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

#[derive(Clone)]
pub struct ProductService {
    db: Database,
}

impl ProductService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Paginated listing ordered by name.
    pub async fn list(&self, filter: ProductFilter) -> Result<ProductListResponse, DbError> {
        filter.validate().map_err(DbError::Invalid)?;

        self.db
            .run(move |conn| {
                let (where_clause, values) = filter_clause(&filter);

                let total: i64 = conn.query_row(
                    &format!("SELECT count(*) FROM products{}", where_clause),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )?;

                let offset = (filter.page as i64 - 1) * filter.limit as i64;
                let sql = format!(
                    "SELECT {} FROM products{} ORDER BY name LIMIT {} OFFSET {}",
                    PRODUCT_COLUMNS, where_clause, filter.limit, offset
                );
                debug!("Product listing: {}", sql);

                let mut stmt = conn.prepare(&sql)?;
                let products = stmt
                    .query_map(params_from_iter(values.iter()), map_product)?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ProductListResponse {
                    products,
                    total,
                    page: filter.page,
                    limit: filter.limit,
                })
            })
            .await
    }

    pub async fn featured(&self, limit: u32) -> Result<Vec<Product>, DbError> {
        if !(1..=20).contains(&limit) {
            return Err(DbError::Invalid("limit must be between 1 and 20".to_string()));
        }

        self.db
            .run(move |conn| {
                let sql = format!(
                    "SELECT {} FROM products ORDER BY name LIMIT {}",
                    PRODUCT_COLUMNS, limit
                );
                let mut stmt = conn.prepare(&sql)?;
                let products = stmt
                    .query_map([], map_product)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(products)
            })
            .await
    }

    pub async fn categories(&self) -> Result<Vec<String>, DbError> {
        self.db
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT category FROM products WHERE category IS NOT NULL AND category <> '' ORDER BY category",
                )?;
                let categories = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(categories)
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Product>, DbError> {
        let id = id.to_string();
        self.db.run(move |conn| find_product(conn, &id)).await
    }

    pub async fn create(&self, data: ProductCreate) -> Result<Product, DbError> {
        data.validate().map_err(DbError::Invalid)?;

        self.db
            .run(move |conn| {
                let id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO products (id, name, brand, description, price, stock, category, rating, \
                     reviews, image_url, original_price, is_new, is_on_sale) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        id,
                        data.name,
                        data.brand,
                        data.description,
                        data.price,
                        data.stock,
                        data.category,
                        data.rating,
                        data.reviews,
                        data.image_url,
                        data.original_price,
                        data.is_new,
                        data.is_on_sale
                    ],
                )?;
                info!("Product created: {} ({})", data.name, id);

                find_product(conn, &id)?.ok_or_else(|| DbError::NotFound(format!("product {}", id)))
            })
            .await
    }

    /// Applies the provided fields; an empty update returns the product unchanged.
    pub async fn update(&self, id: &str, data: ProductUpdate) -> Result<Option<Product>, DbError> {
        data.validate().map_err(DbError::Invalid)?;
        let id = id.to_string();

        self.db
            .run(move |conn| {
                let mut assignments: Vec<&str> = Vec::new();
                let mut values: Vec<Value> = Vec::new();

                let mut text = |column: &'static str, value: Option<String>| {
                    if let Some(v) = value {
                        assignments.push(column);
                        values.push(Value::Text(v));
                    }
                };
                text("name = ?", data.name);
                text("brand = ?", data.brand);
                text("description = ?", data.description);
                text("category = ?", data.category);
                text("image_url = ?", data.image_url);

                for (column, value) in [
                    ("price = ?", data.price),
                    ("rating = ?", data.rating),
                    ("original_price = ?", data.original_price),
                ] {
                    if let Some(v) = value {
                        assignments.push(column);
                        values.push(Value::Double(v));
                    }
                }
                for (column, value) in [("stock = ?", data.stock), ("reviews = ?", data.reviews)] {
                    if let Some(v) = value {
                        assignments.push(column);
                        values.push(Value::Int(v));
                    }
                }
                for (column, value) in [("is_new = ?", data.is_new), ("is_on_sale = ?", data.is_on_sale)] {
                    if let Some(v) = value {
                        assignments.push(column);
                        values.push(Value::Boolean(v));
                    }
                }

                if assignments.is_empty() {
                    return find_product(conn, &id);
                }

                let sql = format!(
                    "UPDATE products SET {}, updated_at = current_timestamp WHERE id = ?",
                    assignments.join(", ")
                );
                values.push(Value::Text(id.clone()));

                let updated = conn.execute(&sql, params_from_iter(values.iter()))?;
                if updated == 0 {
                    return Ok(None);
                }
                find_product(conn, &id)
            })
            .await
    }

    /// Deletes the product and any order lines referencing it.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let id = id.to_string();

        self.db
            .run(move |conn| {
                conn.execute("DELETE FROM order_items WHERE product_id = ?", [&id])?;
                let deleted = conn.execute("DELETE FROM products WHERE id = ?", [&id])?;
                Ok(deleted > 0)
            })
            .await
    }

    pub async fn set_stock(&self, id: &str, new_stock: i32) -> Result<bool, DbError> {
        if new_stock < 0 {
            return Err(DbError::Invalid("stock cannot be negative".to_string()));
        }
        let id = id.to_string();

        self.db
            .run(move |conn| {
                let updated = conn.execute(
                    "UPDATE products SET stock = ?, updated_at = current_timestamp WHERE id = ?",
                    params![new_stock, id],
                )?;
                Ok(updated > 0)
            })
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_product(name: &str, category: &str, price: f64, stock: i32) -> ProductCreate {
        ProductCreate {
            name: name.to_string(),
            brand: Some("TechBrand".to_string()),
            description: Some(format!("{} description", name)),
            price,
            stock,
            category: Some(category.to_string()),
            rating: Some(4.0),
            reviews: 10,
            image_url: None,
            original_price: None,
            is_new: false,
            is_on_sale: false,
        }
    }

    async fn seeded() -> ProductService {
        let products = ProductService::new(Database::in_memory());
        for (name, category, price) in [
            ("Gaming Laptop", "Laptops", 1299.99),
            ("Phone X", "Smartphones", 799.0),
            ("Earbuds", "Audio", 59.9),
            ("Ultrabook", "Laptops", 999.0),
        ] {
            products
                .create(sample_product(name, category, price, 5))
                .await
                .unwrap();
        }
        products
    }

    #[tokio::test]
    async fn test_list_paginates_by_name() {
        let products = seeded().await;
        let page = products
            .list(ProductFilter {
                page: 2,
                limit: 3,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].name, "Ultrabook");
    }

    #[tokio::test]
    async fn test_list_filters_category_and_search() {
        let products = seeded().await;

        let laptops = products
            .list(ProductFilter {
                category: Some("laptop".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(laptops.total, 2);

        let searched = products
            .list(ProductFilter {
                search: Some("phone".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.products[0].name, "Phone X");
    }

    #[tokio::test]
    async fn test_categories_sorted_and_distinct() {
        let products = seeded().await;
        assert_eq!(
            products.categories().await.unwrap(),
            vec!["Audio", "Laptops", "Smartphones"]
        );
    }

    #[tokio::test]
    async fn test_update_and_stock() {
        let products = seeded().await;
        let earbuds = products.list(ProductFilter {
            search: Some("Earbuds".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .products
        .remove(0);

        let updated = products
            .update(
                &earbuds.id,
                ProductUpdate {
                    price: Some(49.9),
                    is_on_sale: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, 49.9);
        assert!(updated.is_on_sale);
        assert_eq!(updated.name, "Earbuds");

        let unchanged = products
            .update(&earbuds.id, ProductUpdate::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.price, 49.9);

        assert!(products.set_stock(&earbuds.id, 42).await.unwrap());
        assert_eq!(products.get(&earbuds.id).await.unwrap().unwrap().stock, 42);
        assert!(!products.set_stock("missing", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_product() {
        let products = seeded().await;
        let featured = products.featured(8).await.unwrap();
        assert_eq!(featured.len(), 4);

        assert!(products.delete(&featured[0].id).await.unwrap());
        assert_eq!(products.get(&featured[0].id).await.unwrap(), None);
    }
}
