use duckdb::Connection;

/// E-commerce schema. Executed at startup and handed verbatim to the model as context.
pub const DATABASE_SCHEMA: &str = r#"
-- Registered customers and administrators
CREATE TABLE IF NOT EXISTS users (
  id VARCHAR PRIMARY KEY,
  name VARCHAR NOT NULL,
  email VARCHAR NOT NULL,
  address VARCHAR,
  role VARCHAR NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user'))
);

-- Store catalogue
CREATE TABLE IF NOT EXISTS products (
  id VARCHAR PRIMARY KEY,
  name VARCHAR NOT NULL,
  brand VARCHAR,
  description VARCHAR,
  price DOUBLE NOT NULL,
  stock INTEGER NOT NULL DEFAULT 0,
  category VARCHAR,
  rating DOUBLE,
  reviews INTEGER NOT NULL DEFAULT 0,
  image_url VARCHAR,
  original_price DOUBLE,
  is_new BOOLEAN NOT NULL DEFAULT false,
  is_on_sale BOOLEAN NOT NULL DEFAULT false,
  created_at TIMESTAMP DEFAULT current_timestamp,
  updated_at TIMESTAMP DEFAULT current_timestamp
);

-- Purchase orders; orders.user_id references users.id
CREATE TABLE IF NOT EXISTS orders (
  id VARCHAR PRIMARY KEY,
  user_id VARCHAR NOT NULL,
  total_price DOUBLE NOT NULL,
  status VARCHAR NOT NULL DEFAULT 'pending'
    CHECK (status IN ('pending', 'processing', 'shipped', 'delivered', 'cancelled')),
  created_at TIMESTAMP DEFAULT current_timestamp,
  updated_at TIMESTAMP DEFAULT current_timestamp
);

-- Line items; order_items.order_id references orders.id, order_items.product_id references products.id
CREATE TABLE IF NOT EXISTS order_items (
  id VARCHAR PRIMARY KEY,
  order_id VARCHAR NOT NULL,
  product_id VARCHAR NOT NULL,
  quantity INTEGER NOT NULL,
  unit_price DOUBLE NOT NULL
);
"#;

/// Creates the e-commerce tables if they do not exist yet.
pub fn bootstrap(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(DATABASE_SCHEMA)
}

/// Static description of the database handed to the model as context.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    text: String,
}

impl SchemaDescriptor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The schema the service itself creates and serves.
    pub fn ecommerce() -> Self {
        Self::new(DATABASE_SCHEMA.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::ecommerce()
    }
}
