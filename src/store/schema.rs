use sqlx::PgPool;

// ============================================================================
// PostgreSQL Schema
// ============================================================================
//
// Created idempotently at startup. `order_items.custom_size_id` is NOT NULL
// and restricts deletes of referenced custom sizes, so a dangling measurement
// reference cannot be committed no matter how requests interleave.
//
// ============================================================================

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS customer_statuses (
    id   SMALLINT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

INSERT INTO customer_statuses (id, name)
VALUES (1, 'active'), (2, 'churned'), (3, 'prospect')
ON CONFLICT (id) DO NOTHING;

CREATE TABLE IF NOT EXISTS order_item_categories (
    id   SMALLINT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

INSERT INTO order_item_categories (id, name)
VALUES (1, 'Shirts'), (2, 'Trousers'), (3, 'Suits'), (4, 'Dresses'), (5, 'Jackets'), (6, 'Skirts')
ON CONFLICT (id) DO NOTHING;

CREATE TABLE IF NOT EXISTS customers (
    id              UUID PRIMARY KEY,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL,
    status_id       SMALLINT NOT NULL REFERENCES customer_statuses (id),
    revenue_cents   BIGINT NOT NULL DEFAULT 0,
    order_count     INTEGER NOT NULL DEFAULT 0,
    last_order_date TIMESTAMPTZ,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    modified_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX IF NOT EXISTS customers_email_lower_idx ON customers (lower(email));

CREATE TABLE IF NOT EXISTS orders (
    id                 UUID PRIMARY KEY,
    customer_id        UUID NOT NULL REFERENCES customers (id) ON DELETE CASCADE,
    order_date         TIMESTAMPTZ NOT NULL,
    total_amount_cents BIGINT NOT NULL DEFAULT 0,
    created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
    modified_at        TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS orders_customer_date_idx ON orders (customer_id, order_date DESC);

CREATE TABLE IF NOT EXISTS custom_sizes (
    id          UUID PRIMARY KEY,
    chest       DOUBLE PRECISION NOT NULL CHECK (chest > 0),
    waist       DOUBLE PRECISION NOT NULL CHECK (waist > 0),
    hips        DOUBLE PRECISION NOT NULL CHECK (hips > 0),
    modified_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS custom_sizes_triple_idx ON custom_sizes (chest, waist, hips);

CREATE TABLE IF NOT EXISTS order_items (
    id             UUID PRIMARY KEY,
    order_id       UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    item_name      TEXT NOT NULL,
    category_id    SMALLINT REFERENCES order_item_categories (id),
    price_cents    BIGINT NOT NULL,
    custom_size_id UUID NOT NULL REFERENCES custom_sizes (id) ON DELETE RESTRICT,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    modified_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS order_items_order_idx ON order_items (order_id);
CREATE INDEX IF NOT EXISTS order_items_custom_size_idx ON order_items (custom_size_id);
"#;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("✅ Database schema ready");
    Ok(())
}
