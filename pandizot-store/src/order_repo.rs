use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pandizot_core::{CoreError, CoreResult, OrderRepository};
use pandizot_order::{Order, OrderItem, OrderStatus, ShippingAddress};
use pandizot_shared::Masked;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::storage_error;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Items and the address are stored as JSONB documents on the order row
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Option<String>,
    email: String,
    items: Json<Vec<OrderItem>>,
    shipping_address: Json<ShippingAddress>,
    status: String,
    notes: Option<String>,
    total: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = CoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(CoreError::StorageError)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            email: Masked::new(row.email),
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            status,
            notes: row.notes,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_ORDER: &str = "SELECT id, user_id, email, items, shipping_address, status, notes, total, \
     created_at, updated_at FROM orders";

fn into_orders(rows: Vec<OrderRow>) -> CoreResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &Order) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, email, items, shipping_address, status, notes, total, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id)
        .bind(&order.user_id)
        .bind(order.email.expose())
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.total)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1", SELECT_ORDER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders(&self) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{} ORDER BY created_at DESC", SELECT_ORDER))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        into_orders(rows)
    }

    async fn list_user_orders(&self, user_id: &str) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_ORDER
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        into_orders(rows)
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> CoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("order {}", id)));
        }
        Ok(())
    }
}
