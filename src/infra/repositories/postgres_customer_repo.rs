use crate::domain::{models::customer::{Customer, CustomerUpsert}, ports::CustomerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCustomerRepo {
    pool: PgPool,
}

impl PostgresCustomerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepo {
    async fn upsert_by_external_id(&self, params: &CustomerUpsert) -> Result<Customer, AppError> {
        let fresh = Customer::from_upsert(params);
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, external_id, name, phone, email, last_booking_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (external_id) DO UPDATE SET
                name = EXCLUDED.name,
                phone = COALESCE(EXCLUDED.phone, customers.phone),
                last_booking_at = EXCLUDED.last_booking_at,
                updated_at = EXCLUDED.updated_at
             RETURNING *"
        )
            .bind(&fresh.id).bind(&fresh.external_id).bind(&fresh.name).bind(&fresh.phone).bind(&fresh.email)
            .bind(fresh.last_booking_at).bind(fresh.created_at).bind(fresh.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE external_id = $1").bind(external_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
