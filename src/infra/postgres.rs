//! Postgres-backed document store and identity provider.
//!
//! Carts, order items and address snapshots are kept as JSONB documents so the
//! tables mirror the document layout of the hosted backend.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{Avatar, CartLine, DeliveryAddress, NewAddress, NewOrder, OrderRecord, OrderStatus, SavedAddress, UserProfile};
use crate::domain::value_objects::{Money, OrderId, PaymentMethod, UserId};
use crate::infra::credentials;
use crate::ports::{AuthError, DocumentStore, IdentityProvider, StoreError, StoreResult, UserIdentity};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    address: Json<DeliveryAddress>,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for SavedAddress {
    fn from(row: AddressRow) -> Self {
        Self { id: row.id, address: row.address.0, is_default: row.is_default, created_at: row.created_at }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    uid: String,
    items: Json<Vec<CartLine>>,
    address: Json<DeliveryAddress>,
    payment_method: String,
    status: Option<String>,
    total_amount: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_method: PaymentMethod = row.payment_method.parse().map_err(|e| StoreError::Malformed(format!("order {}: {e}", row.id)))?;
        let status = match row.status.as_deref() {
            None | Some("") => OrderStatus::default(),
            Some(s) => s.parse().map_err(|e| StoreError::Malformed(format!("order {}: {e}", row.id)))?,
        };
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            owner_id: UserId::new(row.uid),
            items: row.items.0,
            address: row.address.0,
            payment_method,
            total_amount: Money::new(row.total_amount, &row.currency),
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    uid: String,
    email: String,
    avatar: String,
    created_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, uid, items, address, payment_method, status, total_amount, currency, created_at";

impl DocumentStore for PgDocumentStore {
    async fn get_cart(&self, user: &UserId) -> StoreResult<Vec<CartLine>> {
        let row: Option<(Json<Vec<CartLine>>,)> = sqlx::query_as("SELECT items FROM carts WHERE uid = $1")
            .bind(user.as_str()).fetch_optional(&self.pool).await?;
        Ok(row.map(|(items,)| items.0).unwrap_or_default())
    }

    async fn set_cart(&self, user: &UserId, lines: &[CartLine]) -> StoreResult<()> {
        sqlx::query("INSERT INTO carts (uid, items, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (uid) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()")
            .bind(user.as_str()).bind(Json(lines)).execute(&self.pool).await?;
        Ok(())
    }

    async fn get_addresses(&self, user: &UserId) -> StoreResult<Vec<SavedAddress>> {
        let rows = sqlx::query_as::<_, AddressRow>("SELECT id, address, is_default, created_at FROM user_addresses WHERE uid = $1 ORDER BY created_at DESC")
            .bind(user.as_str()).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(SavedAddress::from).collect())
    }

    async fn add_address(&self, user: &UserId, address: NewAddress) -> StoreResult<Uuid> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await?;
        if address.is_default {
            sqlx::query("UPDATE user_addresses SET is_default = FALSE WHERE uid = $1 AND is_default")
                .bind(user.as_str()).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO user_addresses (id, uid, address, is_default, created_at) VALUES ($1, $2, $3, $4, NOW())")
            .bind(id).bind(user.as_str()).bind(Json(&address.address)).bind(address.is_default)
            .execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn set_default_address(&self, user: &UserId, address_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let owned: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM user_addresses WHERE id = $1 AND uid = $2 FOR UPDATE")
            .bind(address_id).bind(user.as_str()).fetch_optional(&mut *tx).await?;
        if owned.is_none() { return Ok(false); }
        sqlx::query("UPDATE user_addresses SET is_default = FALSE WHERE uid = $1 AND is_default")
            .bind(user.as_str()).execute(&mut *tx).await?;
        sqlx::query("UPDATE user_addresses SET is_default = TRUE WHERE id = $1")
            .bind(address_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn create_order(&self, user: &UserId, order: NewOrder) -> StoreResult<OrderId> {
        let id = OrderId::generate();
        sqlx::query("INSERT INTO orders (id, uid, items, address, payment_method, status, total_amount, currency, created_at) VALUES ($1, $2, $3, $4, $5, 'placed', $6, $7, NOW())")
            .bind(id.as_uuid()).bind(user.as_str()).bind(Json(&order.items)).bind(Json(&order.address))
            .bind(order.payment_method.as_str()).bind(order.total_amount.amount()).bind(order.total_amount.currency())
            .execute(&self.pool).await?;
        Ok(id)
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<OrderRecord>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        row.map(OrderRecord::try_from).transpose()
    }

    async fn list_orders(&self, user: &UserId) -> StoreResult<Vec<OrderRecord>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE uid = $1 ORDER BY created_at DESC"))
            .bind(user.as_str()).fetch_all(&self.pool).await?;
        rows.into_iter().map(OrderRecord::try_from).collect()
    }

    async fn ensure_profile(&self, user: &UserId, email: &str) -> StoreResult<bool> {
        let result = sqlx::query("INSERT INTO user_profiles (uid, email, created_at) VALUES ($1, $2, NOW()) ON CONFLICT (uid) DO NOTHING")
            .bind(user.as_str()).bind(email).execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_profile(&self, user: &UserId) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT uid, email, avatar, created_at FROM user_profiles WHERE uid = $1")
            .bind(user.as_str()).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| UserProfile {
            uid: UserId::new(r.uid),
            email: r.email,
            // Avatars written by older clients may be outside the current set.
            avatar: Avatar::parse(&r.avatar).unwrap_or_default(),
            created_at: r.created_at,
        }))
    }

    async fn set_avatar(&self, user: &UserId, avatar: &Avatar) -> StoreResult<()> {
        sqlx::query("UPDATE user_profiles SET avatar = $2 WHERE uid = $1")
            .bind(user.as_str()).bind(avatar.as_str()).execute(&self.pool).await?;
        Ok(())
    }
}

/// Email/password identities with Argon2 hashed credentials.
#[derive(Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

impl IdentityProvider for PgIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let email = credentials::normalize_email(email)?;
        let row: Option<(String, String)> = sqlx::query_as("SELECT uid, password_hash FROM identities WHERE email = $1")
            .bind(&email).fetch_optional(&self.pool).await
            .map_err(|e| AuthError::Unavailable(e.into()))?;
        let Some((uid, phc)) = row else { return Err(AuthError::InvalidCredentials) };
        if credentials::verify_password(password, &phc).await? {
            Ok(UserIdentity { uid: UserId::new(uid), email })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let email = credentials::normalize_email(email)?;
        credentials::check_password_policy(password)?;
        let phc = credentials::hash_password(password).await?;
        let uid = Uuid::new_v4().simple().to_string();
        let inserted: Option<(String,)> = sqlx::query_as("INSERT INTO identities (email, uid, password_hash, created_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT (email) DO NOTHING RETURNING uid")
            .bind(&email).bind(&uid).bind(&phc).fetch_optional(&self.pool).await
            .map_err(|e| AuthError::Unavailable(e.into()))?;
        match inserted {
            Some((uid,)) => Ok(UserIdentity { uid: UserId::new(uid), email }),
            None => Err(AuthError::EmailInUse),
        }
    }
}
