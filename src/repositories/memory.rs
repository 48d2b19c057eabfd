//! In-memory stores for `database.backend = "memory"` and for service tests.
//!
//! Each store keeps its rows behind a `tokio::sync::RwLock`. Unique columns
//! are checked under the write lock and fail with the same `Duplicate`
//! error the PostgreSQL constraints produce.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{
    Category, LogActivity, LogEntry, LogFilter, NewCategory, NewLogEntry, NewPayment,
    NewPaymentMethod, NewProduct, NewUser, Payment, PaymentFilter, PaymentMethod, PaymentStatus,
    PaymentTransition, Product, ProductFilter, UpdateCategory, UpdateProduct, UpdateUser, User,
    Window,
};
use crate::repositories::{
    CategoryRepository, LogEntryRepository, PaymentMethodRepository, PaymentRepository,
    ProductRepository, UserRepository,
};

struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, window: Window) -> Vec<T> {
    rows.skip(window.offset.max(0) as usize)
        .take(window.limit.max(0) as usize)
        .collect()
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Default)]
pub struct MemoryUserRepository {
    table: RwLock<Table<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|u| u.username == new_user.username) {
            return Err(AppError::duplicate("users", "username", &new_user.username));
        }
        if table.rows.values().any(|u| u.email == new_user.email) {
            return Err(AppError::duplicate("users", "email", &new_user.email));
        }

        let user = User {
            id: table.allocate_id(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            is_active: new_user.is_active,
            created_at: new_user.created_at,
            updated_at: None,
            last_login_at: None,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        Ok(self.table.read().await.rows.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>, AppError> {
        let table = self.table.read().await;
        let mut users: Vec<User> = table.rows.values().filter(|u| u.is_active).cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update(&self, user_id: i32, changes: UpdateUser) -> Result<Option<User>, AppError> {
        let mut table = self.table.write().await;
        if let Some(email) = changes.email.as_deref() {
            if table.rows.values().any(|u| u.id != user_id && u.email == email) {
                return Err(AppError::duplicate("users", "email", email));
            }
        }

        let Some(user) = table.rows.get_mut(&user_id) else {
            return Ok(None);
        };
        overwrite(&mut user.email, changes.email);
        overwrite(&mut user.password_hash, changes.password_hash);
        if changes.first_name.is_some() {
            user.first_name = changes.first_name;
        }
        if changes.last_name.is_some() {
            user.last_name = changes.last_name;
        }
        overwrite(&mut user.is_active, changes.is_active);
        if changes.updated_at.is_some() {
            user.updated_at = changes.updated_at;
        }
        if changes.last_login_at.is_some() {
            user.last_login_at = changes.last_login_at;
        }
        Ok(Some(user.clone()))
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Default)]
pub struct MemoryCategoryRepository {
    table: RwLock<Table<Category>>,
}

impl MemoryCategoryRepository {
    /// The four categories the catalog migration inserts.
    pub fn seeded() -> Self {
        let mut table = Table::default();
        let now = Utc::now();
        for (name, description) in [
            ("Electronics", "Electronic devices and gadgets"),
            ("Furniture", "Home and office furniture"),
            ("Books", "Books and educational materials"),
            ("Clothing", "Apparel and accessories"),
        ] {
            let id = table.allocate_id();
            table.rows.insert(
                id,
                Category {
                    id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    is_active: true,
                    created_at: now,
                    updated_at: None,
                },
            );
        }
        Self {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn create(&self, new_category: NewCategory) -> Result<Category, AppError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|c| c.name == new_category.name) {
            return Err(AppError::duplicate("categories", "name", &new_category.name));
        }

        let category = Category {
            id: table.allocate_id(),
            name: new_category.name,
            description: new_category.description,
            is_active: new_category.is_active,
            created_at: new_category.created_at,
            updated_at: None,
        };
        table.rows.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_active(&self, category_id: i32) -> Result<Option<Category>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&category_id).filter(|c| c.is_active).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Category>, AppError> {
        let table = self.table.read().await;
        let mut categories: Vec<Category> =
            table.rows.values().filter(|c| c.is_active).cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_all(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn update(
        &self,
        category_id: i32,
        changes: UpdateCategory,
    ) -> Result<Option<Category>, AppError> {
        let mut table = self.table.write().await;
        if let Some(name) = changes.name.as_deref() {
            if table.rows.values().any(|c| c.id != category_id && c.name == name) {
                return Err(AppError::duplicate("categories", "name", name));
            }
        }

        let Some(category) = table.rows.get_mut(&category_id) else {
            return Ok(None);
        };
        overwrite(&mut category.name, changes.name);
        if changes.description.is_some() {
            category.description = changes.description;
        }
        overwrite(&mut category.is_active, changes.is_active);
        if changes.updated_at.is_some() {
            category.updated_at = changes.updated_at;
        }
        Ok(Some(category.clone()))
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Default)]
pub struct MemoryProductRepository {
    table: RwLock<Table<Product>>,
}

fn sku_taken(table: &Table<Product>, sku: &str, except: Option<i32>) -> bool {
    table
        .rows
        .values()
        .any(|p| Some(p.id) != except && p.sku.as_deref() == Some(sku))
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn create(&self, new_product: NewProduct) -> Result<Product, AppError> {
        let mut table = self.table.write().await;
        if let Some(sku) = new_product.sku.as_deref() {
            if sku_taken(&table, sku, None) {
                return Err(AppError::duplicate("products", "sku", sku));
            }
        }

        let product = Product {
            id: table.allocate_id(),
            name: new_product.name,
            description: new_product.description,
            price: new_product.price,
            category_id: new_product.category_id,
            sku: new_product.sku,
            stock: new_product.stock,
            is_active: new_product.is_active,
            image_url: new_product.image_url,
            created_at: new_product.created_at,
            updated_at: None,
            created_by: new_product.created_by,
            updated_by: None,
        };
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_active(&self, product_id: i32) -> Result<Option<Product>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&product_id).filter(|p| p.is_active).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Product>, AppError> {
        self.search(&ProductFilter::default(), Window::first(i64::MAX)).await
    }

    async fn search(
        &self,
        filter: &ProductFilter,
        window: Window,
    ) -> Result<Vec<Product>, AppError> {
        let table = self.table.read().await;
        let mut products: Vec<&Product> = table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page(products.into_iter().cloned(), window))
    }

    async fn update(
        &self,
        product_id: i32,
        changes: UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let mut table = self.table.write().await;
        if let Some(sku) = changes.sku.as_deref() {
            if sku_taken(&table, sku, Some(product_id)) {
                return Err(AppError::duplicate("products", "sku", sku));
            }
        }

        let Some(product) = table.rows.get_mut(&product_id) else {
            return Ok(None);
        };
        overwrite(&mut product.name, changes.name);
        if changes.description.is_some() {
            product.description = changes.description;
        }
        overwrite(&mut product.price, changes.price);
        overwrite(&mut product.category_id, changes.category_id);
        if changes.sku.is_some() {
            product.sku = changes.sku;
        }
        overwrite(&mut product.stock, changes.stock);
        overwrite(&mut product.is_active, changes.is_active);
        if changes.image_url.is_some() {
            product.image_url = changes.image_url;
        }
        if changes.updated_at.is_some() {
            product.updated_at = changes.updated_at;
        }
        if changes.updated_by.is_some() {
            product.updated_by = changes.updated_by;
        }
        Ok(Some(product.clone()))
    }

    async fn count_active_by_category(&self) -> Result<HashMap<i32, i64>, AppError> {
        let table = self.table.read().await;
        let mut counts = HashMap::new();
        for product in table.rows.values().filter(|p| p.is_active) {
            *counts.entry(product.category_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

// ============================================================================
// Payment methods
// ============================================================================

#[derive(Default)]
pub struct MemoryPaymentMethodRepository {
    table: RwLock<Table<PaymentMethod>>,
}

impl MemoryPaymentMethodRepository {
    /// The four methods the payments migration inserts.
    pub fn seeded() -> Self {
        let mut table = Table::default();
        let now = Utc::now();
        for (name, description, fee_tenths) in [
            ("Credit Card", "Visa, MasterCard, American Express", 29),
            ("PayPal", "PayPal payments", 34),
            ("Bank Transfer", "Direct bank transfer", 5),
            ("Apple Pay", "Apple Pay mobile payments", 25),
        ] {
            let id = table.allocate_id();
            table.rows.insert(
                id,
                PaymentMethod {
                    id,
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    is_active: true,
                    processing_fee: BigDecimal::new(fee_tenths.into(), 1),
                    created_at: now,
                },
            );
        }
        Self {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl PaymentMethodRepository for MemoryPaymentMethodRepository {
    async fn create(&self, new_method: NewPaymentMethod) -> Result<PaymentMethod, AppError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|m| m.name == new_method.name) {
            return Err(AppError::duplicate("payment_methods", "name", &new_method.name));
        }

        let method = PaymentMethod {
            id: table.allocate_id(),
            name: new_method.name,
            description: new_method.description,
            is_active: new_method.is_active,
            processing_fee: new_method.processing_fee,
            created_at: new_method.created_at,
        };
        table.rows.insert(method.id, method.clone());
        Ok(method)
    }

    async fn find_by_id(&self, method_id: i32) -> Result<Option<PaymentMethod>, AppError> {
        Ok(self.table.read().await.rows.get(&method_id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<PaymentMethod>, AppError> {
        let table = self.table.read().await;
        let mut methods: Vec<PaymentMethod> =
            table.rows.values().filter(|m| m.is_active).cloned().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(methods)
    }

    async fn list_all(&self) -> Result<Vec<PaymentMethod>, AppError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Default)]
pub struct MemoryPaymentRepository {
    table: RwLock<Table<Payment>>,
}

fn newest_payments_first(a: &&Payment, b: &&Payment) -> std::cmp::Ordering {
    b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id))
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn create(&self, new_payment: NewPayment) -> Result<Payment, AppError> {
        let mut table = self.table.write().await;
        let payment = Payment {
            id: table.allocate_id(),
            order_id: new_payment.order_id,
            amount: new_payment.amount,
            payment_method_id: new_payment.payment_method_id,
            status: new_payment.status,
            transaction_id: None,
            description: new_payment.description,
            reference: new_payment.reference,
            user_id: new_payment.user_id,
            payment_date: new_payment.payment_date,
            processed_at: None,
            created_at: new_payment.created_at,
            updated_at: None,
        };
        table.rows.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn find_by_id(&self, payment_id: i32) -> Result<Option<Payment>, AppError> {
        Ok(self.table.read().await.rows.get(&payment_id).cloned())
    }

    async fn list(&self, window: Window) -> Result<Vec<Payment>, AppError> {
        self.search(&PaymentFilter::default(), window).await
    }

    async fn search(
        &self,
        filter: &PaymentFilter,
        window: Window,
    ) -> Result<Vec<Payment>, AppError> {
        let table = self.table.read().await;
        let mut payments: Vec<&Payment> = table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        payments.sort_by(newest_payments_first);
        Ok(page(payments.into_iter().cloned(), window))
    }

    async fn transition(
        &self,
        payment_id: i32,
        transition: PaymentTransition,
    ) -> Result<Option<Payment>, AppError> {
        let mut table = self.table.write().await;
        if let Some(txn) = transition.transaction_id.as_deref() {
            let taken = table
                .rows
                .values()
                .any(|p| p.id != payment_id && p.transaction_id.as_deref() == Some(txn));
            if taken {
                return Err(AppError::duplicate("payments", "transaction_id", txn));
            }
        }

        let Some(payment) = table
            .rows
            .get_mut(&payment_id)
            .filter(|p| p.status == PaymentStatus::Pending)
        else {
            return Ok(None);
        };
        payment.status = transition.status;
        payment.transaction_id = transition.transaction_id;
        payment.processed_at = transition.processed_at;
        payment.updated_at = Some(transition.updated_at);
        Ok(Some(payment.clone()))
    }

    async fn total_completed(&self) -> Result<BigDecimal, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|p| p.status == PaymentStatus::Completed)
            .map(|p| &p.amount)
            .sum())
    }

    async fn count_by_method(&self) -> Result<HashMap<i32, i64>, AppError> {
        let table = self.table.read().await;
        let mut counts = HashMap::new();
        for payment in table.rows.values() {
            *counts.entry(payment.payment_method_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

// ============================================================================
// Log entries
// ============================================================================

#[derive(Default)]
pub struct MemoryLogEntryRepository {
    table: RwLock<Table<LogEntry>>,
}

#[async_trait]
impl LogEntryRepository for MemoryLogEntryRepository {
    async fn create(&self, new_entry: NewLogEntry) -> Result<LogEntry, AppError> {
        let mut table = self.table.write().await;
        let entry = LogEntry {
            id: table.allocate_id(),
            service: new_entry.service,
            level: new_entry.level,
            message: new_entry.message,
            username: new_entry.username,
            request_id: new_entry.request_id,
            ip_address: new_entry.ip_address,
            user_agent: new_entry.user_agent,
            exception: new_entry.exception,
            additional_data: new_entry.additional_data,
            timestamp: new_entry.timestamp,
            created_at: new_entry.created_at,
        };
        table.rows.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_by_id(&self, entry_id: i32) -> Result<Option<LogEntry>, AppError> {
        Ok(self.table.read().await.rows.get(&entry_id).cloned())
    }

    async fn search(&self, filter: &LogFilter, window: Window) -> Result<Vec<LogEntry>, AppError> {
        let table = self.table.read().await;
        let mut entries: Vec<&LogEntry> = table
            .rows
            .values()
            .filter(|e| filter.matches(e))
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(page(entries.into_iter().cloned(), window))
    }

    async fn count(&self, filter: &LogFilter) -> Result<i64, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|e| filter.matches(e)).count() as i64)
    }

    async fn activity(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LogActivity>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
            .map(|e| LogActivity {
                service: e.service,
                level: e.level,
                timestamp: e.timestamp,
            })
            .collect())
    }

    async fn purge_before(&self, before: DateTime<Utc>) -> Result<usize, AppError> {
        let mut table = self.table.write().await;
        let initial = table.rows.len();
        table.rows.retain(|_, e| e.timestamp >= before);
        Ok(initial - table.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogLevel, Role, ServiceName};
    use chrono::Duration;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            first_name: None,
            last_name: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let repo = MemoryUserRepository::default();
        let alice = repo.create(new_user("alice", "a@example.com")).await.unwrap();
        assert_eq!(alice.id, 1);

        let err = repo.create(new_user("alice", "b@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field, .. } if field == "username"));

        let err = repo.create(new_user("bob", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_user_update_missing_row() {
        let repo = MemoryUserRepository::default();
        let result = repo.update(42, UpdateUser::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_transition_only_from_pending() {
        let repo = MemoryPaymentRepository::default();
        let now = Utc::now();
        let payment = repo
            .create(NewPayment {
                order_id: 1,
                amount: BigDecimal::from(10),
                payment_method_id: 1,
                status: PaymentStatus::Pending,
                description: None,
                reference: None,
                user_id: 3,
                payment_date: now,
                created_at: now,
            })
            .await
            .unwrap();

        let complete = PaymentTransition {
            status: PaymentStatus::Completed,
            transaction_id: Some("TXN_1".to_string()),
            processed_at: Some(now),
            updated_at: now,
        };
        assert!(repo.transition(payment.id, complete.clone()).await.unwrap().is_some());
        assert!(repo.transition(payment.id, complete).await.unwrap().is_none());
        assert!(
            repo.transition(
                99,
                PaymentTransition {
                    status: PaymentStatus::Failed,
                    transaction_id: None,
                    processed_at: None,
                    updated_at: now,
                }
            )
            .await
            .unwrap()
            .is_none()
        );
    }

    #[tokio::test]
    async fn test_purge_before() {
        let repo = MemoryLogEntryRepository::default();
        let now = Utc::now();
        for days in [1, 10, 100] {
            let at = now - Duration::days(days);
            repo.create(NewLogEntry {
                service: ServiceName::LogsService,
                level: LogLevel::Info,
                message: format!("{} days ago", days),
                username: None,
                request_id: None,
                ip_address: None,
                user_agent: None,
                exception: None,
                additional_data: None,
                timestamp: at,
                created_at: at,
            })
            .await
            .unwrap();
        }

        let deleted = repo.purge_before(now - Duration::days(30)).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.count(&LogFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_seeded_reference_data() {
        let categories = MemoryCategoryRepository::seeded();
        let names: Vec<String> = categories
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Books", "Clothing", "Electronics", "Furniture"]);

        let methods = MemoryPaymentMethodRepository::seeded();
        let card = methods.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(card.name, "Credit Card");
        assert_eq!(card.processing_fee.to_string(), "2.9");
    }
}
