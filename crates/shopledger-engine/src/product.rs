//! # Product Lifecycle
//!
//! Registration, editing and soft deletion of products. Lives on
//! [`StockEngine`] because registration and stock edits write movements.
//!
//! | Operation        | Movement                      | Transaction                |
//! |------------------|-------------------------------|----------------------------|
//! | create (stock>0) | entry "Entrada Inicial"       | expense cost×stock, if > 0 |
//! | update (stock Δ) | entry/exit "Ajuste Manual"    | none                       |
//! | delete           | none                          | none                       |

use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use shopledger_core::stock::{initial_investment, initial_stock, manual_edit};
use shopledger_core::validation::{validate_new_product, validate_product_patch};
use shopledger_core::{
    CoreError, NewProduct, Product, ProductPatch, ProductStatus, TransactionStatus,
    ValidationError,
};
use shopledger_db::{
    generate_id, DbError, MovementRepository, ProductRepository, TransactionRepository,
};

use crate::audit;
use crate::error::{EngineError, EngineResult};
use crate::notify::Entity;
use crate::stock::StockEngine;

/// A product after an edit, with the stock it had before.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub product: Product,
    pub old_stock: i64,
}

impl StockEngine {
    /// Registers a product. Initial stock is recorded as an entry and, when
    /// it costs something, as a stock purchase.
    pub async fn create_product(
        &self,
        actor_id: Option<&str>,
        new_product: NewProduct,
    ) -> EngineResult<Product> {
        validate_new_product(&new_product)?;

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();

        let product = Product {
            id: generate_id(),
            name: new_product.name.trim().to_string(),
            category: new_product.category.trim().to_string(),
            price_cents: new_product.price_cents,
            cost_cents: new_product.cost_cents,
            stock: new_product.stock,
            min_stock: new_product.min_stock,
            status: ProductStatus::for_stock(new_product.stock),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        let investment = initial_investment(&product.name, product.cost(), product.stock)?;

        let mut tx = self.ctx.db.begin_immediate().await?;

        if let Some(expense) = &investment {
            self.ctx.ensure_balance(&mut tx, expense.amount).await?;
        }

        ProductRepository::insert(&mut *tx, &product).await?;

        if let Some(draft) = initial_stock(product.stock) {
            let movement = self.ctx.movement(&product.id, actor.as_deref(), draft, now);
            MovementRepository::insert(&mut *tx, &movement).await?;
        }

        let invested = investment.is_some();
        if let Some(draft) = investment {
            let entry = self.ctx.ledger_entry(draft, TransactionStatus::Paid, now);
            TransactionRepository::insert(&mut *tx, &entry).await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(product_id = %product.id, name = %product.name, stock = product.stock, "Product created");

        let value = product.stock_value();
        self.ctx
            .audit(
                actor.as_deref(),
                audit::PRODUCT_CREATE,
                audit::INVENTORY,
                format!(
                    "Cadastrou: {} | Inicial: {} un | Valor: {}",
                    product.name, product.stock, value
                ),
            )
            .await;
        self.ctx.invalidate_analytics();
        self.ctx.emit(Entity::Products, "create");
        if invested {
            self.ctx.emit(Entity::Transactions, "create");
        }

        Ok(product)
    }

    /// Applies a partial edit. A stock change is recorded as one manual
    /// movement and never reaches the ledger.
    pub async fn update_product(
        &self,
        actor_id: Option<&str>,
        id: &str,
        patch: ProductPatch,
    ) -> EngineResult<ProductUpdate> {
        debug!(product_id = %id, "update_product");
        validate_product_patch(&patch)?;

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();

        let mut tx = self.ctx.db.begin_immediate().await?;

        let current = ProductRepository::find_active(&mut *tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        let old_stock = current.stock;

        let stock = patch.stock.unwrap_or(old_stock);
        let edited = Product {
            name: patch
                .name
                .map(|n| n.trim().to_string())
                .unwrap_or(current.name),
            category: patch
                .category
                .map(|c| c.trim().to_string())
                .unwrap_or(current.category),
            price_cents: patch.price_cents.unwrap_or(current.price_cents),
            cost_cents: patch.cost_cents.unwrap_or(current.cost_cents),
            stock,
            min_stock: patch.min_stock.unwrap_or(current.min_stock),
            status: ProductStatus::for_stock(stock),
            updated_at: now,
            ..current
        };

        let product = ProductRepository::update(&mut *tx, &edited)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        if let Some(draft) = manual_edit(old_stock, product.stock) {
            let movement = self.ctx.movement(&product.id, actor.as_deref(), draft, now);
            MovementRepository::insert(&mut *tx, &movement).await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(product_id = %product.id, old_stock, stock = product.stock, "Product updated");

        let mut details = format!("Editou o produto {}.", product.name);
        if old_stock != product.stock {
            details.push_str(&format!(
                " Estoque alterado de {} para {} unidades.",
                old_stock, product.stock
            ));
        }
        self.ctx
            .audit(actor.as_deref(), audit::PRODUCT_UPDATE, audit::INVENTORY, details)
            .await;
        self.ctx.invalidate_analytics();
        self.ctx.emit(Entity::Products, "update");

        Ok(ProductUpdate { product, old_stock })
    }

    /// Soft-deletes products, keeping their history. Returns how many were
    /// deleted; unknown or already deleted ids are skipped.
    pub async fn delete_products(&self, actor_id: Option<&str>, ids: &[String]) -> EngineResult<u64> {
        if ids.is_empty() {
            return Err(EngineError::validation(ValidationError::Required {
                field: "ids".into(),
            }));
        }

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();

        let mut tx = self.ctx.db.begin_immediate().await?;
        let mut deleted = 0u64;
        for id in ids {
            if ProductRepository::soft_delete(&mut *tx, id, now).await? {
                deleted += 1;
            }
        }
        tx.commit().await.map_err(DbError::transaction)?;

        info!(requested = ids.len(), deleted, "Products deleted");

        if deleted > 0 {
            self.ctx
                .audit(
                    actor.as_deref(),
                    audit::PRODUCT_DELETE,
                    audit::INVENTORY,
                    format!("Excluiu {} produto(s).", deleted),
                )
                .await;
            self.ctx.invalidate_analytics();
            self.ctx.emit(Entity::Products, "delete");
        }

        Ok(deleted)
    }

    /// Non-deleted products, newest first.
    pub async fn list_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.ctx.db.products().list_active().await?)
    }

    pub async fn get_product(&self, id: &str) -> EngineResult<Product> {
        self.ctx
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }
}
