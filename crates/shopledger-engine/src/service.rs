//! # Service Fulfillment Engine
//!
//! Repair orders that consume parts from stock and bill the client.
//!
//! ## Order lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create ──► pending ◄──► in_progress ──► delivered (terminal)           │
//! │    │                                        │                           │
//! │    ├─ parts: guarded decrement + exit       ├─ delivered_at = now       │
//! │    │  movement per line, cost snapshot      └─ linked pending income    │
//! │    └─ income (price > 0):                      marked paid              │
//! │         paid if created delivered,                                      │
//! │         pending otherwise                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The income is linked to its order by `service_order_id`. Editing the
//! client, device or price mirrors onto the income while it is pending.

use tracing::{debug, info};

use shopledger_core::stock::{
    amount_out_of_range, insufficient_stock, service_consumption_reason, service_description,
    service_income, MovementDraft,
};
use shopledger_core::validation::{
    validate_new_service_order, validate_non_negative, validate_optional_text,
    validate_required_text,
};
use shopledger_core::{
    CoreError, Money, MovementType, NewServiceOrder, PartRequest, ServiceOrder, ServiceOrderPatch,
    ServiceOrderWithParts, ServicePart, ServiceStatus, TransactionStatus, MAX_DESCRIPTION_LEN,
    MAX_LABEL_LEN,
};
use shopledger_db::{
    generate_id, DbError, MovementRepository, ProductRepository, ServiceOrderRepository,
    TransactionRepository,
};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::notify::Entity;

fn validate_patch(patch: &ServiceOrderPatch) -> Result<(), shopledger_core::ValidationError> {
    if let Some(client_name) = &patch.client_name {
        validate_required_text("client_name", client_name, MAX_LABEL_LEN)?;
    }
    if let Some(device_model) = &patch.device_model {
        validate_required_text("device_model", device_model, MAX_LABEL_LEN)?;
    }
    validate_optional_text("client_phone", patch.client_phone.as_deref(), MAX_LABEL_LEN)?;
    validate_optional_text("description", patch.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    if let Some(price) = patch.price_cents {
        validate_non_negative("price", price)?;
    }
    Ok(())
}

/// Service orders and their parts.
#[derive(Debug, Clone)]
pub struct ServiceEngine {
    ctx: EngineContext,
}

impl ServiceEngine {
    pub(crate) fn new(ctx: EngineContext) -> Self {
        ServiceEngine { ctx }
    }

    /// Opens an order, consuming every part from stock.
    ///
    /// Either every part is consumed and the order exists, or nothing
    /// changed: one short part aborts the whole order.
    pub async fn create_service_order(
        &self,
        actor_id: Option<&str>,
        details: NewServiceOrder,
        parts: Vec<PartRequest>,
    ) -> EngineResult<ServiceOrderWithParts> {
        validate_new_service_order(&details)?;
        if let Some(bad) = parts.iter().find(|p| p.quantity <= 0) {
            return Err(CoreError::InvalidQuantity(bad.quantity).into());
        }

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();

        let order_id = generate_id();
        let client_name = details.client_name.trim().to_string();
        let device_model = details.device_model.trim().to_string();
        let reason = service_consumption_reason(&device_model, &client_name);

        let mut tx = self.ctx.db.begin_immediate().await?;

        let mut lines = Vec::with_capacity(parts.len());
        let mut parts_cost = Money::zero();
        for request in &parts {
            let product = match ProductRepository::apply_stock_delta(
                &mut *tx,
                &request.product_id,
                MovementType::Exit.signed(request.quantity),
                now,
            )
            .await?
            {
                Some(product) => product,
                None => {
                    return Err(
                        match ProductRepository::find_active(&mut *tx, &request.product_id).await? {
                            Some(current) => insufficient_stock(&current, request.quantity).into(),
                            None => CoreError::ProductNotFound(request.product_id.clone()).into(),
                        },
                    );
                }
            };

            let movement = self.ctx.movement(
                &product.id,
                actor.as_deref(),
                MovementDraft {
                    movement_type: MovementType::Exit,
                    quantity: request.quantity,
                    reason: reason.clone(),
                },
                now,
            );
            MovementRepository::insert(&mut *tx, &movement).await?;

            let line = ServicePart {
                id: generate_id(),
                service_order_id: order_id.clone(),
                product_id: product.id,
                quantity: request.quantity,
                unit_price_cents: product.price_cents,
                unit_cost_cents: product.cost_cents,
            };
            parts_cost = line
                .line_cost()
                .and_then(|cost| parts_cost.checked_add(cost))
                .ok_or_else(|| amount_out_of_range("cost"))?;
            lines.push(line);
        }

        let delivered = details.status == ServiceStatus::Delivered;
        let order = ServiceOrder {
            id: order_id,
            client_name,
            client_phone: details.client_phone,
            device_model,
            description: details.description,
            status: details.status,
            price_cents: details.price_cents,
            cost_cents: parts_cost.cents(),
            front_image_url: details.front_image_url,
            back_image_url: details.back_image_url,
            created_at: now,
            delivered_at: delivered.then_some(now),
        };

        ServiceOrderRepository::insert(&mut *tx, &order).await?;
        for line in &lines {
            ServiceOrderRepository::insert_part(&mut *tx, line).await?;
        }

        let income = match service_income(&order.device_model, &order.client_name, order.price(), parts_cost)
        {
            Some(draft) => {
                let status = if delivered {
                    TransactionStatus::Paid
                } else {
                    TransactionStatus::Pending
                };
                let mut entry = self.ctx.ledger_entry(draft, status, now);
                entry.client_name = Some(order.client_name.clone());
                entry.service_order_id = Some(order.id.clone());
                TransactionRepository::insert(&mut *tx, &entry).await?;
                Some(entry)
            }
            None => None,
        };

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            service_order_id = %order.id,
            parts = lines.len(),
            price = %order.price(),
            cost = %parts_cost,
            "Service order created"
        );

        self.ctx
            .audit(
                actor.as_deref(),
                audit::SERVICE_CREATE,
                audit::SERVICES,
                format!(
                    "Criou serviço: {} para {} | Valor: {}",
                    order.device_model,
                    order.client_name,
                    order.price()
                ),
            )
            .await;
        self.ctx.emit(Entity::Services, "create");
        if !lines.is_empty() {
            self.ctx.invalidate_analytics();
            self.ctx.emit(Entity::Products, "update");
        }
        if income.is_some() {
            self.ctx.emit(Entity::Transactions, "create");
        }

        Ok(ServiceOrderWithParts { order, parts: lines })
    }

    /// Edits an order. Delivering it settles its pending income.
    pub async fn update_service_order(
        &self,
        actor_id: Option<&str>,
        id: &str,
        patch: ServiceOrderPatch,
    ) -> EngineResult<ServiceOrder> {
        debug!(service_order_id = %id, status = ?patch.status, "update_service_order");
        validate_patch(&patch)?;

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();
        let billing_changed = patch.changes_billing_details();

        let mut tx = self.ctx.db.begin_immediate().await?;

        let current = ServiceOrderRepository::find(&mut *tx, id)
            .await?
            .ok_or_else(|| CoreError::ServiceOrderNotFound(id.to_string()))?;

        let old_status = current.status;
        let old_price = current.price();
        let status = patch.status.unwrap_or(old_status);
        if !old_status.can_transition_to(status) {
            return Err(CoreError::InvalidStatusTransition {
                entity: "service order".into(),
                from: old_status.to_string(),
                to: status.to_string(),
            }
            .into());
        }
        let delivering = status == ServiceStatus::Delivered && old_status != ServiceStatus::Delivered;

        let edited = ServiceOrder {
            client_name: patch
                .client_name
                .map(|c| c.trim().to_string())
                .unwrap_or(current.client_name),
            client_phone: patch.client_phone.or(current.client_phone),
            device_model: patch
                .device_model
                .map(|d| d.trim().to_string())
                .unwrap_or(current.device_model),
            description: patch.description.or(current.description),
            status,
            price_cents: patch.price_cents.unwrap_or(current.price_cents),
            front_image_url: patch.front_image_url.or(current.front_image_url),
            back_image_url: patch.back_image_url.or(current.back_image_url),
            delivered_at: if delivering {
                Some(now)
            } else {
                current.delivered_at
            },
            ..current
        };

        let order = ServiceOrderRepository::update(&mut *tx, &edited)
            .await?
            .ok_or_else(|| CoreError::ServiceOrderNotFound(id.to_string()))?;

        let mut income_changed = false;
        if delivering || billing_changed {
            let pending = TransactionRepository::find_by_service_order(&mut *tx, &order.id)
                .await?
                .filter(|t| t.status == TransactionStatus::Pending);

            if let Some(income) = pending {
                if billing_changed {
                    income_changed |= TransactionRepository::sync_service_details(
                        &mut *tx,
                        &income.id,
                        &service_description(&order.device_model, &order.client_name),
                        &order.client_name,
                        order.price_cents,
                    )
                    .await?;
                }
                if delivering {
                    income_changed |= TransactionRepository::mark_paid(&mut *tx, &income.id, now).await?;
                }
            }
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            service_order_id = %order.id,
            from = %old_status,
            to = %order.status,
            income_changed,
            "Service order updated"
        );

        let mut details = format!("Atualizou serviço {}", order.device_model);
        if order.status != old_status {
            details.push_str(&format!(" | Status: {} -> {}", old_status, order.status));
            if delivering {
                details.push_str(&format!(" (Receita Contabilizada: {})", order.price()));
            }
        }
        if order.price() != old_price {
            details.push_str(&format!(" | Preço: {} -> {}", old_price, order.price()));
        }
        self.ctx
            .audit(actor.as_deref(), audit::SERVICE_UPDATE, audit::SERVICES, details)
            .await;
        self.ctx.emit(Entity::Services, "update");
        if income_changed {
            self.ctx.emit(Entity::Transactions, "update");
        }

        Ok(order)
    }

    /// Removes an order and its part lines. Consumed stock stays consumed;
    /// the linked income survives with its order reference cleared.
    pub async fn delete_service_order(&self, actor_id: Option<&str>, id: &str) -> EngineResult<()> {
        let actor = self.ctx.resolve_actor(actor_id).await;

        let mut tx = self.ctx.db.begin_immediate().await?;
        let order = ServiceOrderRepository::find(&mut *tx, id)
            .await?
            .ok_or_else(|| CoreError::ServiceOrderNotFound(id.to_string()))?;
        ServiceOrderRepository::delete(&mut *tx, id).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(service_order_id = %id, "Service order deleted");

        self.ctx
            .audit(
                actor.as_deref(),
                audit::SERVICE_DELETE,
                audit::SERVICES,
                format!(
                    "Excluiu serviço: {} para {}",
                    order.device_model, order.client_name
                ),
            )
            .await;
        self.ctx.emit(Entity::Services, "delete");

        Ok(())
    }

    /// All orders with their parts, newest first.
    pub async fn list_service_orders(&self) -> EngineResult<Vec<ServiceOrderWithParts>> {
        Ok(self.ctx.db.service_orders().list_with_parts().await?)
    }

    pub async fn get_service_order(&self, id: &str) -> EngineResult<ServiceOrderWithParts> {
        self.ctx
            .db
            .service_orders()
            .get_with_parts(id)
            .await?
            .ok_or_else(|| CoreError::ServiceOrderNotFound(id.to_string()).into())
    }
}
