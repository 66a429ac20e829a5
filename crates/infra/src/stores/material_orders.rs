use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use billcraft_core::{DomainError, DomainResult, MaterialOrderId, OfferVersionId, ProjectId};
use billcraft_lifecycle::{
    CustomerSnapshot, MaterialOrder, MaterialOrderItem, MaterialOrders, OrderStatus,
};

/// In-memory material-order collaborator. One order per `(project, offer)`.
#[derive(Debug, Default)]
pub struct InMemoryMaterialOrders {
    orders: RwLock<HashMap<(ProjectId, OfferVersionId), MaterialOrder>>,
}

impl InMemoryMaterialOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, project_id: ProjectId, offer_id: OfferVersionId) -> Option<MaterialOrder> {
        let orders = self.orders.read().ok()?;
        orders.get(&(project_id, offer_id)).cloned()
    }
}

impl MaterialOrders for InMemoryMaterialOrders {
    fn find_or_create(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        items: Vec<MaterialOrderItem>,
        customer: Option<CustomerSnapshot>,
    ) -> DomainResult<MaterialOrder> {
        use std::collections::hash_map::Entry;

        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("material order lock poisoned"))?;

        let order = match orders.entry((project_id, offer_id)) {
            Entry::Occupied(entry) => {
                let order = entry.into_mut();
                order.items = items;
                order.customer = customer;
                if order.status == OrderStatus::Cancelled {
                    order.status = OrderStatus::Open;
                    order.cancelled_at = None;
                }
                order
            }
            Entry::Vacant(entry) => entry.insert(MaterialOrder {
                id: MaterialOrderId::new(),
                project_id,
                offer_id,
                status: OrderStatus::Open,
                customer,
                items,
                created_at: Utc::now(),
                cancelled_at: None,
            }),
        };
        Ok(order.clone())
    }

    fn cancel(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("material order lock poisoned"))?;

        if let Some(order) = orders.get_mut(&(project_id, offer_id)) {
            order.status = OrderStatus::Cancelled;
            order.cancelled_at = Some(at);
        }
        Ok(())
    }
}
