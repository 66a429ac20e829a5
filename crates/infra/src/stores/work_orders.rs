use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use billcraft_core::{DomainError, DomainResult, ItemKey, OfferVersionId, ProjectId, WorkOrderId};
use billcraft_invoicing::ExecutedQuantity;
use billcraft_lifecycle::{CustomerSnapshot, OrderStatus, WorkOrder, WorkOrderItem, WorkOrders};

/// In-memory work-order collaborator.
///
/// One order per `(project, offer)`. Besides the boundary trait it exposes
/// execution-progress helpers so tests and dev tooling can simulate work
/// being performed.
#[derive(Debug, Default)]
pub struct InMemoryWorkOrders {
    orders: RwLock<HashMap<(ProjectId, OfferVersionId), WorkOrder>>,
}

impl InMemoryWorkOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, project_id: ProjectId, offer_id: OfferVersionId) -> Option<WorkOrder> {
        let orders = self.orders.read().ok()?;
        orders.get(&(project_id, offer_id)).cloned()
    }

    /// Overwrite the executed quantity of one item.
    pub fn record_progress(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        key: &ItemKey,
        executed: Decimal,
    ) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("work order lock poisoned"))?;
        let order = orders
            .get_mut(&(project_id, offer_id))
            .ok_or(DomainError::NotFound)?;
        let item = order
            .items
            .iter_mut()
            .find(|i| i.key == *key)
            .ok_or(DomainError::NotFound)?;
        item.executed_quantity = executed;
        Ok(())
    }

    /// Append work performed outside the offer.
    pub fn add_extra(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        item: WorkOrderItem,
    ) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("work order lock poisoned"))?;
        let order = orders
            .get_mut(&(project_id, offer_id))
            .ok_or(DomainError::NotFound)?;
        order.items.push(item);
        Ok(())
    }

    /// Mark every non-cancelled order of the project completed.
    pub fn complete_all(&self, project_id: ProjectId) {
        if let Ok(mut orders) = self.orders.write() {
            for order in orders.values_mut() {
                if order.project_id == project_id && order.status != OrderStatus::Cancelled {
                    order.status = OrderStatus::Completed;
                }
            }
        }
    }
}

impl WorkOrders for InMemoryWorkOrders {
    fn find_or_create(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        items: Vec<WorkOrderItem>,
        customer: Option<CustomerSnapshot>,
    ) -> DomainResult<WorkOrder> {
        use std::collections::hash_map::Entry;

        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("work order lock poisoned"))?;

        let order = match orders.entry((project_id, offer_id)) {
            Entry::Occupied(entry) => {
                // Refresh in place; re-acceptance revives a cancelled order.
                let order = entry.into_mut();
                order.items = items;
                order.customer = customer;
                if order.status == OrderStatus::Cancelled {
                    order.status = OrderStatus::Open;
                    order.cancelled_at = None;
                }
                order
            }
            Entry::Vacant(entry) => entry.insert(WorkOrder {
                id: WorkOrderId::new(),
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
            .map_err(|_| DomainError::conflict("work order lock poisoned"))?;

        if let Some(order) = orders.get_mut(&(project_id, offer_id)) {
            order.status = OrderStatus::Cancelled;
            order.cancelled_at = Some(at);
        }
        Ok(())
    }

    fn executed_quantities(&self, project_id: ProjectId) -> Vec<ExecutedQuantity> {
        let orders = match self.orders.read() {
            Ok(o) => o,
            Err(_) => return Vec::new(),
        };

        orders
            .values()
            .filter(|o| o.project_id == project_id && o.status != OrderStatus::Cancelled)
            .flat_map(|o| o.items.iter())
            .map(|item| ExecutedQuantity {
                key: item.key.clone(),
                name: item.name.clone(),
                unit: item.unit.clone(),
                offered: item.offered_quantity,
                executed: item.executed_quantity,
                is_extra: item.is_extra,
            })
            .collect()
    }

    fn all_completed(&self, project_id: ProjectId) -> bool {
        let orders = match self.orders.read() {
            Ok(o) => o,
            Err(_) => return false,
        };

        let mut any = false;
        for order in orders.values() {
            if order.project_id == project_id && order.status != OrderStatus::Cancelled {
                any = true;
                if order.status != OrderStatus::Completed {
                    return false;
                }
            }
        }
        any
    }
}
