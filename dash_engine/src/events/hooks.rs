use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::task::JoinHandle;

use crate::events::{
    DasherAssignedEvent,
    EventHandler,
    EventProducer,
    Handler,
    OrderCancelledEvent,
    OrderConfirmedEvent,
    OrderCreatedEvent,
    StatusChangedEvent,
};

type BoxedHook = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Cloneable handles that the engine APIs use to publish events. Each list has one entry per registered hook.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_confirmed_producer: Vec<EventProducer<OrderConfirmedEvent>>,
    pub dasher_assigned_producer: Vec<EventProducer<DasherAssignedEvent>>,
    pub status_changed_producer: Vec<EventProducer<StatusChangedEvent>>,
    pub order_cancelled_producer: Vec<EventProducer<OrderCancelledEvent>>,
}

impl EventProducers {
    pub async fn publish_order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_confirmed(&self, event: OrderConfirmedEvent) {
        for producer in &self.order_confirmed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_dasher_assigned(&self, event: DasherAssignedEvent) {
        for producer in &self.dasher_assigned_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_status_changed(&self, event: StatusChangedEvent) {
        for producer in &self.status_changed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_cancelled(&self, event: OrderCancelledEvent) {
        for producer in &self.order_cancelled_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_confirmed: Option<EventHandler<OrderConfirmedEvent>>,
    pub on_dasher_assigned: Option<EventHandler<DasherAssignedEvent>>,
    pub on_status_changed: Option<EventHandler<StatusChangedEvent>>,
    pub on_order_cancelled: Option<EventHandler<OrderCancelledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_created: hooks.on_order_created.map(|f| EventHandler::new("order_created", buffer_size, f)),
            on_order_confirmed: hooks
                .on_order_confirmed
                .map(|f| EventHandler::new("order_confirmed", buffer_size, f)),
            on_dasher_assigned: hooks
                .on_dasher_assigned
                .map(|f| EventHandler::new("dasher_assigned", buffer_size, f)),
            on_status_changed: hooks.on_status_changed.map(|f| EventHandler::new("status_changed", buffer_size, f)),
            on_order_cancelled: hooks
                .on_order_cancelled
                .map(|f| EventHandler::new("order_cancelled", buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_confirmed {
            result.order_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_dasher_assigned {
            result.dasher_assigned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_cancelled {
            result.order_cancelled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns one task per registered hook. Each task ends once every producer for its hook has been dropped.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(handler) = self.on_order_created {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_confirmed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_dasher_assigned {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_status_changed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_cancelled {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        debug!("📬️ {} event handlers started", tasks.len());
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_confirmed: Option<Handler<OrderConfirmedEvent>>,
    pub on_dasher_assigned: Option<Handler<DasherAssignedEvent>>,
    pub on_status_changed: Option<Handler<StatusChangedEvent>>,
    pub on_order_cancelled: Option<Handler<OrderCancelledEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderConfirmedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_dasher_assigned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DasherAssignedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_dasher_assigned = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(StatusChangedEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_order_cancelled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCancelledEvent) -> BoxedHook) + Send + Sync + 'static {
        self.on_order_cancelled = Some(Arc::new(f));
        self
    }
}
