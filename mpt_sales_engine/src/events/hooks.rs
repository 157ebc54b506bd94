use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, SaleReceivedEvent, SaleSettledEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub sale_received_producer: Vec<EventProducer<SaleReceivedEvent>>,
    pub sale_settled_producer: Vec<EventProducer<SaleSettledEvent>>,
}

impl EventProducers {
    pub async fn publish_sale_received(&self, event: SaleReceivedEvent) {
        for emitter in &self.sale_received_producer {
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_sale_settled(&self, event: SaleSettledEvent) {
        for emitter in &self.sale_settled_producer {
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_sale_received: Option<EventHandler<SaleReceivedEvent>>,
    pub on_sale_settled: Option<EventHandler<SaleSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_sale_received = hooks.on_sale_received.map(|f| EventHandler::new(buffer_size, f));
        let on_sale_settled = hooks.on_sale_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_sale_received, on_sale_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_sale_received {
            result.sale_received_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_sale_settled {
            result.sale_settled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_sale_received {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_sale_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_sale_received: Option<Handler<SaleReceivedEvent>>,
    pub on_sale_settled: Option<Handler<SaleSettledEvent>>,
}

impl EventHooks {
    pub fn on_sale_received<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SaleReceivedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_sale_received = Some(Arc::new(f));
        self
    }

    pub fn on_sale_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SaleSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_sale_settled = Some(Arc::new(f));
        self
    }
}
