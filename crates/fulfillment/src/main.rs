//! Demo entry point: wires every service onto one bus and runs an order
//! from creation to delivery.

use common::{Money, OrderId};
use event_bus::EventBus;
use inventory::{InventoryConfig, InventoryLedger, StockItem};
use notifications::NotificationService;
use orders::{OrderRegistry, OrderRequest};
use shipping::{ShippingConfig, ShippingService};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Create the bus and the services
    let bus = EventBus::new();
    let registry = OrderRegistry::new(bus.clone());
    let ledger = InventoryLedger::new(bus.clone(), InventoryConfig::from_env());
    let shipping = ShippingService::new(bus.clone(), ShippingConfig::from_env());
    let notifications = NotificationService::new();

    // 3. Subscribe every service's handlers
    registry.attach().await;
    ledger.attach().await;
    shipping.attach().await;
    notifications.attach(&bus).await;

    // 4. Seed the catalog
    for product in [
        StockItem::new("MacBook Pro", 10, Money::from_dollars(1999), "laptops"),
        StockItem::new("Mechanical Keyboard", 25, Money::from_dollars(129), "accessories"),
        StockItem::new("4K Monitor", 4, Money::from_dollars(549), "displays"),
    ] {
        ledger
            .add_product(product)
            .await
            .expect("failed to seed catalog");
    }

    // 5. Create an order; everything downstream reacts over the bus
    let order = registry
        .create_order(
            OrderRequest::new("ORD1", "customer@example.com", "MacBook Pro")
                .with_address("1 Infinite Loop"),
        )
        .await
        .expect("order creation failed");
    tracing::info!(order_id = %order.order_id, "order accepted, saga running");

    // 6. Wait for the saga to reach delivered
    let order_id = OrderId::new("ORD1");
    loop {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Some(current) = registry.get(&order_id).await
            && current.status.is_terminal()
        {
            tracing::info!(status = %current.status, "saga finished");
            break;
        }
    }

    // 7. Report the end state
    for notification in notifications.all().await {
        tracing::info!(subject = %notification.subject, "notification sent");
    }
    if let Some(reservation) = ledger.reservation_for(&order_id).await {
        tracing::info!(
            item = %reservation.item,
            status = %reservation.status,
            "reservation settled"
        );
    }

    shipping.shutdown().await;
}
