use hawker_edge::money::format_amount;
use hawker_edge::{
    CheckoutRequest, EngineState, InMemoryCatalog, print_banner, setup_environment,
};
use rust_decimal::Decimal;
use shared::models::{MenuAddon, MenuItem, Stall};
use shared::order::PayMethod;
use shared::queue::TicketStatus;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment()?;

    print_banner();
    tracing::info!(environment = %config.environment, "Hawker edge starting...");

    // 2. 初始化引擎状态
    let state = EngineState::initialize(&config)?;

    // 3. 事件观察者
    let mut events = state.bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(kind = event.kind(), "Engine event");
        }
    });

    // 4. 演示菜单
    let catalog = seed_catalog();
    for stall in catalog.stalls() {
        println!("{}", stall.name);
        for item in catalog.menu(&stall.id) {
            println!("  {:<28} {}", item.name, format_amount(item.price));
        }
    }

    // 5. 成功结账
    state
        .carts
        .add_from_catalog(&catalog, "tian-tian", "chicken-rice", 2, &["egg", "chili"]);
    state
        .carts
        .add_from_catalog(&catalog, "tian-tian", "barley", 1, &[]);
    println!("Cart: {} item(s), {}", state.carts.item_count(), format_amount(state.carts.cart_total()));

    if let Some(mut session) = state.checkout.open_checkout("tian-tian") {
        let request = CheckoutRequest::new(PayMethod::PayNow, "Mei Ling");
        if let Some(outcome) = state
            .checkout
            .start_payment(&mut session, request, &CancellationToken::new())
            .await
            && let Some(ticket) = &outcome.ticket
        {
            println!(
                "Paid {} to {} - ticket #{} (about {} min)",
                format_amount(outcome.order.total),
                outcome.order.vendor_name,
                ticket.ticket_no,
                ticket.eta_minutes
            );
            if let Some(pos) = state.queue.get_position(&ticket.stall_id, &ticket.ticket_id) {
                println!("Position {} with {} ahead", pos.position, pos.people_ahead);
            }

            // Vendor serves the customer
            state.call_next(&ticket.stall_id);
            state.set_ticket_status(&ticket.stall_id, &ticket.ticket_id, TicketStatus::Done);
        }
    }

    // 6. 失败结账 (购物车保留)
    state
        .carts
        .add_from_catalog(&catalog, "hokkien-mee", "prawn-mee", 1, &["lard"]);
    if let Some(mut session) = state.checkout.open_checkout("hokkien-mee") {
        let request = CheckoutRequest::new(PayMethod::Card, "Mei Ling").failing();
        if let Some(outcome) = state
            .checkout
            .start_payment(&mut session, request, &CancellationToken::new())
            .await
        {
            println!(
                "Payment to {} failed ({:?}); cart kept with {} item(s)",
                outcome.order.vendor_name,
                outcome.order.failure_reason,
                state.carts.item_count()
            );
        }
    }

    // 7. 统计
    let stats = state.ledger.compute_stats();
    println!(
        "Orders: {}, spent: {}, favourite: {}",
        stats.total_orders,
        format_amount(stats.total_spent),
        stats.favorite_item
    );

    tracing::info!("Hawker edge finished");
    Ok(())
}

fn seed_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    catalog.upsert_stall(
        Stall::new("tian-tian", "Tian Tian Chicken Rice"),
        vec![
            MenuItem::new("chicken-rice", "Hainanese Chicken Rice", Decimal::new(550, 2)).with_addons(vec![
                MenuAddon::new("egg", "Braised Egg", Decimal::new(80, 2)),
                MenuAddon::new("chili", "Extra Chili", Decimal::new(20, 2)),
            ]),
            MenuItem::new("barley", "Barley Water", Decimal::new(180, 2)),
        ],
    );
    catalog.upsert_stall(
        Stall::new("hokkien-mee", "Nam Sing Hokkien Mee"),
        vec![
            MenuItem::new("prawn-mee", "Fried Hokkien Prawn Mee", Decimal::new(600, 2))
                .with_addons(vec![MenuAddon::new("lard", "Crispy Lard", Decimal::new(50, 2))]),
        ],
    );
    catalog
}
