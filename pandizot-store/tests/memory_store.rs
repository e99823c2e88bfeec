use std::collections::BTreeMap;
use std::sync::Arc;

use pandizot_catalog::{NewPricingRule, PriceQuery, PricingEngine, RulePatch, SpeakerType};
use pandizot_core::{CoreError, OrderService, PlaceOrder, PricingRuleRepository, PricingService};
use pandizot_order::{LineConfiguration, OrderStatus, ShippingAddress};
use pandizot_shared::{Masked, OrderEvent};
use pandizot_store::{seed, InMemoryStore};
use tokio::sync::broadcast;

fn services() -> (Arc<InMemoryStore>, Arc<PricingService>, OrderService) {
    let store = Arc::new(InMemoryStore::new());
    let pricing = Arc::new(PricingService::new(store.clone(), PricingEngine::default()));
    let (tx, _) = broadcast::channel(16);
    let orders = OrderService::new(store.clone(), pricing.clone(), tx);
    (store, pricing, orders)
}

fn golf() -> NewPricingRule {
    NewPricingRule {
        vehicle_brand: "Volkswagen".to_string(),
        vehicle_model: "Golf".to_string(),
        base_price: 120.0,
        speaker_type_multipliers: BTreeMap::from([(SpeakerType::FourByTwenty, 1.0)]),
        tweeter_unit_price: 30.0,
    }
}

fn query(brand: &str, model: &str, speaker_type: &str, speakers: u32, tweeters: u32) -> PriceQuery {
    PriceQuery {
        brand: brand.to_string(),
        model: model.to_string(),
        speaker_type: speaker_type.to_string(),
        speaker_count: speakers,
        tweeter_count: tweeters,
    }
}

fn address(email: Option<&str>) -> ShippingAddress {
    ShippingAddress {
        full_name: "Test User".to_string(),
        phone: Masked::new("555-1234".to_string()),
        address_line1: "Test Adres 123".to_string(),
        address_line2: None,
        city: "İstanbul".to_string(),
        district: None,
        postal_code: None,
        country: "TR".to_string(),
        email: email.map(|e| Masked::new(e.to_string())),
    }
}

fn golf_line(quantity: u32) -> LineConfiguration {
    LineConfiguration {
        vehicle_brand: "Volkswagen".to_string(),
        vehicle_model: "Golf".to_string(),
        speaker_type: SpeakerType::FourOval,
        speaker_count: 2,
        tweeter_count: 2,
        options: vec![],
        quantity,
        preview_image_url: Some("/speakers/4-oval.jpg".to_string()),
    }
}

#[tokio::test]
async fn test_compute_price_with_and_without_rule() {
    let (_, pricing, _) = services();
    pricing.create_rule(golf()).await.unwrap();

    let price = pricing.compute_price(&query("Volkswagen", "Golf", "4x20", 4, 0)).await.unwrap();
    assert_eq!(price, 170);

    // Default multiplier filled in for 4-oval
    let price = pricing.compute_price(&query("Volkswagen", "Golf", "4-oval", 2, 2)).await.unwrap();
    assert_eq!(price, 192);

    // Case-sensitive key: no match, fallback pricing
    let price = pricing.compute_price(&query("volkswagen", "Golf", "4x20", 3, 5)).await.unwrap();
    assert_eq!(price, 125);
}

#[tokio::test]
async fn test_duplicate_active_rule_conflicts() {
    let (_, pricing, _) = services();
    pricing.create_rule(golf()).await.unwrap();

    let err = pricing.create_rule(golf()).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_store_enforces_uniqueness_on_its_own() {
    let store = InMemoryStore::new();
    let first = pandizot_catalog::PricingRule::create(golf()).unwrap();
    let second = pandizot_catalog::PricingRule::create(golf()).unwrap();

    store.create_rule(&first).await.unwrap();
    let err = store.create_rule(&second).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_deactivated_rule_stops_pricing_and_frees_vehicle() {
    let (store, pricing, _) = services();
    let rule = pricing.create_rule(golf()).await.unwrap();

    let deactivated = pricing.deactivate_rule(rule.id).await.unwrap();
    assert!(!deactivated.is_active);

    // Fallback price once the rule is inactive
    let price = pricing.compute_price(&query("Volkswagen", "Golf", "4x20", 4, 0)).await.unwrap();
    assert_eq!(price, 150);

    // History is kept
    assert_eq!(store.list_rules(true).await.unwrap().len(), 1);
    assert!(pricing.list_rules(false).await.unwrap().is_empty());

    // A new rule may take the vehicle
    pricing.create_rule(NewPricingRule { base_price: 140.0, ..golf() }).await.unwrap();
    let price = pricing.compute_price(&query("Volkswagen", "Golf", "4x20", 2, 0)).await.unwrap();
    assert_eq!(price, 140);
}

#[tokio::test]
async fn test_reactivation_blocked_by_newer_active_rule() {
    let (_, pricing, _) = services();
    let old = pricing.create_rule(golf()).await.unwrap();
    pricing.deactivate_rule(old.id).await.unwrap();
    pricing.create_rule(golf()).await.unwrap();

    let err = pricing.reactivate_rule(old.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_reactivation_restores_pricing() {
    let (_, pricing, _) = services();
    let rule = pricing.create_rule(golf()).await.unwrap();
    pricing.deactivate_rule(rule.id).await.unwrap();

    let rule = pricing.reactivate_rule(rule.id).await.unwrap();
    assert!(rule.is_active);

    let price = pricing.compute_price(&query("Volkswagen", "Golf", "4x20", 2, 1)).await.unwrap();
    assert_eq!(price, 150);
}

#[tokio::test]
async fn test_update_rule_and_conflicting_rename() {
    let (_, pricing, _) = services();
    let golf_rule = pricing.create_rule(golf()).await.unwrap();
    let polo = pricing
        .create_rule(NewPricingRule { vehicle_model: "Polo".to_string(), ..golf() })
        .await
        .unwrap();

    let updated = pricing
        .update_rule(golf_rule.id, RulePatch { base_price: Some(200.0), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(updated.base_price, 200.0);

    let err = pricing
        .update_rule(polo.id, RulePatch { vehicle_model: Some("Golf".to_string()), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_unknown_rule_ids() {
    let (_, pricing, _) = services();
    let id = uuid::Uuid::new_v4();

    assert!(matches!(pricing.get_rule(id).await, Err(CoreError::NotFound(_))));
    assert!(matches!(pricing.deactivate_rule(id).await, Err(CoreError::NotFound(_))));
    assert!(matches!(pricing.reactivate_rule(id).await, Err(CoreError::NotFound(_))));
    assert!(matches!(
        pricing.update_rule(id, RulePatch::default()).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_rules_sorted() {
    let (store, pricing, _) = services();
    assert_eq!(seed::seed_examples(store.as_ref()).await.unwrap(), 2);
    // Second run is a no-op
    assert_eq!(seed::seed_examples(store.as_ref()).await.unwrap(), 0);

    let rules = pricing.list_rules(false).await.unwrap();
    let brands: Vec<&str> = rules.iter().map(|r| r.vehicle_brand.as_str()).collect();
    assert_eq!(brands, vec!["Toyota", "Volkswagen"]);
}

#[tokio::test]
async fn test_place_order_prices_lines() {
    let (_, pricing, orders) = services();
    pricing.create_rule(golf()).await.unwrap();
    let mut events = orders.subscribe();

    let order = orders
        .place_order(PlaceOrder {
            user_id: Some("user-1".to_string()),
            email: Some("User@Example.com".to_string()),
            lines: vec![golf_line(2)],
            shipping_address: address(None),
            notes: Some("Gift wrap".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(order.items[0].unit_price, 192);
    assert_eq!(order.items[0].total_price, 384);
    assert_eq!(order.total, 384);
    assert_eq!(order.status, OrderStatus::Preparing);
    assert_eq!(order.email.expose(), "user@example.com");

    match events.recv().await.unwrap() {
        OrderEvent::OrderCreated { order_id, total, item_count, .. } => {
            assert_eq!(order_id, order.id);
            assert_eq!(total, 384);
            assert_eq!(item_count, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let mine = orders.list_user_orders("user-1").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(orders.list_user_orders("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_place_order_validation() {
    let (_, _, orders) = services();

    let err = orders
        .place_order(PlaceOrder {
            user_id: None,
            email: None,
            lines: vec![golf_line(1)],
            shipping_address: address(None),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    let err = orders
        .place_order(PlaceOrder {
            user_id: None,
            email: Some("guest@example.com".to_string()),
            lines: vec![],
            shipping_address: address(Some("guest@example.com")),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    let err = orders
        .place_order(PlaceOrder {
            user_id: None,
            email: Some("guest@example.com".to_string()),
            lines: vec![LineConfiguration { speaker_count: 0, ..golf_line(1) }],
            shipping_address: address(Some("guest@example.com")),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));
}

#[tokio::test]
async fn test_order_status_lifecycle() {
    let (_, _, orders) = services();
    let order = orders
        .place_order(PlaceOrder {
            user_id: None,
            email: Some("guest@example.com".to_string()),
            lines: vec![golf_line(1)],
            shipping_address: address(Some("guest@example.com")),
            notes: None,
        })
        .await
        .unwrap();
    let mut events = orders.subscribe();

    let shipped = orders.update_status(order.id, OrderStatus::Shipped).await.unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert_eq!(orders.get_order(order.id).await.unwrap().status, OrderStatus::Shipped);

    match events.recv().await.unwrap() {
        OrderEvent::OrderStatusChanged { from, to, .. } => {
            assert_eq!(from, "preparing");
            assert_eq!(to, "shipped");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Same status again is a no-op
    orders.update_status(order.id, OrderStatus::Shipped).await.unwrap();

    let err = orders.update_status(order.id, OrderStatus::Preparing).await.unwrap_err();
    assert_eq!(
        err,
        CoreError::InvalidTransition { from: OrderStatus::Shipped, to: OrderStatus::Preparing }
    );

    let missing = orders.update_status(uuid::Uuid::new_v4(), OrderStatus::Shipped).await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn test_list_orders_newest_first() {
    let (_, _, orders) = services();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let order = orders
            .place_order(PlaceOrder {
                user_id: None,
                email: Some("guest@example.com".to_string()),
                lines: vec![golf_line(1)],
                shipping_address: address(Some("guest@example.com")),
                notes: None,
            })
            .await
            .unwrap();
        ids.push(order.id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let listed: Vec<_> = orders.list_orders().await.unwrap().into_iter().map(|o| o.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_place_order_with_maximum_counts() {
    let (_, _, orders) = services();

    // No rule for the vehicle: the unit price alone is about 1.07e11
    let line = LineConfiguration {
        speaker_count: u32::MAX,
        tweeter_count: u32::MAX,
        quantity: u32::MAX,
        ..golf_line(1)
    };

    let err = orders
        .place_order(PlaceOrder {
            user_id: None,
            email: Some("guest@example.com".to_string()),
            lines: vec![line],
            shipping_address: address(Some("guest@example.com")),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));
    assert!(orders.list_orders().await.unwrap().is_empty());
}
