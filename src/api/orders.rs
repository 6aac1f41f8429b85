use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::AppState;
use crate::domain::order::{CustomSizeDraft, UpdateCustomSize};
use crate::error::CrmError;
use crate::wire::{CustomSizeUpdateDto, SuccessEnvelope, UpdateCustomSizeRequest};

/// `PATCH /orders/{order_id}/items/{item_id}`
pub async fn update_custom_size(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateCustomSizeRequest>,
) -> Result<HttpResponse, CrmError> {
    let (order_id, item_id) = path.into_inner();
    let body = body.into_inner();

    let command = UpdateCustomSize {
        order_id,
        item_id,
        custom_size: CustomSizeDraft::from_json(body.custom_size.as_ref()),
        updated_at: body.updated_at,
    };

    match state.reconciler.reconcile(command).await {
        Ok(outcome) => {
            state.metrics.record_reconciliation(&outcome);
            Ok(HttpResponse::Ok().json(SuccessEnvelope::new(CustomSizeUpdateDto::from(&outcome))))
        }
        Err(e) => {
            state.metrics.record_reconciliation_failure(e.kind());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::app;
    use super::super::test_support::fixture;
    use super::super::AppState;
    use crate::metrics::Metrics;
    use crate::store::faulty::FaultyStore;
    use crate::store::{MeasurementStore, OrderReadStore};
    use actix_web::{test, web};
    use std::sync::Arc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn patch(order_id: Uuid, item_id: Uuid, body: Value) -> test::TestRequest {
        test::TestRequest::patch()
            .uri(&format!("/orders/{order_id}/items/{item_id}"))
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_update_custom_size_end_to_end() {
        let fx = fixture().await;
        let app = test::init_service(app(fx.state.clone())).await;

        let resp = test::call_service(
            &app,
            patch(
                fx.order_id,
                fx.suit_id,
                json!({ "customSize": { "chest": 40, "waist": 34, "hips": 42 } }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["orderId"], fx.order_id.to_string());
        assert_eq!(body["data"]["itemId"], fx.suit_id.to_string());
        assert_eq!(body["data"]["itemName"], "Navy Wool Suit");
        assert_eq!(body["data"]["price"], 800.0);
        assert_eq!(body["data"]["customSize"], json!({ "chest": 40.0, "waist": 34.0, "hips": 42.0 }));
        assert!(body["data"]["updatedAt"].is_string());

        // The old (38, 32, 40) record had no other user and is gone.
        assert_eq!(fx.store.measurement_count().await, 2);
        let orders = fx.store.list_customer_orders(fx.customer_id).await.unwrap();
        let suit = orders[0]
            .items
            .iter()
            .find(|view| view.item.id == fx.suit_id)
            .unwrap();
        let size = suit.measurement.as_ref().unwrap();
        assert_eq!(
            (size.measurements.chest(), size.measurements.waist(), size.measurements.hips()),
            (40.0, 34.0, 42.0)
        );
        assert_eq!(fx.store.count_referencing_items(size.id).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_update_custom_size_reuses_matching_record() {
        let fx = fixture().await;
        let app = test::init_service(app(fx.state.clone())).await;
        let suit_size = fx.store.item(fx.suit_id).await.unwrap().measurement_id;

        let resp = test::call_service(
            &app,
            patch(
                fx.order_id,
                fx.shirt_id,
                json!({ "customSize": { "chest": 38, "waist": 32, "hips": 40 } }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);

        assert_eq!(fx.store.item(fx.shirt_id).await.unwrap().measurement_id, suit_size);
        assert_eq!(fx.store.measurement_count().await, 1);
    }

    #[actix_web::test]
    async fn test_update_custom_size_validation() {
        let fx = fixture().await;
        let app = test::init_service(app(fx.state.clone())).await;

        let resp = test::call_service(
            &app,
            patch(
                fx.order_id,
                fx.suit_id,
                json!({ "customSize": { "chest": -1, "waist": "wide" } }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("chest must be greater than zero"), "{error}");
        assert!(error.contains("waist must be a number"), "{error}");
        assert!(error.contains("hips is required"), "{error}");
        assert_eq!(fx.store.measurement_count().await, 2);

        let resp = test::call_service(&app, patch(fx.order_id, fx.suit_id, json!({})).to_request()).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_update_custom_size_scoped_to_order() {
        let fx = fixture().await;
        let app = test::init_service(app(fx.state.clone())).await;
        let size = json!({ "customSize": { "chest": 40, "waist": 34, "hips": 42 } });

        let resp = test::call_service(&app, patch(Uuid::new_v4(), fx.suit_id, size.clone()).to_request()).await;
        assert_eq!(resp.status(), 404);

        let resp = test::call_service(&app, patch(fx.order_id, Uuid::new_v4(), size).to_request()).await;
        assert_eq!(resp.status(), 404);
        assert_eq!(fx.store.measurement_count().await, 2);

        let text = crate::metrics::render(fx.state.metrics.registry()).unwrap();
        assert!(text.contains("custom_size_reconciliations_total{outcome=\"failed_not_found\"} 2"));
    }

    #[actix_web::test]
    async fn test_update_custom_size_store_failure() {
        let fx = fixture().await;
        let faulty = Arc::new(FaultyStore::new(fx.store.clone()));
        faulty.inject(|f| f.reject_repoint = true);
        let state = web::Data::new(AppState::new(faulty.clone(), Arc::new(Metrics::new().unwrap())));
        let app = test::init_service(app(state.clone())).await;
        let suit_size = fx.store.item(fx.suit_id).await.unwrap().measurement_id;

        let resp = test::call_service(
            &app,
            patch(
                fx.order_id,
                fx.suit_id,
                json!({ "customSize": { "chest": 40, "waist": 34, "hips": 42 } }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 500);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
        assert_eq!(fx.store.item(fx.suit_id).await.unwrap().measurement_id, suit_size);

        let text = crate::metrics::render(state.metrics.registry()).unwrap();
        assert!(text.contains("custom_size_reconciliations_total{outcome=\"failed_store_failure\"} 1"));
    }
}
