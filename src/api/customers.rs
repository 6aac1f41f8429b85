use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use super::AppState;
use crate::domain::customer::{ChangeCustomerStatus, RegisterCustomer};
use crate::error::CrmError;
use crate::query::{CustomerListParams, CustomerQuery};
use crate::wire::{
    CreateCustomerRequest, CustomerDto, CustomerListResponse, DataEnvelope, OrderDto, PaginationDto,
    SuccessEnvelope, UpdateCustomerStatusRequest,
};

pub async fn list(
    state: web::Data<AppState>,
    params: web::Query<CustomerListParams>,
) -> Result<HttpResponse, CrmError> {
    let query = CustomerQuery::from_params(&params)?;
    let page = state.store.list_customers(&query).await?;

    Ok(HttpResponse::Ok().json(CustomerListResponse {
        data: page.customers.iter().map(CustomerDto::from).collect(),
        pagination: PaginationDto::new(page.total, &query),
    }))
}

pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, CrmError> {
    let body = body.into_inner();
    let customer = state
        .customers
        .register(RegisterCustomer {
            name: body.name.unwrap_or_default(),
            email: body.email.unwrap_or_default(),
            status: body.status,
        })
        .await?;
    state.metrics.record_customer_write("register");

    Ok(HttpResponse::Created().json(SuccessEnvelope::new(CustomerDto::from(&customer))))
}

pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerStatusRequest>,
) -> Result<HttpResponse, CrmError> {
    let status = body
        .into_inner()
        .status
        .ok_or_else(|| CrmError::InvalidArgument("status is required".to_string()))?;

    let change = state
        .customers
        .change_status(ChangeCustomerStatus {
            customer_id: path.into_inner(),
            status,
            requested_at: Utc::now(),
        })
        .await?;
    state
        .metrics
        .record_customer_write(if change.changed { "status_change" } else { "status_unchanged" });

    Ok(HttpResponse::Ok().json(SuccessEnvelope::new(CustomerDto::from(&change.customer))))
}

/// Orders of a customer; an unknown customer simply has none.
pub async fn orders(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, CrmError> {
    let orders = state.store.list_customer_orders(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DataEnvelope {
        data: orders.iter().map(OrderDto::from).collect::<Vec<_>>(),
    }))
}
