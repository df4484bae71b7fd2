use std::collections::HashMap;

use stripe::{Client, CreateCustomer, Customer, CustomerId};
use uuid::Uuid;

use crate::error::{AppError, Res};

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}

/// Creates a Stripe customer tagged with the member id it belongs to.
pub async fn create_customer(
    client: &Client,
    member_id: Uuid,
    email: &str,
    name: Option<&str>,
) -> Res<Customer> {
    let params = CreateCustomer {
        email: Some(email).filter(|e| !e.is_empty()),
        name,
        metadata: Some(HashMap::from([(
            "user_id".to_string(),
            member_id.to_string(),
        )])),
        ..Default::default()
    };

    Customer::create(client, params)
        .await
        .map_err(AppError::from)
}

pub fn parse_customer_id(customer_id: &str) -> Res<CustomerId> {
    customer_id.parse::<CustomerId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse customer id: {}. {}",
            customer_id, e
        ))
    })
}
