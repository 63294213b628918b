use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::JwtKeys, payment::PaymentGateway};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub jwt: Arc<JwtKeys>,
    pub payments: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn new(
        orm: DatabaseConnection,
        jwt: JwtKeys,
        payments: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        Self {
            orm,
            jwt: Arc::new(jwt),
            payments,
        }
    }
}
