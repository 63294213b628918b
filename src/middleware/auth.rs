use std::{future::Future, pin::Pin};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    domain::user::Role,
    error::{AppError, AppResult},
    state::AppState,
};

/// The authenticated caller, decoded from the `Authorization: Bearer` access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> AppResult<()> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> AppResult<()> {
    ensure_role(user, Role::Admin)
}

fn bearer_token(parts: &Parts) -> AppResult<&str> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already decoded by a role guard further out.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(parts)?;
        let claims = state.jwt.verify_access(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

        let user = AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

type GuardFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Role gate for a whole sub-router.
///
/// ```ignore
/// Router::new()
///     .route("/admin/orders", get(list_all_orders))
///     .layer(middleware::from_fn_with_state(state.clone(), require_role(Role::Admin)));
/// ```
///
/// A missing or invalid token is rejected with 401, a valid token with another
/// role with 403. The decoded [`AuthUser`] is stored in the request extensions.
pub fn require_role(
    role: Role,
) -> impl Fn(State<AppState>, Request, Next) -> GuardFuture + Clone + Send + Sync + 'static {
    move |State(state): State<AppState>, req: Request, next: Next| {
        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let user = AuthUser::from_request_parts(&mut parts, &state).await?;

            if let Err(err) = ensure_role(&user, role) {
                tracing::warn!(
                    user_id = %user.user_id,
                    user_role = %user.role,
                    required_role = %role,
                    "role check failed"
                );
                return Err(err);
            }

            Ok(next.run(Request::from_parts(parts, body)).await)
        })
    }
}
