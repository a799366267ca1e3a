use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AuthError, AppState};

/// Verifies the bearer token of every non-public request and stores its
/// claims in the request extensions.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in middleware");
                return Ok(auth_error_response(req, AuthError::MissingJwtService));
            };

            let Some(token) = extract_token(&req) else {
                tracing::warn!(path = %req.path(), "Missing or malformed Authorization header");
                return Ok(auth_error_response(req, AuthError::MissingCredentials));
            };

            match state.jwt_service.decode_jwt(&token) {
                Ok(decoded) => {
                    req.extensions_mut().insert(decoded.claims);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::warn!(path = %req.path(), error = %e, "Rejected bearer token");
                    Ok(auth_error_response(req, e))
                }
            }
        })
    }
}

pub fn is_public_route(path: &str, method: &Method) -> bool {
    if method == Method::OPTIONS {
        return true;
    }

    let readable = method == Method::GET || method == Method::HEAD;
    readable && (path == "/" || path.starts_with("/uploads/"))
}

pub fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

fn auth_error_response(req: ServiceRequest, err: AuthError) -> ServiceResponse<BoxBody> {
    let status = actix_web::ResponseError::status_code(&err);
    let kind = if status.is_server_error() { "internal_server_error" } else { "unauthorized" };
    let message = match err {
        AuthError::TokenExpired => "Token has expired".to_string(),
        other => other.to_string(),
    };

    req.into_response(HttpResponse::build(status).json(serde_json::json!({
        "error": kind,
        "message": message
    })))
}
