//! JWT authentication middleware for Bearer token validation
//!
//! Extracts the authenticated user from JWT claims and adds it to request
//! extensions. `UserId` and `AdminUser` extractors pull it back out in
//! handlers; `AdminUser` additionally requires the admin capability.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::security::jwt;

/// Authenticated identity extracted from JWT claims
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// User ID of the authenticated caller
#[derive(Debug, Clone)]
pub struct UserId(pub Uuid);

/// Authenticated caller with the admin capability
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// JWT authentication middleware factory
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            // Extract the header to an owned String before touching
            // extensions_mut; no RefCell borrows may be live at that point.
            let auth_header = match req.headers().get("Authorization") {
                Some(header) => match header.to_str() {
                    Ok(h) => h.to_string(),
                    Err(_) => {
                        return Err(ErrorUnauthorized("Invalid Authorization header"));
                    }
                },
                None => {
                    return Err(ErrorUnauthorized("Missing Authorization header"));
                }
            };

            let token = match auth_header.strip_prefix("Bearer ") {
                Some(t) => t,
                None => {
                    return Err(ErrorUnauthorized(
                        "Invalid Authorization scheme, expected Bearer",
                    ));
                }
            };

            let user = match jwt::validate_token(token) {
                Ok(token_data) => {
                    if token_data.claims.token_type != "access" {
                        return Err(ErrorUnauthorized("Expected an access token"));
                    }
                    match Uuid::parse_str(&token_data.claims.sub) {
                        Ok(id) => AuthUser {
                            id,
                            username: token_data.claims.username,
                            email: token_data.claims.email,
                            is_admin: token_data.claims.is_admin,
                        },
                        Err(_) => {
                            return Err(ErrorUnauthorized("Invalid user ID in token"));
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!("Token validation failed: {}", e);
                    return Err(ErrorUnauthorized("Invalid or expired token"));
                }
            };

            req.extensions_mut().insert(user);

            let res = service.call(req).await?;
            Ok(res)
        })
    }
}

/// Resolve the caller from request extensions, or fall back to parsing the
/// Authorization header on routes registered without the middleware.
fn auth_from_request(req: &HttpRequest) -> Result<AuthUser, Error> {
    if let Some(user) = req.extensions().get::<AuthUser>().cloned() {
        return Ok(user);
    }

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ErrorUnauthorized("Authentication required"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ErrorUnauthorized("Invalid Authorization scheme, expected Bearer"))?;

    let token_data =
        jwt::validate_token(token).map_err(|_| ErrorUnauthorized("Invalid or expired token"))?;
    if token_data.claims.token_type != "access" {
        return Err(ErrorUnauthorized("Expected an access token"));
    }

    let id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| ErrorUnauthorized("Invalid user ID in token"))?;

    Ok(AuthUser {
        id,
        username: token_data.claims.username,
        email: token_data.claims.email,
        is_admin: token_data.claims.is_admin,
    })
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(auth_from_request(req))
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(auth_from_request(req).map(|user| UserId(user.id)))
    }
}

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(auth_from_request(req).and_then(|user| {
            if user.is_admin {
                Ok(AdminUser(user))
            } else {
                Err(ErrorForbidden("Administrative capability required"))
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_shape() {
        let id = Uuid::new_v4();
        let user = AuthUser {
            id,
            username: "marie".to_string(),
            email: "marie@example.com".to_string(),
            is_admin: false,
        };
        assert_eq!(UserId(user.id).0, id);
        assert!(!user.is_admin);
    }
}
