use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{
    entities::{auth::AuthContext, token::Claims},
    errors::{AppError, AuthError},
};

/// The authenticated caller, built from the claims the auth middleware
/// stored on the request. Returns 401 when there are none.
///
/// Capability checks happen in the use cases, so handlers only need to
/// take `auth: AuthContext`.
impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<Claims>() {
            Some(claims) => AuthContext::try_from(claims).map_err(AppError::from),
            None => Err(AuthError::MissingCredentials.into()),
        };
        ready(result)
    }
}
