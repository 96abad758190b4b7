use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{decode_jwt, error::AuthError},
    db::user::get_user_by_id_optional,
    error::Error,
    model::User,
    state::SharedAppState,
};

/// The user behind the request, if any. Inserted by
/// [`optional_jwt_auth_middleware`].
#[derive(Clone, Debug, Default)]
pub struct Viewer(pub Option<Arc<User>>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

/// Accepts `Token <jwt>` as well as `Bearer <jwt>`.
fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, Error> {
    let auth_header = match headers.get(axum::http::header::AUTHORIZATION) {
        Some(header) => header
            .to_str()
            .map_err(|_| Error::Auth(AuthError::Unauthenticated))?,
        None => {
            return Ok(None);
        }
    };

    let mut header = auth_header.split_whitespace();
    let (scheme_option, token_option) = (header.next(), header.next());

    let scheme = match scheme_option {
        Some(value) => value.to_lowercase(),
        None => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
    };

    if scheme != "bearer" && scheme != "token" {
        return Err(Error::Auth(AuthError::Unauthenticated));
    }

    match token_option {
        Some(value) => Ok(Some(value)),
        None => Err(Error::Auth(AuthError::Unauthenticated)),
    }
}

async fn authenticate(app_state: &SharedAppState, headers: &HeaderMap) -> Result<Option<Arc<User>>, Error> {
    let token = match extract_token(headers)? {
        Some(token) => token,
        None => {
            return Ok(None);
        }
    };

    let token_data = decode_jwt(token, &app_state.config.jwt)
        .map_err(|_| Error::Auth(AuthError::Unauthenticated))?;

    let user = match get_user_by_id_optional(&app_state.pool, token_data.claims.user_id).await? {
        Some(user) => user,
        None => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
    };

    if user.token_version != token_data.claims.token_version {
        return Err(Error::Auth(AuthError::Unauthenticated));
    }

    Ok(Some(Arc::new(user)))
}

#[tracing::instrument(name = "[MIDDLEWARE] jwt auth", skip_all)]
pub async fn jwt_auth_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let user = authenticate(&app_state, req.headers())
        .await?
        .ok_or(Error::Auth(AuthError::Unauthenticated))?;

    req.extensions_mut().insert(Viewer(Some(user.clone())));
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Lets anonymous requests through, a present but invalid token is still
/// rejected.
#[tracing::instrument(name = "[MIDDLEWARE] optional jwt auth", skip_all)]
pub async fn optional_jwt_auth_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let user = authenticate(&app_state, req.headers()).await?;

    req.extensions_mut().insert(Viewer(user));

    Ok(next.run(req).await)
}
